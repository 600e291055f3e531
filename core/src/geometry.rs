//! Pixel-space geometry shared by the world and its collaborators.
//!
//! Positions are integer pixel coordinates anchored at an entity's upper-left
//! corner. Every entity occupies a square footprint; collision checks sample
//! that footprint at [`SAMPLE_STEP`] granularity instead of visiting every
//! pixel, which keeps the cost proportional to entity size.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Smallest distance an entity travels in response to a single movement step.
pub const PIXEL_UNIT: i32 = 5;

/// Spacing between the sample points used to enumerate a footprint.
pub const SAMPLE_STEP: i32 = PIXEL_UNIT * 4;

/// Side length of a grid cell, the placement unit for blocks and bombs.
pub const GRID_SIZE: i32 = SAMPLE_STEP * 3;

/// Number of grid columns laid out on the default pitch.
pub const DEFAULT_COLUMNS: u32 = 13;

/// Number of grid rows laid out on the default pitch.
pub const DEFAULT_ROWS: u32 = 11;

/// Integer pixel coordinate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    x: i32,
    y: i32,
}

impl Coord {
    /// Coordinate of the pitch's upper-left corner.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component measured in pixels.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component measured in pixels.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Translates the coordinate by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Coordinate reached after travelling `distance` pixels in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx.saturating_mul(distance), dy.saturating_mul(distance))
    }

    /// Euclidean distance between two coordinates.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Floors both axes to the enclosing grid-cell origin.
    ///
    /// Negative coordinates round toward negative infinity so that every pixel
    /// maps onto the cell that actually contains it.
    #[must_use]
    pub const fn round(self) -> Self {
        self.round_with_offset(Self::ORIGIN)
    }

    /// Floors both axes to the enclosing grid cell and adds a sub-cell offset.
    #[must_use]
    pub const fn round_with_offset(self, offset: Self) -> Self {
        Self::new(
            self.x.div_euclid(GRID_SIZE).saturating_mul(GRID_SIZE).saturating_add(offset.x),
            self.y.div_euclid(GRID_SIZE).saturating_mul(GRID_SIZE).saturating_add(offset.y),
        )
    }

    /// Centre of a `size`×`size` footprint anchored at this coordinate.
    #[must_use]
    pub const fn center(self, size: i32) -> Self {
        self.offset(size / 2, size / 2)
    }
}

impl Add for Coord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.offset(rhs.x, rhs.y)
    }
}

/// Cardinal directions an entity may face or travel in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Towards decreasing `y`.
    Up,
    /// Towards increasing `x`.
    Right,
    /// Towards increasing `y`.
    Down,
    /// Towards decreasing `x`.
    Left,
}

impl Direction {
    /// Every direction in clockwise order starting from [`Direction::Up`].
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit offset applied when travelling in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// Next direction when rotating a quarter turn clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }
}

/// Bounded rectangular play-field measured in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    width: i32,
    height: i32,
}

impl Pitch {
    /// Creates a pitch with explicit pixel dimensions.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Creates a pitch spanning the provided number of grid cells.
    #[must_use]
    pub fn from_cells(columns: u32, rows: u32) -> Self {
        let cells = |count: u32| {
            i32::try_from(count)
                .unwrap_or(i32::MAX)
                .saturating_mul(GRID_SIZE)
        };
        Self::new(cells(columns), cells(rows))
    }

    /// Width of the pitch in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the pitch in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether a `size`×`size` footprint anchored at `coord` lies
    /// entirely inside the pitch.
    #[must_use]
    pub const fn validate(&self, coord: Coord, size: i32) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.x <= self.width - size
            && coord.y <= self.height - size
    }

    /// Reports whether a single pixel lies inside the pitch.
    #[must_use]
    pub const fn contains(&self, point: Coord) -> bool {
        self.validate(point, 1)
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Self::from_cells(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

/// Reports whether `point` lies inside the inclusive bounding box of a
/// `size`×`size` footprint anchored at `origin`.
#[must_use]
pub const fn collides_with(point: Coord, origin: Coord, size: i32) -> bool {
    point.x >= origin.x
        && point.x <= origin.x + size - 1
        && point.y >= origin.y
        && point.y <= origin.y + size - 1
}

/// Reports whether two square footprints share at least one pixel.
#[must_use]
pub const fn boxes_overlap(a: Coord, a_size: i32, b: Coord, b_size: i32) -> bool {
    a.x < b.x + b_size && b.x < a.x + a_size && a.y < b.y + b_size && b.y < a.y + a_size
}

/// Sample points covering a `size`×`size` footprint anchored at `origin`.
///
/// Points are laid out every [`SAMPLE_STEP`] pixels on both axes, plus the far
/// edge of the footprint, so the corners are always included.
#[must_use]
pub fn footprint(origin: Coord, size: i32) -> Vec<Coord> {
    sample_rect(origin, size, size)
}

/// Sample points covering the strip a footprint newly enters when it travels
/// `step` pixels in `direction`.
///
/// A step at least as long as the footprint yields the whole destination box.
#[must_use]
pub fn leading_edge(origin: Coord, size: i32, direction: Direction, step: i32) -> Vec<Coord> {
    if step <= 0 || size <= 0 {
        return Vec::new();
    }
    let depth = step.min(size);
    let next = origin.step(direction, step);
    let corner = match direction {
        Direction::Up | Direction::Left => next,
        Direction::Right => next.offset(size - depth, 0),
        Direction::Down => next.offset(0, size - depth),
    };
    match direction {
        Direction::Up | Direction::Down => sample_rect(corner, size, depth),
        Direction::Left | Direction::Right => sample_rect(corner, depth, size),
    }
}

/// Grid-cell origins of every cell touched by the rectangle spanning
/// `top_left` to `bottom_right` inclusive.
///
/// Returns an empty list when the corners are reversed.
#[must_use]
pub fn cells_in_area(top_left: Coord, bottom_right: Coord) -> Vec<Coord> {
    if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
        return Vec::new();
    }
    let first = top_left.round();
    let last = bottom_right.round();
    let mut cells = Vec::new();
    let mut row = Some(first.y);
    while let Some(y) = row.filter(|y| *y <= last.y) {
        let mut column = Some(first.x);
        while let Some(x) = column.filter(|x| *x <= last.x) {
            cells.push(Coord::new(x, y));
            column = x.checked_add(GRID_SIZE);
        }
        row = y.checked_add(GRID_SIZE);
    }
    cells
}

/// Grid cells forming the band that extends `depth` cells beyond the edge of
/// a footprint in `direction`.
#[must_use]
pub fn directional_band(origin: Coord, size: i32, direction: Direction, depth: u32) -> Vec<Coord> {
    if depth == 0 || size <= 0 {
        return Vec::new();
    }
    let reach = i32::try_from(depth)
        .unwrap_or(i32::MAX)
        .saturating_mul(GRID_SIZE);
    let far = size.saturating_add(reach) - 1;
    let (top_left, bottom_right) = match direction {
        Direction::Up => (origin.offset(0, -reach), origin.offset(size - 1, -1)),
        Direction::Down => (origin.offset(0, size), origin.offset(size - 1, far)),
        Direction::Left => (origin.offset(-reach, 0), origin.offset(-1, size - 1)),
        Direction::Right => (origin.offset(size, 0), origin.offset(far, size - 1)),
    };
    cells_in_area(top_left, bottom_right)
}

/// Number of grid cells a band must span to cover a `step`-pixel move.
#[must_use]
pub fn band_depth(step: i32) -> u32 {
    u32::try_from(step.max(0)).unwrap_or(0).div_ceil(GRID_SIZE.unsigned_abs())
}

/// Directions leading from the grid cell containing `actor` towards the grid
/// cell containing `pointer`.
///
/// Horizontal directions are listed before vertical ones; an empty list means
/// both share the same cell.
#[must_use]
pub fn pointer_directions(actor: Coord, pointer: Coord) -> Vec<Direction> {
    let actor = actor.round();
    let pointer = pointer.round();
    let mut directions = Vec::with_capacity(2);
    if pointer.x > actor.x {
        directions.push(Direction::Right);
    }
    if pointer.x < actor.x {
        directions.push(Direction::Left);
    }
    if pointer.y > actor.y {
        directions.push(Direction::Down);
    }
    if pointer.y < actor.y {
        directions.push(Direction::Up);
    }
    directions
}

fn sample_rect(corner: Coord, width: i32, height: i32) -> Vec<Coord> {
    let xs = sample_axis(width);
    let ys = sample_axis(height);
    let mut points = Vec::with_capacity(xs.len() * ys.len());
    for dy in &ys {
        for dx in &xs {
            points.push(corner.offset(*dx, *dy));
        }
    }
    points
}

fn sample_axis(length: i32) -> Vec<i32> {
    if length <= 0 {
        return Vec::new();
    }
    let stride = usize::try_from(SAMPLE_STEP.unsigned_abs()).unwrap_or(1);
    let mut offsets: Vec<i32> = (0..length).step_by(stride).collect();
    if offsets.last() != Some(&(length - 1)) {
        offsets.push(length - 1);
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_saturates_at_the_pixel_range() {
        let low = Coord::new(i32::MIN, 0).round();
        assert_eq!(low.y(), 0);
        assert!(low.x() <= i32::MIN + GRID_SIZE);
        let high = Coord::new(i32::MAX, i32::MAX);
        assert_eq!(high.round_with_offset(Coord::new(GRID_SIZE, GRID_SIZE)), high);
    }

    #[test]
    fn bands_far_beyond_the_footprint_do_not_overflow() {
        let edge = Coord::new(i32::MAX - 100, 0);
        let band = directional_band(edge, GRID_SIZE, Direction::Right, 2);
        assert_eq!(band.len(), 2);
        assert!(band.iter().all(|cell| cell.y() == 0));
    }

    #[test]
    fn round_floors_to_grid_cells() {
        assert_eq!(Coord::new(359, 61).round(), Coord::new(300, 60));
        assert_eq!(Coord::new(-1, 0).round(), Coord::new(-60, 0));
        assert_eq!(
            Coord::new(130, 70).round_with_offset(Coord::new(10, 10)),
            Coord::new(130, 70)
        );
    }

    #[test]
    fn validate_accepts_flush_footprints_only() {
        let pitch = Pitch::default();
        assert_eq!(pitch.width(), 780);
        assert_eq!(pitch.height(), 660);
        assert!(pitch.validate(Coord::new(720, 600), GRID_SIZE));
        assert!(!pitch.validate(Coord::new(721, 600), GRID_SIZE));
        assert!(!pitch.validate(Coord::new(-1, 0), 40));
    }

    #[test]
    fn collision_box_is_inclusive_of_far_edge() {
        let origin = Coord::new(60, 60);
        assert!(collides_with(Coord::new(60, 60), origin, GRID_SIZE));
        assert!(collides_with(Coord::new(119, 119), origin, GRID_SIZE));
        assert!(!collides_with(Coord::new(120, 119), origin, GRID_SIZE));
    }

    #[test]
    fn footprint_includes_all_corners() {
        let points = footprint(Coord::new(0, 0), 40);
        assert_eq!(points.len(), 9);
        for corner in [(0, 0), (39, 0), (0, 39), (39, 39)] {
            assert!(
                points.contains(&Coord::new(corner.0, corner.1)),
                "missing corner {corner:?}"
            );
        }
    }

    #[test]
    fn leading_edge_covers_only_entered_strip() {
        let origin = Coord::new(100, 100);
        let points = leading_edge(origin, 40, Direction::Right, PIXEL_UNIT);
        assert!(points.iter().all(|p| p.x() >= 140 && p.x() <= 144));
        assert!(points.iter().any(|p| p.y() == 100));
        assert!(points.iter().any(|p| p.y() == 139));

        let up = leading_edge(origin, 40, Direction::Up, PIXEL_UNIT);
        assert!(up.iter().all(|p| p.y() >= 95 && p.y() <= 99));
    }

    #[test]
    fn leading_edge_of_long_step_is_destination_footprint() {
        let origin = Coord::new(300, 300);
        let points = leading_edge(origin, GRID_SIZE, Direction::Left, GRID_SIZE);
        assert_eq!(points, footprint(Coord::new(240, 300), GRID_SIZE));
    }

    #[test]
    fn directional_band_lists_cells_beyond_edge() {
        let band = directional_band(Coord::new(300, 300), GRID_SIZE, Direction::Right, 2);
        assert_eq!(band, vec![Coord::new(360, 300), Coord::new(420, 300)]);

        let straddling = directional_band(Coord::new(70, 70), 40, Direction::Down, 1);
        assert_eq!(straddling, vec![Coord::new(60, 60), Coord::new(60, 120)]);
    }

    #[test]
    fn band_depth_rounds_up() {
        assert_eq!(band_depth(PIXEL_UNIT), 1);
        assert_eq!(band_depth(GRID_SIZE), 1);
        assert_eq!(band_depth(GRID_SIZE + 1), 2);
        assert_eq!(band_depth(0), 0);
    }

    #[test]
    fn pointer_directions_compare_rounded_cells() {
        let actor = Coord::new(65, 65);
        assert_eq!(
            pointer_directions(actor, Coord::new(200, 10)),
            vec![Direction::Right, Direction::Up]
        );
        assert!(pointer_directions(actor, Coord::new(110, 110)).is_empty());
    }

    #[test]
    fn boxes_overlap_excludes_touching_edges() {
        assert!(boxes_overlap(Coord::new(0, 0), 60, Coord::new(59, 59), 40));
        assert!(!boxes_overlap(Coord::new(0, 0), 60, Coord::new(60, 0), 60));
    }
}
