#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use blast_arena_core::{
    Blueprint, Coord, Direction, EnemyVariant, PowerUpKind, CHARACTER_SIZE, GRID_SIZE,
    POWER_UP_SIZE,
};

/// Prefix marking a comment line inside a layout file.
const COMMENT_PREFIX: char = ';';

/// Arena shipped with the binary, used when no layout file is supplied.
pub(crate) const DEMO_LAYOUT: &str = "\
; 13x11 demo arena
P....+...+..E
.#+#.#.#.#.#.
..+..h..+....
.#.#.#+#.#.#.
.+...f.......
.#.#.#.#+#.#.
....+...t....
.#.#.#.#.#.#.
..+...b...+..
.#.#.#.#.#.#.
G...+.......F
";

/// Content of a single layout cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tile {
    /// Indestructible wall, `#`.
    Hard,
    /// Wall that explosions destroy, `+`.
    Destroyable,
    /// Keyboard-controlled character, `P`.
    Player,
    /// Wandering enemy: `E` walks, `F` flies over destroyable walls, `G`
    /// drifts through every wall.
    Enemy(EnemyVariant),
    /// Pickup: `f` for fire, `b` for transparent bombs, `t` for transparent
    /// blocks, `h` for the hammer.
    PowerUp(PowerUpKind),
}

impl Tile {
    fn from_symbol(symbol: char) -> Option<Option<Self>> {
        let tile = match symbol {
            '.' => return Some(None),
            '#' => Self::Hard,
            '+' => Self::Destroyable,
            'P' => Self::Player,
            'E' => Self::Enemy(EnemyVariant::Basic),
            'F' => Self::Enemy(EnemyVariant::Flying),
            'G' => Self::Enemy(EnemyVariant::Ghost),
            'f' => Self::PowerUp(PowerUpKind::Fire),
            'b' => Self::PowerUp(PowerUpKind::TransparentBombs),
            't' => Self::PowerUp(PowerUpKind::TransparentBlocks),
            'h' => Self::PowerUp(PowerUpKind::Hammer),
            _ => return None,
        };
        Some(Some(tile))
    }

    /// Blueprint spawned for this tile.
    #[must_use]
    pub(crate) const fn blueprint(self) -> Blueprint {
        match self {
            Self::Hard => Blueprint::HardBlock,
            Self::Destroyable => Blueprint::DestroyableBlock,
            Self::Player => Blueprint::Player,
            Self::Enemy(variant) => Blueprint::Enemy {
                speed: 1.0,
                facing: Direction::Left,
                variant,
            },
            Self::PowerUp(kind) => Blueprint::PowerUp { kind },
        }
    }
}

/// Tile anchored at a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlacedTile {
    /// Column of the cell.
    pub column: u32,
    /// Row of the cell.
    pub row: u32,
    /// Content of the cell.
    pub tile: Tile,
}

impl PlacedTile {
    /// Pixel position at which the tile's entity is spawned, centred in its
    /// cell when smaller than one.
    #[must_use]
    pub(crate) fn position(&self) -> Coord {
        let size = match self.tile {
            Tile::Player | Tile::Enemy(_) => CHARACTER_SIZE,
            Tile::PowerUp(_) => POWER_UP_SIZE,
            Tile::Hard | Tile::Destroyable => GRID_SIZE,
        };
        let inset = (GRID_SIZE - size) / 2;
        let offset = |cell: u32| {
            i32::try_from(cell)
                .unwrap_or(i32::MAX)
                .saturating_mul(GRID_SIZE)
                .saturating_add(inset)
        };
        Coord::new(offset(self.column), offset(self.row))
    }
}

/// Arena described as a grid of single-character cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ArenaLayout {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Occupied cells in reading order.
    pub tiles: Vec<PlacedTile>,
}

impl ArenaLayout {
    /// Parses a layout, ignoring blank and comment lines.
    pub(crate) fn parse(source: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = source
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
            .collect();
        let Some(first) = lines.first() else {
            return Err(LayoutError::Empty);
        };
        let columns = first.chars().count();

        let mut tiles = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != columns {
                return Err(LayoutError::UnevenRow {
                    row,
                    expected: columns,
                    found,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                let tile = Tile::from_symbol(symbol).ok_or(LayoutError::UnknownTile {
                    row,
                    column,
                    symbol,
                })?;
                if let Some(tile) = tile {
                    tiles.push(PlacedTile {
                        column: to_u32(column)?,
                        row: to_u32(row)?,
                        tile,
                    });
                }
            }
        }

        let players = tiles
            .iter()
            .filter(|placed| placed.tile == Tile::Player)
            .count();
        match players {
            0 => return Err(LayoutError::MissingPlayer),
            1 => {}
            count => return Err(LayoutError::MultiplePlayers(count)),
        }

        Ok(Self {
            columns: to_u32(columns)?,
            rows: to_u32(lines.len())?,
            tiles,
        })
    }
}

fn to_u32(value: usize) -> Result<u32, LayoutError> {
    u32::try_from(value).map_err(|_| LayoutError::TooLarge)
}

/// Errors that can occur while parsing an arena layout.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LayoutError {
    /// The layout contained no rows.
    Empty,
    /// A row's width differed from the first row.
    UnevenRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A cell used a symbol with no meaning.
    UnknownTile {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
        /// Offending symbol.
        symbol: char,
    },
    /// No `P` cell was present.
    MissingPlayer,
    /// More than one `P` cell was present.
    MultiplePlayers(usize),
    /// The layout exceeds the addressable grid.
    TooLarge,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "layout contains no rows"),
            Self::UnevenRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} is {found} cells wide, expected {expected}"),
            Self::UnknownTile {
                row,
                column,
                symbol,
            } => write!(f, "unknown tile '{symbol}' at row {row}, column {column}"),
            Self::MissingPlayer => write!(f, "layout has no player cell"),
            Self::MultiplePlayers(count) => {
                write!(f, "layout has {count} player cells, expected one")
            }
            Self::TooLarge => write!(f, "layout is too large"),
        }
    }
}

impl Error for LayoutError {}
