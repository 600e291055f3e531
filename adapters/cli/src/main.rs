#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless, scripted Blast Arena match.

mod layout;
mod summary;

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result};
use blast_arena_core::{ArenaConfig, Coord, EntityId, GameCommand, GRID_SIZE};
use blast_arena_runtime::Match;
use blast_arena_world::query;
use clap::Parser;
use tokio::time::sleep;
use tracing::{info, warn};

use layout::{ArenaLayout, Tile, DEMO_LAYOUT};
use summary::EventTally;

/// Command-line arguments accepted by the Blast Arena binary.
#[derive(Debug, Parser)]
#[command(name = "blast-arena", about = "Runs a headless Blast Arena match")]
struct CliArgs {
    /// TOML file with arena configuration overrides.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Text layout of the arena; the built-in demo arena is used otherwise.
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,
    /// Seconds of match time to simulate.
    #[arg(long, default_value_t = 8)]
    seconds: u64,
    /// Dispatch held commands with the shorter turbo debounce.
    #[arg(long)]
    turbo: bool,
    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

/// One action of the scripted opening played on behalf of the player.
#[derive(Clone, Copy, Debug)]
enum Step {
    Press(GameCommand),
    Release(GameCommand),
    SteerToward { column: i32, row: i32 },
    Wait(u64),
}

/// Arms a bomb, runs clear of its blast and wanders down the first column.
const OPENING: &[Step] = &[
    Step::Press(GameCommand::PlaceBomb),
    Step::Wait(40),
    Step::Release(GameCommand::PlaceBomb),
    Step::Press(GameCommand::MoveDown),
    Step::Wait(1_300),
    Step::Release(GameCommand::MoveDown),
    Step::SteerToward { column: 0, row: 6 },
    Step::Wait(1_500),
];

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = CliArgs::parse();
    let layout = load_layout(args.layout.as_deref())?;
    let config = load_config(args.config.as_deref(), &layout)?;
    if args.print_config {
        let rendered =
            toml::to_string_pretty(&config).context("failed to render the configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    run(&args, config, &layout).await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn load_layout(path: Option<&Path>) -> Result<ArenaLayout> {
    let Some(path) = path else {
        return Ok(ArenaLayout::parse(DEMO_LAYOUT)?);
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout {}", path.display()))?;
    ArenaLayout::parse(&source).with_context(|| format!("invalid layout {}", path.display()))
}

/// Reads configuration overrides and sizes the pitch to the layout.
fn load_config(path: Option<&Path>, layout: &ArenaLayout) -> Result<ArenaConfig> {
    let mut config = match path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?;
            toml::from_str(&source)
                .with_context(|| format!("failed to parse configuration {}", path.display()))?
        }
        None => ArenaConfig::default(),
    };
    config.columns = layout.columns;
    config.rows = layout.rows;
    config.validate().context("invalid arena configuration")?;
    Ok(config)
}

async fn run(args: &CliArgs, config: ArenaConfig, layout: &ArenaLayout) -> Result<()> {
    let arena = Match::start(config).context("failed to start the match")?;
    let tally = Arc::new(Mutex::new(EventTally::default()));
    let sink = Arc::clone(&tally);
    let listener = arena.on_event(move |event| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&event);
    });

    let player = populate(&arena, layout)?;
    arena.control(player);
    arena.set_turbo(args.turbo);

    play_script(&arena, OPENING).await;
    let remaining = Duration::from_secs(args.seconds).saturating_sub(arena.now());
    sleep(remaining).await;

    let finished = arena.read(|world| query::character(world, player));
    arena.shutdown().await;
    if let Err(error) = listener.await {
        warn!(%error, "event listener failed");
    }

    let tally = tally
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    print!("{tally}");
    match finished {
        Some(view) => println!("player finished {:?} with {} health", view.state, view.health),
        None => println!("player was removed from the arena"),
    }
    info!(
        detonations = tally.count("detonated"),
        eliminations = tally.count("eliminated"),
        "match finished"
    );
    Ok(())
}

/// Spawns every layout tile and returns the player's handle.
fn populate(arena: &Match, layout: &ArenaLayout) -> Result<EntityId> {
    let mut player = None;
    for placed in &layout.tiles {
        let entity = arena
            .spawn(placed.tile.blueprint(), placed.position())
            .with_context(|| {
                format!(
                    "failed to place {:?} at column {}, row {}",
                    placed.tile, placed.column, placed.row
                )
            })?;
        if placed.tile == Tile::Player {
            player = Some(entity);
        }
    }
    player.context("layout has no player")
}

async fn play_script(arena: &Match, script: &[Step]) {
    for step in script {
        match *step {
            Step::Press(command) => {
                if !arena.press(command) {
                    warn!(?command, "scripted press was debounced");
                }
            }
            Step::Release(command) => arena.release(command),
            Step::SteerToward { column, row } => {
                let pointer = Coord::new(column * GRID_SIZE, row * GRID_SIZE);
                if !arena.steer_toward(pointer) {
                    warn!("no live player to steer");
                }
            }
            Step::Wait(millis) => sleep(Duration::from_millis(millis)).await,
        }
    }
}
