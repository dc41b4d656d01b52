// main.rs - Headless Conway's Game of Life runner
//
// Loads an RLE file, a built-in pattern or a blank/random board, runs it on
// the async driver and prints each generation as text.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, anyhow};
use clap::Parser;
use conway::{Fill, Grid, Pattern, TMatrix, PATTERNS, builtin};
use conway_coro::config::{DEFAULT_COLS, DEFAULT_INTERVAL_MILLIS, DEFAULT_ROWS};
use conway_coro::{GameConfig, GameOfLife, ui};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Conway's Game of Life on an async stepping driver
#[derive(Parser, Debug)]
#[command(name = "conway-coro")]
#[command(about = "Run Conway's Game of Life from an RLE pattern", long_about = None)]
struct Args {
    /// RLE pattern file to load
    #[arg(short, long, conflicts_with = "builtin")]
    pattern: Option<PathBuf>,

    /// Built-in pattern (see --list)
    #[arg(short, long)]
    builtin: Option<String>,

    /// Board rows (defaults to the pattern height, or 80)
    #[arg(long)]
    rows: Option<usize>,

    /// Board columns (defaults to the pattern width, or 80)
    #[arg(long)]
    cols: Option<usize>,

    /// Seed the board randomly instead of loading a pattern
    #[arg(long, conflicts_with_all = ["pattern", "builtin"])]
    random: bool,

    /// Seed for --random, for reproducible runs
    #[arg(long, requires = "random")]
    seed: Option<u64>,

    /// Milliseconds between generations
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MILLIS)]
    interval: u64,

    /// Number of generations to run
    #[arg(short, long, default_value_t = 100)]
    generations: u64,

    /// Only print the final summary
    #[arg(short, long)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List built-in patterns and exit
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.list {
        for pattern in PATTERNS {
            println!("{}", pattern.name);
        }
        return Ok(());
    }

    let mut game = build_game(&args)?;
    let (rows, cols) = game.dimensions();
    info!(rows, cols, interval = args.interval, "board ready");

    if !args.quiet {
        print!("{}", ui::render_frame(0, &game.snapshot()));
    }

    let (tx, rx) = mpsc::channel::<(u64, TMatrix)>();
    game.start_running_for(args.generations, move |generation, cells| {
        // Receiver gone means main is shutting down
        let _ = tx.send((generation, cells.clone()));
    })?;

    // Ends once the driver finishes its last generation and drops the sender
    for (generation, cells) in rx.iter() {
        if !args.quiet {
            print!("{}", ui::render_frame(generation, &cells));
        }
    }

    let generation = game.stop_running();
    info!(generation, population = game.population(), "finished");
    Ok(())
}

fn build_game(args: &Args) -> anyhow::Result<GameOfLife> {
    let Some(pattern) = load_pattern(args)? else {
        let fill = match (args.random, args.seed) {
            (true, Some(seed)) => Fill::Seeded(seed),
            (true, None) => Fill::Random,
            (false, _) => Fill::Uniform(false),
        };
        let config = GameConfig::default()
            .with_dimensions(args.rows.unwrap_or(DEFAULT_ROWS), args.cols.unwrap_or(DEFAULT_COLS))
            .with_interval_millis(args.interval)
            .with_fill(fill);
        return Ok(GameOfLife::new(config)?);
    };

    let grid = match (args.rows, args.cols) {
        (None, None) => Grid::from_pattern(pattern),
        (rows, cols) => {
            let rows = rows.unwrap_or(pattern.rows());
            let cols = cols.unwrap_or(pattern.cols());
            let mut grid = Grid::new(rows, cols, Fill::Uniform(false))?;
            // Centre the pattern; anything hanging off the board is clipped
            let top = rows.saturating_sub(pattern.rows()) / 2;
            let left = cols.saturating_sub(pattern.cols()) / 2;
            grid.stamp(&pattern, top, left);
            grid
        }
    };
    Ok(GameOfLife::with_grid(grid, args.interval)?)
}

fn load_pattern(args: &Args) -> anyhow::Result<Option<Pattern>> {
    if let Some(path) = &args.pattern {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pattern file {}", path.display()))?;
        let pattern: Pattern = text
            .parse()
            .with_context(|| format!("failed to decode {}", path.display()))?;
        debug!(path = %path.display(), "pattern loaded");
        return Ok(Some(pattern));
    }

    if let Some(name) = &args.builtin {
        let named = builtin(name)
            .ok_or_else(|| anyhow!("unknown pattern {name:?}, try --list"))?;
        return Ok(Some(named.decode()?));
    }

    Ok(None)
}
