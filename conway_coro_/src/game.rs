// game.rs - Game of Life session: owns the grid, the generation count and the runner
//
// While stopped the grid lives here; while running it lives inside the
// driver task. Every mutating call stops the driver and takes the grid back
// before touching it, so the two never overlap.

use conway::{ConwayError, Fill, Grid, Pattern, TMatrix};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::driver::{Simulation, interval_from_millis};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Conway(#[from] ConwayError),

    #[error("failed to start the simulation runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A Game of Life board plus the machinery to run it.
///
/// All methods are synchronous and meant to be called from a non-async
/// thread (a GUI loop, a CLI main). Stepping happens on a dedicated runtime
/// worker owned by the game.
pub struct GameOfLife {
    grid: Option<Grid>,              // None while `running` holds it
    running: Option<Simulation>,
    dimensions: (usize, usize),
    generation: u64,
    interval_millis: u64,
    runtime: Runtime,
}

impl GameOfLife {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let grid = Grid::new(config.rows, config.cols, config.fill)?;
        Self::with_grid(grid, config.interval_millis)
    }

    /// Decode RLE text and size the board to the pattern.
    pub fn from_pattern_text(text: &str, interval_millis: u64) -> Result<Self, GameError> {
        let pattern: Pattern = text.parse()?;
        Self::with_grid(Grid::from_pattern(pattern), interval_millis)
    }

    pub fn with_grid(grid: Grid, interval_millis: u64) -> Result<Self, GameError> {
        interval_from_millis(interval_millis)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("conway-driver")
            .enable_all()
            .build()?;

        debug!(dimensions = ?grid.dimensions(), interval_millis, "game created");
        Ok(Self {
            dimensions: grid.dimensions(),
            grid: Some(grid),
            running: None,
            generation: 0,
            interval_millis,
            runtime,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn generation(&self) -> u64 {
        match &self.running {
            Some(simulation) => simulation.generation(),
            None => self.generation,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval_millis
    }

    /// Live cells of the last committed generation.
    pub fn snapshot(&self) -> TMatrix {
        match (&self.running, &self.grid) {
            (Some(simulation), _) => simulation.latest().cells,
            (None, Some(grid)) => grid.live_cell_matrix(),
            (None, None) => vec![vec![false; self.dimensions.1]; self.dimensions.0],
        }
    }

    pub fn population(&self) -> usize {
        self.snapshot().iter().flatten().filter(|&&alive| alive).count()
    }

    /// Advance one generation by hand, stopping the runner first if needed.
    pub fn step(&mut self) -> u64 {
        self.halt();
        if let Some(grid) = self.grid.as_mut() {
            grid.advance();
            self.generation += 1;
        }
        self.generation
    }

    /// Kill every cell and restart the generation count.
    pub fn reset(&mut self) {
        self.halt();
        if let Some(grid) = self.grid.as_mut() {
            grid.reset();
        }
        self.generation = 0;
    }

    /// Replace the board with a blank one of the new size.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<(), ConwayError> {
        let grid = Grid::new(rows, cols, Fill::Uniform(false))?;
        self.replace_grid(grid);
        Ok(())
    }

    /// Re-seed the board at its current size.
    pub fn refill(&mut self, fill: Fill) -> Result<(), ConwayError> {
        let (rows, cols) = self.dimensions;
        let grid = Grid::new(rows, cols, fill)?;
        self.replace_grid(grid);
        Ok(())
    }

    /// Re-seed the board with random cells, keeping its size.
    pub fn randomize(&mut self) -> Result<(), ConwayError> {
        self.refill(Fill::Random)
    }

    /// Decode RLE text and replace the board with it. On a decode error the
    /// current board is left exactly as it was.
    pub fn load_pattern_text(&mut self, text: &str) -> Result<(), ConwayError> {
        let pattern: Pattern = text.parse()?;
        self.load_pattern(pattern);
        Ok(())
    }

    pub fn load_pattern(&mut self, pattern: Pattern) {
        self.replace_grid(pattern.into());
    }

    /// Flip one cell. Refused while running or when off the board.
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> bool {
        if self.is_running() {
            return false;
        }
        self.grid
            .as_mut()
            .is_some_and(|grid| grid.toggle_cell(row, col))
    }

    /// Start stepping on the driver worker. `on_generation` runs on that
    /// worker after every generation. Starting twice is a no-op.
    pub fn start_running<F>(&mut self, on_generation: F) -> Result<(), ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        self.launch(None, on_generation)
    }

    /// Like [`start_running`](GameOfLife::start_running), but the driver
    /// halts by itself after `generations` more steps and drops
    /// `on_generation`. The game still counts as running until
    /// [`stop_running`](GameOfLife::stop_running) collects the grid.
    pub fn start_running_for<F>(&mut self, generations: u64, on_generation: F) -> Result<(), ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        self.launch(Some(generations), on_generation)
    }

    fn launch<F>(&mut self, generations: Option<u64>, on_generation: F) -> Result<(), ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        if self.is_running() {
            return Ok(());
        }
        // Checked before the grid leaves our hands
        interval_from_millis(self.interval_millis)?;

        let Some(grid) = self.grid.take() else {
            return Ok(());
        };
        let _guard = self.runtime.enter();
        let simulation = match generations {
            Some(count) => {
                let last = self.generation.saturating_add(count);
                Simulation::resume_until(grid, self.generation, last, self.interval_millis, on_generation)?
            }
            None => Simulation::resume(grid, self.generation, self.interval_millis, on_generation)?,
        };
        self.running = Some(simulation);
        Ok(())
    }

    /// Stop the driver and wait for its in-flight step. Returns the number of
    /// the last committed generation.
    pub fn stop_running(&mut self) -> u64 {
        self.halt();
        self.generation
    }

    pub fn set_interval(&mut self, interval_millis: u64) -> Result<(), ConwayError> {
        interval_from_millis(interval_millis)?;
        if let Some(simulation) = &self.running {
            simulation.set_interval(interval_millis)?;
        }
        self.interval_millis = interval_millis;
        Ok(())
    }

    /// Take the grid back from the driver, if one is running.
    fn halt(&mut self) {
        if let Some(simulation) = self.running.take() {
            let (grid, generation) = self.runtime.block_on(simulation.stop());
            info!(generation, "game paused");
            self.grid = Some(grid);
            self.generation = generation;
        }
    }

    fn replace_grid(&mut self, grid: Grid) {
        self.halt();
        self.dimensions = grid.dimensions();
        self.grid = Some(grid);
        self.generation = 0;
    }
}
