// config.rs - Board size, seeding and stepping speed for a new game

use conway::{ConwayError, Fill};

use crate::driver::interval_from_millis;

pub const DEFAULT_ROWS: usize = 80;
pub const DEFAULT_COLS: usize = 80;
pub const DEFAULT_INTERVAL_MILLIS: u64 = 50;

/// Settings for [`GameOfLife::new`](crate::GameOfLife::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub interval_millis: u64,
    pub fill: Fill,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            fill: Fill::Uniform(false),
        }
    }
}

impl GameConfig {
    pub fn with_dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_interval_millis(mut self, interval_millis: u64) -> Self {
        self.interval_millis = interval_millis;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    /// Check everything that can be checked without building the grid.
    pub fn validate(&self) -> Result<(), ConwayError> {
        if self.rows < 1 || self.cols < 1 {
            return Err(ConwayError::invalid_dimensions(format!(
                "board must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        interval_from_millis(self.interval_millis)?;
        Ok(())
    }
}
