// grid.rs - Fixed-size automaton grid for Conway's Game of Life

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::cell::Cell;
use crate::error::{ConwayError, Result};
use crate::patterns::Pattern;

pub type TRow = Vec<bool>;          // One row of live/dead flags
pub type TMatrix = Vec<TRow>;       // rows x cols snapshot, row-major

/// Largest board `Grid::new` and the decoder accept, in cells
pub const MAX_CELLS: usize = 1 << 24;

/// Moore neighbourhood offsets as (row, col)
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// How a new grid is seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    /// Each cell alive with probability 0.5, from thread-local entropy
    Random,
    /// Same as `Random` but reproducible from a seed
    Seeded(u64),
    /// Every cell set to the given state
    Uniform(bool),
    /// Decoded pattern copied verbatim; its shape must match the grid's
    Pattern(Pattern),
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Uniform(false)
    }
}

/// A bounded (non-toroidal) Game of Life board.
///
/// Dimensions never change after construction; resizing means building a
/// new `Grid`. The grid does no locking of its own: whoever holds it
/// (caller or running driver) is the only one mutating it.
///
/// Two grids are equal when their dimensions and committed cells match.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a `rows x cols` grid seeded according to `fill`.
    pub fn new(rows: usize, cols: usize, fill: Fill) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        let cells = match fill {
            Fill::Uniform(alive) => vec![Cell::new(alive); len],
            Fill::Random => random_cells(&mut rand::thread_rng(), len),
            Fill::Seeded(seed) => random_cells(&mut StdRng::seed_from_u64(seed), len),
            Fill::Pattern(pattern) => {
                let (pattern_rows, pattern_cols) = pattern.dimensions();
                if (pattern_rows, pattern_cols) != (rows, cols) {
                    return Err(ConwayError::DimensionMismatch {
                        rows,
                        cols,
                        pattern_rows,
                        pattern_cols,
                    });
                }
                return Ok(Self::from_pattern(pattern));
            }
        };

        debug!(rows, cols, "grid created");
        Ok(Self { rows, cols, cells })
    }

    /// Build a grid shaped exactly like `pattern`. Cannot fail: the decoder
    /// already guarantees a non-empty rectangular matrix.
    pub fn from_pattern(pattern: Pattern) -> Self {
        let (rows, cols) = pattern.dimensions();
        let cells = pattern
            .into_matrix()
            .into_iter()
            .flatten()
            .map(Cell::new)
            .collect();

        debug!(rows, cols, "grid created from pattern");
        Self { rows, cols, cells }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Committed state of a cell, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        self.index(row, col).map(|i| self.cells[i].alive)
    }

    /// Committed state of a cell; anything outside the grid reads as dead.
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.get(row, col).unwrap_or(false)
    }

    /// Live cells among the 8 Moore neighbours of `(row, col)`.
    ///
    /// Reads the committed generation only, never staged values.
    pub fn count_live_neighbors(&self, row: usize, col: usize) -> u8 {
        NEIGHBOURS
            .iter()
            .filter(|&&(dr, dc)| match (row.checked_add_signed(dr), col.checked_add_signed(dc)) {
                (Some(r), Some(c)) => self.is_alive(r, c),
                _ => false,
            })
            .count() as u8
    }

    /// Advance one generation.
    ///
    /// Every cell's next state is staged from the pre-advance board before
    /// any cell is committed, so scan order never leaks into the result.
    pub fn advance(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let neighbours = self.count_live_neighbors(row, col);
                self.cells[row * self.cols + col].stage(neighbours);
            }
        }

        self.cells.iter_mut().for_each(Cell::commit);
        trace!(population = self.population(), "generation advanced");
    }

    /// Kill every cell; dimensions are kept.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Snapshot of the committed state for rendering.
    pub fn live_cell_matrix(&self) -> TMatrix {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.alive).collect())
            .collect()
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.alive).count()
    }

    /// Flip a cell. Returns `false` if the coordinate is off the grid.
    pub fn toggle_cell(&mut self, row: usize, col: usize) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i].alive = !self.cells[i].alive;
                true
            }
            None => false,
        }
    }

    /// Clear the grid, then copy `pattern` in with its top-left corner at
    /// `(top, left)`. Cells falling outside the grid are dropped.
    pub fn stamp(&mut self, pattern: &Pattern, top: usize, left: usize) {
        self.reset();

        for (r, row) in pattern.cells().iter().enumerate() {
            for (c, &alive) in row.iter().enumerate() {
                let target = top
                    .checked_add(r)
                    .zip(left.checked_add(c))
                    .and_then(|(row, col)| self.index(row, col));
                if let Some(i) = target {
                    self.cells[i].alive = alive;
                }
            }
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.alive == b.alive)
    }
}

impl Eq for Grid {}

impl From<Pattern> for Grid {
    fn from(pattern: Pattern) -> Self {
        Grid::from_pattern(pattern)
    }
}

/// Cell count of a `rows x cols` board, checked against `1..=MAX_CELLS`.
pub(crate) fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    if rows < 1 || cols < 1 {
        return Err(ConwayError::invalid_dimensions(format!(
            "grid must be at least 1x1, got {rows}x{cols}"
        )));
    }
    match rows.checked_mul(cols) {
        Some(len) if len <= MAX_CELLS => Ok(len),
        _ => Err(ConwayError::invalid_dimensions(format!(
            "grid of {rows}x{cols} cells exceeds the {MAX_CELLS} cell limit"
        ))),
    }
}

fn random_cells<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<Cell> {
    (0..len).map(|_| Cell::new(rng.gen_bool(0.5))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(rows: usize, cols: usize, live: &[(usize, usize)]) -> Grid {
        let mut grid = Grid::new(rows, cols, Fill::Uniform(false)).unwrap();
        for &(r, c) in live {
            assert!(grid.toggle_cell(r, c));
        }
        grid
    }

    fn live_cells(grid: &Grid) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (r, row) in grid.live_cell_matrix().iter().enumerate() {
            for (c, &alive) in row.iter().enumerate() {
                if alive {
                    out.push((r, c));
                }
            }
        }
        out
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            Grid::new(0, 5, Fill::Uniform(false)),
            Err(ConwayError::InvalidDimensions(_))
        ));
        assert!(matches!(
            Grid::new(5, 0, Fill::Random),
            Err(ConwayError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn rejects_boards_over_the_cell_limit() {
        assert!(matches!(
            Grid::new(100_000, 100_000, Fill::Uniform(false)),
            Err(ConwayError::InvalidDimensions(_))
        ));
        assert!(matches!(
            Grid::new(usize::MAX, 2, Fill::Random),
            Err(ConwayError::InvalidDimensions(_))
        ));
        assert!(Grid::new(1, MAX_CELLS, Fill::Uniform(false)).is_ok());
    }

    #[test]
    fn equality_ignores_staged_state() {
        let blinker = [(2, 1), (2, 2), (2, 3)];
        let fresh = grid_with(5, 5, &blinker);
        let mut stepped = fresh.clone();
        stepped.advance();
        assert_ne!(stepped, fresh);
        stepped.advance();
        assert_eq!(stepped, fresh);

        let mut full = Grid::new(3, 3, Fill::Uniform(true)).unwrap();
        full.advance();
        let corners = grid_with(3, 3, &[(0, 0), (0, 2), (2, 0), (2, 2)]);
        assert_eq!(full, corners);

        let wider = Grid::new(3, 4, Fill::Uniform(false)).unwrap();
        assert_ne!(Grid::new(4, 3, Fill::Uniform(false)).unwrap(), wider);
    }

    #[test]
    fn builds_from_a_pattern_via_into() {
        let pattern: Pattern = "x = 2, y = 2\nbo$o!".parse().unwrap();
        let grid: Grid = pattern.into();
        assert_eq!(live_cells(&grid), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn uniform_fill_sets_every_cell() {
        let grid = Grid::new(3, 4, Fill::Uniform(true)).unwrap();
        assert_eq!(grid.population(), 12);
        assert_eq!(grid.dimensions(), (3, 4));
        assert_eq!(grid.live_cell_matrix(), vec![vec![true; 4]; 3]);
    }

    #[test]
    fn seeded_fill_is_reproducible() {
        let a = Grid::new(20, 20, Fill::Seeded(7)).unwrap();
        let b = Grid::new(20, 20, Fill::Seeded(7)).unwrap();
        assert_eq!(a.live_cell_matrix(), b.live_cell_matrix());
        // 400 fair coin flips landing all one way would mean the seed is ignored
        assert!(a.population() > 0 && a.population() < 400);
    }

    #[test]
    fn pattern_fill_checks_shape() {
        let pattern: Pattern = "x = 3, y = 2\n2o$bo!".parse().unwrap();

        let err = Grid::new(4, 4, Fill::Pattern(pattern.clone())).unwrap_err();
        assert_eq!(
            err,
            ConwayError::DimensionMismatch { rows: 4, cols: 4, pattern_rows: 2, pattern_cols: 3 }
        );

        let grid = Grid::new(2, 3, Fill::Pattern(pattern)).unwrap();
        assert_eq!(live_cells(&grid), vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn neighbours_outside_the_grid_are_dead() {
        let grid = Grid::new(3, 3, Fill::Uniform(true)).unwrap();
        assert_eq!(grid.count_live_neighbors(0, 0), 3);
        assert_eq!(grid.count_live_neighbors(0, 1), 5);
        assert_eq!(grid.count_live_neighbors(1, 1), 8);
        assert_eq!(grid.count_live_neighbors(2, 2), 3);
    }

    #[test]
    fn single_cell_grid_has_no_neighbours() {
        let mut grid = Grid::new(1, 1, Fill::Uniform(true)).unwrap();
        assert_eq!(grid.count_live_neighbors(0, 0), 0);
        grid.advance();
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn block_is_a_still_life() {
        let block = [(1, 1), (1, 2), (2, 1), (2, 2)];
        let mut grid = grid_with(4, 4, &block);
        for _ in 0..3 {
            grid.advance();
            assert_eq!(live_cells(&grid), block.to_vec());
        }
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let horizontal = vec![(2, 1), (2, 2), (2, 3)];
        let vertical = vec![(1, 2), (2, 2), (3, 2)];
        let mut grid = grid_with(5, 5, &horizontal);

        grid.advance();
        assert_eq!(live_cells(&grid), vertical);
        grid.advance();
        assert_eq!(live_cells(&grid), horizontal);
    }

    #[test]
    fn blinker_against_the_edge_is_clipped_not_wrapped() {
        // Vertical phase would need row -1, which does not exist
        let mut grid = grid_with(3, 3, &[(0, 0), (0, 1), (0, 2)]);
        grid.advance();
        assert_eq!(live_cells(&grid), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn glider_moves_one_cell_diagonally_every_four_generations() {
        let glider = [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)];
        let mut grid = grid_with(8, 8, &glider);
        for _ in 0..4 {
            grid.advance();
        }
        let mut expected: Vec<_> = glider.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
        expected.sort();
        assert_eq!(live_cells(&grid), expected);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut grid = Grid::new(6, 7, Fill::Seeded(42)).unwrap();
        grid.reset();
        let once = grid.live_cell_matrix();
        grid.reset();
        assert_eq!(grid.live_cell_matrix(), once);
        assert_eq!(once, vec![vec![false; 7]; 6]);
        assert_eq!(grid.dimensions(), (6, 7));
    }

    #[test]
    fn toggle_rejects_out_of_bounds() {
        let mut grid = Grid::new(2, 2, Fill::Uniform(false)).unwrap();
        assert!(!grid.toggle_cell(2, 0));
        assert!(!grid.toggle_cell(0, 2));
        assert!(grid.toggle_cell(1, 1));
        assert_eq!(grid.get(1, 1), Some(true));
        assert_eq!(grid.get(5, 5), None);
    }

    #[test]
    fn stamp_clears_and_clips() {
        let pattern: Pattern = "x = 3, y = 3\n3o$3o$3o!".parse().unwrap();
        let mut grid = Grid::new(4, 4, Fill::Uniform(true)).unwrap();

        grid.stamp(&pattern, 2, 2);
        assert_eq!(live_cells(&grid), vec![(2, 2), (2, 3), (3, 2), (3, 3)]);
    }
}
