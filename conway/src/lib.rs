// lib.rs - Conway's Game of Life automaton and RLE pattern decoder
//
// Bounded B3/S23 grid with a double-buffered two-phase update, plus a
// decoder that turns RLE text into an exact rows x cols seed matrix.

mod cell;      // Cell with staged next state
mod error;     // Shared error kinds
pub mod grid;      // Automaton engine
pub mod patterns;  // RLE decoder and built-in patterns

pub use error::{ConwayError, Result};
pub use grid::{Fill, Grid, MAX_CELLS, TMatrix, TRow};
pub use patterns::{NamedPattern, Pattern, PATTERNS, builtin, decode};
