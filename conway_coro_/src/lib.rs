// lib.rs - Async runner for Conway's Game of Life
//
// A tokio task steps the grid at a fixed interval and reports each
// generation to an observer; `GameOfLife` wraps it for synchronous callers.

pub mod config;  // Board size, seeding and speed
pub mod driver;  // Background stepping task
pub mod game;    // Grid ownership and start/stop handoff
pub mod ui;      // Text rendering

pub use config::GameConfig;
pub use driver::{Frame, Simulation};
pub use game::{GameError, GameOfLife};
