// ui.rs - Plain-text rendering of generations for terminal output

use std::fmt::Write;

use conway::TMatrix;

pub const LIVE_GLYPH: char = 'o';
pub const DEAD_GLYPH: char = '.';

/// One line per row, `o` for live cells and `.` for dead ones.
pub fn render(cells: &TMatrix) -> String {
    let mut out = String::new();
    for row in cells {
        out.extend(row.iter().map(|&alive| if alive { LIVE_GLYPH } else { DEAD_GLYPH }));
        out.push('\n');
    }
    out
}

/// Generation header, the board, and population statistics.
pub fn render_frame(generation: u64, cells: &TMatrix) -> String {
    let total: usize = cells.iter().map(Vec::len).sum();
    let live = cells.iter().flatten().filter(|&&alive| alive).count();
    let share = if total == 0 { 0.0 } else { live as f64 / total as f64 * 100.0 };

    let mut out = format!("Generation: {generation}\n");
    out.push_str(&render(cells));
    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "Live cells: {live}  Dead cells: {}  Population: {share:.1}%",
        total - live
    );
    out
}
