// patterns.rs - RLE pattern decoding and the built-in pattern library
//
// Accepted text:
//
//   #N Glider                   <- any line starting with '#' is a comment
//   x = 3, y = 3, rule = B3/S23 <- header, rule clause optional and ignored
//   bo$2bo$3o!                  <- body, may span several lines
//
// In the body a decimal count prefixes a tag: 'o' alive, 'b' (or any other
// cell tag) dead, '$' end of row. A missing count means 1. '!' ends the body.

use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ConwayError, Result};
use crate::grid::{TMatrix, TRow, checked_len};

const ALIVE: char = 'o';
const DEAD: char = 'b';
const ROW_BREAK: char = '$';
const END: char = '!';
const COMMENT: char = '#';

const X_KEY: &str = "x = ";
const Y_KEY: &str = ", y = ";

/// A decoded pattern: exactly `rows` rows of exactly `cols` cells each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    rows: usize,
    cols: usize,
    cells: TMatrix,
}

impl Pattern {
    /// Decode RLE text given as a sequence of lines.
    pub fn decode<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        decode(lines)
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

    pub fn cells(&self) -> &TMatrix {
        &self.cells
    }

    pub fn into_matrix(self) -> TMatrix {
        self.cells
    }

    pub fn population(&self) -> usize {
        self.cells.iter().flatten().filter(|&&alive| alive).count()
    }
}

impl FromStr for Pattern {
    type Err = ConwayError;

    fn from_str(text: &str) -> Result<Self> {
        decode(text.lines())
    }
}

/// Decode RLE text into a [`Pattern`].
///
/// Fails with `MalformedHeader` when there is no usable header line or no
/// body, and with `InvalidDimensions` when `x`/`y` are unparsable or below 1.
pub fn decode<I, S>(lines: I) -> Result<Pattern>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = lines.into_iter().filter(|line| {
        let line: &str = line.as_ref();
        !line.starts_with(COMMENT) && !line.trim().is_empty()
    });

    let header = lines
        .next()
        .ok_or_else(|| ConwayError::malformed_header("no header line found"))?;
    let (rows, cols) = parse_header(header.as_ref())?;

    // Line breaks carry no meaning in the body; only '$' ends a row
    let mut body = String::new();
    for line in lines {
        let line: &str = line.as_ref();
        body.extend(line.chars().filter(|ch| !ch.is_whitespace()));
    }
    if body.is_empty() {
        return Err(ConwayError::malformed_header("pattern body is empty"));
    }

    // A body of nothing but '$'/'!' is still valid, it just has nothing to count
    if body.contains(|ch: char| ch == ALIVE || ch == DEAD) {
        body = normalize_counts(&body);
    }

    let cells = run_length_decode(&body, rows, cols);
    let pattern = Pattern { rows, cols, cells };

    debug!(rows, cols, population = pattern.population(), "pattern decoded");
    Ok(pattern)
}

/// Parse `x = <cols>, y = <rows>[, rule = ...]` into `(rows, cols)`.
fn parse_header(line: &str) -> Result<(usize, usize)> {
    let (Some(x_at), Some(y_at)) = (line.find(X_KEY), line.find(Y_KEY)) else {
        return Err(ConwayError::malformed_header(format!(
            "expected `x = <cols>, y = <rows>`, found {line:?}"
        )));
    };

    let cols = parse_dimension("x", up_to_comma(&line[x_at + X_KEY.len()..]))?;
    let rows = parse_dimension("y", up_to_comma(&line[y_at + Y_KEY.len()..]))?;

    // Same cap as a grid, checked before anything is allocated
    checked_len(rows, cols)?;
    Ok((rows, cols))
}

fn up_to_comma(text: &str) -> &str {
    text.split_once(',').map_or(text, |(value, _)| value)
}

fn parse_dimension(key: &str, text: &str) -> Result<usize> {
    let value: i64 = text.trim().parse().map_err(|_| {
        ConwayError::invalid_dimensions(format!("{key} = {:?} is not an integer", text.trim()))
    })?;
    if value < 1 {
        return Err(ConwayError::invalid_dimensions(format!(
            "{key} = {value} must be at least 1"
        )));
    }
    usize::try_from(value)
        .map_err(|_| ConwayError::invalid_dimensions(format!("{key} = {value} is too large")))
}

/// Cell tags and row breaks all take a run count; digits and '!' do not.
fn takes_count(ch: char) -> bool {
    ch != END && !ch.is_ascii_digit()
}

/// Give every tag that has no count in front of it an explicit `1`.
///
/// `bo$2bo$3o!` becomes `1b1o1$2b1o1$3o!`; input that already spells out
/// every count comes back unchanged.
pub(crate) fn normalize_counts(body: &str) -> String {
    let mut out = String::with_capacity(body.len() * 2);
    let mut after_digit = false;

    for ch in body.chars() {
        if takes_count(ch) && !after_digit {
            out.push('1');
        }
        after_digit = ch.is_ascii_digit();
        out.push(ch);
    }
    out
}

/// Expand the run-length body into exactly `rows x cols` cells.
///
/// Content beyond the declared size is dropped with a warning; anything
/// short of it is padded with dead cells.
fn run_length_decode(body: &str, rows: usize, cols: usize) -> TMatrix {
    let mut decoded: TMatrix = Vec::new();
    let mut row = TRow::new();
    let mut count: Option<usize> = None;
    let mut clipped = false;

    for ch in body.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let acc = count.unwrap_or(0);
            count = Some(acc.saturating_mul(10).saturating_add(digit as usize));
            continue;
        }

        let run = count.take().unwrap_or(1);
        match ch {
            ROW_BREAK => {
                clipped |= close_row(&mut decoded, std::mem::take(&mut row), rows);
                let blanks = run.saturating_sub(1).min(rows.saturating_sub(decoded.len()));
                decoded.extend(std::iter::repeat_with(TRow::new).take(blanks));
            }
            END => {
                if !row.is_empty() {
                    clipped |= close_row(&mut decoded, std::mem::take(&mut row), rows);
                }
                break;
            }
            tag => {
                let room = cols - row.len();
                if run > room && tag == ALIVE {
                    clipped = true;
                }
                row.extend(std::iter::repeat(tag == ALIVE).take(run.min(room)));
            }
        }
    }

    // Bodies missing the final '!' keep their last row
    if !row.is_empty() {
        clipped |= close_row(&mut decoded, row, rows);
    }

    if clipped {
        warn!(rows, cols, "pattern body exceeds declared size, extra cells dropped");
    }

    for row in decoded.iter_mut() {
        row.resize(cols, false);
    }
    decoded.resize_with(rows, || vec![false; cols]);
    decoded
}

/// Append a finished row unless the declared height is already reached.
/// Returns `true` when live cells had to be dropped.
fn close_row(decoded: &mut TMatrix, row: TRow, rows: usize) -> bool {
    if decoded.len() < rows {
        decoded.push(row);
        false
    } else {
        row.contains(&true)
    }
}

/// A pattern shipped with the crate, stored as RLE text.
#[derive(Debug, Clone, Copy)]
pub struct NamedPattern {
    pub name: &'static str,
    pub rle: &'static str,
}

impl NamedPattern {
    pub fn decode(&self) -> Result<Pattern> {
        self.rle.parse()
    }
}

pub const PATTERNS: &[NamedPattern] = &[
    NamedPattern {
        name: "Glider",
        rle: "#N Glider\nx = 3, y = 3, rule = B3/S23\nbo$2bo$3o!",
    },
    NamedPattern {
        name: "Blinker",
        rle: "#N Blinker\nx = 3, y = 1, rule = B3/S23\n3o!",
    },
    NamedPattern {
        name: "Block",
        rle: "#N Block\nx = 2, y = 2, rule = B3/S23\n2o$2o!",
    },
    NamedPattern {
        name: "Toad",
        rle: "#N Toad\nx = 4, y = 2, rule = B3/S23\nb3o$3o!",
    },
    NamedPattern {
        name: "Beacon",
        rle: "#N Beacon\nx = 4, y = 4, rule = B3/S23\n2o$2o$2b2o$2b2o!",
    },
    NamedPattern {
        name: "Pulsar",
        rle: "#N Pulsar\nx = 13, y = 13, rule = B3/S23\n\
              2b3o3b3o2$o4bobo4bo$o4bobo4bo$o4bobo4bo$2b3o3b3o2$2b3o3b3o$\n\
              o4bobo4bo$o4bobo4bo$o4bobo4bo2$2b3o3b3o!",
    },
    NamedPattern {
        name: "R-pentomino",
        rle: "#N R-pentomino\nx = 3, y = 3, rule = B3/S23\nb2o$2o$bo!",
    },
    NamedPattern {
        name: "Gosper Glider Gun",
        rle: "#N Gosper glider gun\nx = 36, y = 9, rule = B3/S23\n\
              24bo$22bobo$12b2o6b2o12b2o$11bo3bo4b2o12b2o$2o8bo5bo3b2o$\n\
              2o8bo3bob2o4bobo$10bo5bo7bo$11bo3bo$12b2o!",
    },
];

/// Look up a built-in pattern by name, ignoring case and punctuation
/// (`"gosper-glider-gun"` finds "Gosper Glider Gun").
pub fn builtin(name: &str) -> Option<&'static NamedPattern> {
    let wanted = fold_name(name);
    PATTERNS.iter().find(|pattern| fold_name(pattern.name) == wanted)
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
