mod dense;
mod lines;
mod sparse;

pub use dense::DenseReader;
pub use sparse::SparseReader;

use crate::{Cell, ParseError, ParseErrorKind};
use std::{fmt, io};

/// Upper bound on `width * height` of a single generation grid.
pub const MAX_GRID_CELLS: u64 = 1 << 32;

/// Axis-aligned rectangle `[xmin, xmin + width) x [ymin, ymin + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub width: u64,
    pub height: u64,
}

impl BoundingBox {
    pub fn new(xmin: i64, ymin: i64, width: u64, height: u64) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
        }
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let (x0, y0) = (self.xmin as i128, self.ymin as i128);
        let (x1, y1) = (x0 + self.width as i128, y0 + self.height as i128);
        let (ox0, oy0) = (other.xmin as i128, other.ymin as i128);
        let (ox1, oy1) = (ox0 + other.width as i128, oy0 + other.height as i128);
        x0 <= ox0 && ox1 <= x1 && y0 <= oy0 && oy1 <= y1
    }

    /// Whether every cell of the box has an `i64` coordinate.
    pub fn fits_plane(&self) -> bool {
        let end = i64::MAX as i128 + 1;
        self.xmin as i128 + self.width as i128 <= end
            && self.ymin as i128 + self.height as i128 <= end
    }

    pub(crate) fn off_plane(&self) -> ParseErrorKind {
        ParseErrorKind::OffPlane {
            xmin: self.xmin,
            ymin: self.ymin,
            width: self.width,
            height: self.height,
        }
    }

    /// Absolute coordinate of the cell at `(col, row)` within the box.
    fn absolute(&self, col: usize, row: usize) -> Cell {
        // exact whenever the box fits the plane
        (
            (self.xmin as i128 + col as i128) as i64,
            (self.ymin as i128 + row as i128) as i64,
        )
    }

    /// Absolute coordinate of the `i`-th cell in row-major order.
    pub fn cell_at(&self, i: usize) -> Cell {
        let w = (self.width as usize).max(1);
        self.absolute(i % w, i / w)
    }

    /// `(row, col)` of an absolute coordinate, if it is inside the box.
    fn local(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        let col = x as i128 - self.xmin as i128;
        let row = y as i128 - self.ymin as i128;
        if (0..self.width as i128).contains(&col) && (0..self.height as i128).contains(&row) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.xmin, self.ymin, self.width, self.height
        )
    }
}

/// Dense snapshot of one generation, the unit of comparison.
///
/// `cells` is row-major with `bounds.width * bounds.height` entries; row 0
/// is `y = ymin`. Everything outside the bounding box is dead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationState {
    generation: u64,
    bounds: BoundingBox,
    cells: Vec<bool>,
}

impl GenerationState {
    /// An all-dead grid of the given shape. The box must fit the `i64` plane.
    pub fn blank(generation: u64, bounds: BoundingBox) -> Result<Self, ParseErrorKind> {
        if !bounds.fits_plane() {
            return Err(bounds.off_plane());
        }
        let too_large = ParseErrorKind::GridTooLarge {
            width: bounds.width,
            height: bounds.height,
        };
        let n = match bounds.width.checked_mul(bounds.height) {
            Some(n) if n <= MAX_GRID_CELLS => n,
            _ => return Err(too_large),
        };
        let n = usize::try_from(n).map_err(|_| too_large)?;
        Ok(Self {
            generation,
            bounds,
            cells: vec![false; n],
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Row-major cells.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[bool] {
        let w = self.bounds.width as usize;
        &self.cells[row * w..(row + 1) * w]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [bool] {
        let w = self.bounds.width as usize;
        &mut self.cells[row * w..(row + 1) * w]
    }

    /// State of the cell at absolute `(x, y)`.
    pub fn get(&self, x: i64, y: i64) -> bool {
        self.bounds
            .local(x, y)
            .is_some_and(|(r, c)| self.cells[r * self.bounds.width as usize + c])
    }

    /// Sets the cell at absolute `(x, y)`; returns `false` if it lies outside the box.
    pub fn set(&mut self, x: i64, y: i64, alive: bool) -> bool {
        match self.bounds.local(x, y) {
            Some((r, c)) => {
                self.cells[r * self.bounds.width as usize + c] = alive;
                true
            }
            None => false,
        }
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Absolute coordinates of live cells in row-major order.
    pub fn live_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| self.bounds.cell_at(i))
            .collect()
    }

    /// Writes the state in the reference simulator's dense block format.
    pub fn write_dense(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "{}\n{}", self.bounds, self.generation)?;
        for r in 0..self.bounds.height as usize {
            write_row(out, self.row(r).iter().copied())?;
        }
        Ok(())
    }

    /// Writes the state in the target simulator's subgrid block format, one
    /// subgrid per entry of `tiles`.
    pub fn write_sparse(&self, out: &mut impl io::Write, tiles: &[BoundingBox]) -> io::Result<()> {
        writeln!(out, "{}\n{}\n{}", self.bounds, self.generation, tiles.len())?;
        for tile in tiles {
            if !self.bounds.contains(tile) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("subgrid {tile} lies outside {}", self.bounds),
                ));
            }
            writeln!(out, "{tile}")?;
            for dy in 0..tile.height as usize {
                let y = tile.absolute(0, dy).1;
                write_row(
                    out,
                    (0..tile.width as usize).map(|dx| self.get(tile.absolute(dx, dy).0, y)),
                )?;
            }
        }
        Ok(())
    }
}

fn write_row(out: &mut impl io::Write, row: impl Iterator<Item = bool>) -> io::Result<()> {
    let line = row
        .map(|alive| if alive { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = vec![];
        self.write_dense(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// A stream of generation states in one of the simulator output formats.
pub trait StateReader {
    /// Reads the next generation, `Ok(None)` once the stream is exhausted.
    fn read_next(&mut self) -> Result<Option<GenerationState>, ParseError>;
}
