mod catalog;
mod rotate;

pub use catalog::Catalog;

use crate::HarnessError;

/// Absolute or relative `(x, y)` position of a cell on the plane.
pub type Cell = (i64, i64);

/// A set of live-cell offsets relative to an implicit local origin.
///
/// Order is irrelevant and duplicates are harmless: the cells denote
/// their union.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    cells: Vec<Cell>,
}

impl Pattern {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Inclusive `(min, max)` corners of the pattern, `None` for an empty pattern.
    pub fn bounds(&self) -> Option<(Cell, Cell)> {
        let (&(x, y), rest) = self.cells.split_first()?;
        Some(rest.iter().fold(((x, y), (x, y)), |((x0, y0), (x1, y1)), &(x, y)| {
            ((x0.min(x), y0.min(y)), (x1.max(x), y1.max(y)))
        }))
    }

    /// Sorted, deduplicated copy shifted so that its minimum corner is `(0, 0)`.
    ///
    /// Two patterns are congruent under translation iff their normal forms are equal.
    pub fn normalized(&self) -> Self {
        let Some(((x0, y0), _)) = self.bounds() else {
            return Self::new(vec![]);
        };
        let mut cells = self
            .cells
            .iter()
            .map(|&(x, y)| (x - x0, y - y0))
            .collect::<Vec<_>>();
        cells.sort_unstable();
        cells.dedup();
        Self::new(cells)
    }

    /// Adds `(dx, dy)` to every offset.
    pub fn translate(&self, dx: i64, dy: i64) -> Result<Vec<Cell>, HarnessError> {
        self.cells
            .iter()
            .map(|&(x, y)| match (x.checked_add(dx), y.checked_add(dy)) {
                (Some(x), Some(y)) => Ok((x, y)),
                _ => Err(HarnessError::CoordinateOverflow { x: dx, y: dy }),
            })
            .collect()
    }
}

/// A catalog pattern with a rotation and a translation.
///
/// Rotation is applied first, then the renormalized result is
/// translated by `(x, y)`.
#[derive(Clone, Debug)]
pub struct PlacedPrimitive<'a> {
    pub name: &'a str,
    pub pattern: &'a Pattern,
    pub rotations: u32,
    pub x: i64,
    pub y: i64,
}

impl PlacedPrimitive<'_> {
    /// Absolute coordinates of the placed primitive's live cells.
    pub fn cells(&self) -> Result<Vec<Cell>, HarnessError> {
        self.pattern
            .rotate(self.rotations)?
            .translate(self.x, self.y)
    }
}
