use super::{Cell, Pattern};
use crate::{state::MAX_GRID_CELLS, HarnessError};

impl Pattern {
    /// Rotates the pattern counter-clockwise by `rotations` quarter turns.
    ///
    /// The rotated pattern is renormalized so that its bounding box starts
    /// at `(0, 0)`. Any `rotations` divisible by 4 returns the pattern
    /// unchanged, without renormalization. Fails if the bounding box is too
    /// large to hold as a matrix.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is empty and `rotations % 4 != 0`.
    pub fn rotate(&self, rotations: u32) -> Result<Pattern, HarnessError> {
        let turns = rotations % 4;
        if turns == 0 {
            return Ok(self.clone());
        }
        let Some(((x0, y0), _)) = self.bounds() else {
            panic!("an empty pattern has no bounding box to rotate");
        };

        let (mut rows, mut cols) = self.matrix_shape()?;
        let mut matrix = vec![false; rows * cols];
        for &(x, y) in &self.cells {
            matrix[y.abs_diff(y0) as usize * cols + x.abs_diff(x0) as usize] = true;
        }
        for _ in 0..turns {
            matrix = rotate_matrix(&matrix, rows, cols);
            (rows, cols) = (cols, rows);
        }

        let cells = matrix
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| ((i % cols) as i64, (i / cols) as i64))
            .collect::<Vec<Cell>>();
        Ok(Pattern::new(cells))
    }

    /// `(rows, cols)` of the bounding box, if it fits in a grid of at most
    /// `MAX_GRID_CELLS` cells.
    fn matrix_shape(&self) -> Result<(usize, usize), HarnessError> {
        let ((x0, y0), (x1, y1)) = self.bounds().unwrap_or_default();
        let width = x1.abs_diff(x0).saturating_add(1);
        let height = y1.abs_diff(y0).saturating_add(1);
        match width.checked_mul(height) {
            Some(n) if n <= MAX_GRID_CELLS => Ok((height as usize, width as usize)),
            _ => Err(HarnessError::InvalidConfig(format!(
                "pattern spans {width}x{height} cells, too large to rotate"
            ))),
        }
    }
}

/// One counter-clockwise quarter turn of a row-major `rows x cols` matrix.
///
/// The result is `cols x rows`, its first row being the last column of the input.
fn rotate_matrix(src: &[bool], rows: usize, cols: usize) -> Vec<bool> {
    let mut dst = vec![false; rows * cols];
    for i in 0..cols {
        for j in 0..rows {
            dst[i * rows + j] = src[j * cols + (cols - 1 - i)];
        }
    }
    dst
}
