use super::{lines::LineSource, GenerationState, StateReader};
use crate::{ParseError, ParseErrorKind};
use std::io::BufRead;

/// Reads the target simulator's output and stitches its subgrids into one
/// dense grid covering the block's bounding box.
///
/// Each block is the bounding box, the generation index, the number of
/// subgrids, then per subgrid its own bounding box and `height` rows.
/// Subgrids are written in order, so where two overlap the later one wins.
pub struct SparseReader<R> {
    lines: LineSource<R>,
}

impl<R: BufRead> SparseReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: LineSource::new(input),
        }
    }
}

impl<R: BufRead> StateReader for SparseReader<R> {
    fn read_next(&mut self) -> Result<Option<GenerationState>, ParseError> {
        let Some(bounds) = self.lines.next_header()? else {
            return Ok(None);
        };
        let generation = self.lines.expect_count("generation")?;
        let mut state =
            GenerationState::blank(generation, bounds).map_err(|kind| self.lines.error(kind))?;

        let subgrids = self.lines.expect_count("subgrid count")?;
        for _ in 0..subgrids {
            let sub = self.lines.expect_header()?;
            if !bounds.contains(&sub) {
                return Err(self.lines.error(ParseErrorKind::SubgridOutOfBounds {
                    xmin: sub.xmin,
                    ymin: sub.ymin,
                    width: sub.width,
                    height: sub.height,
                }));
            }
            // in range: `sub` lies inside `bounds`, whose grid fits in memory
            let col = (sub.xmin as i128 - bounds.xmin as i128) as usize;
            let row = (sub.ymin as i128 - bounds.ymin as i128) as usize;
            let width = sub.width as usize;
            for j in 0..sub.height as usize {
                self.lines
                    .expect_row(&mut state.row_mut(row + j)[col..col + width])?;
            }
        }
        Ok(Some(state))
    }
}
