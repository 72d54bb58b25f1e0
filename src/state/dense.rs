use super::{lines::LineSource, GenerationState, StateReader};
use crate::ParseError;
use std::io::BufRead;

/// Reads the reference simulator's output: a bounding box, the generation
/// index and `height` rows of `width` comma-separated cells per block.
pub struct DenseReader<R> {
    lines: LineSource<R>,
}

impl<R: BufRead> DenseReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: LineSource::new(input),
        }
    }
}

impl<R: BufRead> StateReader for DenseReader<R> {
    fn read_next(&mut self) -> Result<Option<GenerationState>, ParseError> {
        let Some(bounds) = self.lines.next_header()? else {
            return Ok(None);
        };
        let generation = self.lines.expect_count("generation")?;
        let mut state =
            GenerationState::blank(generation, bounds).map_err(|kind| self.lines.error(kind))?;
        for row in 0..bounds.height as usize {
            self.lines.expect_row(state.row_mut(row))?;
        }
        Ok(Some(state))
    }
}
