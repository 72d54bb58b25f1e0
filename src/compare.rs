use log::{debug, error};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    state::{GenerationState, StateReader},
    Cell, CellMismatch, HarnessError, MetadataField, Side,
};

/// Outcome of comparing one reference generation with one target generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Match,
    /// The first metadata field, in comparison order, that differs.
    Metadata(MetadataField),
    /// Metadata agrees but cells do not.
    Cells {
        generation: u64,
        differing: u64,
        first: Cell,
    },
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        *self == Self::Match
    }
}

/// Exact comparison: generation, then `xmin`, `ymin`, `width`, `height`,
/// then every cell.
pub fn compare(reference: &GenerationState, target: &GenerationState) -> Comparison {
    let (rb, tb) = (reference.bounds(), target.bounds());
    let fields = [
        (MetadataField::Generation, reference.generation() == target.generation()),
        (MetadataField::XMin, rb.xmin == tb.xmin),
        (MetadataField::YMin, rb.ymin == tb.ymin),
        (MetadataField::Width, rb.width == tb.width),
        (MetadataField::Height, rb.height == tb.height),
    ];
    if let Some(&(field, _)) = fields.iter().find(|(_, equal)| !equal) {
        return Comparison::Metadata(field);
    }

    let mut differing = 0;
    let mut first = None;
    for (i, (r, t)) in reference.cells().iter().zip(target.cells()).enumerate() {
        if r != t {
            differing += 1;
            first.get_or_insert(i);
        }
    }
    match first {
        None => Comparison::Match,
        Some(i) => Comparison::Cells {
            generation: reference.generation(),
            differing,
            first: rb.cell_at(i),
        },
    }
}

/// Side-by-side picture of the cells around `(x, y)`: target on the left,
/// reference on the right, `#` for live cells.
pub fn neighbourhood(
    reference: &GenerationState,
    target: &GenerationState,
    (x, y): Cell,
) -> String {
    const K: i128 = 10;
    let b = reference.bounds();
    let (col, row) = (x as i128 - b.xmin as i128, y as i128 - b.ymin as i128);
    let (c1, c2) = ((col - K).max(0), (col + K).min(b.width as i128));
    let (r1, r2) = ((row - K).max(0), (row + K).min(b.height as i128));

    let draw = |state: &GenerationState, r: i128| {
        let cells = state.row(r as usize);
        cells[c1 as usize..c2 as usize]
            .iter()
            .map(|&c| if c { '#' } else { ' ' })
            .collect::<String>()
    };
    let mut picture = String::new();
    for r in r1..r2 {
        picture.push('|');
        picture.push_str(&draw(target, r));
        picture.push('|');
        picture.push_str(&draw(reference, r));
        picture.push_str("|\n");
    }
    picture
}

/// Deterministic name of the diagnostic dump for `generation`.
pub fn dump_path(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("generation_{generation}.dump"))
}

/// Writes `state` in dense block format to [`dump_path`] under `dir`.
pub fn write_dump(dir: &Path, state: &GenerationState) -> Result<PathBuf, HarnessError> {
    fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;
    let path = dump_path(dir, state.generation());
    let file = File::create(&path).map_err(|e| HarnessError::io(&path, e))?;
    let mut out = BufWriter::new(file);
    state
        .write_dense(&mut out)
        .and_then(|()| out.flush())
        .map_err(|e| HarnessError::io(&path, e))?;
    Ok(path)
}

/// What a successful stream comparison covered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Generation indices, in stream order.
    pub generations: Vec<u64>,
}

/// Compares two output streams generation by generation until both are
/// exhausted.
///
/// Stops at the first disagreement. On a cell mismatch the target grid is
/// dumped into `dump_dir`, if given.
pub fn compare_streams(
    reference: &mut impl StateReader,
    target: &mut impl StateReader,
    dump_dir: Option<&Path>,
) -> Result<StreamSummary, HarnessError> {
    let mut summary = StreamSummary::default();
    loop {
        let ref_state = reference
            .read_next()
            .map_err(|source| HarnessError::Parse {
                side: Side::Reference,
                source,
            })?;
        let target_state = target.read_next().map_err(|source| HarnessError::Parse {
            side: Side::Target,
            source,
        })?;

        let (ref_state, target_state) = match (ref_state, target_state) {
            (None, None) => return Ok(summary),
            (None, Some(_)) => {
                return Err(HarnessError::Desync {
                    exhausted: Side::Reference,
                    compared: summary.generations.len() as u64,
                })
            }
            (Some(_), None) => {
                return Err(HarnessError::Desync {
                    exhausted: Side::Target,
                    compared: summary.generations.len() as u64,
                })
            }
            (Some(r), Some(t)) => (r, t),
        };

        match compare(&ref_state, &target_state) {
            Comparison::Match => {
                debug!(
                    "generation {} matches ({} live cells in {})",
                    ref_state.generation(),
                    ref_state.population(),
                    ref_state.bounds()
                );
                summary.generations.push(ref_state.generation());
            }
            Comparison::Metadata(field) => {
                return Err(HarnessError::MetadataMismatch {
                    field,
                    reference: Box::new(ref_state),
                    target: Box::new(target_state),
                })
            }
            Comparison::Cells {
                generation,
                differing,
                first,
            } => {
                let dump = match dump_dir {
                    Some(dir) => Some(write_dump(dir, &target_state)?),
                    None => None,
                };
                if let Some(path) = &dump {
                    error!("target grid of generation {generation} dumped to {}", path.display());
                }
                return Err(HarnessError::CellMismatch(Box::new(CellMismatch {
                    generation,
                    differing,
                    first,
                    picture: neighbourhood(&ref_state, &target_state, first),
                    dump,
                })));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BoundingBox, DenseReader, SparseReader};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const SEED: u64 = 42;

    fn random_state(rng: &mut impl Rng, generation: u64, bounds: BoundingBox) -> GenerationState {
        let mut state = GenerationState::blank(generation, bounds).unwrap();
        for y in 0..bounds.height as i64 {
            for x in 0..bounds.width as i64 {
                state.set(bounds.xmin + x, bounds.ymin + y, rng.gen_bool(0.4));
            }
        }
        state
    }

    #[test]
    fn test_compare_with_itself() {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        for generation in 0..20 {
            let state = random_state(&mut rng, generation, BoundingBox::new(-7, 3, 13, 9));
            assert!(compare(&state, &state.clone()).is_match());
        }
    }

    #[test]
    fn test_single_flip_detected() {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let bounds = BoundingBox::new(100, -100, 16, 16);
        for _ in 0..50 {
            let reference = random_state(&mut rng, 12, bounds);
            let (x, y) = (100 + rng.gen_range(0..16), -100 + rng.gen_range(0..16));
            let mut target = reference.clone();
            target.set(x, y, !reference.get(x, y));

            let expected = Comparison::Cells {
                generation: 12,
                differing: 1,
                first: (x, y),
            };
            assert_eq!(compare(&reference, &target), expected);
            assert_eq!(compare(&target, &reference), expected);
        }
    }

    #[test]
    fn test_mismatch_at_plane_edge() {
        let dense = b"(9223372036854775806,0,2,1)\n0\n0,0\n";
        let sparse = b"(9223372036854775806,0,2,1)\n0\n1\n(9223372036854775807,0,1,1)\n1\n";
        let err = compare_streams(
            &mut DenseReader::new(&dense[..]),
            &mut SparseReader::new(&sparse[..]),
            None,
        )
        .unwrap_err();
        let HarnessError::CellMismatch(mismatch) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(mismatch.first, (i64::MAX, 0));
        assert_eq!(mismatch.differing, 1);

        let dense = b"(9223372036854775807,0,2,1)\n0\n0,0\n";
        let sparse = b"(9223372036854775807,0,2,1)\n0\n1\n(9223372036854775807,0,1,1)\n1\n";
        let err = compare_streams(
            &mut DenseReader::new(&dense[..]),
            &mut SparseReader::new(&sparse[..]),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Parse {
                side: Side::Reference,
                ..
            }
        ));
    }

    #[test]
    fn test_metadata_order() {
        let a = GenerationState::blank(1, BoundingBox::new(0, 0, 2, 2)).unwrap();
        let b = GenerationState::blank(2, BoundingBox::new(1, 0, 2, 2)).unwrap();
        assert_eq!(compare(&a, &b), Comparison::Metadata(MetadataField::Generation));
        let c = GenerationState::blank(1, BoundingBox::new(1, 5, 2, 2)).unwrap();
        assert_eq!(compare(&a, &c), Comparison::Metadata(MetadataField::XMin));
        let d = GenerationState::blank(1, BoundingBox::new(0, 0, 2, 3)).unwrap();
        assert_eq!(compare(&a, &d), Comparison::Metadata(MetadataField::Height));
    }

    #[test]
    fn test_neighbourhood_picture() {
        let bounds = BoundingBox::new(0, 0, 3, 1);
        let mut reference = GenerationState::blank(0, bounds).unwrap();
        reference.set(0, 0, true);
        let target = GenerationState::blank(0, bounds).unwrap();
        assert_eq!(neighbourhood(&reference, &target, (0, 0)), "|   |#  |\n");
    }

    #[test]
    fn test_streams_equal() {
        let dense = b"(0,0,3,1)\n0\n1,1,1\n(1,-1,1,3)\n1\n1\n1\n1\n";
        let sparse = b"(0,0,3,1)\n0\n1\n(0,0,3,1)\n1,1,1\n(1,-1,1,3)\n1\n1\n(1,-1,1,3)\n1\n1\n1\n";
        let summary = compare_streams(
            &mut DenseReader::new(&dense[..]),
            &mut SparseReader::new(&sparse[..]),
            None,
        )
        .unwrap();
        assert_eq!(summary.generations, vec![0, 1]);
    }

    #[test]
    fn test_stream_desync() {
        let block = "(0,0,1,1)\n0\n1\n";
        let sparse_block = "(0,0,1,1)\n0\n1\n(0,0,1,1)\n1\n";
        let result = compare_streams(
            &mut DenseReader::new(block.as_bytes()),
            &mut SparseReader::new(format!("{sparse_block}{sparse_block}").as_bytes()),
            None,
        );
        assert!(matches!(
            result,
            Err(HarnessError::Desync {
                exhausted: Side::Reference,
                compared: 1
            })
        ));
        let result = compare_streams(
            &mut DenseReader::new(block.as_bytes()),
            &mut SparseReader::new(&b""[..]),
            None,
        );
        assert!(matches!(
            result,
            Err(HarnessError::Desync {
                exhausted: Side::Target,
                compared: 0
            })
        ));
    }

    #[test]
    fn test_parse_error_names_side() {
        let result = compare_streams(
            &mut DenseReader::new(&b"(0,0,1,1)\n0\n1\n"[..]),
            &mut SparseReader::new(&b"(0,0,1,1)\n0\n"[..]),
            None,
        );
        assert!(matches!(
            result,
            Err(HarnessError::Parse {
                side: Side::Target,
                ..
            })
        ));
    }

    #[test]
    fn test_cell_mismatch_dumps_target() {
        let dir = tempfile::tempdir().unwrap();
        let dense = b"(0,0,2,1)\n4\n1,0\n";
        let sparse = b"(0,0,2,1)\n4\n1\n(1,0,1,1)\n1\n";
        let err = compare_streams(
            &mut DenseReader::new(&dense[..]),
            &mut SparseReader::new(&sparse[..]),
            Some(dir.path()),
        )
        .unwrap_err();
        let HarnessError::CellMismatch(mismatch) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(mismatch.generation, 4);
        assert_eq!(mismatch.differing, 2);
        assert_eq!(mismatch.first, (0, 0));

        let path = mismatch.dump.clone().unwrap();
        assert_eq!(path, dir.path().join("generation_4.dump"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "(0,0,2,1)\n4\n0,1\n");

        let reloaded = DenseReader::new(fs::read(&path).unwrap().as_slice())
            .read_next()
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.live_cells(), vec![(1, 0)]);
    }

    #[test]
    fn test_metadata_mismatch_carries_both_states() {
        let err = compare_streams(
            &mut DenseReader::new(&b"(0,0,1,1)\n0\n1\n"[..]),
            &mut SparseReader::new(&b"(0,0,1,1)\n1\n0\n"[..]),
            None,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("mismatch at key generation"), "{message}");
        assert!(message.contains("(0,0,1,1)\n1\n0\n"), "{message}");
    }
}
