mod compare;
mod error;
mod pattern;
mod runner;
mod scenario;
mod suite;
mod utils;

pub mod state;

pub use compare::{
    compare, compare_streams, dump_path, neighbourhood, write_dump, Comparison, StreamSummary,
};
pub use error::{
    CellMismatch, HarnessError, MetadataField, ParseError, ParseErrorKind, Side, TrialFailure,
};
pub use pattern::{Catalog, Cell, Pattern, PlacedPrimitive};
pub use runner::{run_pair, Simulator};
pub use scenario::{CellFormat, Scenario, ScenarioGenerator};
pub use state::{BoundingBox, DenseReader, GenerationState, SparseReader, StateReader};
pub use suite::{compare_outputs, trial_dir, TestSuite, TrialReport};
pub use utils::{GeneratorConfig, SuiteConfig};
