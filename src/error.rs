use crate::state::GenerationState;
use std::{fmt, io, path::PathBuf, time::Duration};
use thiserror::Error;

/// Which of the two simulators a piece of data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Reference,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Target => write!(f, "test target"),
        }
    }
}

/// A malformed line in one of the simulator output formats.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number in the stream.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("expected `(xmin,ymin,width,height)`, got {0:?}")]
    BadHeader(String),
    #[error("expected `x,y` or `(x,y)`, got {0:?}")]
    BadCoordinate(String),
    #[error("expected an integer, got {0:?}")]
    BadInteger(String),
    #[error("negative {what}: {value}")]
    Negative { what: &'static str, value: i64 },
    #[error("cell value must be 0 or 1, got {0:?}")]
    BadCell(String),
    #[error("row has {found} cells, expected {expected}")]
    RowLength { expected: u64, found: u64 },
    #[error("box ({xmin},{ymin},{width},{height}) extends past the i64 plane")]
    OffPlane {
        xmin: i64,
        ymin: i64,
        width: u64,
        height: u64,
    },
    #[error("grid of {width}x{height} cells is too large")]
    GridTooLarge { width: u64, height: u64 },
    #[error("subgrid ({xmin},{ymin},{width},{height}) lies outside the bounding box")]
    SubgridOutOfBounds {
        xmin: i64,
        ymin: i64,
        width: u64,
        height: u64,
    },
    #[error("stream ended in the middle of a generation block")]
    UnexpectedEof,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Names the metadata field on which two states disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataField {
    Generation,
    XMin,
    YMin,
    Width,
    Height,
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generation => "generation",
            Self::XMin => "xmin",
            Self::YMin => "ymin",
            Self::Width => "width",
            Self::Height => "height",
        };
        f.write_str(name)
    }
}

/// Details of a generation whose metadata matched but whose cells did not.
#[derive(Debug)]
pub struct CellMismatch {
    pub generation: u64,
    /// Number of cells that differ.
    pub differing: u64,
    /// Absolute coordinate of the first differing cell in row-major order.
    pub first: (i64, i64),
    /// Neighbourhood of `first`, target on the left and reference on the right.
    pub picture: String,
    /// Where the target grid was dumped, if it was.
    pub dump: Option<PathBuf>,
}

impl fmt::Display for CellMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mismatch in state representation, check generation {}: {} differing cells, first at ({}, {})",
            self.generation, self.differing, self.first.0, self.first.1
        )?;
        if let Some(path) = &self.dump {
            write!(f, "; target grid dumped to {}", path.display())?;
        }
        write!(f, "\n{}", self.picture)
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid primitive: {name} (available: {available})")]
    UnknownPrimitive { name: String, available: String },
    #[error("executable not found: {0}")]
    MissingExecutable(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("coordinate overflow while placing a pattern at ({x}, {y})")]
    CoordinateOverflow { x: i64, y: i64 },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch {side} executable {path}: {source}")]
    Spawn {
        side: Side,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("simulators did not finish within {0:?}")]
    Timeout(Duration),
    #[error("missing output: {}", describe_missing(.0))]
    MissingOutput(Vec<(Side, PathBuf)>),
    #[error("malformed {side} output, {source}")]
    Parse {
        side: Side,
        #[source]
        source: ParseError,
    },
    #[error("{exhausted} state ran out of lines after {compared} generations")]
    Desync { exhausted: Side, compared: u64 },
    #[error("mismatch at key {field}!\nref_state = {reference}\ntesttarget_state = {target}")]
    MetadataMismatch {
        field: MetadataField,
        reference: Box<GenerationState>,
        target: Box<GenerationState>,
    },
    #[error("{0}")]
    CellMismatch(Box<CellMismatch>),
    #[error("output comparison did not complete: {0}")]
    Comparison(#[from] tokio::task::JoinError),
}

fn describe_missing(missing: &[(Side, PathBuf)]) -> String {
    missing
        .iter()
        .map(|(side, path)| format!("{side} did not write {}", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failed trial, with everything needed to reproduce it.
#[derive(Debug, Error)]
#[error("trial {index} (seed {seed}) failed: {error}")]
pub struct TrialFailure {
    pub index: usize,
    pub seed: u64,
    /// Preserved scenario file, if the failure happened after it was written.
    pub scenario: Option<PathBuf>,
    #[source]
    pub error: HarnessError,
}
