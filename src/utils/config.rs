use std::{
    ops::{Range, RangeInclusive},
    path::PathBuf,
    time::Duration,
};

use crate::{CellFormat, HarnessError};

/// Controls how random scenarios are drawn.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Number of primitives per scenario, upper bound exclusive.
    pub primitive_count: Range<usize>,
    /// Quarter turns applied to each primitive.
    pub rotations: RangeInclusive<u32>,
    /// Primitives are placed within `window_width x window_height` cells
    /// of the scenario's anchor.
    pub window_width: u32,
    pub window_height: u32,
    /// Where the anchor of a scenario may land. Clamped by the generator so
    /// that no placed cell leaves the `i64` plane.
    pub anchor_x: RangeInclusive<i64>,
    pub anchor_y: RangeInclusive<i64>,
}

impl GeneratorConfig {
    pub const PRIMITIVE_COUNT: Range<usize> = 10..200;
    pub const ROTATIONS: RangeInclusive<u32> = 1..=3;
    /// The reference simulator processes every cell of its bounding box,
    /// so the window stays small.
    pub const WINDOW_SIDE: u32 = 30;
    pub const ANCHOR_RANGE: RangeInclusive<i64> = -i64::MAX..=i64::MAX - 1;
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            primitive_count: Self::PRIMITIVE_COUNT,
            rotations: Self::ROTATIONS,
            window_width: Self::WINDOW_SIDE,
            window_height: Self::WINDOW_SIDE,
            anchor_x: Self::ANCHOR_RANGE,
            anchor_y: Self::ANCHOR_RANGE,
        }
    }
}

/// Everything a test suite run needs, passed in explicitly.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    pub reference: PathBuf,
    pub target: PathBuf,
    pub num_tests: usize,
    pub generations: u64,
    /// Suite seed; a fresh one is drawn from entropy when `None`.
    pub seed: Option<u64>,
    /// Deadline for both simulators of one trial to exit.
    pub timeout: Duration,
    /// Keep the trial directory (scenario, outputs, dumps) of a failed trial.
    pub keep_failed: bool,
    pub scenario_format: CellFormat,
    /// Parent directory for per-trial directories, system temp dir if `None`.
    pub work_dir: Option<PathBuf>,
    pub generator: GeneratorConfig,
}

impl SuiteConfig {
    pub const NUM_TESTS: usize = 10;
    pub const GENERATIONS: u64 = 100;
    pub const TIMEOUT: Duration = Duration::from_secs(600);

    pub fn new(reference: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            target: target.into(),
            num_tests: Self::NUM_TESTS,
            generations: Self::GENERATIONS,
            seed: None,
            timeout: Self::TIMEOUT,
            keep_failed: true,
            scenario_format: CellFormat::default(),
            work_dir: None,
            generator: GeneratorConfig::default(),
        }
    }

    /// Checks that both executables exist. The generator settings are
    /// checked by `ScenarioGenerator::new`.
    pub fn validate(&self) -> Result<(), HarnessError> {
        for exe in [&self.reference, &self.target] {
            if !exe.is_file() {
                return Err(HarnessError::MissingExecutable(exe.clone()));
            }
        }
        Ok(())
    }
}
