use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    compare::compare_streams,
    runner::{run_pair, Simulator},
    state::{DenseReader, SparseReader},
    Catalog, HarnessError, Scenario, ScenarioGenerator, Side, SuiteConfig, TrialFailure,
};

const SCENARIO_FILE: &str = "scenario.txt";
const REFERENCE_OUTPUT: &str = "reference.out";
const TARGET_OUTPUT: &str = "target.out";
const DIAGNOSTICS_DIR: &str = "diagnostics";

/// Summary of a passed trial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrialReport {
    pub index: usize,
    pub seed: u64,
    /// Cells in the scenario, overlaps counted once per primitive.
    pub scenario_cells: usize,
    pub generations: usize,
}

/// Repeatedly generates a scenario, runs both simulators on it and compares
/// their outputs.
pub struct TestSuite {
    config: SuiteConfig,
    generator: ScenarioGenerator,
    reference: Simulator,
    target: Simulator,
    seed: u64,
    rng: ChaCha8Rng,
}

impl TestSuite {
    pub fn new(config: SuiteConfig, catalog: Catalog) -> Result<Self, HarnessError> {
        config.validate()?;
        let generator = ScenarioGenerator::new(catalog, config.generator.clone())?;
        let seed = config.seed.unwrap_or_else(|| ChaCha8Rng::from_entropy().gen());
        info!("suite seed {seed}");
        Ok(Self {
            reference: Simulator::new(Side::Reference, &config.reference),
            target: Simulator::new(Side::Target, &config.target),
            generator,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Runs `num_tests` trials, stopping at the first failure. `on_pass` is
    /// called after each passed trial.
    pub async fn run(
        &mut self,
        mut on_pass: impl FnMut(&TrialReport),
    ) -> Result<Vec<TrialReport>, TrialFailure> {
        let mut reports = Vec::with_capacity(self.config.num_tests);
        for index in 0..self.config.num_tests {
            let report = self.run_trial(index).await?;
            on_pass(&report);
            reports.push(report);
        }
        Ok(reports)
    }

    /// Runs the next trial, seeded from the suite RNG.
    pub async fn run_trial(&mut self, index: usize) -> Result<TrialReport, TrialFailure> {
        let seed = self.rng.gen();
        self.run_trial_with_seed(index, seed).await
    }

    /// Runs one trial in a fresh directory. The directory is removed on
    /// success and, with `keep_failed`, preserved on failure once the
    /// scenario has been written.
    pub async fn run_trial_with_seed(
        &self,
        index: usize,
        seed: u64,
    ) -> Result<TrialReport, TrialFailure> {
        let fail = |scenario, error| TrialFailure {
            index,
            seed,
            scenario,
            error,
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix("gol-trial-");
        let dir = match &self.config.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| fail(None, HarnessError::io(std::env::temp_dir(), e)))?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scenario_path = dir.path().join(SCENARIO_FILE);
        let scenario = self
            .write_scenario(&scenario_path, &mut rng)
            .map_err(|error| fail(None, error))?;

        match self.check(dir.path(), &scenario_path).await {
            Ok(generations) => {
                info!("trial {index} passed, {generations} generations compared");
                Ok(TrialReport {
                    index,
                    seed,
                    scenario_cells: scenario.len(),
                    generations,
                })
            }
            Err(error) if self.config.keep_failed => {
                let kept = dir.keep();
                warn!("trial {index} failed, files kept in {}", kept.display());
                Err(fail(Some(kept.join(SCENARIO_FILE)), error))
            }
            Err(error) => Err(fail(None, error)),
        }
    }

    fn write_scenario(
        &self,
        path: &Path,
        rng: &mut ChaCha8Rng,
    ) -> Result<Scenario, HarnessError> {
        let scenario = self.generator.generate_random(rng)?;
        scenario.save(path, self.config.scenario_format)?;
        info!(
            "scenario with {} cells ({} distinct) at {}",
            scenario.len(),
            scenario.live_cells().len(),
            path.display()
        );
        Ok(scenario)
    }

    /// Runs both simulators on the saved scenario and compares their outputs.
    async fn check(&self, dir: &Path, scenario_path: &Path) -> Result<usize, HarnessError> {
        let (ref_out, target_out) = (dir.join(REFERENCE_OUTPUT), dir.join(TARGET_OUTPUT));
        run_pair(
            &self.reference,
            &self.target,
            scenario_path,
            self.config.generations,
            [&ref_out, &target_out],
            self.config.timeout,
        )
        .await?;

        let dump_dir = dir.join(DIAGNOSTICS_DIR);
        // the outputs can be large; read them off the runtime threads
        tokio::task::spawn_blocking(move || {
            compare_outputs(&ref_out, &target_out, Some(&dump_dir))
        })
        .await?
    }
}

/// Compares a finished reference output file with a target output file.
/// Returns the number of generations compared.
pub fn compare_outputs(
    reference: &Path,
    target: &Path,
    dump_dir: Option<&Path>,
) -> Result<usize, HarnessError> {
    let open = |path: &Path| -> Result<BufReader<File>, HarnessError> {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| HarnessError::io(path, e))
    };
    let summary = compare_streams(
        &mut DenseReader::new(open(reference)?),
        &mut SparseReader::new(open(target)?),
        dump_dir,
    )?;
    Ok(summary.generations.len())
}

/// Directory holding the files of a preserved trial.
pub fn trial_dir(failure: &TrialFailure) -> Option<PathBuf> {
    failure
        .scenario
        .as_ref()
        .and_then(|s| s.parent())
        .map(Path::to_path_buf)
}
