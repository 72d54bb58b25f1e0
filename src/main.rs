#![warn(clippy::all)]

use anyhow::Result;
use clap::Parser;
use gol_harness::{trial_dir, CellFormat, Catalog, GeneratorConfig, SuiteConfig, TestSuite};
use std::{path::PathBuf, process::ExitCode, time::Duration};

/// Generates random Game of Life scenarios, runs a reference and a target
/// simulator on each and compares their outputs generation by generation.
#[derive(Parser)]
#[command(name = "gol_harness")]
struct Args {
    /// Reference simulator executable.
    reference: PathBuf,
    /// Simulator under test.
    target: PathBuf,
    /// Number of trials.
    #[arg(default_value_t = SuiteConfig::NUM_TESTS)]
    num_tests: usize,
    /// Generations each simulator writes.
    #[arg(long, default_value_t = SuiteConfig::GENERATIONS)]
    generations: u64,
    /// Suite seed; random if omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Replay the single trial with this seed instead of running the suite.
    #[arg(long)]
    trial_seed: Option<u64>,
    /// Width of the placement window.
    #[arg(long, default_value_t = GeneratorConfig::WINDOW_SIDE)]
    width: u32,
    /// Height of the placement window.
    #[arg(long, default_value_t = GeneratorConfig::WINDOW_SIDE)]
    height: u32,
    /// Seconds both simulators get to finish one trial.
    #[arg(long, default_value_t = SuiteConfig::TIMEOUT.as_secs())]
    timeout: u64,
    /// Delete the files of a failed trial instead of keeping them.
    #[arg(long)]
    discard_failed: bool,
    #[arg(long, value_enum, default_value_t = CellFormat::Bare)]
    scenario_format: CellFormat,
    /// Where trial directories are created.
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> SuiteConfig {
        let mut config = SuiteConfig::new(self.reference, self.target);
        config.num_tests = self.num_tests;
        config.generations = self.generations;
        config.seed = self.seed;
        config.timeout = Duration::from_secs(self.timeout);
        config.keep_failed = !self.discard_failed;
        config.scenario_format = self.scenario_format;
        config.work_dir = self.work_dir;
        config.generator.window_width = self.width;
        config.generator.window_height = self.height;
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let trial_seed = args.trial_seed;
    let mut suite = TestSuite::new(args.into_config(), Catalog::builtin())?;

    let result = match trial_seed {
        Some(seed) => suite.run_trial_with_seed(0, seed).await.map(|r| vec![r]),
        None => {
            suite
                .run(|report| println!("{}: Succeeded", report.index))
                .await
        }
    };

    match result {
        Ok(reports) => {
            println!("All {} tests passed (seed {})", reports.len(), suite.seed());
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            eprintln!("{}", failure.error);
            match &failure.scenario {
                Some(path) => println!(
                    "{}: Failed! Input file is at {}",
                    failure.index,
                    path.display()
                ),
                None => println!("{}: Failed!", failure.index),
            }
            if let Some(dir) = trial_dir(&failure) {
                println!("Simulator outputs and dumps are in {}", dir.display());
            }
            println!(
                "Replay with --seed {} --trial-seed {}",
                suite.seed(),
                failure.seed
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
