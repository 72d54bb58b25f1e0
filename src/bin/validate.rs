use anyhow::Result;
use clap::Parser;
use gol_harness::compare_outputs;
use std::{path::PathBuf, process::ExitCode};

/// Compares an existing reference output file with a target output file.
#[derive(Parser)]
#[command(name = "validate")]
struct Args {
    /// Dense output of the reference simulator.
    reference_output: PathBuf,
    /// Subgrid output of the simulator under test.
    target_output: PathBuf,
    /// Directory for the target grid dump on a cell mismatch.
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    for path in [&args.reference_output, &args.target_output] {
        anyhow::ensure!(path.is_file(), "{} is not a file", path.display());
    }

    match compare_outputs(
        &args.reference_output,
        &args.target_output,
        args.dump_dir.as_deref(),
    ) {
        Ok(generations) => {
            println!("{generations} generations match");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            println!("Test failed.");
            Ok(ExitCode::FAILURE)
        }
    }
}
