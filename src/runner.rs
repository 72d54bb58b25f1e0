use log::{debug, warn};
use std::{
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};
use tokio::process::Command;

use crate::{HarnessError, Side};

/// One of the two external simulators, invoked as
/// `<executable> <scenario> <generations> <output>`.
#[derive(Clone, Debug)]
pub struct Simulator {
    side: Side,
    executable: PathBuf,
}

impl Simulator {
    pub fn new(side: Side, executable: impl Into<PathBuf>) -> Self {
        Self {
            side,
            executable: executable.into(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs the simulator to completion. The process is killed if the
    /// returned future is dropped before it exits.
    pub async fn run(
        &self,
        scenario: &Path,
        generations: u64,
        output: &Path,
    ) -> Result<ExitStatus, HarnessError> {
        let timer = Instant::now();
        let result = Command::new(&self.executable)
            .arg(scenario)
            .arg(generations.to_string())
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| HarnessError::Spawn {
                side: self.side,
                path: self.executable.clone(),
                source,
            })?;

        debug!("{} finished in {:?}", self.side, timer.elapsed());
        if !result.status.success() {
            // only the output file is part of the contract
            warn!(
                "{} exited with {}: {}",
                self.side,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }
        Ok(result.status)
    }
}

/// Runs both simulators concurrently on the same scenario and waits for
/// both to exit, then checks that each wrote its output file.
///
/// If `timeout` elapses first, both processes are killed.
pub async fn run_pair(
    reference: &Simulator,
    target: &Simulator,
    scenario: &Path,
    generations: u64,
    outputs: [&Path; 2],
    timeout: Duration,
) -> Result<(), HarnessError> {
    let [ref_out, target_out] = outputs;
    let both = async {
        tokio::join!(
            reference.run(scenario, generations, ref_out),
            target.run(scenario, generations, target_out),
        )
    };
    let (ref_status, target_status) = tokio::time::timeout(timeout, both)
        .await
        .map_err(|_| HarnessError::Timeout(timeout))?;
    ref_status?;
    target_status?;

    let missing = [(reference.side, ref_out), (target.side, target_out)]
        .into_iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(side, path)| (side, path.to_path_buf()))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(HarnessError::MissingOutput(missing));
    }
    Ok(())
}
