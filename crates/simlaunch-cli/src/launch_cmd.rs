//! `simlaunch launch` command: start every process of a launch description
//! and supervise them.
//!
//! Processes are started in plan order. The launch ends when any process
//! exits or on Ctrl-C; the remaining processes are then stopped, newest
//! first. If starting fails partway, the processes already running are
//! stopped before the error is reported.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use simlaunch_core::launch::{ExitedProcess, LaunchContext, TokioSpawner, launch};
use simlaunch_core::package::PackageIndex;

use crate::resolve::{LaunchTarget, collect_overrides};

/// How the supervised launch ended.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// A process exited on its own.
    Exited(ExitedProcess),
    /// Ctrl-C was received.
    Interrupted,
    /// The launch description started no processes.
    Empty,
}

/// Run the launch command.
pub async fn run_launch(target: &LaunchTarget, packages: &PackageIndex, grace: Duration) -> Result<()> {
    let outcome = launch_and_supervise(target, packages, grace, tokio::signal::ctrl_c()).await?;

    match outcome {
        LaunchOutcome::Exited(exited) => match exited.status {
            Ok(status) if status.success() => {
                println!("{} exited, all processes stopped.", exited.label);
                Ok(())
            }
            Ok(status) => bail!("{} exited with {status}, all processes stopped", exited.label),
            Err(e) => Err(e).with_context(|| format!("failed to wait for {}", exited.label)),
        },
        LaunchOutcome::Interrupted => {
            println!("Interrupted, all processes stopped.");
            Ok(())
        }
        LaunchOutcome::Empty => {
            println!("No processes to start.");
            Ok(())
        }
    }
}

/// Start the processes of `target`, wait for the first exit or for
/// `interrupt` to complete, then stop everything.
///
/// Must run on the multi-threaded runtime.
pub async fn launch_and_supervise<F>(
    target: &LaunchTarget,
    packages: &PackageIndex,
    grace: Duration,
    interrupt: F,
) -> Result<LaunchOutcome>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    let plan = target.load(packages)?;
    let overrides = collect_overrides(plan.arguments(), &target.overrides, |key| {
        std::env::var(key).ok()
    })?;

    // Resolution runs command substitutions synchronously; keep it off the
    // async worker. Requires the multi-threaded runtime.
    let mut spawner = TokioSpawner::new();
    let launched = tokio::task::block_in_place(|| {
        launch(&plan, &overrides, LaunchContext::new(packages), &mut spawner)
    });
    let started = match launched {
        Ok(started) => started,
        Err(e) => {
            if !spawner.is_empty() {
                warn!(running = spawner.len(), "launch failed, stopping started processes");
                spawner.shutdown(grace).await;
            }
            return Err(e).with_context(|| format!("failed to launch {}", target.file.display()));
        }
    };

    if started == 0 {
        return Ok(LaunchOutcome::Empty);
    }
    info!(processes = started, "all processes started");

    let outcome = tokio::select! {
        exited = spawner.wait_any() => match exited {
            Some(exited) => {
                info!(unit = %exited.label, "process exited, stopping the rest");
                LaunchOutcome::Exited(exited)
            }
            None => LaunchOutcome::Empty,
        },
        signal = interrupt => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("interrupted, stopping processes");
            LaunchOutcome::Interrupted
        }
    };

    spawner.shutdown(grace).await;
    Ok(outcome)
}
