//! Process spawner backed by `tokio::process`.
//!
//! Children inherit stdout/stderr so their output goes straight to the
//! terminal. Must be used from within a tokio runtime.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use futures::future::select_all;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{ProcessSpec, Spawner};

struct RunningProcess {
    label: String,
    child: Child,
}

/// A child that has exited.
#[derive(Debug)]
pub struct ExitedProcess {
    pub label: String,
    pub status: std::io::Result<ExitStatus>,
}

/// Starts processes as tokio children and keeps them for supervision.
///
/// Children are killed when the spawner is dropped.
#[derive(Default)]
pub struct TokioSpawner {
    running: Vec<RunningProcess>,
}

impl TokioSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children still tracked.
    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Labels of the tracked children, in start order.
    pub fn labels(&self) -> Vec<&str> {
        self.running.iter().map(|p| p.label.as_str()).collect()
    }

    /// Wait until any child exits and stop tracking it.
    ///
    /// Returns `None` immediately if no children are tracked.
    /// Cancel safe: dropping the future leaves every child tracked.
    pub async fn wait_any(&mut self) -> Option<ExitedProcess> {
        if self.running.is_empty() {
            return None;
        }

        let (status, index) = {
            let waits = self
                .running
                .iter_mut()
                .map(|process| Box::pin(process.child.wait()));
            let (status, index, _pending) = select_all(waits).await;
            (status, index)
        };

        let process = self.running.remove(index);
        Some(ExitedProcess {
            label: process.label,
            status,
        })
    }

    /// Stop every tracked child, most recently started first.
    ///
    /// Each child gets SIGTERM and `grace` to exit before being killed.
    pub async fn shutdown(&mut self, grace: Duration) {
        while let Some(mut process) = self.running.pop() {
            terminate(&mut process, grace).await;
        }
    }
}

async fn terminate(process: &mut RunningProcess, grace: Duration) {
    let label = process.label.as_str();

    if let Ok(Some(status)) = process.child.try_wait() {
        debug!(unit = label, %status, "process already exited");
        return;
    }

    #[cfg(unix)]
    if let Some(pid) = process.child.id() {
        // SAFETY: pid belongs to a child we spawned and have not reaped.
        let ret = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if ret != 0 {
            warn!(unit = label, pid, "SIGTERM failed, proceeding to SIGKILL");
        }
    }

    match tokio::time::timeout(grace, process.child.wait()).await {
        Ok(Ok(status)) => debug!(unit = label, %status, "process exited after SIGTERM"),
        _ => {
            debug!(unit = label, "process did not exit in time, sending SIGKILL");
            let _ = process.child.kill().await;
        }
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&mut self, spec: ProcessSpec) -> std::io::Result<()> {
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        debug!(unit = %spec.label, pid = child.id(), "process started");
        self.running.push(RunningProcess {
            label: spec.label,
            child,
        });
        Ok(())
    }
}

impl std::fmt::Debug for TokioSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSpawner")
            .field("running", &self.labels())
            .finish()
    }
}
