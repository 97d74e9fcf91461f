//! Data refresh: a pluggable task plus the interval scheduler that drives it.
//!
//! The service never writes CSV files itself. A [`RefreshTask`] is whatever
//! rewrites them (an external fetch script via [`CommandRefresh`], or nothing
//! at all with [`NoopRefresh`]). The HTTP handler and the background
//! schedule call the same task through one [`ExclusiveRefresh`], so at most
//! one run is in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use candlewick_core::UtcDateTime;
use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Delay before a failed scheduled refresh is attempted again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Summary of one completed refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub task: String,
    pub started_at: UtcDateTime,
    pub duration_ms: u64,
    pub detail: String,
}

#[async_trait]
pub trait RefreshTask: Send + Sync {
    fn name(&self) -> &str;

    async fn refresh(&self) -> Result<RefreshReport, RefreshError>;
}

/// Does nothing. Used when no refresh command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresh;

#[async_trait]
impl RefreshTask for NoopRefresh {
    fn name(&self) -> &str {
        "noop"
    }

    async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        Ok(RefreshReport {
            task: self.name().to_owned(),
            started_at: UtcDateTime::now(),
            duration_ms: 0,
            detail: String::from("no refresh command configured"),
        })
    }
}

/// Runs an external program and waits for it to exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRefresh {
    program: String,
    args: Vec<String>,
}

impl CommandRefresh {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split on whitespace; no shell quoting is interpreted.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl RefreshTask for CommandRefresh {
    fn name(&self) -> &str {
        &self.program
    }

    async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let started_at = UtcDateTime::now();
        let clock = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RefreshError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RefreshError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(RefreshReport {
            task: self.program.clone(),
            started_at,
            duration_ms: elapsed_ms(clock),
            detail: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
        })
    }
}

/// Serializes runs of the wrapped task. A caller that arrives while a run is
/// in flight waits for it to finish, then runs its own.
pub struct ExclusiveRefresh {
    inner: Arc<dyn RefreshTask>,
    running: Mutex<()>,
}

impl ExclusiveRefresh {
    pub fn new(inner: Arc<dyn RefreshTask>) -> Self {
        Self {
            inner,
            running: Mutex::new(()),
        }
    }
}

#[async_trait]
impl RefreshTask for ExclusiveRefresh {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!(task = self.name(), "refresh already running, waiting");
                self.running.lock().await
            }
        };
        self.inner.refresh().await
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Handle to the background schedule. Dropping it stops the schedule.
#[derive(Debug)]
pub struct RefreshLoop {
    handle: JoinHandle<()>,
}

impl RefreshLoop {
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run `task` every `every`, starting one interval from now. A failed run is
/// logged and retried after `retry_after` until it succeeds, then the
/// regular schedule resumes.
///
/// Must be called from within a tokio runtime.
pub fn spawn_refresh_loop(
    task: Arc<dyn RefreshTask>,
    every: Duration,
    retry_after: Duration,
) -> RefreshLoop {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            loop {
                match task.refresh().await {
                    Ok(report) => {
                        tracing::info!(
                            task = %report.task,
                            duration_ms = report.duration_ms,
                            "scheduled refresh finished"
                        );
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(
                            task = task.name(),
                            %error,
                            retry_in_secs = retry_after.as_secs_f64(),
                            "scheduled refresh failed"
                        );
                        tokio::time::sleep(retry_after).await;
                    }
                }
            }
        }
    });

    RefreshLoop { handle }
}
