//! Subprocess stage runner.
//!
//! One stage = one child process, run to completion with stdout and
//! stderr merged into a single ordered line stream. The runner polls the
//! cancellation controller between lines; on cancel it terminates the
//! child (SIGTERM on unix), waits out the grace period, then kills.
//!
//! Failure to even launch the program is reported the same way as a
//! non-zero exit: a failed outcome, never a panic or a raw I/O error.

use crate::cancel::CancelController;
use crate::config::RunConfig;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What a stage invocation came to.
#[derive(Debug)]
pub struct StageOutcome {
    /// Child exited with status zero.
    pub succeeded: bool,
    /// Merged stdout+stderr lines, in arrival order.
    pub lines: Vec<String>,
}

/// Run `program` with `args`, streaming its merged output until exit,
/// cancellation, or launch failure.
///
/// The child runs in the configured working directory with stdin closed,
/// so a stage that tries to prompt fails fast instead of hanging the
/// pipeline. Its pid is published on the controller for the duration of
/// the run.
pub async fn run_stage(
    stage: &'static str,
    program: &str,
    args: &[&Path],
    cancel: &CancelController,
    config: &RunConfig,
) -> StageOutcome {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&config.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(stage, program, %err, "failed to launch stage program");
            return StageOutcome {
                succeeded: false,
                lines: vec![format!("failed to launch '{program}': {err}")],
            };
        }
    };
    cancel.set_current_child(child.id());
    debug!(stage, program, pid = ?child.id(), "stage started");

    // Both pipes feed one channel; the channel closes once both readers
    // are done, which is the signal that the child's output is complete.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone());
    }
    drop(tx);

    let mut lines = Vec::new();
    let mut poll = tokio::time::interval(config.poll_interval);
    let succeeded = loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(line) => {
                    debug!(stage, "{line}");
                    lines.push(line);
                }
                None => {
                    let status = child.wait().await;
                    break matches!(status, Ok(s) if s.success());
                }
            },
            _ = poll.tick() => {
                if cancel.poll() {
                    terminate(&mut child, config.grace_period).await;
                    cancel.set_current_child(None);
                    debug!(stage, "stage terminated on cancellation");
                    return StageOutcome { succeeded: false, lines };
                }
            }
        }
    };

    cancel.set_current_child(None);
    debug!(stage, succeeded, captured = lines.len(), "stage finished");
    StageOutcome { succeeded, lines }
}

/// Spawn a task that reads `stream` line by line into `tx`.
fn forward_lines(
    stream: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                return;
            }
        }
    });
}

/// Ask the child to exit, then kill it if it ignores the request.
///
/// On unix the polite request is SIGTERM, delivered via the system
/// `kill` utility so stages get a chance to flush and remove partial
/// output. Elsewhere (and as the escalation everywhere) the process is
/// killed outright.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let _ = std::process::Command::new("kill")
                .args(["-TERM", &pid.to_string()])
                .output();
        }
        if tokio::time::timeout(grace, child.wait()).await.is_err() {
            warn!("stage ignored termination request, killing");
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = grace;
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelController;
    use std::sync::Arc;
    use std::time::Instant;
    use tempfile::TempDir;

    fn test_config(dir: &std::path::Path) -> RunConfig {
        RunConfig::builder()
            .working_dir(dir)
            .grace_period(Duration::from_millis(200))
            .poll_interval(Duration::from_millis(20))
            .build()
    }

    #[tokio::test]
    async fn captures_merged_stdout_and_stderr() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let outcome = run_stage(
            "rasterize",
            "sh",
            &[Path::new("-c"), Path::new("echo out-line; echo err-line >&2")],
            &cancel,
            &test_config(tmp.path()),
        )
        .await;
        assert!(outcome.succeeded);
        assert!(outcome.lines.iter().any(|l| l == "out-line"));
        assert!(outcome.lines.iter().any(|l| l == "err-line"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failed_outcome() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let outcome = run_stage(
            "enhance",
            "sh",
            &[Path::new("-c"), Path::new("echo before-failing; exit 3")],
            &cancel,
            &test_config(tmp.path()),
        )
        .await;
        assert!(!outcome.succeeded);
        // output captured up to the failure is retained
        assert!(outcome.lines.iter().any(|l| l == "before-failing"));
    }

    #[tokio::test]
    async fn missing_program_fails_without_panicking() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let outcome = run_stage(
            "transcribe",
            "definitely-not-a-real-program-4f9c",
            &[Path::new("input")],
            &cancel,
            &test_config(tmp.path()),
        )
        .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.lines.len(), 1);
        assert!(outcome.lines[0].contains("failed to launch"));
    }

    #[tokio::test]
    async fn child_runs_in_configured_working_directory() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let outcome = run_stage(
            "combine",
            "sh",
            &[Path::new("-c"), Path::new("echo made-here > marker.txt")],
            &cancel,
            &test_config(tmp.path()),
        )
        .await;
        assert!(outcome.succeeded);
        assert!(tmp.path().join("marker.txt").is_file());
    }

    #[tokio::test]
    async fn cancellation_terminates_a_long_running_child() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let canceller = Arc::clone(&cancel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            canceller.request_cancel();
        });

        let started = Instant::now();
        let outcome = run_stage(
            "transcribe",
            "sh",
            &[Path::new("-c"), Path::new("sleep 30")],
            &cancel,
            &test_config(tmp.path()),
        )
        .await;
        assert!(!outcome.succeeded);
        // Well under the sleep duration: terminate + grace, not 30 s.
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(cancel.current_child(), None);
    }

    #[tokio::test]
    async fn publishes_child_pid_while_running() {
        let tmp = TempDir::new().unwrap();
        let cancel = CancelController::new();
        let runner_cancel = Arc::clone(&cancel);
        let config = test_config(tmp.path());
        let task = tokio::spawn(async move {
            run_stage(
                "transcribe",
                "sh",
                &[Path::new("-c"), Path::new("sleep 30")],
                &runner_cancel,
                &config,
            )
            .await
        });

        // the pid slot must be visible to other tasks while the child runs
        let deadline = Instant::now() + Duration::from_secs(5);
        while cancel.current_child().is_none() {
            assert!(Instant::now() < deadline, "child pid never published");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        cancel.request_cancel();
        let outcome = task.await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(cancel.current_child(), None);
    }
}
