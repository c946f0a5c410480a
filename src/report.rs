//! Structured summary of a completed run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one stage invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name ("rasterize", "enhance", "transcribe", "combine").
    pub stage: String,
    /// Program that was invoked.
    pub program: String,
    pub succeeded: bool,
    pub duration_ms: u64,
    /// Number of output lines captured from the child.
    pub captured_lines: usize,
    /// Output location the orchestrator resolved for this stage, when one
    /// was found on disk.
    pub output: Option<PathBuf>,
}

/// Summary of a whole pipeline run, returned on success and rendered by
/// the CLI's `--json` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The document that was processed.
    pub input: PathBuf,
    pub succeeded: bool,
    /// The consolidated text file, present when the run succeeded.
    pub final_artifact: Option<PathBuf>,
    pub total_duration_ms: u64,
    pub stages: Vec<StageReport>,
}
