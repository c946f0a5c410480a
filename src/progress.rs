//! Progress reporting hooks.
//!
//! The library core stays silent on stdout; anything user-facing goes
//! through this trait so the CLI can draw spinners while tests and
//! embedders plug in their own observers (or nothing at all).

use std::sync::Arc;

/// Callback invoked as the pipeline advances.
///
/// All methods have no-op defaults, so implementors override only what
/// they care about. Stage indices are zero-based.
pub trait PipelineProgress: Send + Sync {
    /// A run is starting with `total_stages` stages ahead of it.
    fn on_run_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// A stage child is about to be spawned.
    fn on_stage_start(&self, index: usize, total: usize, stage: &str, program: &str) {
        let _ = (index, total, stage, program);
    }

    /// A stage finished (successfully or not).
    fn on_stage_complete(
        &self,
        index: usize,
        total: usize,
        stage: &str,
        succeeded: bool,
        duration_ms: u64,
    ) {
        let _ = (index, total, stage, succeeded, duration_ms);
    }

    /// The run is over; cleanup has already happened.
    fn on_run_complete(&self, succeeded: bool) {
        let _ = succeeded;
    }
}

/// Callback that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

/// Shared, thread-safe progress callback handle.
pub type ProgressCallback = Arc<dyn PipelineProgress>;
