//! Top-level pipeline orchestration.
//!
//! A run walks four stages in a fixed order, each consuming the previous
//! stage's output:
//!
//! ```text
//! document.pdf ─▶ rasterize ─▶ <stem>_images
//!                  enhance  ─▶ <prev>_enhanced
//!                transcribe ─▶ <prev>_transcriptions
//!                  combine  ─▶ transcription.txt
//! ```
//!
//! Stage tools write next to their input under a predictable name and
//! disambiguate with a `_N` suffix on collision, so before each stage the
//! orchestrator snapshots the unique path the tool is about to take
//! ([`crate::paths::unique_path`]) and afterwards re-resolves what was
//! actually produced ([`crate::paths::resolve_actual_output`]). Each
//! resolved intermediate is tracked for cleanup before the next stage
//! starts.
//!
//! Cleanup runs whether the run completes or aborts; only a force quit
//! skips it.

use crate::cancel::CancelController;
use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::paths::{resolve_actual_output, unique_path};
use crate::pipeline::artifacts::ArtifactTracker;
use crate::pipeline::stage::run_stage;
use crate::pipeline::{discover, select};
use crate::report::{RunReport, StageReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Number of stages in the pipeline.
pub const STAGE_COUNT: usize = 4;

/// Name of the consolidated text file the combine stage produces in the
/// working directory.
pub const FINAL_ARTIFACT_NAME: &str = "transcription.txt";

const IMAGES_SUFFIX: &str = "_images";
const ENHANCED_SUFFIX: &str = "_enhanced";
const TRANSCRIPTIONS_SUFFIX: &str = "_transcriptions";

/// One pipeline run: select input, execute the four stages, track and
/// clean up intermediates, and report.
///
/// ```rust,no_run
/// use pdf2txt::{PipelineRun, RunConfig};
///
/// # async fn demo() -> Result<(), pdf2txt::PipelineError> {
/// let config = RunConfig::builder()
///     .input("scan.pdf")
///     .build();
/// let report = PipelineRun::new(config).execute().await?;
/// println!("wrote {:?}", report.final_artifact);
/// # Ok(())
/// # }
/// ```
pub struct PipelineRun {
    config: RunConfig,
    cancel: Arc<CancelController>,
    tracker: ArtifactTracker,
    stages: Vec<StageReport>,
}

impl PipelineRun {
    pub fn new(config: RunConfig) -> Self {
        let tracker = ArtifactTracker::new(config.env_dir.clone());
        Self {
            config,
            cancel: CancelController::new(),
            tracker,
            stages: Vec::new(),
        }
    }

    /// Handle for requesting cancellation from outside the run (the CLI
    /// never needs this; embedders and tests do).
    pub fn cancel_handle(&self) -> Arc<CancelController> {
        Arc::clone(&self.cancel)
    }

    /// Execute the run to completion.
    ///
    /// On success the report carries the final artifact path and
    /// per-stage details. On any error the intermediates have already
    /// been cleaned up (unless `keep_artifacts` is set).
    pub async fn execute(mut self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        self.cancel.spawn_signal_handler();

        // ── Step 1: resolve the input document ───────────────────────────
        let input = self.resolve_input().await?;
        info!(input = %input.display(), "starting pipeline");

        // Selection is done with stdin; the key listener may have it now.
        self.cancel.spawn_key_listener();
        if let Some(cb) = &self.config.progress {
            cb.on_run_start(STAGE_COUNT);
        }

        // ── Step 2: run the stages ────────────────────────────────────────
        let result = self.run_stages(&input).await;

        // ── Step 3: cleanup (runs on success and on abort) ────────────────
        self.tracker.cleanup_all(self.config.keep_artifacts);

        if let Some(cb) = &self.config.progress {
            cb.on_run_complete(result.is_ok());
        }

        let final_artifact = result?;
        let total_duration_ms = started.elapsed().as_millis() as u64;
        info!(
            final_artifact = %final_artifact.display(),
            total_duration_ms,
            "pipeline complete"
        );
        Ok(RunReport {
            input,
            succeeded: true,
            final_artifact: Some(final_artifact),
            total_duration_ms,
            stages: self.stages,
        })
    }

    /// Validate an explicit input, or discover candidates and select one.
    async fn resolve_input(&self) -> Result<PathBuf, PipelineError> {
        if let Some(path) = &self.config.input {
            return discover::validate_input(path);
        }

        let dir = &self.config.working_dir;
        let candidates = discover::find_pdf_candidates(dir)?;
        if candidates.is_empty() {
            return Err(PipelineError::NoDocumentsFound { dir: dir.clone() });
        }

        let chosen = if self.config.non_interactive {
            // Candidates are sorted, so "first" is lexicographic.
            info!(candidate = %candidates[0], "non-interactive mode, taking first candidate");
            candidates[0].clone()
        } else {
            match select::select_document(&candidates, self.config.select_timeout, &self.cancel)
                .await
            {
                Some(name) => name,
                None if self.cancel.is_cancelled() => return Err(PipelineError::Cancelled),
                None => return Err(PipelineError::SelectionAborted),
            }
        };
        discover::validate_input(&dir.join(chosen))
    }

    /// Drive the four stages in order, returning the final artifact path.
    async fn run_stages(&mut self, input: &Path) -> Result<PathBuf, PipelineError> {
        let program = self.config.rasterize_program.clone();
        let expected = unique_path(&with_suffix(&input.with_extension(""), IMAGES_SUFFIX));
        self.invoke(0, "rasterize", program, input).await?;
        let images = self.locate_and_track(&expected);

        let program = self.config.enhance_program.clone();
        let expected = unique_path(&with_suffix(&images, ENHANCED_SUFFIX));
        self.invoke(1, "enhance", program, &images).await?;
        let enhanced = self.locate_and_track(&expected);

        let program = self.config.transcribe_program.clone();
        let expected = unique_path(&with_suffix(&enhanced, TRANSCRIPTIONS_SUFFIX));
        self.invoke(2, "transcribe", program, &enhanced).await?;
        let transcriptions = self.locate_and_track(&expected);

        let program = self.config.combine_program.clone();
        let expected = unique_path(&self.config.working_dir.join(FINAL_ARTIFACT_NAME));
        self.invoke(3, "combine", program, &transcriptions).await?;

        // The combine stage said it succeeded; trust but verify.
        let final_path = resolve_actual_output(&expected);
        if !final_path.is_file() {
            return Err(PipelineError::FinalArtifactMissing { expected });
        }
        if let Some(last) = self.stages.last_mut() {
            last.output = Some(final_path.clone());
        }
        Ok(final_path)
    }

    /// Run one stage, recording its report. Cancellation is checked
    /// before the spawn and, inside the runner, at every poll interval.
    async fn invoke(
        &mut self,
        index: usize,
        stage: &'static str,
        program: String,
        arg: &Path,
    ) -> Result<(), PipelineError> {
        if self.cancel.poll() {
            return Err(PipelineError::Cancelled);
        }
        if let Some(cb) = &self.config.progress {
            cb.on_stage_start(index, STAGE_COUNT, stage, &program);
        }
        info!(stage, program = %program, input = %arg.display(), "running stage");

        let started = Instant::now();
        let outcome = run_stage(stage, &program, &[arg], &self.cancel, &self.config).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.stages.push(StageReport {
            stage: stage.to_string(),
            program: program.clone(),
            succeeded: outcome.succeeded,
            duration_ms,
            captured_lines: outcome.lines.len(),
            output: None,
        });
        if let Some(cb) = &self.config.progress {
            cb.on_stage_complete(index, STAGE_COUNT, stage, outcome.succeeded, duration_ms);
        }

        if outcome.succeeded {
            Ok(())
        } else if self.cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            // Surface the tail of the child's output at warn level; the
            // full stream was already logged at debug.
            let tail = outcome.lines.len().saturating_sub(5);
            for line in &outcome.lines[tail..] {
                warn!(stage, "{line}");
            }
            Err(PipelineError::StageFailed { stage, program })
        }
    }

    /// Resolve what the last stage actually produced and register it for
    /// cleanup. Tracking happens before the next stage starts.
    fn locate_and_track(&mut self, expected: &Path) -> PathBuf {
        let actual = resolve_actual_output(expected);
        if actual.exists() {
            self.tracker.track(actual.clone());
            if let Some(last) = self.stages.last_mut() {
                last.output = Some(actual.clone());
            }
        } else {
            warn!(expected = %expected.display(), "stage output not found where expected");
        }
        actual
    }
}

/// Append `suffix` to the last path component.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    name.push_str(suffix);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}
