//! Error types for the pdf2txt orchestrator.
//!
//! Every failure in the orchestration layer is terminal for the run: no
//! component retries on its own (retry, if any, is a concern internal to
//! each external stage tool). Raw `std::io` and process errors are caught
//! at the boundary of the component that produced them and converted into
//! one of the variants below, so callers never see an uncontextualised
//! I/O error bubbling out of the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2txt orchestration engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The supplied document path is missing, not a file, or not a PDF.
    #[error("Invalid PDF file path: '{path}'\nThe path must be an existing file with a .pdf extension.")]
    InvalidInput { path: PathBuf },

    /// Listing the working directory for candidate documents failed.
    #[error("Failed to scan '{dir}' for PDF files: {source}")]
    DiscoveryFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Discovery ran fine but found nothing to process.
    #[error("No PDF files found in '{dir}'.")]
    NoDocumentsFound { dir: PathBuf },

    // ── Selection errors ──────────────────────────────────────────────────
    /// Interactive selection timed out, hit EOF, or was cancelled.
    #[error("No PDF selected or selection timed out.")]
    SelectionAborted,

    // ── Stage errors ──────────────────────────────────────────────────────
    /// A stage exited non-zero or could not be launched at all.
    /// Later stages are never invoked once one fails.
    #[error("Stage '{stage}' failed (program: {program}).\nRe-run with -v to see the stage's output.")]
    StageFailed { stage: &'static str, program: String },

    // ── Integrity errors ──────────────────────────────────────────────────
    /// Every stage reported success but the combined text file is absent.
    /// Defends against a combine stage that exits 0 after a partial write.
    #[error("Pipeline reported success but the final file '{expected}' was not found.")]
    FinalArtifactMissing { expected: PathBuf },

    // ── Cancellation ──────────────────────────────────────────────────────
    /// The user requested a cooperative cancel (Ctrl-C or the cancel key).
    /// Cleanup has already run by the time this surfaces.
    #[error("Pipeline cancelled.")]
    Cancelled,
}
