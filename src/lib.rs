//! # pdf2txt
//!
//! Turn a PDF document into a single consolidated text file by chaining
//! four external stage tools:
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌────────────┐   ┌─────────┐
//! │ document │──▶│ rasterize │──▶│ enhance │──▶│ transcribe │──▶│ combine │
//! └──────────┘   └───────────┘   └─────────┘   └────────────┘   └─────────┘
//!                 page images     cleaned-up     per-page         one text
//!                                 images         transcriptions   file
//! ```
//!
//! This crate is the orchestration engine, not the stages: each stage is
//! an opaque executable invoked with a single positional argument that
//! exits zero on success. The engine handles input discovery and
//! interactive selection, `_N`-suffix path disambiguation, subprocess
//! supervision with merged output streaming, cooperative cancellation
//! (Ctrl-C and keyboard), and best-effort cleanup of intermediate
//! artifacts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pdf2txt::{PipelineRun, RunConfig};
//!
//! # async fn demo() -> Result<(), pdf2txt::PipelineError> {
//! let config = RunConfig::builder()
//!     .working_dir("/data/scans")
//!     .input("/data/scans/report.pdf")
//!     .build();
//!
//! let report = PipelineRun::new(config).execute().await?;
//! println!("transcription at {:?}", report.final_artifact);
//! # Ok(())
//! # }
//! ```
//!
//! Omit `input` to discover `*.pdf` files in the working directory and
//! prompt for a choice (auto-selected in CI). Enable the default `cli`
//! feature for the `pdf2txt` command-line binary.

pub mod cancel;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod run;

pub use cancel::{CancelController, CancelEvent};
pub use config::{RunConfig, RunConfigBuilder};
pub use error::PipelineError;
pub use progress::{NoopProgress, PipelineProgress, ProgressCallback};
pub use report::{RunReport, StageReport};
pub use run::{PipelineRun, FINAL_ARTIFACT_NAME, STAGE_COUNT};
