//! Pipeline building blocks: discovery, selection, stage execution, and
//! artifact tracking. [`crate::run::PipelineRun`] wires them together.

pub mod artifacts;
pub mod discover;
pub mod select;
pub mod stage;

pub use artifacts::ArtifactTracker;
pub use stage::{run_stage, StageOutcome};
