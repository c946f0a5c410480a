//! Run configuration with builder pattern.

use crate::progress::ProgressCallback;
use std::path::PathBuf;
use std::time::Duration;

/// Default interactive-selection timeout in seconds.
pub const DEFAULT_SELECT_TIMEOUT_SECS: u64 = 60;
/// Default grace period between terminate and kill for a stage child.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
/// Default cancellation poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a pipeline run.
///
/// Use [`RunConfig::builder`] to construct:
///
/// ```rust
/// use pdf2txt::RunConfig;
///
/// let config = RunConfig::builder()
///     .working_dir("/tmp/scans")
///     .keep_artifacts(true)
///     .build();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Directory candidates are discovered in and the final artifact is
    /// written to. Also the working directory of every stage child.
    pub working_dir: PathBuf,
    /// Document to process. `None` triggers discovery + selection.
    pub input: Option<PathBuf>,
    /// Retain intermediate stage outputs after the run.
    pub keep_artifacts: bool,
    /// Extra directory (e.g. a scratch environment) removed during
    /// cleanup alongside the intermediates.
    pub env_dir: Option<PathBuf>,
    /// Skip the interactive selector and take the first candidate.
    /// Defaults to true when the `CI` environment variable is set.
    pub non_interactive: bool,
    /// How long the interactive selector waits for a choice.
    pub select_timeout: Duration,
    /// How long a terminated stage child gets before being killed.
    pub grace_period: Duration,
    /// How often in-flight work checks for cancellation.
    pub poll_interval: Duration,
    /// Stage 1 program: PDF → page images directory.
    pub rasterize_program: String,
    /// Stage 2 program: images directory → enhanced images directory.
    pub enhance_program: String,
    /// Stage 3 program: enhanced images → per-page transcriptions.
    pub transcribe_program: String,
    /// Stage 4 program: transcriptions directory → single text file.
    pub combine_program: String,
    /// Optional progress callback (spinners, logging, tests).
    pub progress: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            input: None,
            keep_artifacts: false,
            env_dir: None,
            non_interactive: std::env::var_os("CI").is_some(),
            select_timeout: Duration::from_secs(DEFAULT_SELECT_TIMEOUT_SECS),
            grace_period: DEFAULT_GRACE_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            rasterize_program: "pdf2txt-rasterize".into(),
            enhance_program: "pdf2txt-enhance".into(),
            transcribe_program: "pdf2txt-transcribe".into(),
            combine_program: "pdf2txt-combine".into(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("working_dir", &self.working_dir)
            .field("input", &self.input)
            .field("keep_artifacts", &self.keep_artifacts)
            .field("env_dir", &self.env_dir)
            .field("non_interactive", &self.non_interactive)
            .field("select_timeout", &self.select_timeout)
            .field("grace_period", &self.grace_period)
            .field("poll_interval", &self.poll_interval)
            .field("rasterize_program", &self.rasterize_program)
            .field("enhance_program", &self.enhance_program)
            .field("transcribe_program", &self.transcribe_program)
            .field("combine_program", &self.combine_program)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for [`RunConfig`].
#[derive(Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = dir.into();
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input = Some(path.into());
        self
    }

    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.config.keep_artifacts = keep;
        self
    }

    pub fn env_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.env_dir = Some(dir.into());
        self
    }

    pub fn non_interactive(mut self, non_interactive: bool) -> Self {
        self.config.non_interactive = non_interactive;
        self
    }

    /// Clamped to at least 1 second.
    pub fn select_timeout(mut self, timeout: Duration) -> Self {
        self.config.select_timeout = timeout.max(Duration::from_secs(1));
        self
    }

    /// Clamped to at least 100 ms so a terminated child always gets a
    /// chance to exit before the kill.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_period = grace.max(Duration::from_millis(100));
        self
    }

    /// Clamped to 10 ms – 5 s.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval
            .max(Duration::from_millis(10))
            .min(Duration::from_secs(5));
        self
    }

    pub fn rasterize_program(mut self, program: impl Into<String>) -> Self {
        self.config.rasterize_program = program.into();
        self
    }

    pub fn enhance_program(mut self, program: impl Into<String>) -> Self {
        self.config.enhance_program = program.into();
        self
    }

    pub fn transcribe_program(mut self, program: impl Into<String>) -> Self {
        self.config.transcribe_program = program.into();
        self
    }

    pub fn combine_program(mut self, program: impl Into<String>) -> Self {
        self.config.combine_program = program.into();
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}
