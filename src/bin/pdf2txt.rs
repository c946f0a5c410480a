//! pdf2txt command-line interface.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2txt::{PipelineProgress, PipelineRun, RunConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
Examples:
  pdf2txt report.pdf              Process one document
  pdf2txt                         Pick a PDF from the working directory
  pdf2txt --keep report.pdf       Retain intermediate stage outputs
  pdf2txt --json report.pdf       Machine-readable run report

Keys while stages are running:
  x        cancel: terminate the current stage, clean up, exit 1
  q        force quit immediately, skipping cleanup
  Ctrl-C   same as 'x'; press twice to force quit

Stage programs default to pdf2txt-rasterize, pdf2txt-enhance,
pdf2txt-transcribe and pdf2txt-combine; override them with the matching
flags or PDF2TXT_* environment variables.";

#[derive(Parser, Debug)]
#[command(
    name = "pdf2txt",
    version,
    about = "Turn a PDF into a single consolidated text file",
    after_help = AFTER_HELP
)]
struct Cli {
    /// PDF to process; omit to pick one from the working directory
    input: Option<PathBuf>,

    /// Directory to scan for PDFs and to write the transcription into
    #[arg(short = 'd', long, default_value = ".")]
    working_dir: PathBuf,

    /// Keep intermediate stage outputs after the run
    #[arg(short, long)]
    keep: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Seconds to wait for an interactive selection
    #[arg(long, default_value_t = 60, value_name = "SECS")]
    select_timeout: u64,

    /// Skip the selection prompt and take the first candidate
    /// (implied by the CI environment variable)
    #[arg(short = 'y', long)]
    non_interactive: bool,

    /// Extra directory removed during cleanup (e.g. a bootstrap env)
    #[arg(long, value_name = "DIR")]
    env_dir: Option<PathBuf>,

    /// Stage 1 program: PDF -> page images
    #[arg(long, env = "PDF2TXT_RASTERIZE", default_value = "pdf2txt-rasterize")]
    rasterize: String,

    /// Stage 2 program: images -> enhanced images
    #[arg(long, env = "PDF2TXT_ENHANCE", default_value = "pdf2txt-enhance")]
    enhance: String,

    /// Stage 3 program: enhanced images -> per-page transcriptions
    #[arg(long, env = "PDF2TXT_TRANSCRIBE", default_value = "pdf2txt-transcribe")]
    transcribe: String,

    /// Stage 4 program: transcriptions -> one text file
    #[arg(long, env = "PDF2TXT_COMBINE", default_value = "pdf2txt-combine")]
    combine: String,

    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress spinners and per-stage status lines
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err:#}", red("✘"));
            1
        }
    };
    // Exit without waiting for runtime teardown: a selector read left
    // pending on an open stdin would keep the blocking pool alive and
    // the process with it.
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let mut builder = RunConfig::builder()
        .working_dir(&cli.working_dir)
        .keep_artifacts(cli.keep)
        .non_interactive(cli.non_interactive || std::env::var_os("CI").is_some())
        .select_timeout(Duration::from_secs(cli.select_timeout))
        .rasterize_program(cli.rasterize)
        .enhance_program(cli.enhance)
        .transcribe_program(cli.transcribe)
        .combine_program(cli.combine);
    if let Some(input) = cli.input {
        builder = builder.input(input);
    }
    if let Some(env_dir) = cli.env_dir {
        builder = builder.env_dir(env_dir);
    }
    let show_progress = !cli.quiet && !cli.json && cli.verbose == 0;
    if show_progress {
        builder = builder.progress(Arc::new(CliProgress::new()));
    }

    let report = PipelineRun::new(builder.build()).execute().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if !cli.quiet {
        for stage in &report.stages {
            println!(
                "  {} {:<11} {}",
                green("✔"),
                stage.stage,
                dim(&format_duration(stage.duration_ms))
            );
        }
        println!(
            "  {} total       {}",
            cyan("•"),
            dim(&format_duration(report.total_duration_ms))
        );
    }
    if let Some(path) = &report.final_artifact {
        println!(
            "{} {}",
            green("✔"),
            bold(&format!("Transcription written to {}", path.display()))
        );
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "pdf2txt=debug,info",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Progress rendering ────────────────────────────────────────────────────

struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl PipelineProgress for CliProgress {
    fn on_stage_start(&self, index: usize, total: usize, stage: &str, program: &str) {
        self.bar.set_prefix(format!("[{}/{total}]", index + 1));
        self.bar.set_message(format!("{stage} ({program})"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_stage_complete(
        &self,
        index: usize,
        total: usize,
        stage: &str,
        succeeded: bool,
        duration_ms: u64,
    ) {
        let mark = if succeeded { green("✔") } else { red("✘") };
        self.bar.println(format!(
            "[{}/{total}] {mark} {stage} {}",
            index + 1,
            dim(&format_duration(duration_ms))
        ));
    }

    fn on_run_complete(&self, _succeeded: bool) {
        self.bar.finish_and_clear();
    }
}

// ── Output helpers ────────────────────────────────────────────────────────

fn paint(code: &str, text: &str) -> String {
    if std::env::var_os("NO_COLOR").is_some() {
        text.to_string()
    } else {
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn green(text: &str) -> String {
    paint("32", text)
}

fn red(text: &str) -> String {
    paint("31", text)
}

fn cyan(text: &str) -> String {
    paint("36", text)
}

fn bold(text: &str) -> String {
    paint("1", text)
}

fn dim(text: &str) -> String {
    paint("2", text)
}

fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}
