//! CLI binary for fileconv.
//!
//! A thin shim over the library crate that maps CLI flags to `ClientConfig`,
//! renders workflow feedback in the terminal and exits non-zero when the
//! cycle did not end in a download.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fileconv::{
    convert_file_with_progress, inspect, list_formats, ClientConfig, Feedback, FileConvError,
    NoopProgress, ProgressObserver, Severity, Stage, WorkflowProgress, DEFAULT_BACKEND_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// Render a feedback line with its severity's display style.
fn styled(feedback: &Feedback) -> String {
    let style = feedback.severity.style();
    let colour = match style.color {
        Some("green") => "32",
        Some("orange") => "33",
        Some("red") => "31",
        _ => "",
    };
    let mut codes = Vec::new();
    if style.bold {
        codes.push("1");
    }
    if !colour.is_empty() {
        codes.push(colour);
    }
    if codes.is_empty() {
        feedback.message.clone()
    } else {
        format!("\x1b[{}m{}\x1b[0m", codes.join(";"), feedback.message)
    }
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Neutral => "◆",
        Severity::Success => "✔",
        Severity::Warning => "⚠",
        Severity::Error => "✘",
    }
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal observer: a spinner whose prefix follows the workflow stage, and
/// one printed line per feedback message.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl WorkflowProgress for CliProgress {
    fn on_stage(&self, _from: Stage, to: Stage) {
        if to.is_busy() {
            self.bar.set_prefix(to.to_string());
        } else if matches!(to, Stage::Done | Stage::Error) {
            self.bar.finish_and_clear();
        }
    }

    fn on_feedback(&self, feedback: &Feedback) {
        let line = format!("{} {}", marker(feedback.severity), styled(feedback));
        if self.bar.is_finished() {
            eprintln!("{line}");
        } else {
            self.bar.println(line);
        }
    }
}

/// Prints feedback without a spinner (`--no-progress`).
struct PlainProgress;

impl WorkflowProgress for PlainProgress {
    fn on_feedback(&self, feedback: &Feedback) {
        eprintln!("{} {}", marker(feedback.severity), styled(feedback));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a JPEG to PNG into the current directory
  fileconv photo.jpg --to png

  # Write into another directory
  fileconv talk.wav --to mp3 -o ~/Music

  # Which formats does the backend accept?
  fileconv --list-formats

  # What can this file become? (nothing is uploaded)
  fileconv --inspect-only report.docx

  # Machine-readable result
  fileconv --json photo.jpg --to webp > result.json

ENVIRONMENT VARIABLES:
  FILECONV_BACKEND_URL    Backend base URL (default http://127.0.0.1:8000)
  FILECONV_TO             Target format
  FILECONV_OUTPUT_DIR     Output directory
  FILECONV_TIMEOUT        Per-request timeout in seconds
  RUST_LOG                Overrides the log filter (e.g. fileconv=debug)
"#;

/// Convert files through a remote conversion backend.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert files through a remote conversion backend",
    long_about = "Upload a local file to a conversion backend, convert it to the chosen \
format and save the result. The backend decides which formats are accepted and which \
conversions are possible.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file to convert.
    input: Option<PathBuf>,

    /// Target format (e.g. png, mp3, pdf). Case-insensitive.
    #[arg(short, long, env = "FILECONV_TO")]
    to: Option<String>,

    /// Directory to save the converted file into.
    #[arg(short, long, env = "FILECONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Backend base URL.
    #[arg(long, env = "FILECONV_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Per-request timeout in seconds. No timeout when unset.
    #[arg(long, env = "FILECONV_TIMEOUT")]
    timeout: Option<u64>,

    /// List the formats the backend accepts and exit.
    #[arg(long)]
    list_formats: bool,

    /// Show the source format and its conversions, no upload.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library logs quiet while the spinner owns the terminal.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── List-formats mode ────────────────────────────────────────────────
    if cli.list_formats {
        let formats = list_formats(&config)
            .await
            .context("Failed to load formats")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&formats).context("Failed to serialise formats")?
            );
        } else {
            for f in formats {
                println!("{f}");
            }
        }
        return Ok(());
    }

    let Some(input) = cli.input.as_ref() else {
        bail!("No input file given (see --help)");
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(input, &config)
            .await
            .map_err(user_error)
            .context("Failed to inspect file")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise inspection")?
            );
        } else {
            println!("File:         {}", info.file_name);
            println!("Format:       {}", info.raw_format);
            if info.format != info.raw_format {
                println!("Canonical:    {}", info.format);
            }
            println!("Accepted:     {}", info.accepted);
            let targets: Vec<&str> = info.conversions.iter().map(|f| f.as_str()).collect();
            println!(
                "Converts to:  {}",
                if targets.is_empty() {
                    "-".to_string()
                } else {
                    targets.join(", ")
                }
            );
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let Some(to) = cli.to.as_deref() else {
        bail!("No target format given (use --to)");
    };

    let progress: ProgressObserver = if show_progress {
        CliProgress::new() as ProgressObserver
    } else if cli.quiet || cli.json {
        Arc::new(NoopProgress)
    } else {
        Arc::new(PlainProgress)
    };

    let report = convert_file_with_progress(input, to, &cli.output_dir, &config, progress)
        .await
        .map_err(user_error)
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "   {} → {}  {}  {}ms",
            report.source_format,
            report.target_format,
            dim(&format!("{} bytes", report.bytes)),
            report.duration_ms,
        );
        eprintln!("   {}", bold(&report.output_path.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder().backend_url(&cli.backend);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

/// Surface the workflow's own message rather than the error chain.
fn user_error(e: FileConvError) -> anyhow::Error {
    match e {
        FileConvError::WorkflowFailed { feedback } => anyhow::anyhow!(feedback.message),
        other => other.into(),
    }
}
