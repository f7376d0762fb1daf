//! CLI binary for doc2md.
//!
//! A thin shim over the library crate: maps flags to `ConversionConfig`,
//! renders a spinner while the model streams, and prints a summary line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc2md::credentials::{self, Scope};
use doc2md::{convert_to_file, ConversionConfig, ConversionProgress, ConversionStats};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Terminal progress: a spinner that tracks the streamed character count.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Extracting");
        bar.set_message("reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgress for CliProgress {
    fn on_extraction_complete(&self, pages: usize, images_saved: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Extracted {pages} page{}, {images_saved} image{}",
                if pages == 1 { "" } else { "s" },
                if images_saved == 1 { "" } else { "s" },
            ))
        ));
    }

    fn on_generation_start(&self) {
        self.bar.set_prefix("Converting");
        self.bar.set_message("waiting for model…");
    }

    fn on_generation_progress(&self, total_chars: usize) {
        self.bar
            .set_message(format!("{total_chars} chars received"));
    }

    fn on_complete(&self, _stats: &ConversionStats) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input (report.pdf -> report.md)
  doc2md report.pdf

  # Explicit output path
  doc2md contract.docx -o out/contract.md

  # OCR a screenshot
  doc2md screenshot.png

  # Keep one section of Markdown per PDF page
  doc2md --respect-pages slides.pdf

  # Use a different model or endpoint
  doc2md --model gpt-4o report.pdf
  doc2md --base-url http://localhost:11434/v1 --model llava report.pdf

  # Store the API key once
  doc2md setup            # current directory (.doc2md.json)
  doc2md setup --global   # user config directory

SUPPORTED INPUTS:
  .pdf .docx .png .jpg .jpeg .gif .webp

ENVIRONMENT VARIABLES:
  DOC2MD_API_KEY    API key (takes precedence over config files)
  DOC2MD_MODEL      Override the model ID
  DOC2MD_BASE_URL   OpenAI-compatible endpoint base URL
"#;

/// Convert PDF, DOCX, and image files to Markdown using a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert PDF, DOCX, and image files to Markdown using a vision LLM",
    arg_required_else_help = true,
    args_conflicts_with_subcommands = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input document (.pdf, .docx, or an image file).
    input: Option<PathBuf>,

    /// Output Markdown path. Defaults to the input path with a .md extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model ID sent to the endpoint.
    #[arg(long, env = "DOC2MD_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(long, env = "DOC2MD_BASE_URL")]
    base_url: Option<String>,

    /// Emit one Markdown section per PDF page, separated by horizontal rules.
    #[arg(long)]
    respect_pages: bool,

    /// PDF page screenshot scale factor (0.5-4.0).
    #[arg(long, default_value_t = 1.5)]
    render_scale: f32,

    /// Sampling temperature (0.0-2.0).
    #[arg(long, default_value_t = 0.1)]
    temperature: f32,

    /// Max model output tokens.
    #[arg(long, default_value_t = 8192)]
    max_tokens: usize,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the API key in a doc2md config file.
    Setup {
        /// Write to the user config directory instead of the current directory.
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Library logs go to stderr and stay out of the spinner's way.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    if let Some(Command::Setup { global }) = cli.command {
        return run_setup(if global { Scope::Global } else { Scope::Local });
    }

    let input = cli
        .input
        .clone()
        .context("No input file given (see doc2md --help)")?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("md"));

    let mut builder = ConversionConfig::builder()
        .respect_pages(cli.respect_pages)
        .render_scale(cli.render_scale)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref base_url) = cli.base_url {
        builder = builder.base_url(base_url);
    }
    if show_progress {
        builder = builder.progress(CliProgress::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let result = convert_to_file(&input, &output, &config)
        .await
        .context("Conversion failed")?;

    if !cli.quiet {
        let stats = &result.stats;
        eprintln!(
            "{}  {} page{}  {}ms  →  {}",
            green("✔"),
            stats.pages,
            if stats.pages == 1 { "" } else { "s" },
            stats.total_duration_ms,
            bold(&result.output_path.display().to_string()),
        );
        let kept = stats.images_saved - stats.images_deleted;
        if stats.images_saved > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{kept} image{} kept, {} deleted",
                    if kept == 1 { "" } else { "s" },
                    stats.images_deleted
                ))
            );
        }
    }

    Ok(())
}

/// Prompt for an API key on stdin and store it.
fn run_setup(scope: Scope) -> Result<()> {
    eprint!("API key: ");
    io::stderr().flush().ok();

    let mut key = String::new();
    io::stdin()
        .read_line(&mut key)
        .context("Failed to read API key from stdin")?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("No API key entered");
    }

    let path = credentials::store_api_key(key, scope).context("Failed to store API key")?;
    eprintln!("{} API key saved to {}", green("✔"), bold(&path.display().to_string()));
    Ok(())
}
