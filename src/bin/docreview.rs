//! CLI binary for edgequake-docreview.
//!
//! A thin shim over the library crate: flags map to `ReviewConfig` and
//! `ConnectionSettings`, results are printed as text or JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_docreview::{
    AnalysisRequest, ChecklistCatalog, ConnectionSettings, Review, ReviewConfig, ReviewEngine,
    ReviewStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List checklist categories
  docreview --checklists checklists.json categories

  # Extract text only (no model needed)
  docreview extract scan.pdf

  # Review against a checklist with a local model
  docreview --checklists checklists.json review charter.docx \
      --category "Project Charter" --provider ollama --model llama3

  # Review with OpenAI, JSON output
  docreview review plan.pdf --provider openai --model gpt-4o --json

  # Verify a connection before using it
  docreview test-connection --provider gemini --model gemini-1.5-flash

SUPPORTED PROVIDERS:
  Provider   API key   Images attached for models containing
  ────────   ───────   ─────────────────────────────────────
  openai     required  gpt-4o, vision
  gemini     required  gemini-1.5
  ollama     no        llava, vision

ENVIRONMENT VARIABLES:
  DOCREVIEW_PROVIDER     Provider name (openai, ollama, gemini)
  DOCREVIEW_MODEL        Model identifier
  DOCREVIEW_API_KEY      API key for the provider
  DOCREVIEW_BASE_URL     OpenAI-compatible base URL or Ollama host
  DOCREVIEW_CHECKLISTS   Path to the checklist catalog JSON
  PDFIUM_LIB_PATH        Path to libpdfium (else the system library)
  RUST_LOG               Log filter, overrides --verbose/--quiet
"#;

/// Score documents against checklists using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docreview",
    version,
    about = "Score documents against checklists using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Checklist catalog JSON (`{"sheets": [...], "data": {...}}`).
    #[arg(long, global = true, env = "DOCREVIEW_CHECKLISTS")]
    checklists: Option<PathBuf>,

    /// Disable the OCR fallback.
    #[arg(long, global = true, env = "DOCREVIEW_NO_OCR")]
    no_ocr: bool,

    /// Tesseract language code(s), e.g. `eng` or `eng+fra`.
    #[arg(long, global = true, env = "DOCREVIEW_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Minimum embedded characters per PDF page before OCR kicks in.
    #[arg(long, global = true, env = "DOCREVIEW_OCR_MIN_CHARS", default_value_t = 100)]
    ocr_min_chars: usize,

    /// HTTP timeout for model calls, in seconds.
    #[arg(long, global = true, env = "DOCREVIEW_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCREVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "DOCREVIEW_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List checklist categories and their item counts.
    Categories,

    /// Extract text from a document without calling a model.
    Extract {
        /// Document to extract (.pdf, .docx, .txt, .md, .xlsx, .csv, ...).
        file: PathBuf,

        /// Output JSON (`{"text": ..., "images": [...]}`).
        #[arg(long)]
        json: bool,
    },

    /// Extract a document and review it with the model.
    Review {
        /// Document to review.
        file: PathBuf,

        /// Checklist category to evaluate against.
        #[arg(short = 'C', long)]
        category: Option<String>,

        /// Free-text instructions passed to the model.
        #[arg(short, long, default_value = "")]
        instructions: String,

        /// Output the review as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Send a minimal prompt to check a connection.
    TestConnection {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Provider: openai, ollama, gemini.
    #[arg(long, env = "DOCREVIEW_PROVIDER")]
    provider: Option<String>,

    /// Model identifier, e.g. gpt-4o, llama3, gemini-1.5-flash.
    #[arg(long, env = "DOCREVIEW_MODEL")]
    model: Option<String>,

    /// API key (required for openai and gemini).
    #[arg(long, env = "DOCREVIEW_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible base URL or Ollama host (ignored for gemini).
    #[arg(long, env = "DOCREVIEW_BASE_URL")]
    base_url: Option<String>,
}

impl ConnectionArgs {
    /// `None` when no provider/model was given, mirroring "no active connection".
    fn settings(&self) -> Option<ConnectionSettings> {
        let (provider, model) = (self.provider.as_ref()?, self.model.as_ref()?);
        let mut settings = ConnectionSettings::new(provider.clone(), model.clone());
        if let Some(key) = &self.api_key {
            settings = settings.with_api_key(key.clone());
        }
        if let Some(url) = &self.base_url {
            settings = settings.with_base_url(url.clone());
        }
        Some(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep INFO logs out of the way while the spinner is on screen.
    let show_spinner = !cli.quiet
        && match &cli.command {
            Command::Review { json, .. } => !*json,
            Command::TestConnection { .. } => true,
            Command::Categories | Command::Extract { .. } => false,
        };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
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
    let catalog = Arc::new(load_catalog(cli.checklists.as_deref())?);
    let engine = ReviewEngine::new(catalog, config);

    match &cli.command {
        Command::Categories => print_categories(engine.catalog()),
        Command::Extract { file, json } => {
            let doc = extract_file(&engine, file).await?;
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("Failed to serialise output")?
                );
            } else {
                let mut handle = io::stdout().lock();
                handle
                    .write_all(doc.text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !doc.text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
        }
        Command::Review {
            file,
            category,
            instructions,
            json,
            connection,
        } => {
            let doc = extract_file(&engine, file).await?;
            let mut request = AnalysisRequest::new(doc.text)
                .with_images(doc.images)
                .with_instructions(instructions.clone());
            if let Some(c) = category {
                request = request.with_category(c.clone());
            }

            let active = connection.settings();
            let spinner = spinner(show_spinner, "Waiting for the model…");
            let result = engine.analyze(&request, active.as_ref()).await;
            spinner.finish_and_clear();
            let review = result.context("Review failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&review).context("Failed to serialise review")?
                );
            } else {
                print_review(&review);
            }
        }
        Command::TestConnection { connection } => {
            let settings = connection
                .settings()
                .context("Both --provider and --model are required")?;
            let spinner = spinner(show_spinner, "Contacting the model…");
            let result = engine.test_connection(&settings).await;
            spinner.finish_and_clear();
            result.context("Connection test failed")?;
            eprintln!(
                "{} {}/{} is reachable",
                green("✔"),
                settings.provider,
                bold(&settings.model_name)
            );
        }
    }

    Ok(())
}

/// Map global CLI flags to `ReviewConfig`.
fn build_config(cli: &Cli) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .ocr_enabled(!cli.no_ocr)
        .ocr_language(cli.ocr_lang.clone())
        .ocr_min_chars_per_page(cli.ocr_min_chars);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

fn load_catalog(path: Option<&Path>) -> Result<ChecklistCatalog> {
    match path {
        Some(p) => ChecklistCatalog::from_path(p).context("Failed to load checklists"),
        None => Ok(ChecklistCatalog::empty()),
    }
}

async fn extract_file(
    engine: &ReviewEngine,
    path: &Path,
) -> Result<edgequake_docreview::ExtractedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    engine
        .extract(&filename, bytes)
        .await
        .with_context(|| format!("Failed to extract {}", path.display()))
}

fn spinner(enabled: bool, message: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_categories(catalog: &ChecklistCatalog) {
    if catalog.is_empty() {
        eprintln!("{}", dim("No checklists loaded (use --checklists)."));
        return;
    }
    for name in catalog.categories() {
        println!("{:<40} {}", name, dim(&format!("{} items", catalog.items_for(name).len())));
    }
}

fn print_review(review: &Review) {
    let score = review.score.to_string();
    let score = match review.score {
        80..=100 => green(&score),
        50..=79 => yellow(&score),
        _ => red(&score),
    };
    println!("{} {}/100", bold("Score:"), score);
    if review.is_degraded() {
        println!("{}", red("The model call failed; this is a fallback review."));
    }

    println!();
    println!("{}", bold("Checklist"));
    for item in &review.checklist {
        let mark = match item.status {
            ReviewStatus::Pass => green("✓"),
            ReviewStatus::Warning => yellow("⚠"),
            ReviewStatus::Fail => red("✗"),
            ReviewStatus::NotApplicable => dim("–"),
        };
        let heading = if item.section.is_empty() {
            item.item.clone()
        } else {
            format!("{} {}", dim(&format!("[{}]", item.section)), item.item)
        };
        println!("  {mark} {heading}");
        if !item.comment.is_empty() {
            println!("      {}", dim(&item.comment));
        }
    }

    if !review.suggestions.is_empty() {
        println!();
        println!("{}", bold("Suggestions"));
        for (i, s) in review.suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, s);
        }
    }

    if let Some(rewrite) = review.rewritten_content.as_deref().filter(|r| !r.trim().is_empty()) {
        println!();
        println!("{}", bold("Rewritten content"));
        println!("{rewrite}");
    }
}
