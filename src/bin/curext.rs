//! CLI binary for curriculum-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the result envelope.

use anyhow::{Context, Result};
use clap::Parser;
use curriculum_extract::structure::annotate;
use curriculum_extract::{
    extract, inspect, Envelope, ExtractError, ExtractionConfig, ExtractionKind, ExtractionProgressCallback,
    KindRequest, PageSelection, ProgressCallback, SourceFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished pass. Passes may finish out of
/// order in "all" mode.
struct CliProgressCallback {
    bar: ProgressBar,
    done: AtomicUsize,
    total: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            done: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        })
    }

    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        self.bar.set_message(format!("{done}/{total} passes"));
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, kinds: &[ExtractionKind]) {
        self.total.store(kinds.len(), Ordering::SeqCst);
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("0/{} passes", kinds.len()));
    }

    fn on_pass_complete(&self, kind: ExtractionKind, records: usize) {
        self.bar
            .println(format!("  {} {:<13} {}", green("✓"), kind.data_key(), dim(&format!("{records} records"))));
        self.advance();
    }

    fn on_pass_error(&self, kind: ExtractionKind, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<13} {}", red("✗"), kind.data_key(), red(&msg)));
        self.advance();
    }

    fn on_extraction_complete(&self, passes: usize, success_count: usize) {
        self.bar.finish_and_clear();
        if success_count == passes {
            eprintln!("{} {} passes completed", green("✔"), bold(&passes.to_string()));
        } else {
            eprintln!(
                "{} {}/{} passes completed",
                red("✘"),
                bold(&success_count.to_string()),
                passes
            );
        }
    }
}

const AFTER_HELP: &str = r#"KINDS:
  todo | all                  every family below
  programa | program          program metadata and stage hours
  competencias | competencies competency units
  raps | unidadRaps           learning outcomes with knowledge and criteria
  proyecto | project          formative project basic information
  fases | phases              project phases, in canonical order
  actividades | activities    project activities with their outcome codes

EXAMPLES:
  # Everything, pretty-printed
  curext programa.pdf --pretty

  # One family from a pre-tabularised document
  curext tablas.json --kind competencias

  # Learning outcomes split per RAP, with counts
  curext programa.pdf --kind todo --structure --summary -o salida.json

  # Only the first twelve pages of an encrypted document
  curext --pages 1-12 --password secreto programa.pdf

  # Page, table and row counts only
  curext --inspect-only programa.pdf

INPUT FORMATS:
  .json   {"pages":[{"number":1,"tables":[[["cell",null]]]}]}
  .pdf    text rows read through pdfium (set PDFIUM_LIB_PATH to a local libpdfium)
  Other extensions are sniffed from the first bytes; force one with --format.

OUTPUT:
  {"success": true, "data": {...}} on stdout, or
  {"success": false, "error": "..."} with a non-zero exit status.
  Logs go to stderr; RUST_LOG overrides -v/-q.
"#;

/// Extract curriculum records from tabular PDF or JSON documents.
#[derive(Parser, Debug)]
#[command(
    name = "curext",
    version,
    about = "Extract curriculum records from tabular PDF or JSON documents",
    long_about = "Extract program metadata, competency units, learning outcomes, formative-project \
information, phases and activities from curriculum documents (local files or URLs), printed as \
a JSON envelope.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Record family to extract, or `todo` for all of them.
    #[arg(short, long, env = "CUREXT_KIND", default_value = "todo")]
    kind: String,

    /// Write the envelope to this file instead of stdout.
    #[arg(short, long, env = "CUREXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Indent the JSON output.
    #[arg(long, env = "CUREXT_PRETTY")]
    pretty: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "CUREXT_PAGES", default_value = "all")]
    pages: String,

    /// Input format: auto, json, pdf.
    #[arg(long, env = "CUREXT_FORMAT", default_value = "auto")]
    format: SourceFormat,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CUREXT_PASSWORD")]
    password: Option<String>,

    /// Add `estructura`: learning outcomes split per RAP.
    #[arg(long, env = "CUREXT_STRUCTURE")]
    structure: bool,

    /// Add `resumen`: RAP counts per competency.
    #[arg(long, env = "CUREXT_SUMMARY")]
    summary: bool,

    /// Maximum passes running at once.
    #[arg(short, long, env = "CUREXT_CONCURRENCY", default_value_t = 6)]
    concurrency: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CUREXT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "CUREXT_NO_PROGRESS")]
    no_progress: bool,

    /// Print page, table and row counts only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CUREXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CUREXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the spinner; it reports the same events.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let shape = inspect(&cli.input, &config).await.context("Failed to inspect document")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&shape).context("Failed to serialise shape")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let kind: Result<KindRequest, ExtractError> = cli.kind.parse();
    let envelope = match kind {
        Ok(kind) => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
            } else {
                None
            };
            let config = build_config(&cli, progress)?;
            let result = extract(&cli.input, kind, &config).await.map(|mut data| {
                annotate(&mut data, cli.structure, cli.summary);
                data
            });
            Envelope::from_result(result)
        }
        Err(e) => Envelope::failure(e.to_string()),
    };

    let json = envelope.to_json(cli.pretty).context("Failed to serialise envelope")?;
    match cli.output {
        Some(ref path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("{}  →  {}", status_mark(envelope.success), bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
    }

    if let Some(ref error) = envelope.error {
        if !cli.quiet {
            eprintln!("{} {}", red("error:"), error);
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn status_mark(success: bool) -> String {
    if success {
        green("✔")
    } else {
        red("✘")
    }
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExtractionConfig::builder()
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout)
        .source_format(cli.format)
        .pages(pages);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}
