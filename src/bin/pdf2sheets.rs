//! CLI binary for pdf2sheets.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! picks a document source and a workbook, and prints the result.

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2sheets::{
    plan, run, select_document, DocumentSource, EmptyPagePolicy, HttpExtractor, JsonWorkbook,
    LocalFolder, Pdf2SheetsError, ProgressCallback, RunConfig, RunProgressCallback, RunReport,
    SingleFile, DEFAULT_MAX_PAGES_PER_BATCH,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over batches, one log line per batch.
struct CliProgressCallback {
    bar: ProgressBar,
    batch_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many batches there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            batch_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total_batches: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} batches  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_batches as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn batch_elapsed_secs(&self) -> f64 {
        self.batch_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize, total_batches: usize) {
        self.activate_bar(total_batches);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Processing {total_pages} pages in {total_batches} batches…"
            ))
        ));
    }

    fn on_batch_start(&self, batch: usize, _total: usize) {
        if let Ok(mut t) = self.batch_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("batch {batch}"));
    }

    fn on_batch_complete(&self, batch: usize, total: usize, pages_written: usize) {
        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            batch,
            total,
            dim(&format!("{pages_written:>3} sheets")),
            dim(&format!("{:.1}s", self.batch_elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_error(&self, batch: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}  {}",
            red("✗"),
            batch,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.batch_elapsed_secs())),
        ));
        self.bar.abandon();
    }

    fn on_run_complete(&self, sheets_written: usize, sheets_deleted: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} sheets written, {} stale sheets deleted",
            green("✔"),
            bold(&sheets_written.to_string()),
            bold(&sheets_deleted.to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process the newest file in a folder
  pdf2sheets ./inbox --endpoint http://localhost:5000/extract

  # Process one file into a specific workbook, 5 pages per request
  pdf2sheets report.pdf --endpoint http://ocr:5000/ --workbook report.json --batch-size 5

  # Show how a document would be split (no requests are sent)
  pdf2sheets report.pdf --endpoint http://ocr:5000/ --plan-only

  # Machine-readable run report
  pdf2sheets ./inbox --endpoint http://ocr:5000/ --json > report.json

MARKDOWN CONTRACT:
  The service must introduce every page with a line of the form
      ## Page 7        or        --- Page 7 ---
  Page 7 is written to sheet d07. Sheets named d + digits that the current
  document no longer produces are deleted after the last batch.

EXIT STATUS:
  0  run completed, or there was nothing to do (empty folder, PDF with no pages)
  1  any other failure; sheets written before the failure are kept

ENVIRONMENT VARIABLES:
  PDF2SHEETS_ENDPOINT     Extraction service URL
  PDF2SHEETS_WORKBOOK     Workbook file
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Overrides the log filter (e.g. pdf2sheets=debug)
"#;

/// Split PDFs into page batches, extract them remotely and write one sheet
/// per page.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2sheets",
    version,
    about = "Turn PDF pages into spreadsheet tabs via a remote extraction service",
    long_about = "Cuts a PDF into small page batches, sends each batch to an extraction \
service that answers with Markdown, and writes every page's tables and text into its own \
sheet (d01, d02, …) of a JSON workbook. Stale page sheets from earlier runs are removed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder (the newest file is used) or a single file.
    source: PathBuf,

    /// Extraction service URL. Each batch is POSTed here.
    #[arg(long, env = "PDF2SHEETS_ENDPOINT")]
    endpoint: String,

    /// Workbook file to update. Created if missing.
    #[arg(short, long, env = "PDF2SHEETS_WORKBOOK", default_value = "sheets.json")]
    workbook: PathBuf,

    /// Maximum pages per extraction request.
    #[arg(short, long, env = "PDF2SHEETS_BATCH_SIZE", default_value_t = DEFAULT_MAX_PAGES_PER_BATCH,
          value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    batch_size: usize,

    /// Per-request timeout in seconds. Default: the HTTP client's own.
    #[arg(long, env = "PDF2SHEETS_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2SHEETS_PASSWORD")]
    password: Option<String>,

    /// Let a page marker with no content release its old sheet for deletion.
    #[arg(long, env = "PDF2SHEETS_RELEASE_EMPTY_PAGES")]
    release_empty_pages: bool,

    /// Parse service output as-is, without stripping fences and invisible characters.
    #[arg(long, env = "PDF2SHEETS_NO_CLEAN")]
    no_clean: bool,

    /// Path to libpdfium. Default: ./ then the system library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the batch layout only; send nothing, write nothing.
    #[arg(long)]
    plan_only: bool,

    /// Print the run report (or plan) as JSON on stdout.
    #[arg(long, env = "PDF2SHEETS_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2SHEETS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2SHEETS_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2SHEETS_NO_PROGRESS")]
    no_progress: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.plan_only;
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

    match try_main(&cli, show_progress) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", red("✘"));
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: &Cli, show_progress: bool) -> Result<ExitCode> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;
    let source = open_source(&cli.source);

    // ── Plan-only mode ───────────────────────────────────────────────────
    if cli.plan_only {
        let (file, bytes) = match select_document(&*source) {
            Ok(selected) => selected,
            Err(e) if e.is_benign() => return Ok(nothing_to_do(cli, &e)),
            Err(e) => return Err(e).context("Failed to select document"),
        };
        let layout = match plan(&bytes, &config) {
            Ok(layout) => layout,
            Err(e) if e.is_benign() => return Ok(nothing_to_do(cli, &e)),
            Err(e) => return Err(e).context("Failed to load PDF"),
        };

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&layout).context("Failed to serialise plan")?
            );
        } else {
            println!("File:     {}", file.name);
            println!("Pages:    {}", layout.total_pages);
            println!("Batches:  {}", layout.batches.len());
            for (i, (first, last)) in layout.batches.iter().enumerate() {
                println!("  {:>3}  pages {}-{}", i + 1, first, last);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let extractor = HttpExtractor::new(&config).context("Failed to build HTTP client")?;
    let mut workbook = JsonWorkbook::open(&cli.workbook)
        .with_context(|| format!("Failed to open workbook {}", cli.workbook.display()))?;

    let report = match run(&*source, &extractor, &mut workbook, &config) {
        Ok(report) => report,
        Err(e) if e.is_benign() => return Ok(nothing_to_do(cli, &e)),
        Err(e) => return Err(e).context("Run failed"),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report, &cli.workbook, show_progress);
    }
    Ok(ExitCode::SUCCESS)
}

/// Report a benign outcome; the process still succeeds.
fn nothing_to_do(cli: &Cli, e: &Pdf2SheetsError) -> ExitCode {
    info!("Nothing to do: {}", e);
    if !cli.quiet && !cli.json {
        eprintln!("{} Nothing to do: {}", cyan("◆"), e);
    }
    ExitCode::SUCCESS
}

fn print_summary(report: &RunReport, workbook: &Path, show_progress: bool) {
    // The progress callback already printed the per-batch lines and totals.
    if !show_progress {
        eprintln!(
            "Processed '{}': {} pages, {} sheets written, {} deleted",
            report.file,
            report.total_pages,
            report.sheets_written.len(),
            report.sheets_deleted.len()
        );
    }
    if !report.duplicate_pages.is_empty() {
        eprintln!(
            "{} Pages appearing more than once (last one kept): {:?}",
            cyan("⚠"),
            report.duplicate_pages
        );
    }
    eprintln!(
        "   {}  {}ms  →  {}",
        dim(&format!("{} batches", report.batches.len())),
        report.duration_ms,
        bold(&workbook.display().to_string()),
    );
}

fn open_source(path: &Path) -> Box<dyn DocumentSource> {
    if path.is_dir() {
        Box::new(LocalFolder::new(path))
    } else {
        Box::new(SingleFile::new(path))
    }
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let policy = if cli.release_empty_pages {
        EmptyPagePolicy::Release
    } else {
        EmptyPagePolicy::Retain
    };

    let mut builder = RunConfig::builder(cli.endpoint.clone())
        .max_pages_per_batch(cli.batch_size)
        .clean_markdown(!cli.no_clean)
        .empty_page_policy(policy);

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
