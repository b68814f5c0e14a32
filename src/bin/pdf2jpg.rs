//! CLI binary for pdf2jpg.
//!
//! A thin shim over the library crate: maps CLI flags to a `Job` and a
//! `ConversionConfig`, drives the engine, and renders its events.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2jpg::{
    reveal_in_file_manager, ConversionConfig, ConversionEngine, ConversionEvent, DocumentLoader,
    DocumentStatus, Job, JobProgress, PdfiumLoader, RunOutcome, SettingsStore,
};
use std::io;
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Terminal progress view ───────────────────────────────────────────────────

/// Renders engine events as a progress bar plus one log line per finished
/// document. The bar position is recomputed from the projection on every
/// event.
struct TerminalView {
    bar: Option<ProgressBar>,
    projection: JobProgress,
}

impl TerminalView {
    fn new(job: &Job, show_progress: bool) -> Self {
        let projection = JobProgress::from_job(job);
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(projection.total_pages() as u64);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>4}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);
            bar.set_style(style);
            bar.set_prefix("Converting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Self { bar, projection }
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn on_event(&mut self, event: &ConversionEvent) {
        self.projection.apply(event);

        match event {
            ConversionEvent::Progress { document_index, .. } => {
                if let (Some(bar), Some(doc)) =
                    (&self.bar, self.projection.documents.get(*document_index))
                {
                    bar.set_length(self.projection.total_pages() as u64);
                    bar.set_position(self.projection.attempted_pages() as u64);
                    bar.set_message(format!(
                        "{} {}/{}",
                        doc.name, doc.last_page, doc.page_count
                    ));
                }
            }
            ConversionEvent::StatusChanged {
                document_index,
                status,
            } => {
                let Some(doc) = self.projection.documents.get(*document_index) else {
                    return;
                };
                let mark = match status {
                    DocumentStatus::Pending | DocumentStatus::InProgress => return,
                    DocumentStatus::Completed if doc.completed_pages < doc.page_count => {
                        yellow("⚠")
                    }
                    DocumentStatus::Completed => green("✓"),
                    DocumentStatus::Failed => red("✗"),
                    DocumentStatus::Skipped => dim("–"),
                    DocumentStatus::Cancelled => yellow("■"),
                };
                self.println(format!(
                    "  {} {:<40} {:>5}/{:<5} {}",
                    mark,
                    doc.name,
                    doc.completed_pages,
                    doc.page_count,
                    dim(status.as_str()),
                ));
            }
            ConversionEvent::Error { message } => {
                self.println(format!("{} {}", red("✘"), red(message)));
            }
            ConversionEvent::Finished => {
                if let Some(bar) = &self.bar {
                    bar.finish_and_clear();
                }
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert two PDFs into ~/Pictures/Scans/<name>/...
  pdf2jpg -d ~/Pictures -n Scans report.pdf invoice.pdf

  # Re-use the last destination, higher resolution
  pdf2jpg -n "March invoices" --dpi 300 invoices/*.pdf

  # Print the final job state as JSON and open the result
  pdf2jpg -n Batch --json --open *.pdf

OUTPUT LAYOUT:
  <dest>/<name>/<document>/<document>_page_<N>.jpg
  Documents whose names collide get _1, _2, … suffixes in queue order.
  Page numbers are zero-padded to the width of the page count.

  Password-protected PDFs are skipped. Press Ctrl-C to stop after the
  current page; images already written are kept.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Override log filtering (e.g. pdf2jpg=debug)
"#;

/// Convert PDF documents into per-page JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2jpg",
    version,
    about = "Convert PDF documents into per-page JPEG images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to convert, in processing order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Destination folder. Defaults to the last destination used.
    #[arg(short, long, env = "PDF2JPG_DEST")]
    dest: Option<PathBuf>,

    /// Name of the job folder created inside the destination.
    #[arg(short, long, env = "PDF2JPG_NAME")]
    name: String,

    /// Rendering resolution (72–600 DPI).
    #[arg(long, env = "PDF2JPG_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (0–100).
    #[arg(long, env = "PDF2JPG_QUALITY", default_value_t = 80,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Open the job folder in the file manager when done.
    #[arg(long)]
    open: bool,

    /// Print the final job (statuses, page counts, failed pages) as JSON.
    #[arg(long, env = "PDF2JPG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2JPG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2JPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2JPG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs unless --verbose is set.
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

    // ── Settings & destination ───────────────────────────────────────────
    let settings = SettingsStore::in_home_dir();
    let destination = match &cli.dest {
        Some(dest) => {
            let dest = std::path::absolute(dest)
                .with_context(|| format!("Cannot resolve destination {}", dest.display()))?;
            if let Some(ref store) = settings {
                store.remember_destination(&dest);
            }
            Some(dest)
        }
        None => settings.as_ref().and_then(SettingsStore::last_destination),
    };
    let destination =
        destination.context("No destination given and none remembered; pass --dest <DIR>")?;

    let config = ConversionConfig::builder()
        .dpi(cli.dpi)
        .quality(cli.quality)
        .build()
        .context("Invalid configuration")?;

    // ── Bind pdfium and queue documents ──────────────────────────────────
    let pdfium_lib = cli.pdfium_lib.clone();
    let loader: Arc<dyn DocumentLoader> = Arc::new(
        tokio::task::spawn_blocking(move || PdfiumLoader::bind(pdfium_lib.as_deref()))
            .await
            .context("pdfium binding task failed")??,
    );

    let mut job = Job::new(Some(destination), cli.name.clone());
    let inputs = cli.inputs.clone();
    let queue_loader = Arc::clone(&loader);
    job = tokio::task::spawn_blocking(move || {
        job.add_paths(&inputs, queue_loader.as_ref());
        job
    })
    .await
    .context("inspection task failed")?;

    let dropped = cli.inputs.len().saturating_sub(job.items.len());
    if dropped > 0 && !cli.quiet {
        eprintln!(
            "{} {} input(s) ignored (duplicate, unreadable, or not a PDF)",
            yellow("⚠"),
            dropped
        );
    }
    if !job.can_start() {
        anyhow::bail!("Nothing to convert: no readable, unencrypted PDFs were queued");
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Converting {} documents ({} pages) → {}",
                job.items.len(),
                job.total_pages(),
                job.job_folder_path().unwrap_or_default().display()
            ))
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let engine = ConversionEngine::new(loader, config);
    let mut view = TerminalView::new(&job, show_progress);
    let mut run = engine.start(job);
    let cancel = run.cancel_token();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = run.events.recv() => match event {
                Some(event) => {
                    if !cli.quiet && !cli.json {
                        view.on_event(&event);
                    }
                    if event == ConversionEvent::Finished {
                        break;
                    }
                }
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                cancel.cancel();
                if !cli.quiet {
                    view.println(yellow("Cancelling after the current page…"));
                }
            }
        }
    }

    let outcome = run.join().await.context("Conversion failed")?;
    report(&cli, &outcome)?;

    if cli.open {
        if let Some(folder) = outcome.job.job_folder_path() {
            reveal_in_file_manager(&folder)
                .with_context(|| format!("Failed to open {}", folder.display()))?;
        }
    }

    if let Some(fatal) = outcome.fatal {
        return Err(anyhow::Error::new(fatal).context("Conversion aborted"));
    }
    Ok(())
}

/// Print the end-of-run summary.
fn report(cli: &Cli, outcome: &RunOutcome) -> Result<()> {
    let job = &outcome.job;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(job).context("Failed to serialise job")?
        );
        return Ok(());
    }
    if cli.quiet || outcome.fatal.is_some() {
        return Ok(());
    }

    let s = job.summary();
    let mark = if s.failed == 0 && s.failed_pages == 0 && !outcome.cancelled {
        green("✔")
    } else if s.completed == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {}/{} documents  {}/{} pages  →  {}",
        mark,
        s.completed,
        s.documents,
        s.completed_pages,
        s.total_pages,
        bold(&job.job_folder_path().unwrap_or_default().display().to_string()),
    );
    if s.failed + s.skipped + s.cancelled > 0 {
        eprintln!(
            "   {} failed  /  {} skipped  /  {} cancelled",
            red(&s.failed.to_string()),
            dim(&s.skipped.to_string()),
            yellow(&s.cancelled.to_string()),
        );
    }
    for item in job.items.iter().filter(|i| !i.failed_pages.is_empty()) {
        eprintln!(
            "   {} {}: pages {:?} failed",
            red("✗"),
            item.display_name,
            item.failed_pages
        );
    }
    Ok(())
}
