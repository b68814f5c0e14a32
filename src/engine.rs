//! The conversion engine: walks the queue document by document and page by
//! page, writing one JPEG per page.
//!
//! ## Run algorithm
//!
//! ```text
//! validate destination ──▶ create job folder ──▶ for each document:
//!     cancelled?      → Cancelled (this and every later document), stop
//!     InProgress
//!     encrypted?      → Skipped
//!     claim folder    → create it, else Failed
//!     re-open         → else Failed
//!     for each page:  cancelled? → Cancelled, stop pages
//!                     render → completed_pages += 1 | failed_pages.push(n)
//!                     Progress
//!     → Completed if any page succeeded, Failed if none did
//! Finished
//! ```
//!
//! Documents and pages are processed strictly one at a time. Cancellation is
//! checked before each document and before each page; an in-flight render is
//! never interrupted. Nothing written before a cancellation is removed.

use crate::config::ConversionConfig;
use crate::document::DocumentStatus;
use crate::error::Pdf2JpgError;
use crate::event::{CancelToken, ConversionEvent, EventSink};
use crate::job::Job;
use crate::naming::{page_filename, UsedNames};
use crate::pipeline::pdfium::DocumentLoader;
use crate::pipeline::render;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one run.
#[derive(Debug)]
pub struct RunOutcome {
    /// The job with final statuses and page counters.
    pub job: Job,
    /// Set when the run aborted before processing any document.
    pub fatal: Option<Pdf2JpgError>,
    /// Whether a cancellation request was observed during the run.
    pub cancelled: bool,
}

/// Drives conversion runs with a shared document loader.
#[derive(Clone)]
pub struct ConversionEngine {
    loader: Arc<dyn DocumentLoader>,
    config: ConversionConfig,
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("loader", &"<dyn DocumentLoader>")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionEngine {
    pub fn new(loader: Arc<dyn DocumentLoader>, config: ConversionConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Start a run on a blocking worker thread.
    ///
    /// Must be called from within a Tokio runtime. The engine owns `job`
    /// until [`ConversionHandle::join`] hands it back.
    pub fn start(&self, job: Job) -> ConversionHandle {
        let (sink, events) = EventSink::channel();
        let cancel = CancelToken::new();
        let engine = self.clone();
        let worker_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || engine.run(job, &worker_cancel, &sink));

        ConversionHandle {
            events,
            cancel,
            task,
        }
    }

    /// Execute a run synchronously on the calling thread.
    ///
    /// Always ends with exactly one [`ConversionEvent::Finished`].
    pub fn run(&self, mut job: Job, cancel: &CancelToken, events: &EventSink) -> RunOutcome {
        let started = Instant::now();
        job.reset_progress();
        job.running = true;

        let fatal = match prepare_job_folder(&job) {
            Ok(job_folder) => {
                info!(
                    "Converting {} documents ({} pages) into {}",
                    job.items.len(),
                    job.total_pages(),
                    job_folder.display()
                );
                self.process_documents(&mut job, &job_folder, cancel, events);
                None
            }
            Err(e) => {
                warn!("Run aborted: {}", e);
                events.emit(ConversionEvent::Error {
                    message: e.to_string(),
                });
                Some(e)
            }
        };

        job.running = false;
        job.cancelled = cancel.is_cancelled();
        events.emit(ConversionEvent::Finished);

        let summary = job.summary();
        info!(
            "Run finished in {}ms: {}/{} documents completed, {}/{} pages written{}",
            started.elapsed().as_millis(),
            summary.completed,
            summary.documents,
            summary.completed_pages,
            summary.total_pages,
            if job.cancelled { " (cancelled)" } else { "" }
        );

        RunOutcome {
            cancelled: job.cancelled,
            job,
            fatal,
        }
    }

    fn process_documents(
        &self,
        job: &mut Job,
        job_folder: &Path,
        cancel: &CancelToken,
        events: &EventSink,
    ) {
        let mut used = UsedNames::new();

        for index in 0..job.items.len() {
            if cancel.is_cancelled() {
                info!("Cancellation requested; skipping remaining documents");
                for (rest, item) in job.items.iter_mut().enumerate().skip(index) {
                    item.status = DocumentStatus::Cancelled;
                    events.status(rest, DocumentStatus::Cancelled);
                }
                break;
            }

            let status = self.process_document(job, index, job_folder, &mut used, cancel, events);
            job.items[index].status = status;
            events.status(index, status);
        }
    }

    /// Convert one document and return its terminal status.
    fn process_document(
        &self,
        job: &mut Job,
        index: usize,
        job_folder: &Path,
        used: &mut UsedNames,
        cancel: &CancelToken,
        events: &EventSink,
    ) -> DocumentStatus {
        let item = &mut job.items[index];
        item.status = DocumentStatus::InProgress;
        events.status(index, DocumentStatus::InProgress);

        if item.encrypted {
            info!("Skipping password-protected {}", item.path.display());
            return DocumentStatus::Skipped;
        }

        let folder_name = used.claim(&item.sanitized_name);
        let folder = job_folder.join(&folder_name);
        if let Err(e) = std::fs::create_dir_all(&folder) {
            warn!("Could not create {}: {}", folder.display(), e);
            return DocumentStatus::Failed;
        }

        let source = match self.loader.open(&item.path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not re-open document: {}", e);
                return DocumentStatus::Failed;
            }
        };

        let page_count = source.page_count();
        if page_count == 0 {
            warn!("{} has no pages on re-open", item.path.display());
            return DocumentStatus::Failed;
        }
        if page_count != item.page_count {
            warn!(
                "{} changed since it was queued: {} → {} pages",
                item.path.display(),
                item.page_count,
                page_count
            );
            item.page_count = page_count;
        }

        for page_index in 0..page_count {
            if cancel.is_cancelled() {
                info!(
                    "Cancelled {} after {}/{} pages",
                    item.display_name, item.completed_pages, page_count
                );
                return DocumentStatus::Cancelled;
            }

            let page_number = page_index + 1;
            let output = folder.join(page_filename(&folder_name, page_number, page_count));
            if render::render_page(source.as_ref(), page_index, &output, &self.config) {
                item.completed_pages += 1;
            } else {
                item.failed_pages.push(page_number);
            }
            events.progress(index, page_number, item.completed_pages);
        }
        drop(source);

        debug!(
            "{}: {}/{} pages written, failed {:?}",
            item.display_name, item.completed_pages, page_count, item.failed_pages
        );

        if item.completed_pages > 0 {
            DocumentStatus::Completed
        } else {
            DocumentStatus::Failed
        }
    }
}

/// Validate the destination and create the job folder.
fn prepare_job_folder(job: &Job) -> Result<PathBuf, Pdf2JpgError> {
    let Some(destination) = job.destination.as_deref() else {
        return Err(Pdf2JpgError::InvalidDestination {
            reason: "no destination folder selected".into(),
        });
    };
    if destination.as_os_str().is_empty() {
        return Err(Pdf2JpgError::InvalidDestination {
            reason: "destination path is empty".into(),
        });
    }
    if destination.exists() && !destination.is_dir() {
        return Err(Pdf2JpgError::InvalidDestination {
            reason: format!("'{}' is not a directory", destination.display()),
        });
    }

    let job_folder = destination.join(job.sanitized_folder_name());
    std::fs::create_dir_all(&job_folder).map_err(|source| Pdf2JpgError::FolderCreationFailed {
        path: job_folder.clone(),
        source,
    })?;
    Ok(job_folder)
}

/// A run in progress on a worker thread.
#[derive(Debug)]
pub struct ConversionHandle {
    /// Events from the worker, ending with [`ConversionEvent::Finished`].
    pub events: mpsc::UnboundedReceiver<ConversionEvent>,
    cancel: CancelToken,
    task: JoinHandle<RunOutcome>,
}

impl ConversionHandle {
    /// Ask the worker to stop at its next check point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run, for use from other tasks.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the worker and take back the job.
    pub async fn join(self) -> Result<RunOutcome, Pdf2JpgError> {
        self.task
            .await
            .map_err(|e| Pdf2JpgError::Internal(format!("Conversion worker panicked: {e}")))
    }
}
