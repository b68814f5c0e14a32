//! The conversion job and the consumer's view of it.
//!
//! [`Job`] is the batch: destination, job folder name and the ordered queue of
//! [`DocumentItem`]s. Queue order is processing order and decides who gets
//! the un-suffixed folder name when two documents sanitise to the same name.
//!
//! While a run is in flight the engine owns the `Job`. The consumer keeps a
//! [`JobProgress`] built from a snapshot taken before the run and updated only
//! from [`ConversionEvent`]s.

use crate::document::{inspect, DocumentItem, DocumentStatus};
use crate::event::ConversionEvent;
use crate::naming::sanitize_name;
use crate::pipeline::pdfium::DocumentLoader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One batch of documents to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    pub destination: Option<PathBuf>,
    /// Job folder name as typed by the user; see [`Job::sanitized_folder_name`].
    pub folder_name: String,
    pub items: Vec<DocumentItem>,
    /// Set by the engine for the duration of a run.
    pub running: bool,
    /// Set by the engine when the run observed a cancellation request.
    pub cancelled: bool,
}

impl Job {
    pub fn new(destination: Option<PathBuf>, folder_name: impl Into<String>) -> Self {
        Self {
            destination,
            folder_name: folder_name.into(),
            ..Self::default()
        }
    }

    /// A fresh, empty job that keeps only this job's destination.
    pub fn next_job(&self) -> Self {
        Self::new(self.destination.clone(), "")
    }

    pub fn sanitized_folder_name(&self) -> String {
        sanitize_name(&self.folder_name)
    }

    /// `<destination>/<sanitized folder name>`, if a destination is set.
    pub fn job_folder_path(&self) -> Option<PathBuf> {
        self.destination
            .as_ref()
            .map(|d| d.join(self.sanitized_folder_name()))
    }

    pub fn total_pages(&self) -> usize {
        self.items.iter().map(|i| i.page_count).sum()
    }

    pub fn completed_pages(&self) -> usize {
        self.items.iter().map(|i| i.completed_pages).sum()
    }

    /// Completed over total pages; 0.0 when there are no pages.
    pub fn progress(&self) -> f64 {
        ratio(self.completed_pages(), self.total_pages())
    }

    /// Whether `path` (after resolution) is already queued.
    pub fn contains(&self, path: &Path) -> bool {
        let resolved = resolve_path(path);
        self.items.iter().any(|i| i.path == resolved)
    }

    /// Inspect and queue `paths` in order.
    ///
    /// Paths already queued and files that fail inspection are skipped
    /// silently. Returns the number of documents added.
    pub fn add_paths<P: AsRef<Path>>(&mut self, paths: &[P], loader: &dyn DocumentLoader) -> usize {
        let mut added = 0;
        for path in paths {
            let resolved = resolve_path(path.as_ref());
            if self.items.iter().any(|i| i.path == resolved) {
                debug!("Already queued: {}", resolved.display());
                continue;
            }
            match inspect(&resolved, loader) {
                Ok(item) => {
                    self.items.push(item);
                    added += 1;
                }
                Err(e) => warn!("Dropping {}: {}", resolved.display(), e),
            }
        }
        added
    }

    /// Remove the item at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<DocumentItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Destination chosen, folder name not blank, and something to convert.
    pub fn can_start(&self) -> bool {
        self.destination.is_some()
            && !self.folder_name.trim().is_empty()
            && self.items.iter().any(DocumentItem::is_convertible)
    }

    /// Put every item back to `Pending` with no recorded progress.
    pub fn reset_progress(&mut self) {
        for item in &mut self.items {
            item.reset_progress();
        }
        self.cancelled = false;
    }

    pub fn summary(&self) -> JobSummary {
        let count = |s: DocumentStatus| self.items.iter().filter(|i| i.status == s).count();
        JobSummary {
            documents: self.items.len(),
            completed: count(DocumentStatus::Completed),
            failed: count(DocumentStatus::Failed),
            skipped: count(DocumentStatus::Skipped),
            cancelled: count(DocumentStatus::Cancelled),
            total_pages: self.total_pages(),
            completed_pages: self.completed_pages(),
            failed_pages: self.items.iter().map(|i| i.failed_pages.len()).sum(),
        }
    }
}

/// Canonical form of `path` when it exists, else the path as given.
fn resolve_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    }
}

/// Per-status counts for end-of-run reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub documents: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub total_pages: usize,
    pub completed_pages: usize,
    pub failed_pages: usize,
}

/// Consumer-side projection of a running job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub documents: Vec<DocumentProgress>,
    pub finished: bool,
    pub error: Option<String>,
}

/// Projection of one queued document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProgress {
    pub name: String,
    pub page_count: usize,
    pub status: DocumentStatus,
    pub completed_pages: usize,
    /// Pages attempted so far (successful or not).
    pub last_page: usize,
}

impl JobProgress {
    /// Projection of `job` as it stands before the run starts.
    pub fn from_job(job: &Job) -> Self {
        Self {
            documents: job
                .items
                .iter()
                .map(|i| DocumentProgress {
                    name: i.display_name.clone(),
                    page_count: i.page_count,
                    status: DocumentStatus::Pending,
                    completed_pages: 0,
                    last_page: 0,
                })
                .collect(),
            finished: false,
            error: None,
        }
    }

    /// Fold one event into the projection. Unknown indices are ignored.
    ///
    /// A `Progress` page number beyond the snapshot's page count grows that
    /// document's total, so [`JobProgress::total_pages`] follows the engine.
    pub fn apply(&mut self, event: &ConversionEvent) {
        match event {
            ConversionEvent::Progress {
                document_index,
                page_number,
                completed_pages,
            } => {
                if let Some(doc) = self.documents.get_mut(*document_index) {
                    // The engine may find more pages on re-open than inspection did.
                    doc.page_count = doc.page_count.max(*page_number);
                    doc.completed_pages = *completed_pages;
                    doc.last_page = doc.last_page.max(*page_number);
                }
            }
            ConversionEvent::StatusChanged {
                document_index,
                status,
            } => {
                if let Some(doc) = self.documents.get_mut(*document_index) {
                    doc.status = *status;
                }
            }
            ConversionEvent::Error { message } => self.error = Some(message.clone()),
            ConversionEvent::Finished => self.finished = true,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.documents.iter().map(|d| d.page_count).sum()
    }

    pub fn completed_pages(&self) -> usize {
        self.documents.iter().map(|d| d.completed_pages).sum()
    }

    /// Pages attempted so far, including failures.
    pub fn attempted_pages(&self) -> usize {
        self.documents.iter().map(|d| d.last_page).sum()
    }

    pub fn progress(&self) -> f64 {
        ratio(self.completed_pages(), self.total_pages())
    }
}
