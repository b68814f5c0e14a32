//! Queued documents and their inspection.

use crate::error::{OpenError, Pdf2JpgError};
use crate::naming::sanitize_name;
use crate::pipeline::pdfium::DocumentLoader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lifecycle of one queued document.
///
/// ```text
/// Pending ──▶ InProgress ──▶ Completed | Failed | Skipped | Cancelled
///    └─────────────────────▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Skipped,
}

impl DocumentStatus {
    /// `true` once the document will not change again in this run.
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Pending | Self::InProgress => false,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Skipped => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued source file with its inspection results and run-time status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItem {
    /// Source file path.
    pub path: PathBuf,
    /// File stem as shown to the user.
    pub display_name: String,
    /// Filesystem-safe form of `display_name`.
    pub sanitized_name: String,
    /// 0 if and only if the document is encrypted.
    pub page_count: usize,
    pub encrypted: bool,
    pub status: DocumentStatus,
    /// Pages written successfully in the current run.
    pub completed_pages: usize,
    /// 1-based numbers of pages that failed in the current run, ascending.
    pub failed_pages: Vec<usize>,
}

impl DocumentItem {
    fn new(path: &Path, page_count: usize, encrypted: bool) -> Self {
        let display_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sanitized_name = sanitize_name(&display_name);
        Self {
            path: path.to_path_buf(),
            display_name,
            sanitized_name,
            page_count,
            encrypted,
            status: DocumentStatus::Pending,
            completed_pages: 0,
            failed_pages: Vec::new(),
        }
    }

    /// Whether the engine will try to convert this document.
    pub fn is_convertible(&self) -> bool {
        !self.encrypted && self.page_count > 0
    }

    /// Back to `Pending` with no recorded progress.
    pub fn reset_progress(&mut self) {
        self.status = DocumentStatus::Pending;
        self.completed_pages = 0;
        self.failed_pages.clear();
    }
}

/// Open `path` once to read its encryption state and page count.
///
/// Encrypted documents are returned with a page count of 0; their pages are
/// never enumerated. Files that cannot be opened, and documents with no
/// pages, yield [`Pdf2JpgError::InspectionFailed`].
pub fn inspect(path: &Path, loader: &dyn DocumentLoader) -> Result<DocumentItem, Pdf2JpgError> {
    match loader.open(path) {
        Ok(source) => {
            let pages = source.page_count();
            if pages == 0 {
                return Err(Pdf2JpgError::InspectionFailed {
                    path: path.to_path_buf(),
                    detail: "document has no pages".into(),
                });
            }
            debug!("Inspected {}: {} pages", path.display(), pages);
            Ok(DocumentItem::new(path, pages, false))
        }
        Err(OpenError::PasswordRequired { .. }) => {
            debug!("Inspected {}: password-protected", path.display());
            Ok(DocumentItem::new(path, 0, true))
        }
        Err(OpenError::Unreadable { detail, .. }) => Err(Pdf2JpgError::InspectionFailed {
            path: path.to_path_buf(),
            detail,
        }),
    }
}
