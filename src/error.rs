//! Error types for the pdf2jpg library.
//!
//! Three error types map onto three failure scopes:
//!
//! * [`Pdf2JpgError`]: **Fatal** or API-level: the run cannot start (no
//!   usable destination, job folder could not be created), pdfium could not
//!   be bound, or a file could not be inspected.
//!
//! * [`OpenError`]: a document backend could not open a file. The inspector
//!   turns [`OpenError::PasswordRequired`] into an encrypted queue item and
//!   everything else into [`Pdf2JpgError::InspectionFailed`]; the engine turns
//!   any of them into a `Failed` document.
//!
//! * [`PageError`]: **Non-fatal**: one page failed to render, encode or be
//!   written. The renderer logs it and reports a boolean failure; the engine
//!   records the page number and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal and API-level errors returned by the pdf2jpg library.
#[derive(Debug, Error)]
pub enum Pdf2JpgError {
    // ── Run-aborting errors ───────────────────────────────────────────────
    /// The job has no destination, or the destination is not a directory.
    #[error("Invalid destination: {reason}")]
    InvalidDestination { reason: String },

    /// The job folder (or one of its parents) could not be created.
    #[error("Failed to create job folder '{path}': {source}")]
    FolderCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Queue errors ──────────────────────────────────────────────────────
    /// The file could not be opened or parsed as a document.
    #[error("Could not inspect '{path}': {detail}")]
    InspectionFailed { path: PathBuf, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install pdfium system-wide.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure to open a document through a [`crate::pipeline::pdfium::DocumentLoader`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpenError {
    /// The document is encrypted and needs a password to open.
    #[error("'{path}' is password-protected")]
    PasswordRequired { path: PathBuf },

    /// The file is missing, unreadable, corrupt, or not a supported document.
    #[error("'{path}' could not be opened: {detail}")]
    Unreadable { path: PathBuf, detail: String },
}

/// A non-fatal error for a single page.
///
/// Page numbers are 1-based.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// JPEG encoding failed.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The encoded image could not be written to its destination.
    #[error("Page {page}: could not write '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },
}
