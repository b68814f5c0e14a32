//! # pdf2jpg
//!
//! Convert a queue of PDF documents into per-page JPEG images.
//!
//! Each document gets its own folder inside the job folder, one image per
//! page:
//!
//! ```text
//! <destination>/<job folder>/<document>/<document>_page_01.jpg
//!                           /<document>_1/<document>_1_page_1.jpg   (name collision)
//! ```
//!
//! ## Pipeline Overview
//!
//! ```text
//! paths
//!  │
//!  ├─ 1. Inspect  open each file, detect encryption, count pages   (document)
//!  ├─ 2. Queue    ordered Job, duplicates dropped                    (job)
//!  ├─ 3. Run      worker thread walks documents then pages           (engine)
//!  │     ├─ name  sanitise + collision-free folder names             (naming)
//!  │     └─ page  pdfium raster → flatten → JPEG → atomic write      (pipeline)
//!  └─ 4. Events   Progress / StatusChanged / Error / Finished        (event)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2jpg::{ConversionConfig, ConversionEngine, ConversionEvent, Job, PdfiumLoader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = Arc::new(PdfiumLoader::bind(None)?);
//!     let mut job = Job::new(Some("/tmp/out".into()), "Scans");
//!     job.add_paths(&["report.pdf", "invoice.pdf"], &*loader);
//!
//!     let engine = ConversionEngine::new(loader, ConversionConfig::default());
//!     let mut run = engine.start(job);
//!     while let Some(event) = run.events.recv().await {
//!         if let ConversionEvent::Progress { document_index, page_number, .. } = event {
//!             eprintln!("document {document_index}: page {page_number}");
//!         }
//!     }
//!     let outcome = run.join().await?;
//!     println!("{:?}", outcome.job.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2jpg` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod event;
pub mod job;
pub mod naming;
pub mod pipeline;
pub mod reveal;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, IMAGE_EXTENSION};
pub use document::{inspect, DocumentItem, DocumentStatus};
pub use engine::{ConversionEngine, ConversionHandle, RunOutcome};
pub use error::{OpenError, PageError, Pdf2JpgError};
pub use event::{CancelToken, ConversionEvent, EventSink};
pub use job::{DocumentProgress, Job, JobProgress, JobSummary};
pub use naming::{page_filename, resolve_collision, sanitize_name, UsedNames};
pub use pipeline::pdfium::{bind_pdfium, DocumentLoader, PageSource, PdfiumLoader};
pub use reveal::reveal_in_file_manager;
pub use settings::SettingsStore;
