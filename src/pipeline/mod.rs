//! Per-page pipeline stages.
//!
//! ## Data Flow
//!
//! ```text
//! pdfium ──▶ render
//! (open, rasterise)  (flatten, JPEG, atomic write)
//! ```
//!
//! 1. [`pdfium`]: the [`pdfium::DocumentLoader`] / [`pdfium::PageSource`]
//!    seam and its pdfium-render implementation
//! 2. [`render`]: turn one rasterised page into a JPEG file on disk

pub mod pdfium;
pub mod render;
