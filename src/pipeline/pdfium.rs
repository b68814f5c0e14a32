//! Document backend: open a document and rasterise its pages.
//!
//! The engine and the inspector only see the [`DocumentLoader`] and
//! [`PageSource`] traits. [`PdfiumLoader`] is the production implementation
//! on top of `pdfium-render`; tests plug in in-memory fakes.
//!
//! Each call to [`DocumentLoader::open`] yields an independent handle. The
//! handle is closed when the returned box is dropped.

use crate::error::{OpenError, PageError, Pdf2JpgError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Opens documents for inspection and conversion.
///
/// `Send + Sync` so one loader can be shared between the consumer (which
/// inspects files as they are queued) and the conversion worker.
pub trait DocumentLoader: Send + Sync {
    /// Open `path`, returning a fresh handle to its pages.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, OpenError>;
}

/// An open document.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Rasterise the page at zero-based `index`, scaling both axes by `scale`
    /// relative to the document's native unit (72 per inch).
    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, PageError>;
}

/// Bind to a pdfium library.
///
/// With an explicit `library_path`, only that file is tried. Otherwise the
/// platform library is looked up in the working directory, then next to the
/// executable, then through the system loader.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, Pdf2JpgError> {
    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                let exe_dir = std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(Path::to_path_buf))
                    .unwrap_or_default();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&exe_dir))
            })
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2JpgError::PdfiumBindingFailed(e.to_string()))?;

    info!("pdfium bound");
    Ok(Pdfium::new(bindings))
}

/// [`DocumentLoader`] backed by pdfium.
pub struct PdfiumLoader {
    pdfium: Pdfium,
}

// SAFETY: pdfium-render is built with `thread_safe`, which serialises every
// call into the pdfium library behind a global mutex. Documents opened through
// the loader are never shared between threads; each handle stays on the thread
// that opened it.
unsafe impl Send for PdfiumLoader {}
unsafe impl Sync for PdfiumLoader {}

impl PdfiumLoader {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Bind pdfium (see [`bind_pdfium`]) and wrap it in a loader.
    pub fn bind(library_path: Option<&Path>) -> Result<Self, Pdf2JpgError> {
        bind_pdfium(library_path).map(Self::new)
    }
}

impl DocumentLoader for PdfiumLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, OpenError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| classify_load_error(path, &e))?;

        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// pdfium reports a missing password as a generic load error; the variant
/// name is the only reliable signal.
fn classify_load_error(path: &Path, err: &PdfiumError) -> OpenError {
    let detail = format!("{err:?}");
    if detail.contains("Password") || detail.contains("password") {
        OpenError::PasswordRequired {
            path: path.to_path_buf(),
        }
    } else {
        OpenError::Unreadable {
            path: path.to_path_buf(),
            detail,
        }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, PageError> {
        let page = self
            .document
            .pages()
            .get(index as PdfPageIndex)
            .map_err(|e| PageError::RenderFailed {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_clear_color(PdfColor::WHITE)
            .render_form_data(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PageError::RenderFailed {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
