//! Page rendering: rasterise one page, flatten it, encode it as JPEG and
//! write it to disk.
//!
//! The encoded bytes go to a temporary file in the destination folder which
//! is then renamed over the final path, so a reader never observes a
//! half-written image.
//!
//! [`render_page`] never propagates an error: every failure is logged and
//! reported as `false`. [`try_render_page`] exposes the underlying
//! [`PageError`] for callers that want it.

use crate::config::ConversionConfig;
use crate::error::PageError;
use crate::pipeline::pdfium::PageSource;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Render the page at zero-based `index` into `output_path`.
///
/// Returns `true` when the image was written.
pub fn render_page(
    source: &dyn PageSource,
    index: usize,
    output_path: &Path,
    config: &ConversionConfig,
) -> bool {
    match try_render_page(source, index, output_path, config) {
        Ok(()) => true,
        Err(e) => {
            warn!("{} ({})", e, output_path.display());
            false
        }
    }
}

/// Fallible core of [`render_page`].
pub fn try_render_page(
    source: &dyn PageSource,
    index: usize,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<(), PageError> {
    let page = index + 1;
    let image = source.render_page(index, config.scale())?;
    let rgb = flatten_alpha(image);
    let bytes = encode_jpeg(&rgb, config.quality).map_err(|e| PageError::EncodeFailed {
        page,
        detail: e.to_string(),
    })?;
    write_atomically(output_path, &bytes).map_err(|e| PageError::WriteFailed {
        page,
        path: output_path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!(
        "Wrote page {} → {} ({} bytes)",
        page,
        output_path.display(),
        bytes.len()
    );
    Ok(())
}

/// Composite any alpha channel onto a white background.
pub fn flatten_alpha(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = src[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        *dst = Rgb([blend(src[0]), blend(src[1]), blend(src[2])]);
    }
    out
}

/// Encode an RGB image as baseline JPEG. `quality` is clamped to 1–100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(image)?;
    Ok(buf)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".page-");
    // Same mode as File::create: 0o666 minus the umask, not tempfile's 0o600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp: NamedTempFile = builder.tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
