//! Configuration types for page-to-JPEG conversion.
//!
//! All rendering behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The builder clamps out-of-range values
//! in its setters and `build()` validates the result.

use crate::error::Pdf2JpgError;
use serde::{Deserialize, Serialize};

/// File extension of every page image written by the engine.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Native resolution of a PDF user-space unit (1 pt = 1/72 inch).
pub const NATIVE_DPI: f32 = 72.0;

/// Configuration for a conversion run.
///
/// # Example
/// ```rust
/// use pdf2jpg::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .quality(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale(), 300.0 / 72.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Rendering resolution in dots per inch. Range: 72–600. Default: 200.
    ///
    /// Pages are rasterised at `dpi / 72` times their native size in both axes.
    pub dpi: u32,

    /// JPEG encoding quality. Range: 0–100. Default: 80.
    pub quality: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            quality: 80,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Render scale factor relative to the document's native unit.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / NATIVE_DPI
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality.min(100);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2JpgError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2JpgError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.quality > 100 {
            return Err(Pdf2JpgError::InvalidConfig(format!(
                "Quality must be 0–100, got {}",
                c.quality
            )));
        }
        Ok(self.config)
    }
}
