//! Handler configuration, read from the environment once per cold start.

use crate::error::ConfigError;
use serde::Deserialize;

/// Settings shared read-only by every invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// Bucket that receives thumbnails. Events from this bucket are ignored.
    pub output_bucket: String,
    /// Width of the generated thumbnail in pixels.
    #[serde(default = "default_thumbnail_width")]
    pub thumbnail_width: u32,
    /// Only keys ending with this suffix are resized. Case-sensitive.
    #[serde(default = "default_key_suffix")]
    pub key_suffix: String,
    /// JPEG quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_thumbnail_width() -> u32 {
    200
}

fn default_key_suffix() -> String {
    ".jpg".to_string()
}

fn default_jpeg_quality() -> u8 {
    85
}

impl HandlerConfig {
    /// Loads `OUTPUT_BUCKET`, `THUMBNAIL_WIDTH`, `KEY_SUFFIX` and `JPEG_QUALITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<Self>()?.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.output_bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("OUTPUT_BUCKET must not be empty".into()));
        }
        if self.thumbnail_width == 0 {
            return Err(ConfigError::Invalid("THUMBNAIL_WIDTH must be positive".into()));
        }
        if self.key_suffix.is_empty() {
            return Err(ConfigError::Invalid("KEY_SUFFIX must not be empty".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "JPEG_QUALITY must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(self)
    }
}
