//! Thumbnail processor - decodes source images into frames and resizes each frame
//! to a fixed width, keeping the aspect ratio.
//!
//! Decoding and resizing are CPU-bound, so the async entry points run them on the
//! blocking thread pool.

use crate::error::ThumbnailError;
use bytes::Bytes;
use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::error::{DecodingError, ImageError, ImageFormatHint};
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, GenericImageView, ImageFormat};
use lambda_runtime::tracing;
use std::io::Cursor;

/// Output settings for thumbnails.
#[derive(Clone, Copy, Debug)]
pub struct ThumbnailConfig {
    /// Target width in pixels; the height follows the source aspect ratio.
    pub width: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 200,
            quality: 85,
        }
    }
}

/// A decoded source image. Animated GIFs produce one frame per animation frame,
/// everything else produces exactly one.
#[derive(Debug)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub frames: Vec<DynamicImage>,
}

/// A single encoded thumbnail.
#[derive(Debug)]
pub struct Thumbnail {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThumbnailProcessor {
    config: ThumbnailConfig,
}

impl ThumbnailProcessor {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Sniffs the format from the bytes and decodes every frame.
    pub fn decode(data: &[u8]) -> Result<DecodedImage, ThumbnailError> {
        let format = image::guess_format(data).map_err(ThumbnailError::Decode)?;

        let frames = if format == ImageFormat::Gif {
            let decoder = GifDecoder::new(Cursor::new(data)).map_err(ThumbnailError::Decode)?;
            decoder
                .into_frames()
                .collect_frames()
                .map_err(ThumbnailError::Decode)?
                .into_iter()
                .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()))
                .collect()
        } else {
            vec![image::load_from_memory_with_format(data, format).map_err(ThumbnailError::Decode)?]
        };

        if frames.is_empty() {
            return Err(ThumbnailError::Decode(ImageError::Decoding(DecodingError::new(
                ImageFormatHint::Exact(format),
                "image contains no frames",
            ))));
        }

        tracing::debug!(?format, frames = frames.len(), "Decoded source image");
        Ok(DecodedImage { format, frames })
    }

    pub async fn decode_async(data: Bytes) -> Result<DecodedImage, ThumbnailError> {
        tokio::task::spawn_blocking(move || Self::decode(&data)).await?
    }

    /// Resizes one frame to the configured width and encodes it, in the source
    /// format when that format can be written and as JPEG otherwise.
    pub fn render(
        &self,
        frame: &DynamicImage,
        source_format: ImageFormat,
    ) -> Result<Thumbnail, ThumbnailError> {
        let (orig_w, orig_h) = frame.dimensions();
        let width = self.config.width;
        let height = target_height(orig_w, orig_h, width);

        let resized = frame.resize_exact(width, height, FilterType::Triangle);

        let format = if source_format.writing_enabled() {
            source_format
        } else {
            ImageFormat::Jpeg
        };
        let data = self.encode(&resized, format)?;

        tracing::debug!(
            original_width = orig_w,
            original_height = orig_h,
            width,
            height,
            size = data.len(),
            "Thumbnail generated"
        );

        Ok(Thumbnail {
            data,
            width,
            height,
            content_type: format.to_mime_type(),
        })
    }

    pub async fn render_async(
        self,
        frame: DynamicImage,
        source_format: ImageFormat,
    ) -> Result<Thumbnail, ThumbnailError> {
        tokio::task::spawn_blocking(move || self.render(&frame, source_format)).await?
    }

    fn encode(&self, img: &DynamicImage, format: ImageFormat) -> Result<Bytes, ThumbnailError> {
        let mut cursor = Cursor::new(Vec::new());

        if format == ImageFormat::Jpeg {
            // JPEG has no alpha channel.
            let encoder = JpegEncoder::new_with_quality(&mut cursor, self.config.quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(ThumbnailError::Encode)?;
        } else {
            img.write_to(&mut cursor, format)
                .map_err(ThumbnailError::Encode)?;
        }

        Ok(Bytes::from(cursor.into_inner()))
    }
}

/// Height that keeps the aspect ratio of `orig_w` x `orig_h` at `width`,
/// rounded half up and never below one pixel.
pub fn target_height(orig_w: u32, orig_h: u32, width: u32) -> u32 {
    if orig_w == 0 {
        return 1;
    }
    let (orig_w, orig_h, width) = (u64::from(orig_w), u64::from(orig_h), u64::from(width));
    let height = (orig_h * width + orig_w / 2) / orig_w;
    u32::try_from(height).unwrap_or(u32::MAX).max(1)
}
