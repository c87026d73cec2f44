//! Visual normalization to the canonical frame.
//!
//! Every downloaded or generated visual is normalized here before it is
//! handed to assembly: scaled to fill the canonical frame and
//! center-cropped, so the compose graph only ever deals in geometry.

use std::path::Path;

use image::imageops::FilterType;
use tracing::debug;

use autoshort_models::FrameSize;

use crate::error::{MediaError, MediaResult};

/// Decode `bytes`, normalize to `frame`, and write a PNG to `dest`.
///
/// Returns the dimensions written, which always equal `frame`.
pub fn normalize_image(bytes: &[u8], frame: FrameSize, dest: &Path) -> MediaResult<FrameSize> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| MediaError::invalid_image(format!("decode failed: {}", e)))?;

    let normalized = img.resize_to_fill(frame.width, frame.height, FilterType::Lanczos3);

    normalized
        .save_with_format(dest, image::ImageFormat::Png)
        .map_err(|e| MediaError::invalid_image(format!("write failed: {}", e)))?;

    debug!(
        "Normalized {}x{} -> {} at {}",
        img.width(),
        img.height(),
        frame,
        dest.display()
    );

    Ok(frame)
}
