//! Locally rendered fallback visuals.
//!
//! When a visual synthesis call fails, the run degrades to a patterned
//! placeholder sized to the canonical frame instead of aborting. The
//! rendering is deterministic: the same ordinal always yields the same
//! placeholder.

use std::path::Path;

use image::{Rgba, RgbaImage};

use autoshort_models::FrameSize;

use crate::error::{MediaError, MediaResult};

/// Background palette, indexed by segment ordinal.
const PALETTE: [[u8; 3]; 6] = [
    [0x1e, 0x29, 0x3b], // slate
    [0x2b, 0x1e, 0x3b], // violet
    [0x1e, 0x3b, 0x2f], // pine
    [0x3b, 0x2a, 0x1e], // umber
    [0x3b, 0x1e, 0x29], // wine
    [0x1e, 0x33, 0x3b], // teal
];

/// Height of the alternating stripe bands, in pixels.
const BAND_HEIGHT: u32 = 96;

/// Render a fallback visual for a segment and write a PNG to `dest`.
pub fn render_fallback_visual(
    ordinal: usize,
    frame: FrameSize,
    dest: &Path,
) -> MediaResult<FrameSize> {
    let base = PALETTE[ordinal % PALETTE.len()];
    let img = banded_image(frame, base);

    img.save(dest)
        .map_err(|e| MediaError::invalid_image(format!("placeholder write failed: {}", e)))?;

    Ok(frame)
}

/// Render a fallback thumbnail and write a PNG to `dest`.
pub fn render_fallback_thumbnail(frame: FrameSize, dest: &Path) -> MediaResult<FrameSize> {
    let img = banded_image(frame, PALETTE[0]);

    img.save(dest)
        .map_err(|e| MediaError::invalid_image(format!("placeholder write failed: {}", e)))?;

    Ok(frame)
}

/// Flat color with slightly lightened horizontal bands.
fn banded_image(frame: FrameSize, base: [u8; 3]) -> RgbaImage {
    let lighter = [
        base[0].saturating_add(18),
        base[1].saturating_add(18),
        base[2].saturating_add(18),
    ];

    RgbaImage::from_fn(frame.width, frame.height, |_, y| {
        let c = if (y / BAND_HEIGHT) % 2 == 0 { base } else { lighter };
        Rgba([c[0], c[1], c[2], 255])
    })
}
