//! Preview frame extraction.

use std::path::Path;

use autoshort_models::encoding::{THUMBNAIL_SCALE_WIDTH, THUMBNAIL_TIMESTAMP};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Extract a preview frame from an assembled video.
pub async fn extract_preview(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let filter = format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH);

    let cmd = FfmpegCommand::new(output_path.as_ref())
        .input_with_args(["-ss", THUMBNAIL_TIMESTAMP], video_path.as_ref())
        .single_frame()
        .video_filter(&filter)
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}
