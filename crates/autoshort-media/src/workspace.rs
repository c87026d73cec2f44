//! Per-run scoped temporary storage.
//!
//! Each production run gets a uniquely named workspace directory that is
//! removed recursively when the workspace is dropped, on every exit
//! path. A periodic sweep removes leftovers from crashed processes that
//! skipped per-run cleanup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Scoped workspace for one production run.
///
/// Dropping the workspace removes its directory and everything in it.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under `root`, creating `root` if needed.
    ///
    /// The directory name embeds `run_id` so leftovers from crashed
    /// processes are attributable.
    pub fn create(root: impl AsRef<Path>, run_id: &str) -> MediaResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("run-{}-", run_id))
            .tempdir_in(root)?;

        debug!("Created run workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the narration audio track.
    pub fn audio_path(&self) -> PathBuf {
        self.path().join("narration.mp3")
    }

    /// Path for a segment's visual.
    pub fn visual_path(&self, ordinal: usize) -> PathBuf {
        self.path().join(format!("visual_{:03}.png", ordinal))
    }

    /// Path for the thumbnail.
    pub fn thumbnail_path(&self) -> PathBuf {
        self.path().join("thumbnail.png")
    }

    /// Path for the subtitle cue file.
    pub fn subtitles_path(&self) -> PathBuf {
        self.path().join("cues.srt")
    }

    /// Path for the assembled output file.
    pub fn output_path(&self) -> PathBuf {
        self.path().join("short.mp4")
    }
}

/// Remove workspace entries under `root` older than `retention`.
///
/// Returns the number of entries removed. Individual removal failures
/// are logged and skipped; the sweep is best-effort.
pub fn sweep_stale(root: impl AsRef<Path>, retention: Duration) -> MediaResult<usize> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable workspace entry: {}", e);
                continue;
            }
        };

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.elapsed().ok());

        let stale = matches!(age, Some(age) if age >= retention);
        if !stale {
            continue;
        }

        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };

        match result {
            Ok(()) => {
                debug!("Swept stale workspace entry {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Failed to sweep {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
