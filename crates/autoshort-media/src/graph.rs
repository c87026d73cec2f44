//! Declarative composition graph for the assembly engine.
//!
//! The engine describes an assembly as ordered stream inputs, named
//! intermediate pads and an output mapping, then renders that description
//! to FFmpeg arguments. Graph construction is pure, so the composition
//! logic is testable without invoking an encoder.

use std::path::{Path, PathBuf};

use autoshort_models::{EncodingConfig, FrameSize};

use crate::command::FfmpegCommand;

/// One visual input and the screen time it gets.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualInput {
    pub path: PathBuf,
    pub duration_secs: f64,
    /// Still images are looped for their duration; clips are trimmed to it
    pub looped_still: bool,
}

impl VisualInput {
    /// A still image shown for `duration_secs`.
    pub fn still(path: impl AsRef<Path>, duration_secs: f64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            duration_secs,
            looped_still: true,
        }
    }

    /// A video clip trimmed to `duration_secs`.
    pub fn clip(path: impl AsRef<Path>, duration_secs: f64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            duration_secs,
            looped_still: false,
        }
    }
}

/// Declarative description of one assembly invocation.
#[derive(Debug, Clone)]
pub struct ComposeGraph {
    frame: FrameSize,
    fps: u32,
    visuals: Vec<VisualInput>,
    audio: PathBuf,
    subtitles: Option<PathBuf>,
}

impl ComposeGraph {
    /// Create a graph for the given canonical frame and frame rate.
    pub fn new(frame: FrameSize, fps: u32, audio: impl AsRef<Path>) -> Self {
        Self {
            frame,
            fps,
            visuals: Vec::new(),
            audio: audio.as_ref().to_path_buf(),
            subtitles: None,
        }
    }

    /// Append a visual input. Presentation order is append order.
    pub fn push_visual(&mut self, visual: VisualInput) {
        self.visuals.push(visual);
    }

    /// Attach a subtitle cue file, embedded as a separate text stream.
    pub fn with_subtitles(mut self, path: impl AsRef<Path>) -> Self {
        self.subtitles = Some(path.as_ref().to_path_buf());
        self
    }

    /// Visuals in presentation order.
    pub fn visuals(&self) -> &[VisualInput] {
        &self.visuals
    }

    /// Total visual stream duration in seconds.
    pub fn visual_duration_secs(&self) -> f64 {
        self.visuals.iter().map(|v| v.duration_secs).sum()
    }

    /// The filter complex: per-input scale/pad to the canonical frame,
    /// then an order-preserving concat.
    pub fn filter_complex(&self) -> String {
        let (w, h) = (self.frame.width, self.frame.height);
        let mut filter = String::new();

        for (i, _) in self.visuals.iter().enumerate() {
            filter.push_str(&format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps}[v{i}];",
                i = i,
                w = w,
                h = h,
                fps = self.fps,
            ));
        }

        for i in 0..self.visuals.len() {
            filter.push_str(&format!("[v{}]", i));
        }
        filter.push_str(&format!(
            "concat=n={}:v=1:a=0[vout]",
            self.visuals.len()
        ));

        filter
    }

    /// Render the graph to an FFmpeg command writing `output`.
    ///
    /// Input ordering is fixed: visuals in presentation order, then the
    /// audio track, then the optional subtitle file. The output duration
    /// is the shorter of the visual stream and the audio track.
    pub fn to_command(&self, output: impl AsRef<Path>, encoding: &EncodingConfig) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output);

        for visual in &self.visuals {
            let duration = format!("{:.3}", visual.duration_secs);
            if visual.looped_still {
                cmd = cmd.input_with_args(["-loop", "1", "-t", duration.as_str()], &visual.path);
            } else {
                cmd = cmd.input_with_args(["-t", duration.as_str()], &visual.path);
            }
        }

        let audio_index = self.visuals.len();
        cmd = cmd.input(&self.audio);

        if let Some(ref subs) = self.subtitles {
            cmd = cmd.input(subs);
        }

        cmd = cmd
            .filter_complex(self.filter_complex())
            .map("[vout]")
            .map(format!("{}:a", audio_index));

        if self.subtitles.is_some() {
            let subs_index = audio_index + 1;
            cmd = cmd
                .map(format!("{}", subs_index))
                .output_arg("-c:s")
                .output_arg("mov_text");
        }

        cmd = cmd.output_args(encoding.to_ffmpeg_args());

        // Never play visual filler past the narration or cut it short:
        // the output ends with the shorter stream.
        cmd.output_arg("-shortest")
    }
}
