use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::render::surface::FrameRGBA;

/// Configuration provided to a [`FrameSink`] when an export starts.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u32,
    /// Length of the video stream. Audio is padded or cut to this.
    pub duration: Duration,
    /// Optional audio stream to mux alongside the video.
    pub audio: Option<AudioInputConfig>,
    /// Container `title` metadata.
    pub title: String,
}

/// Audio input for sinks that encode an audio stream.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to a WAV file.
    pub path: PathBuf,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order. A session ends with exactly
/// one of `end` (keep the output) or `abort` (discard it).
pub trait FrameSink {
    /// Open the session. Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> AssemblyResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AssemblyResult<()>;
    /// Finalize the output after the last frame.
    fn end(&mut self) -> AssemblyResult<()>;
    /// Stop without producing output and discard anything partially written. Idempotent.
    fn abort(&mut self);
    /// Final output file, once `end` has succeeded.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Frames in timeline order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> AssemblyResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AssemblyResult<()> {
        if self.cfg.is_none() {
            return Err(AssemblyError::encode("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(AssemblyError::encode("out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> AssemblyResult<()> {
        if self.cfg.is_none() {
            return Err(AssemblyError::encode("in-memory sink not started"));
        }
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
