//! Offline export.
//!
//! Steps through a timeline at a fixed cadence, composites every output frame with the same
//! [`FrameCompositor`] the preview uses, and streams the frames to a [`FrameSink`] in order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context as _;

use crate::audio::wav::AudioTrack;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::export::plan::FramePlan;
use crate::foundation::clock::Clock;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::render::compositor::FrameCompositor;
use crate::render::surface::FrameRGBA;
use crate::scene::timeline::Timeline;

/// File stem shared by every whole-timeline output.
pub const OUTPUT_STEM: &str = "Creative_Assembly_UGC";
/// Container extension of the exported video.
pub const VIDEO_EXT: &str = "mp4";

/// Export settings. `Default` is the fixed delivery format: 1080x1920, 30 fps, 8 Mbps.
#[derive(Clone, Debug)]
pub struct ExportOpts {
    pub out_dir: PathBuf,
    pub overwrite: bool,
    pub canvas: Canvas,
    pub fps: Fps,
    pub bitrate_bps: u32,
    /// Wait before finalizing the encoder so trailing audio is flushed.
    pub settle: Duration,
    /// Straight-alpha background used when flattening frames.
    pub bg_rgba: [u8; 4],
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            overwrite: true,
            canvas: Canvas::VERTICAL_1080P,
            fps: Fps { num: 30, den: 1 },
            bitrate_bps: 8_000_000,
            settle: Duration::from_millis(500),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl ExportOpts {
    pub fn validate(&self) -> AssemblyResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if self.bitrate_bps == 0 {
            return Err(AssemblyError::validation("bitrate must be non-zero"));
        }
        Ok(())
    }

    /// `<out_dir>/Creative_Assembly_UGC.mp4`.
    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(format!("{OUTPUT_STEM}.{VIDEO_EXT}"))
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State of one export run. Consumed by [`ExportPipeline::export`].
#[derive(Debug, Default)]
pub struct ExportJob {
    progress_percent: Option<u8>,
    cancel: CancelToken,
}

impl ExportJob {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            progress_percent: None,
            cancel,
        }
    }

    /// Last reported progress, `None` before the first frame.
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress_percent
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn check_cancelled(&self) -> AssemblyResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }
        Ok(())
    }

    fn report(&mut self, pct: u8, on_progress: &mut dyn FnMut(u8)) {
        if self.progress_percent.is_some_and(|p| p >= pct) {
            return;
        }
        self.progress_percent = Some(pct);
        on_progress(pct);
    }
}

/// Frame accounting of an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames delivered to the sink.
    pub frames_total: u64,
    /// Frames actually composited.
    pub frames_rendered: u64,
    /// Static frames repeated from the previous composite.
    pub frames_elided: u64,
}

/// Result of a successful export.
#[derive(Clone, Debug)]
pub struct VideoFile {
    /// Final file, when the sink writes one.
    pub path: Option<PathBuf>,
    pub frames: u64,
    pub has_audio: bool,
    pub stats: RenderStats,
}

/// Offline export driver.
pub struct ExportPipeline<C: Clock> {
    opts: ExportOpts,
    clock: C,
}

impl<C: Clock> ExportPipeline<C> {
    pub fn new(opts: ExportOpts, clock: C) -> AssemblyResult<Self> {
        opts.validate()?;
        Ok(Self { opts, clock })
    }

    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Render every frame of `timeline` into `sink`.
    ///
    /// The narration, if any, is handed to the sink as a temporary WAV; failing to prepare it
    /// degrades to a video-only export. Decoded images and the temporary audio file are released
    /// whatever the outcome. On error or cancellation the sink is aborted so no partial output
    /// survives. The timeline is never modified.
    #[tracing::instrument(skip_all, fields(scenes = timeline.scene_count(), transition = ?timeline.transition))]
    pub fn export(
        &self,
        compositor: &mut FrameCompositor,
        timeline: &Timeline,
        sink: &mut dyn FrameSink,
        mut job: ExportJob,
        on_progress: &mut dyn FnMut(u8),
    ) -> AssemblyResult<VideoFile> {
        timeline.validate()?;
        if compositor.canvas() != self.opts.canvas {
            return Err(AssemblyError::validation(
                "compositor canvas does not match the export canvas",
            ));
        }
        let plan = FramePlan::new(timeline, self.opts.fps)?;
        job.check_cancelled()?;

        let duration = self.opts.fps.duration_of(plan.total_frames());
        let mut audio_tmp = TempFileGuard(None);
        let audio = match timeline.audio.as_ref().filter(|t| !t.is_empty()) {
            Some(track) => match write_audio_temp(track, duration) {
                Ok(path) => {
                    audio_tmp.0 = Some(path.clone());
                    Some(AudioInputConfig { path })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "audio attach failed; exporting video only");
                    None
                }
            },
            None => None,
        };
        let has_audio = audio.is_some();

        sink.begin(SinkConfig {
            canvas: self.opts.canvas,
            fps: self.opts.fps,
            bitrate_bps: self.opts.bitrate_bps,
            duration,
            audio,
            title: timeline.title.clone(),
        })?;
        tracing::info!(frames = plan.total_frames(), has_audio, "export started");

        let result = self
            .render_frames(compositor, timeline, &plan, sink, &mut job, on_progress)
            .and_then(|stats| {
                job.check_cancelled()?;
                job.report(100, on_progress);
                self.clock.sleep(self.opts.settle);
                sink.end()?;
                Ok(stats)
            });
        compositor.release_images();
        drop(audio_tmp);

        match result {
            Ok(stats) => {
                tracing::info!(
                    frames = stats.frames_total,
                    rendered = stats.frames_rendered,
                    elided = stats.frames_elided,
                    "export finished"
                );
                Ok(VideoFile {
                    path: sink.output_path().map(Path::to_path_buf),
                    frames: stats.frames_total,
                    has_audio,
                    stats,
                })
            }
            Err(e) => {
                sink.abort();
                if e.is_cancelled() {
                    tracing::info!(progress = ?job.progress_percent(), "export cancelled");
                } else {
                    tracing::warn!(error = %e, "export failed");
                }
                Err(e)
            }
        }
    }

    fn render_frames(
        &self,
        compositor: &mut FrameCompositor,
        timeline: &Timeline,
        plan: &FramePlan,
        sink: &mut dyn FrameSink,
        job: &mut ExportJob,
        on_progress: &mut dyn FnMut(u8),
    ) -> AssemblyResult<RenderStats> {
        let mut surface = FrameRGBA::new(self.opts.canvas)?;
        let mut stats = RenderStats::default();
        let mut idx = 0u64;

        for scene in 0..plan.scene_count {
            let next = plan.blends_after(scene).then_some(scene + 1);
            let mut live = vec![scene];
            live.extend(next);
            compositor.retain_scenes(timeline, &live);

            // Static frames of a scene are identical: composite once, push repeatedly.
            job.check_cancelled()?;
            compositor.render(&mut surface, timeline, scene, None, 0.0)?;
            stats.frames_rendered += 1;
            for f in 0..plan.static_frames(scene) {
                job.check_cancelled()?;
                sink.push_frame(FrameIndex(idx), &surface)?;
                if f > 0 {
                    stats.frames_elided += 1;
                }
                idx += 1;
                job.report(plan.percent_after(idx), on_progress);
            }

            let Some(next) = next else {
                continue;
            };
            for f in 0..plan.frames_per_transition {
                job.check_cancelled()?;
                let progress =
                    crate::effects::transitions::window_progress(f, plan.frames_per_transition);
                compositor.render(&mut surface, timeline, scene, Some(next), progress)?;
                stats.frames_rendered += 1;
                sink.push_frame(FrameIndex(idx), &surface)?;
                idx += 1;
                job.report(plan.percent_after(idx), on_progress);
            }
        }

        stats.frames_total = idx;
        Ok(stats)
    }

    /// Render export frame `index` on its own.
    pub fn render_frame(
        &self,
        compositor: &mut FrameCompositor,
        timeline: &Timeline,
        index: FrameIndex,
    ) -> AssemblyResult<FrameRGBA> {
        timeline.validate()?;
        let plan = FramePlan::new(timeline, self.opts.fps)?;
        let frame = plan.frame_at(index).ok_or_else(|| {
            AssemblyError::validation(format!(
                "frame {} is past the end ({} frames)",
                index.0,
                plan.total_frames()
            ))
        })?;
        let mut surface = FrameRGBA::new(compositor.canvas())?;
        compositor.render(&mut surface, timeline, frame.scene, frame.next, frame.progress)?;
        Ok(surface)
    }
}

/// Write the narration, fitted to the video length, to a temporary WAV.
fn write_audio_temp(track: &AudioTrack, len: Duration) -> AssemblyResult<PathBuf> {
    let wav = track.fit_to(len).to_wav()?;
    let path = std::env::temp_dir().join(format!(
        "creative_assembly_narration_{}_{}.wav",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    std::fs::write(&path, wav)
        .with_context(|| format!("write narration WAV '{}'", path.display()))
        .map_err(|e| AssemblyError::audio_attach(format!("{e:#}")))?;
    Ok(path)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
