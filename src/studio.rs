//! One timeline instance with its preview loop and exporter.
//!
//! The compositor, the preview surface and the audio device are exclusive resources: a
//! [`Studio`] runs at most one preview or one export at a time, and starting an export stops the
//! preview first.

use crate::audio::device::AudioDevice;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::export::pipeline::{CancelToken, ExportJob, ExportOpts, ExportPipeline, VideoFile};
use crate::foundation::clock::Clock;
use crate::foundation::error::AssemblyResult;
use crate::playback::scheduler::{PlaybackScheduler, PlaybackState};
use crate::render::caption::CaptionRenderer;
use crate::render::compositor::FrameCompositor;
use crate::render::surface::FrameRGBA;
use crate::scene::timeline::{Timeline, TimelineModel};

pub struct Studio<C: Clock + Clone> {
    model: TimelineModel,
    slot: usize,
    compositor: FrameCompositor,
    surface: FrameRGBA,
    scheduler: PlaybackScheduler<C>,
    pipeline: ExportPipeline<C>,
    preview: Option<Timeline>,
}

impl<C: Clock + Clone> Studio<C> {
    pub fn new(
        model: TimelineModel,
        opts: ExportOpts,
        clock: C,
        audio: Box<dyn AudioDevice>,
        captions: Option<CaptionRenderer>,
    ) -> AssemblyResult<Self> {
        let mut compositor = FrameCompositor::new(opts.canvas)?;
        compositor.set_caption_renderer(captions);
        let surface = FrameRGBA::new(opts.canvas)?;
        let scheduler = PlaybackScheduler::new(clock.clone(), audio);
        let pipeline = ExportPipeline::new(opts, clock)?;
        Ok(Self {
            model,
            slot: 0,
            compositor,
            surface,
            scheduler,
            pipeline,
            preview: None,
        })
    }

    pub fn model(&self) -> &TimelineModel {
        &self.model
    }

    /// Edit the timeline. Preview is stopped so it never shows a half-edited state.
    pub fn model_mut(&mut self) -> &mut TimelineModel {
        self.stop_preview();
        &mut self.model
    }

    /// Replace the timeline. The previous timeline's audio voice is released.
    pub fn swap_timeline(&mut self, model: TimelineModel) {
        self.stop_preview();
        self.slot += 1;
        self.scheduler.bind_slot(self.slot);
        self.model = model;
    }

    pub fn playback(&self) -> &PlaybackState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler<C> {
        &self.scheduler
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    /// The most recent preview frame.
    pub fn preview_frame(&self) -> &FrameRGBA {
        &self.surface
    }

    /// Start preview if stopped, stop it if playing. Returns whether preview is running.
    pub fn toggle_preview(&mut self) -> bool {
        if self.scheduler.is_playing() {
            self.stop_preview();
            return false;
        }
        let timeline = self.model.snapshot();
        let started = self.scheduler.start(&timeline);
        self.preview = Some(timeline);
        started
    }

    pub fn stop_preview(&mut self) {
        self.scheduler.stop();
        self.preview = None;
    }

    /// Advance preview to the clock's current time and render the frame. Returns whether
    /// preview is still running.
    pub fn tick_preview(&mut self) -> bool {
        let Some(timeline) = self.preview.as_ref() else {
            return false;
        };
        let compositor = &mut self.compositor;
        let surface = &mut self.surface;
        let running = self.scheduler.tick(timeline, &mut |state: &PlaybackState| {
            compositor.render(
                surface,
                timeline,
                state.current_scene,
                state.transitioning_to,
                state.progress,
            )
        });
        if !running {
            self.preview = None;
        }
        running
    }

    /// Export into `sink`, stopping preview first.
    pub fn export(
        &mut self,
        sink: &mut dyn FrameSink,
        cancel: CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> AssemblyResult<VideoFile> {
        self.stop_preview();
        let timeline = self.model.snapshot();
        self.pipeline.export(
            &mut self.compositor,
            &timeline,
            sink,
            ExportJob::new(cancel),
            on_progress,
        )
    }

    /// Export to `Creative_Assembly_UGC.mp4` in the configured output directory.
    pub fn export_mp4(
        &mut self,
        cancel: CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> AssemblyResult<VideoFile> {
        let opts = self.pipeline.opts();
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            out_path: opts.output_path(),
            overwrite: opts.overwrite,
            bg_rgba: opts.bg_rgba,
        });
        self.export(&mut sink, cancel, on_progress)
    }
}
