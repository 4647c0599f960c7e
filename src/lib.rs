//! Creative Assembly turns a narration track and a sequence of still images into a short
//! vertical video.
//!
//! - Build a [`TimelineModel`] (directly or from a [`ProjectFile`])
//! - Preview it with a [`PlaybackScheduler`] driven by an injected [`Clock`]
//! - Export it through an [`ExportPipeline`] into a [`FrameSink`] (MP4 via system `ffmpeg`)
//!
//! Preview and export composite frames with the same [`FrameCompositor`], so a given point in the
//! timeline renders identically in both.
#![forbid(unsafe_code)]

/// Still images and colours.
pub mod assets;
/// Narration container and preview audio output.
pub mod audio;
/// Transition laws and pixel kernels.
pub mod effects;
/// Encoding sinks.
pub mod encode;
/// Offline export.
pub mod export;
mod foundation;
/// Interactive preview loop.
pub mod playback;
/// Frame compositing and captions.
pub mod render;
/// Timeline model, version history and project files.
pub mod scene;
/// Preview and export around one timeline.
pub mod studio;

pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{AssemblyError, AssemblyResult};

pub use crate::assets::color::Rgba8;
pub use crate::assets::handle::{ArtifactId, ImageHandle};
pub use crate::audio::device::{
    AudioDevice, AudioEvent, AudioRegistry, AudioVoice, NullAudioDevice, RecordingAudioDevice,
};
pub use crate::audio::wav::{AudioTrack, wav_header, wrap_pcm_as_wav};
pub use crate::effects::transitions::{CompositeParams, Role, blend};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::export::pipeline::{
    CancelToken, ExportJob, ExportOpts, ExportPipeline, RenderStats, VideoFile,
};
pub use crate::export::plan::{FramePlan, PlannedFrame};
pub use crate::export::still::{export_narration_wav, export_scene_still};
pub use crate::playback::scheduler::{PlaybackScheduler, PlaybackState};
pub use crate::render::caption::CaptionRenderer;
pub use crate::render::compositor::FrameCompositor;
pub use crate::render::surface::FrameRGBA;
pub use crate::scene::captions::{CaptionPosition, CaptionSettings, CaptionStyle};
pub use crate::scene::history::SceneVersionStore;
pub use crate::scene::project::ProjectFile;
pub use crate::scene::timeline::{
    ImageGenerator, References, RegenerateRequest, Scene, SceneInput, Timeline, TimelineInputs,
    TimelineModel, TransitionType, ViewType,
};
pub use crate::studio::Studio;
