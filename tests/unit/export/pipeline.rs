use super::*;
use crate::assets::decode::solid_png;
use crate::assets::handle::ImageHandle;
use crate::encode::sink::InMemorySink;
use crate::foundation::clock::ManualClock;
use crate::scene::captions::CaptionSettings;
use crate::scene::timeline::{SceneInput, TimelineInputs, TimelineModel, TransitionType};

const CANVAS: Canvas = Canvas {
    width: 4,
    height: 8,
};

fn opts() -> ExportOpts {
    ExportOpts {
        canvas: CANVAS,
        ..ExportOpts::default()
    }
}

fn timeline(transition: TransitionType, audio: Option<AudioTrack>) -> Timeline {
    TimelineModel::new(TimelineInputs {
        title: "Unit".to_owned(),
        script: "One. Two.".to_owned(),
        scenes: [[255, 0, 0, 255], [0, 255, 0, 255]]
            .into_iter()
            .map(|px| SceneInput {
                image: ImageHandle::new(solid_png(2, 2, px)),
                alternates: Vec::new(),
                view: Default::default(),
            })
            .collect(),
        transition,
        captions: CaptionSettings {
            visible: false,
            ..CaptionSettings::default()
        },
        audio,
        ..TimelineInputs::default()
    })
    .unwrap()
    .snapshot()
}

#[test]
fn default_opts_are_the_delivery_format() {
    let o = ExportOpts::default();
    assert_eq!(o.canvas, Canvas::VERTICAL_1080P);
    assert_eq!(o.fps, Fps { num: 30, den: 1 });
    assert_eq!(o.bitrate_bps, 8_000_000);
    assert_eq!(o.settle, Duration::from_millis(500));
    assert!(o.validate().is_ok());
    assert_eq!(
        o.output_path(),
        PathBuf::from(".").join("Creative_Assembly_UGC.mp4")
    );
}

#[test]
fn invalid_opts_are_rejected() {
    let zero_rate = ExportOpts {
        bitrate_bps: 0,
        ..ExportOpts::default()
    };
    assert!(ExportPipeline::new(zero_rate, ManualClock::new()).is_err());
    let bad_fps = ExportOpts {
        fps: Fps { num: 30, den: 0 },
        ..ExportOpts::default()
    };
    assert!(ExportPipeline::new(bad_fps, ManualClock::new()).is_err());
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let job = ExportJob::new(token.clone());
    assert!(!job.is_cancelled());
    token.cancel();
    assert!(job.is_cancelled());
}

#[test]
fn progress_reports_only_increase() {
    let mut job = ExportJob::default();
    let mut seen = Vec::new();
    let mut record = |p: u8| seen.push(p);
    job.report(3, &mut record);
    job.report(3, &mut record);
    job.report(2, &mut record);
    job.report(5, &mut record);
    assert_eq!(seen, vec![3, 5]);
    assert_eq!(job.progress_percent(), Some(5));
}

#[test]
fn export_streams_every_frame_and_settles() {
    let clock = ManualClock::new();
    let pipeline = ExportPipeline::new(opts(), clock.clone()).unwrap();
    let mut compositor = FrameCompositor::new(CANVAS).unwrap();
    let mut sink = InMemorySink::new();
    let t = timeline(TransitionType::Fade, None);

    let video = pipeline
        .export(&mut compositor, &t, &mut sink, ExportJob::default(), &mut |_| {})
        .unwrap();
    assert_eq!(video.frames, 120);
    assert_eq!(sink.frames().len(), 120);
    assert!(sink.is_ended());
    assert!(!video.has_audio);
    assert_eq!(video.path, None);
    assert_eq!(clock.now(), Duration::from_millis(500));
    assert_eq!(compositor.resident_images(), 0);

    // 45 + 60 static frames composited once per scene, 15 blended frames each composited.
    assert_eq!(video.stats.frames_rendered, 2 + 15);
    assert_eq!(video.stats.frames_elided, 44 + 59);
    assert_eq!(
        sink.config().map(|c| (c.bitrate_bps, c.title.clone())),
        Some((8_000_000, "Unit".to_owned()))
    );
}

#[test]
fn audio_track_is_handed_to_the_sink_and_cleaned_up() {
    let pipeline = ExportPipeline::new(opts(), ManualClock::new()).unwrap();
    let mut compositor = FrameCompositor::new(CANVAS).unwrap();
    let mut sink = InMemorySink::new();
    let track = AudioTrack::from_pcm_s16le(vec![0u8; 4800]).unwrap();
    let t = timeline(TransitionType::HardCut, Some(track));

    let video = pipeline
        .export(&mut compositor, &t, &mut sink, ExportJob::default(), &mut |_| {})
        .unwrap();
    assert!(video.has_audio);
    assert_eq!(
        sink.config().map(|c| c.duration),
        Some(Duration::from_secs(4))
    );
    let wav = sink
        .config()
        .and_then(|c| c.audio.as_ref())
        .map(|a| a.path.clone())
        .unwrap();
    assert!(!wav.exists());
}

#[test]
fn narration_temp_file_spans_the_whole_video() {
    let one_second = AudioTrack::from_pcm_s16le(vec![3u8; 48_000]).unwrap();
    let path = write_audio_temp(&one_second, Duration::from_secs(6)).unwrap();
    let _guard = TempFileGuard(Some(path.clone()));

    let wav = std::fs::read(&path).unwrap();
    assert_eq!(wav.len(), 44 + 288_000);
    assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 288_000);
    assert!(wav[44 + 48_000..].iter().all(|&b| b == 0));
}

#[test]
fn cancelled_before_start_never_opens_the_sink() {
    let pipeline = ExportPipeline::new(opts(), ManualClock::new()).unwrap();
    let mut compositor = FrameCompositor::new(CANVAS).unwrap();
    let mut sink = InMemorySink::new();
    let token = CancelToken::new();
    token.cancel();
    let err = pipeline
        .export(
            &mut compositor,
            &timeline(TransitionType::Fade, None),
            &mut sink,
            ExportJob::new(token),
            &mut |_| {},
        )
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(sink.config().is_none());
}

#[test]
fn compositor_canvas_must_match() {
    let pipeline = ExportPipeline::new(opts(), ManualClock::new()).unwrap();
    let mut compositor = FrameCompositor::new(Canvas {
        width: 2,
        height: 2,
    })
    .unwrap();
    let mut sink = InMemorySink::new();
    assert!(matches!(
        pipeline.export(
            &mut compositor,
            &timeline(TransitionType::Fade, None),
            &mut sink,
            ExportJob::default(),
            &mut |_| {},
        ),
        Err(AssemblyError::Validation(_))
    ));
}

#[test]
fn render_frame_matches_the_plan() {
    let pipeline = ExportPipeline::new(opts(), ManualClock::new()).unwrap();
    let mut compositor = FrameCompositor::new(CANVAS).unwrap();
    let t = timeline(TransitionType::Fade, None);

    let first = pipeline.render_frame(&mut compositor, &t, FrameIndex(0)).unwrap();
    assert_eq!(first.pixel(0, 0), Some([255, 0, 0, 255]));
    let end_of_window = pipeline.render_frame(&mut compositor, &t, FrameIndex(59)).unwrap();
    assert_eq!(end_of_window.pixel(0, 0), Some([0, 255, 0, 255]));
    assert!(pipeline.render_frame(&mut compositor, &t, FrameIndex(120)).is_err());
}
