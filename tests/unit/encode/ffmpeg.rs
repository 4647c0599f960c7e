use std::time::Duration;

use super::*;
use crate::encode::sink::AudioInputConfig;
use crate::foundation::core::{Canvas, Fps};

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        canvas: Canvas { width, height },
        fps: Fps::integer(30).unwrap(),
        bitrate_bps: 1_000_000,
        duration: Duration::from_secs(1),
        audio: None,
        title: "Test".to_owned(),
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "creative_assembly_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn flatten_premul_over_black_produces_expected_rgb() {
    // Premultiplied red @ 50% alpha => rgb is 128,0,0 when premul.
    let src = vec![128u8, 0u8, 0u8, 128u8];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
}

#[test]
fn flatten_transparent_over_white_is_white() {
    let src = vec![0u8, 0, 0, 0, 10, 20, 30, 255];
    let mut dst = vec![0u8; 8];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [255, 255, 255, 255]).unwrap();
    assert_eq!(dst, vec![255, 255, 255, 255, 10, 20, 30, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 4];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0u8; 8], [0, 0, 0, 255]).is_err());
}

fn arg_strings(cfg: &SinkConfig) -> Vec<String> {
    encoder_args(cfg, Path::new("/tmp/out/clip.mp4.part"))
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn short_narration_never_shortens_the_video() {
    let mut c = cfg(1080, 1920);
    c.duration = Duration::from_secs(6);
    c.audio = Some(AudioInputConfig {
        path: PathBuf::from("/tmp/narration.wav"),
    });
    let args = arg_strings(&c);

    assert!(!args.iter().any(|a| a == "-shortest"));
    assert_eq!(value_after(&args, "-af"), Some("apad"));
    assert_eq!(value_after(&args, "-t"), Some("6.000"));
    assert_eq!(value_after(&args, "-c:a"), Some("aac"));
    let inputs: Vec<_> = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "-i")
        .map(|(i, _)| args[i + 1].as_str())
        .collect();
    assert_eq!(inputs, ["pipe:0", "/tmp/narration.wav"]);
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out/clip.mp4.part"));
}

#[test]
fn video_only_encode_drops_audio() {
    let args = arg_strings(&cfg(16, 16));
    assert!(args.iter().any(|a| a == "-an"));
    assert_eq!(value_after(&args, "-t"), None);
    assert_eq!(value_after(&args, "-r"), Some("30/1"));
    assert_eq!(value_after(&args, "-s"), Some("16x16"));
    assert_eq!(value_after(&args, "-metadata"), Some("title=Test"));
    assert_eq!(value_after(&args, "-bufsize"), Some("2000000"));
}

#[test]
fn part_file_sits_next_to_the_output() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/out/video.mp4"));
    assert_eq!(sink.part_path(), PathBuf::from("/tmp/out/video.mp4.part"));
}

#[test]
fn begin_rejects_bad_config_before_spawning() {
    let out = temp_path("ffmpeg_bad_cfg").join("out.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    assert!(matches!(
        sink.begin(cfg(11, 10)),
        Err(AssemblyError::Validation(_))
    ));
    let mut zero_rate = cfg(10, 10);
    zero_rate.bitrate_bps = 0;
    assert!(matches!(
        sink.begin(zero_rate),
        Err(AssemblyError::Validation(_))
    ));
    assert!(sink.output_path().is_none());
}

#[test]
fn begin_refuses_to_overwrite_when_asked() {
    let dir = temp_path("ffmpeg_no_overwrite");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("out.mp4");
    std::fs::write(&out, b"existing").unwrap();

    let mut opts = FfmpegSinkOpts::new(&out);
    opts.overwrite = false;
    let mut sink = FfmpegSink::new(opts);
    assert!(matches!(
        sink.begin(cfg(10, 10)),
        Err(AssemblyError::Validation(_))
    ));
    assert_eq!(std::fs::read(&out).unwrap(), b"existing");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(temp_path("ffmpeg_unstarted")));
    let frame = FrameRGBA::new(Canvas {
        width: 2,
        height: 2,
    })
    .unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
    sink.abort();
}

#[test]
fn encodes_and_moves_into_place_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = temp_path("ffmpeg_encode");
    let out = dir.join("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(16, 16)).unwrap();
    let mut frame = FrameRGBA::new(Canvas {
        width: 16,
        height: 16,
    })
    .unwrap();
    frame.fill([255, 0, 0, 255]);
    for i in 0..5 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    sink.end().unwrap();
    assert_eq!(sink.output_path(), Some(out.as_path()));
    assert!(out.exists());
    assert!(!dir.join("clip.mp4.part").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn abort_discards_the_partial_file() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = temp_path("ffmpeg_abort");
    let out = dir.join("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(16, 16)).unwrap();
    let frame = FrameRGBA::new(Canvas {
        width: 16,
        height: 16,
    })
    .unwrap();
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.abort();
    sink.abort();
    assert!(!out.exists());
    assert!(!dir.join("clip.mp4.part").exists());
    assert!(sink.output_path().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}
