use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Final MP4 path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background colour used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Output is written next to the target as `<name>.part` and renamed into place only when the
/// encoder exits cleanly, so an aborted or failed export never leaves a file at `out_path`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    finished: Option<PathBuf>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            finished: None,
        }
    }

    fn part_path(&self) -> PathBuf {
        let mut name = self
            .opts
            .out_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".part");
        self.opts.out_path.with_file_name(name)
    }

    fn join_stderr(&mut self) -> Vec<u8> {
        self.stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default()
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> AssemblyResult<()> {
        cfg.canvas.validate()?;
        if !cfg.canvas.width.is_multiple_of(2) || !cfg.canvas.height.is_multiple_of(2) {
            return Err(AssemblyError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if cfg.bitrate_bps == 0 {
            return Err(AssemblyError::validation("bitrate must be non-zero"));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(AssemblyError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(AssemblyError::encoder_unavailable(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let part = self.part_path();
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(encoder_args(&cfg, &part));

        let mut child = cmd.spawn().map_err(|e| {
            AssemblyError::encoder_unavailable(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AssemblyError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AssemblyError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(part = %part.display(), "ffmpeg session opened");
        self.scratch = vec![0u8; cfg.canvas.rgba_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.finished = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> AssemblyResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| AssemblyError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(AssemblyError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(AssemblyError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(AssemblyError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(AssemblyError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            AssemblyError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> AssemblyResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| AssemblyError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            AssemblyError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = self.join_stderr();
        let part = self.part_path();
        self.cfg = None;

        if !status.success() {
            let _ = std::fs::remove_file(&part);
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(AssemblyError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        std::fs::rename(&part, &self.opts.out_path).map_err(|e| {
            let _ = std::fs::remove_file(&part);
            AssemblyError::encode(format!(
                "move '{}' into place: {e}",
                self.opts.out_path.display()
            ))
        })?;
        self.finished = Some(self.opts.out_path.clone());
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            let _ = self.join_stderr();
            let _ = std::fs::remove_file(self.part_path());
            tracing::debug!("ffmpeg session aborted");
        }
        self.cfg = None;
    }

    fn output_path(&self) -> Option<&Path> {
        self.finished.as_deref()
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Command line for one encode of `cfg` into `part`.
///
/// The video stream decides the length: audio is padded with silence and cut at `cfg.duration`.
fn encoder_args(cfg: &SinkConfig, part: &Path) -> Vec<OsString> {
    fn strs<'a, const N: usize>(items: [&'a str; N]) -> impl Iterator<Item = OsString> + 'a {
        items.into_iter().map(OsString::from)
    }

    let mut args: Vec<OsString> = Vec::new();

    // Input: raw RGBA8, flattened to opaque in push_frame.
    args.extend(strs(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"]));
    args.extend(strs(["-s", &format!("{}x{}", cfg.canvas.width, cfg.canvas.height)]));
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    args.extend(strs(["-r", &format!("{}/{}", cfg.fps.num, cfg.fps.den)]));
    args.extend(strs(["-i", "pipe:0"]));

    match cfg.audio.as_ref() {
        Some(audio) => {
            args.push("-i".into());
            args.push(audio.path.clone().into_os_string());
            args.extend(strs(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac", "-af", "apad"]));
            args.extend(strs(["-t", &format!("{:.3}", cfg.duration.as_secs_f64())]));
        }
        None => args.push("-an".into()),
    }

    let bitrate = cfg.bitrate_bps.to_string();
    args.extend(strs([
        "-c:v",
        "libx264",
        "-b:v",
        &bitrate,
        "-maxrate",
        &bitrate,
        "-bufsize",
        &(u64::from(cfg.bitrate_bps) * 2).to_string(),
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]));
    if !cfg.title.is_empty() {
        args.push("-metadata".into());
        args.push(format!("title={}", cfg.title).into());
    }
    args.extend(strs(["-f", "mp4"]));
    args.push(part.as_os_str().to_owned());
    args
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> AssemblyResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(AssemblyError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let [bg_r, bg_g, bg_b, _] = bg_rgba.map(u16::from);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AssemblyResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
