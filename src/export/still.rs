use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::export::pipeline::OUTPUT_STEM;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::scene::timeline::Timeline;

/// `creative-assembly-scene-<n+1>.png` for 0-based scene `n`.
pub fn still_file_name(scene: usize) -> String {
    format!("creative-assembly-scene-{}.png", scene + 1)
}

/// File name of the narration download.
pub fn wav_file_name() -> String {
    format!("{OUTPUT_STEM}.wav")
}

/// Write the currently selected artifact of `scene` to `out_dir` as PNG.
#[tracing::instrument(skip(timeline, out_dir), err)]
pub fn export_scene_still(
    timeline: &Timeline,
    scene: usize,
    out_dir: &Path,
) -> AssemblyResult<PathBuf> {
    let artifact = &timeline.scene(scene)?.current_artifact;
    let img = image::load_from_memory(artifact.bytes())
        .map_err(|e| AssemblyError::asset_decode(scene, e.to_string()))?;

    let path = out_dir.join(still_file_name(scene));
    ensure_parent_dir(&path)?;
    img.save_with_format(&path, image::ImageFormat::Png)
        .with_context(|| format!("write still '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "scene still written");
    Ok(path)
}

/// Write the timeline's narration to `out_dir` as `Creative_Assembly_UGC.wav`.
pub fn export_narration_wav(timeline: &Timeline, out_dir: &Path) -> AssemblyResult<PathBuf> {
    let track = timeline
        .audio
        .as_ref()
        .ok_or_else(|| AssemblyError::validation("timeline has no narration track"))?;
    let path = out_dir.join(wav_file_name());
    ensure_parent_dir(&path)?;
    std::fs::write(&path, track.to_wav()?)
        .with_context(|| format!("write narration '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/export/still.rs"]
mod tests;
