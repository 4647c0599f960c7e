//! JSON project boundary.
//!
//! A project file names the generated artifacts on disk and carries the editing choices made for
//! them. It is validated once here and turned into a strict [`TimelineModel`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::assets::handle::ImageHandle;
use crate::audio::wav::AudioTrack;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::scene::captions::CaptionSettings;
use crate::scene::timeline::{
    References, SceneInput, TimelineInputs, TimelineModel, TransitionType, ViewType,
};

/// One scene entry of a project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneEntry {
    /// Initial artifact.
    pub image: String,
    #[serde(default)]
    pub alternates: Vec<String>,
    #[serde(default)]
    pub view: ViewType,
}

/// Reference images for regeneration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub outside: Option<String>,
    #[serde(default)]
    pub inside: Option<String>,
}

/// Serialized project. All paths are relative to the project file's directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    pub title: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub transition: TransitionType,
    #[serde(default)]
    pub captions: CaptionSettings,
    pub scenes: Vec<SceneEntry>,
    #[serde(default)]
    pub reference: ReferenceEntry,
    /// Raw narration PCM (s16le, mono, 24 kHz).
    #[serde(default)]
    pub audio: Option<String>,
    /// TrueType/OpenType font used for captions.
    #[serde(default)]
    pub caption_font: Option<String>,
}

impl ProjectFile {
    pub fn from_reader<R: std::io::Read>(r: R) -> AssemblyResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| AssemblyError::validation(format!("parse project JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> AssemblyResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AssemblyError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Load every referenced file under `root` and build the live timeline.
    pub fn into_model(&self, root: &Path) -> AssemblyResult<TimelineModel> {
        if self.scenes.is_empty() {
            return Err(AssemblyError::validation("project has no scenes"));
        }

        let scenes = self
            .scenes
            .iter()
            .map(|s| {
                Ok(SceneInput {
                    image: ImageHandle::new(read_asset(root, &s.image)?),
                    alternates: s
                        .alternates
                        .iter()
                        .map(|a| Ok(ImageHandle::new(read_asset(root, a)?)))
                        .collect::<AssemblyResult<Vec<_>>>()?,
                    view: s.view,
                })
            })
            .collect::<AssemblyResult<Vec<_>>>()?;

        let load_opt = |p: &Option<String>| -> AssemblyResult<Option<ImageHandle>> {
            p.as_deref()
                .map(|p| Ok(ImageHandle::new(read_asset(root, p)?)))
                .transpose()
        };
        let references = References {
            outside: load_opt(&self.reference.outside)?,
            inside: load_opt(&self.reference.inside)?,
        };

        let audio = self
            .audio
            .as_deref()
            .map(|p| AudioTrack::from_pcm_s16le(read_asset(root, p)?))
            .transpose()?;

        TimelineModel::new(TimelineInputs {
            title: self.title.clone(),
            script: self.script.clone(),
            scenes,
            transition: self.transition,
            captions: self.captions.clone(),
            audio,
            references,
        })
    }

    /// Bytes of the configured caption font, if any.
    pub fn caption_font_bytes(&self, root: &Path) -> AssemblyResult<Option<Vec<u8>>> {
        self.caption_font
            .as_deref()
            .map(|p| read_asset(root, p))
            .transpose()
    }
}

/// Resolve a project-relative path under `root` and read it.
pub fn read_asset(root: &Path, rel: &str) -> AssemblyResult<Vec<u8>> {
    let path = resolve_rel_path(root, rel)?;
    let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    Ok(bytes)
}

fn resolve_rel_path(root: &Path, rel: &str) -> AssemblyResult<PathBuf> {
    Ok(root.join(normalize_rel_path(rel)?))
}

/// Normalize a project-relative path.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths and parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> AssemblyResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(AssemblyError::validation("project paths must be relative"));
    }
    if s.is_empty() {
        return Err(AssemblyError::validation("project path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AssemblyError::validation(
                "project paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AssemblyError::validation(
            "project path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;
