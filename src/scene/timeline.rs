use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::handle::ImageHandle;
use crate::audio::wav::AudioTrack;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::scene::captions::{CaptionSettings, assign_captions};
use crate::scene::history::SceneVersionStore;

/// On-screen time of every scene, transition included.
pub const SCENE_DURATION: Duration = Duration::from_millis(2000);
/// Length of the blend between consecutive scenes for blending transition types.
pub const TRANSITION_WINDOW: Duration = Duration::from_millis(500);

const _: () = assert!(TRANSITION_WINDOW.as_nanos() <= SCENE_DURATION.as_nanos());

/// How consecutive scenes hand over. One type applies to the whole timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    None,
    HardCut,
    #[default]
    Fade,
    Slide,
    Zoom,
    MotionBlur,
}

impl TransitionType {
    /// `false` for types that switch scenes instantly at the boundary.
    pub fn blends(self) -> bool {
        !matches!(self, Self::None | Self::HardCut)
    }

    /// Duration of the blend window at each scene boundary.
    pub fn window(self) -> Duration {
        if self.blends() {
            TRANSITION_WINDOW
        } else {
            Duration::ZERO
        }
    }
}

/// Where a scene's shot was taken; selects the reference image for regeneration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    Outside,
    Inside,
}

/// One timeline unit: the selected artifact and its caption segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub index: usize,
    /// Borrowed from the scene's history; the history owns the version list.
    pub current_artifact: ImageHandle,
    pub caption: String,
    pub view: ViewType,
}

/// Immutable snapshot of a timeline, consumed by preview and export.
#[derive(Clone, Debug)]
pub struct Timeline {
    pub title: String,
    pub scenes: Vec<Scene>,
    pub transition: TransitionType,
    pub captions: CaptionSettings,
    pub audio: Option<AudioTrack>,
}

impl Timeline {
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scene(&self, index: usize) -> AssemblyResult<&Scene> {
        self.scenes.get(index).ok_or(AssemblyError::SceneOutOfRange {
            scene: index,
            count: self.scenes.len(),
        })
    }

    /// The scene `index` blends into, if any. The last scene never transitions.
    pub fn next_of(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (self.transition.blends() && next < self.scenes.len()).then_some(next)
    }

    /// Non-transitioning part of a scene that is followed by a blend.
    pub fn dwell(&self) -> Duration {
        SCENE_DURATION.saturating_sub(self.transition.window())
    }

    /// Total running time.
    pub fn duration(&self) -> Duration {
        SCENE_DURATION.saturating_mul(self.scenes.len() as u32)
    }

    pub(crate) fn validate(&self) -> AssemblyResult<()> {
        if self.scenes.is_empty() {
            return Err(AssemblyError::validation("timeline has no scenes"));
        }
        if u32::try_from(self.scenes.len()).is_err() {
            return Err(AssemblyError::validation("timeline has too many scenes"));
        }
        self.captions.validate()
    }
}

/// Initial artifacts of one scene.
#[derive(Clone, Debug)]
pub struct SceneInput {
    pub image: ImageHandle,
    /// Extra versions available in the history from the start.
    pub alternates: Vec<ImageHandle>,
    pub view: ViewType,
}

/// Product reference images used to regenerate scenes.
#[derive(Clone, Debug, Default)]
pub struct References {
    pub outside: Option<ImageHandle>,
    pub inside: Option<ImageHandle>,
}

/// Everything a timeline is assembled from.
#[derive(Clone, Debug, Default)]
pub struct TimelineInputs {
    pub title: String,
    pub script: String,
    pub scenes: Vec<SceneInput>,
    pub transition: TransitionType,
    pub captions: CaptionSettings,
    pub audio: Option<AudioTrack>,
    pub references: References,
}

/// Inputs handed to an [`ImageGenerator`] when a scene is regenerated.
#[derive(Debug)]
pub struct RegenerateRequest<'a> {
    pub scene: usize,
    pub view: ViewType,
    /// Reference image chosen by the scene's view type.
    pub reference: &'a ImageHandle,
    pub current: &'a ImageHandle,
    pub title: &'a str,
    pub caption: &'a str,
    /// Free-form direction from the operator, possibly empty.
    pub instruction: &'a str,
}

/// External collaborator producing a new artifact for a scene.
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, req: &RegenerateRequest<'_>) -> AssemblyResult<ImageHandle>;
}

/// The live, editable timeline.
///
/// Scene count is fixed at construction. Artifact history lives in a shared
/// [`SceneVersionStore`] so regenerations of different scenes may run concurrently.
#[derive(Debug)]
pub struct TimelineModel {
    title: String,
    script: String,
    views: Vec<ViewType>,
    captions: Vec<String>,
    store: Arc<SceneVersionStore>,
    transition: TransitionType,
    caption_settings: CaptionSettings,
    audio: Option<AudioTrack>,
    references: References,
}

impl TimelineModel {
    pub fn new(inputs: TimelineInputs) -> AssemblyResult<Self> {
        if inputs.scenes.is_empty() {
            return Err(AssemblyError::validation("a timeline needs at least one scene"));
        }
        inputs.captions.validate()?;

        let views = inputs.scenes.iter().map(|s| s.view).collect();
        let histories = inputs
            .scenes
            .into_iter()
            .map(|s| {
                let mut versions = Vec::with_capacity(1 + s.alternates.len());
                versions.push(s.image);
                versions.extend(s.alternates);
                versions
            })
            .collect();
        let store = Arc::new(SceneVersionStore::new(histories)?);
        let captions = assign_captions(&inputs.script, store.scene_count());

        Ok(Self {
            title: inputs.title,
            script: inputs.script,
            views,
            captions,
            store,
            transition: inputs.transition,
            caption_settings: inputs.captions,
            audio: inputs.audio,
            references: inputs.references,
        })
    }

    /// Freeze the current state for rendering.
    pub fn snapshot(&self) -> Timeline {
        let scenes = self
            .store
            .current_all()
            .into_iter()
            .enumerate()
            .map(|(index, current_artifact)| Scene {
                index,
                current_artifact,
                caption: self.captions[index].clone(),
                view: self.views[index],
            })
            .collect();
        Timeline {
            title: self.title.clone(),
            scenes,
            transition: self.transition,
            captions: self.caption_settings.clone(),
            audio: self.audio.clone(),
        }
    }

    pub fn scene_count(&self) -> usize {
        self.store.scene_count()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Caption segment of every scene, in timeline order.
    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    pub fn transition(&self) -> TransitionType {
        self.transition
    }

    pub fn caption_settings(&self) -> &CaptionSettings {
        &self.caption_settings
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    pub fn store(&self) -> &Arc<SceneVersionStore> {
        &self.store
    }

    pub fn set_transition(&mut self, transition: TransitionType) {
        self.transition = transition;
    }

    pub fn set_caption_settings(&mut self, settings: CaptionSettings) -> AssemblyResult<()> {
        settings.validate()?;
        self.caption_settings = settings;
        Ok(())
    }

    /// Replace the narration script and re-derive every caption segment.
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
        self.captions = assign_captions(&self.script, self.scene_count());
    }

    pub fn set_audio(&mut self, audio: Option<AudioTrack>) {
        self.audio = audio;
    }

    pub fn history_of(&self, scene: usize) -> AssemblyResult<Vec<ImageHandle>> {
        self.store.history_of(scene)
    }

    pub fn select_version(&self, scene: usize, version: usize) -> AssemblyResult<()> {
        self.store.select(scene, version)
    }

    /// Append user-supplied image bytes as the new current version of `scene`.
    pub fn replace_artifact(
        &self,
        scene: usize,
        bytes: impl Into<Arc<[u8]>>,
    ) -> AssemblyResult<ImageHandle> {
        let _guard = self.store.regeneration_guard(scene)?;
        self.store.append(scene, ImageHandle::new(bytes))
    }

    /// Reference image for regenerating `scene`: the inside reference for inside shots when one
    /// exists, the outside reference otherwise.
    pub fn reference_for(&self, scene: usize) -> AssemblyResult<Option<&ImageHandle>> {
        let view = *self.views.get(scene).ok_or(AssemblyError::SceneOutOfRange {
            scene,
            count: self.views.len(),
        })?;
        let inside = self.references.inside.as_ref();
        Ok(match view {
            ViewType::Inside if inside.is_some() => inside,
            _ => self.references.outside.as_ref(),
        })
    }

    /// Ask `generator` for a fresh artifact and append it as the new current version.
    ///
    /// Regenerations of the same scene are serialized; the last to complete is current. When no
    /// reference image is configured the current artifact is used as the reference.
    #[tracing::instrument(skip(self, generator, instruction), err)]
    pub fn regenerate(
        &self,
        scene: usize,
        generator: &dyn ImageGenerator,
        instruction: &str,
    ) -> AssemblyResult<ImageHandle> {
        let _guard = self.store.regeneration_guard(scene)?;
        let current = self.store.current(scene)?;
        let reference = self.reference_for(scene)?.unwrap_or(&current);
        let req = RegenerateRequest {
            scene,
            view: self.views[scene],
            reference,
            current: &current,
            title: &self.title,
            caption: &self.captions[scene],
            instruction,
        };
        let artifact = generator.generate(&req)?;
        tracing::info!(scene, artifact = artifact.id().0, "scene regenerated");
        self.store.append(scene, artifact)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/timeline.rs"]
mod tests;
