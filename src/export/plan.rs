use crate::effects::transitions::window_progress;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::scene::timeline::{SCENE_DURATION, Timeline};

/// What one export frame shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedFrame {
    pub scene: usize,
    /// Incoming scene while blending.
    pub next: Option<usize>,
    pub progress: f32,
}

/// Frame layout of an export at a fixed cadence.
///
/// Every scene gets `frames_per_scene` frames. When a blending transition follows, its last
/// `frames_per_transition` of them are blended towards the next scene, so the total never
/// depends on the transition type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub scene_count: usize,
    pub frames_per_scene: u64,
    pub frames_per_transition: u64,
}

impl FramePlan {
    pub fn new(timeline: &Timeline, fps: Fps) -> AssemblyResult<Self> {
        let frames_per_scene = fps.frames_in(SCENE_DURATION);
        if frames_per_scene == 0 {
            return Err(AssemblyError::validation(
                "fps too low: a scene must span at least one frame",
            ));
        }
        Ok(Self {
            scene_count: timeline.scene_count(),
            frames_per_scene,
            frames_per_transition: fps.frames_in(timeline.transition.window()),
        })
    }

    pub fn total_frames(&self) -> u64 {
        self.frames_per_scene * self.scene_count as u64
    }

    /// Whether `scene` ends in a blend.
    pub fn blends_after(&self, scene: usize) -> bool {
        self.frames_per_transition > 0 && scene + 1 < self.scene_count
    }

    /// Non-blended frames of `scene`.
    pub fn static_frames(&self, scene: usize) -> u64 {
        if self.blends_after(scene) {
            self.frames_per_scene - self.frames_per_transition
        } else {
            self.frames_per_scene
        }
    }

    /// Contents of export frame `index`, or `None` past the end.
    pub fn frame_at(&self, index: FrameIndex) -> Option<PlannedFrame> {
        if index.0 >= self.total_frames() {
            return None;
        }
        let scene = (index.0 / self.frames_per_scene) as usize;
        let within = index.0 % self.frames_per_scene;
        let statics = self.static_frames(scene);
        if within < statics {
            return Some(PlannedFrame {
                scene,
                next: None,
                progress: 0.0,
            });
        }
        Some(PlannedFrame {
            scene,
            next: Some(scene + 1),
            progress: window_progress(within - statics, self.frames_per_transition),
        })
    }

    /// Overall progress after `done` frames: `floor(done / total * 100)`.
    pub fn percent_after(&self, done: u64) -> u8 {
        let total = self.total_frames();
        if total == 0 {
            return 100;
        }
        (u128::from(done.min(total)) * 100 / u128::from(total)) as u8
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/plan.rs"]
mod tests;
