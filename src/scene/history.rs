//! Append-only per-scene artifact history.
//!
//! Each scene owns a lane holding its ordered versions and a pointer to the current one.
//! Versions are never removed or reordered; switching versions only moves the pointer. Lanes are
//! locked independently, so edits to different scenes never contend.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assets::handle::ImageHandle;
use crate::foundation::error::{AssemblyError, AssemblyResult};

struct SceneHistory {
    versions: Vec<ImageHandle>,
    current: usize,
}

struct Lane {
    history: RwLock<SceneHistory>,
    regen: Mutex<()>,
}

/// Version history for every scene of a timeline.
pub struct SceneVersionStore {
    lanes: Vec<Lane>,
}

impl SceneVersionStore {
    /// Build a store from the initial versions of each scene. The first entry of each scene
    /// becomes current.
    pub fn new(initial: Vec<Vec<ImageHandle>>) -> AssemblyResult<Self> {
        let lanes = initial
            .into_iter()
            .enumerate()
            .map(|(scene, versions)| {
                if versions.is_empty() {
                    return Err(AssemblyError::validation(format!(
                        "scene {scene} needs at least one image"
                    )));
                }
                Ok(Lane {
                    history: RwLock::new(SceneHistory {
                        versions,
                        current: 0,
                    }),
                    regen: Mutex::new(()),
                })
            })
            .collect::<AssemblyResult<Vec<_>>>()?;
        Ok(Self { lanes })
    }

    pub fn scene_count(&self) -> usize {
        self.lanes.len()
    }

    /// Add a new version for `scene` and make it current.
    pub fn append(&self, scene: usize, artifact: ImageHandle) -> AssemblyResult<ImageHandle> {
        let mut h = self.write(scene)?;
        h.versions.push(artifact.clone());
        h.current = h.versions.len() - 1;
        tracing::debug!(scene, version = h.current, "appended scene version");
        Ok(artifact)
    }

    /// Point `scene` at an existing version.
    ///
    /// An out-of-range `version` fails with [`AssemblyError::InvalidVersionIndex`] and leaves the
    /// current artifact untouched.
    pub fn select(&self, scene: usize, version: usize) -> AssemblyResult<()> {
        let mut h = self.write(scene)?;
        if version >= h.versions.len() {
            return Err(AssemblyError::InvalidVersionIndex {
                scene,
                version,
                len: h.versions.len(),
            });
        }
        h.current = version;
        Ok(())
    }

    /// All versions of `scene` in creation order.
    pub fn history_of(&self, scene: usize) -> AssemblyResult<Vec<ImageHandle>> {
        Ok(self.read(scene)?.versions.clone())
    }

    /// The currently selected artifact of `scene`.
    pub fn current(&self, scene: usize) -> AssemblyResult<ImageHandle> {
        let h = self.read(scene)?;
        Ok(h.versions[h.current].clone())
    }

    /// Index of the currently selected version of `scene`.
    pub fn current_version(&self, scene: usize) -> AssemblyResult<usize> {
        Ok(self.read(scene)?.current)
    }

    /// Current artifact of every scene, in timeline order.
    pub fn current_all(&self) -> Vec<ImageHandle> {
        self.lanes
            .iter()
            .map(|lane| {
                let h = read_lane(lane);
                h.versions[h.current].clone()
            })
            .collect()
    }

    /// Hold the regeneration section of `scene`. Regenerations of one scene run one at a time.
    pub(crate) fn regeneration_guard(&self, scene: usize) -> AssemblyResult<MutexGuard<'_, ()>> {
        let lane = self.lane(scene)?;
        Ok(lane.regen.lock().unwrap_or_else(|p| p.into_inner()))
    }

    fn lane(&self, scene: usize) -> AssemblyResult<&Lane> {
        self.lanes.get(scene).ok_or(AssemblyError::SceneOutOfRange {
            scene,
            count: self.lanes.len(),
        })
    }

    fn read(&self, scene: usize) -> AssemblyResult<RwLockReadGuard<'_, SceneHistory>> {
        Ok(read_lane(self.lane(scene)?))
    }

    fn write(&self, scene: usize) -> AssemblyResult<RwLockWriteGuard<'_, SceneHistory>> {
        let lane = self.lane(scene)?;
        Ok(lane.history.write().unwrap_or_else(|p| p.into_inner()))
    }
}

fn read_lane(lane: &Lane) -> RwLockReadGuard<'_, SceneHistory> {
    lane.history.read().unwrap_or_else(|p| p.into_inner())
}

impl std::fmt::Debug for SceneVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lens: Vec<usize> = self
            .lanes
            .iter()
            .map(|lane| read_lane(lane).versions.len())
            .collect();
        f.debug_struct("SceneVersionStore")
            .field("versions_per_scene", &lens)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/history.rs"]
mod tests;
