//! Interactive preview loop.
//!
//! The scheduler owns a monotonic [`Clock`] and derives the playback position from the time
//! elapsed since `start`, instead of chaining per-scene timers. Each scene is on screen for
//! [`SCENE_DURATION`]; when a blending transition follows, its last
//! [`TRANSITION_WINDOW`](crate::scene::timeline::TRANSITION_WINDOW) sweeps progress from 0 to 1
//! towards the next scene.

use std::time::Duration;

use crate::audio::device::{AudioDevice, AudioRegistry};
use crate::foundation::clock::Clock;
use crate::foundation::error::AssemblyResult;
use crate::scene::timeline::{SCENE_DURATION, Timeline};

/// Observable preview state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackState {
    pub current_scene: usize,
    pub transitioning_to: Option<usize>,
    /// Progress through the current transition, `0..1`.
    pub progress: f32,
    pub playing: bool,
}

/// Where the timeline is at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackPosition {
    pub scene: usize,
    pub next: Option<usize>,
    pub progress: f32,
}

/// Position of `timeline` after `elapsed` of playback, or `None` once it has ended.
pub fn position_at(timeline: &Timeline, elapsed: Duration) -> Option<PlaybackPosition> {
    let scene_nanos = SCENE_DURATION.as_nanos();
    let scene = usize::try_from(elapsed.as_nanos() / scene_nanos).ok()?;
    if scene >= timeline.scene_count() {
        return None;
    }
    let into_scene = elapsed.as_nanos() % scene_nanos;
    let dwell = timeline.dwell().as_nanos();

    match timeline.next_of(scene) {
        Some(next) if into_scene >= dwell => {
            let window = timeline.transition.window().as_nanos();
            let progress = ((into_scene - dwell) as f64 / window as f64) as f32;
            Some(PlaybackPosition {
                scene,
                next: Some(next),
                progress: progress.clamp(0.0, 1.0),
            })
        }
        _ => Some(PlaybackPosition {
            scene,
            next: None,
            progress: 0.0,
        }),
    }
}

/// Drives preview playback against an injected clock.
pub struct PlaybackScheduler<C: Clock> {
    clock: C,
    audio: AudioRegistry,
    slot: usize,
    started_at: Option<Duration>,
    state: PlaybackState,
}

impl<C: Clock> PlaybackScheduler<C> {
    pub fn new(clock: C, device: Box<dyn AudioDevice>) -> Self {
        Self {
            clock,
            audio: AudioRegistry::new(device),
            slot: 0,
            started_at: None,
            state: PlaybackState::default(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Point the scheduler at another timeline slot. Playback stops and the previous slot's
    /// voice is released.
    pub fn bind_slot(&mut self, slot: usize) {
        if slot == self.slot {
            return;
        }
        self.stop();
        self.audio.release(self.slot);
        self.slot = slot;
    }

    /// Number of audio voices currently held.
    pub fn audio_voices(&self) -> usize {
        self.audio.len()
    }

    /// Begin playback from the first scene. Returns `false` (and does nothing) when already
    /// playing.
    ///
    /// Audio failures are logged and playback continues silently.
    pub fn start(&mut self, timeline: &Timeline) -> bool {
        if self.state.playing {
            return false;
        }
        match timeline.audio.as_ref() {
            Some(track) => {
                if let Err(e) = self.audio.play(self.slot, track, Duration::ZERO) {
                    tracing::warn!(error = %e, "preview audio unavailable; playing silently");
                }
            }
            None => {
                self.audio.release(self.slot);
            }
        }
        self.started_at = Some(self.clock.now());
        self.state = PlaybackState {
            current_scene: 0,
            transitioning_to: None,
            progress: 0.0,
            playing: true,
        };
        tracing::debug!(scenes = timeline.scene_count(), "preview started");
        true
    }

    /// Stop playback and pause audio. Safe to call in any state.
    pub fn stop(&mut self) {
        self.audio.pause_all();
        self.started_at = None;
        self.state.playing = false;
        self.state.transitioning_to = None;
        self.state.progress = 0.0;
    }

    /// Stop when playing, start otherwise. Returns whether playback is running afterwards.
    pub fn toggle(&mut self, timeline: &Timeline) -> bool {
        if self.state.playing {
            self.stop();
            false
        } else {
            self.start(timeline)
        }
    }

    /// Advance the state to the clock's current time and hand it to `present`.
    ///
    /// Returns whether playback is still running. Reaching the end of the timeline stops
    /// playback, and so does an error from `present`.
    pub fn tick<F>(&mut self, timeline: &Timeline, present: &mut F) -> bool
    where
        F: FnMut(&PlaybackState) -> AssemblyResult<()>,
    {
        let Some(started_at) = self.started_at.filter(|_| self.state.playing) else {
            return false;
        };
        let elapsed = self.clock.now().saturating_sub(started_at);
        let Some(pos) = position_at(timeline, elapsed) else {
            tracing::debug!("preview reached the end of the timeline");
            self.stop();
            return false;
        };

        if pos.scene != self.state.current_scene || pos.next != self.state.transitioning_to {
            tracing::debug!(scene = pos.scene, next = ?pos.next, "preview position");
        }
        self.state.current_scene = pos.scene;
        self.state.transitioning_to = pos.next;
        self.state.progress = pos.progress;

        if let Err(e) = present(&self.state) {
            tracing::warn!(error = %e, "preview frame failed; stopping playback");
            self.stop();
            return false;
        }
        true
    }

    /// Tick every `frame_interval` until playback stops.
    pub fn run<F>(&mut self, timeline: &Timeline, frame_interval: Duration, mut present: F)
    where
        F: FnMut(&PlaybackState) -> AssemblyResult<()>,
    {
        while self.tick(timeline, &mut present) {
            self.clock.sleep(frame_interval);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
