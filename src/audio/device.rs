//! Preview audio output.
//!
//! Voices are owned by an [`AudioRegistry`] keyed by timeline slot. A voice is opened lazily the
//! first time its slot plays and reopened when the slot's track changes. It is paused and
//! dropped when the slot is released, when the timeline is swapped, or when the registry itself
//! is dropped.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::wav::AudioTrack;
use crate::foundation::error::AssemblyResult;

/// One playable instance of a decoded track.
pub trait AudioVoice {
    /// Start (or resume) playback at `offset` into the track.
    fn play_from(&mut self, offset: Duration) -> AssemblyResult<()>;
    /// Pause playback. Pausing a paused voice is a no-op.
    fn pause(&mut self);
}

/// An output device able to open voices from WAV bytes.
pub trait AudioDevice {
    fn open(&mut self, wav: &[u8]) -> AssemblyResult<Box<dyn AudioVoice>>;
}

/// Scoped ownership of preview voices, keyed by timeline slot.
pub struct AudioRegistry {
    device: Box<dyn AudioDevice>,
    voices: HashMap<usize, SlotVoice>,
}

struct SlotVoice {
    track: AudioTrack,
    voice: Box<dyn AudioVoice>,
}

impl AudioRegistry {
    pub fn new(device: Box<dyn AudioDevice>) -> Self {
        Self {
            device,
            voices: HashMap::new(),
        }
    }

    /// Play `track` from `offset` on the voice for `slot`.
    ///
    /// The voice is opened on first use. If the slot already holds a voice for a different
    /// track, that voice is released and a new one is opened.
    pub fn play(&mut self, slot: usize, track: &AudioTrack, offset: Duration) -> AssemblyResult<()> {
        if self
            .voices
            .get(&slot)
            .is_some_and(|held| !held.track.shares_pcm(track))
        {
            tracing::debug!(slot, "preview track changed");
            self.release(slot);
        }
        let held = match self.voices.entry(slot) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let wav = track.to_wav()?;
                let voice = self.device.open(&wav)?;
                tracing::debug!(slot, "opened preview voice");
                e.insert(SlotVoice {
                    track: track.clone(),
                    voice,
                })
            }
        };
        held.voice.play_from(offset)
    }

    /// Pause every live voice without releasing it.
    pub fn pause_all(&mut self) {
        for held in self.voices.values_mut() {
            held.voice.pause();
        }
    }

    /// Pause and drop the voice for `slot`. Returns `true` if one was held.
    pub fn release(&mut self, slot: usize) -> bool {
        match self.voices.remove(&slot) {
            Some(mut held) => {
                held.voice.pause();
                tracing::debug!(slot, "released preview voice");
                true
            }
            None => false,
        }
    }

    /// Pause and drop every voice.
    pub fn release_all(&mut self) {
        for (_, mut held) in self.voices.drain() {
            held.voice.pause();
        }
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.voices.contains_key(&slot)
    }

    /// Number of voices currently held.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

impl Drop for AudioRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Headless device whose voices do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioDevice;

struct NullVoice;

impl AudioVoice for NullVoice {
    fn play_from(&mut self, _offset: Duration) -> AssemblyResult<()> {
        Ok(())
    }

    fn pause(&mut self) {}
}

impl AudioDevice for NullAudioDevice {
    fn open(&mut self, _wav: &[u8]) -> AssemblyResult<Box<dyn AudioVoice>> {
        Ok(Box::new(NullVoice))
    }
}

/// Observable voice lifecycle event recorded by [`RecordingAudioDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Opened { voice: usize, wav_len: usize },
    Played { voice: usize, offset: Duration },
    Paused { voice: usize },
    Dropped { voice: usize },
}

/// Device that records voice activity instead of producing sound. Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingAudioDevice {
    log: Arc<Mutex<Vec<AudioEvent>>>,
    opened: usize,
}

impl RecordingAudioDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AudioEvent> {
        lock_log(&self.log).clone()
    }

    /// Number of voices opened and not yet dropped.
    pub fn live_voices(&self) -> usize {
        let log = lock_log(&self.log);
        let opened = log
            .iter()
            .filter(|e| matches!(e, AudioEvent::Opened { .. }))
            .count();
        let dropped = log
            .iter()
            .filter(|e| matches!(e, AudioEvent::Dropped { .. }))
            .count();
        opened - dropped
    }
}

fn lock_log(log: &Mutex<Vec<AudioEvent>>) -> std::sync::MutexGuard<'_, Vec<AudioEvent>> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct RecordingVoice {
    id: usize,
    log: Arc<Mutex<Vec<AudioEvent>>>,
}

impl AudioVoice for RecordingVoice {
    fn play_from(&mut self, offset: Duration) -> AssemblyResult<()> {
        lock_log(&self.log).push(AudioEvent::Played {
            voice: self.id,
            offset,
        });
        Ok(())
    }

    fn pause(&mut self) {
        lock_log(&self.log).push(AudioEvent::Paused { voice: self.id });
    }
}

impl Drop for RecordingVoice {
    fn drop(&mut self) {
        lock_log(&self.log).push(AudioEvent::Dropped { voice: self.id });
    }
}

impl AudioDevice for RecordingAudioDevice {
    fn open(&mut self, wav: &[u8]) -> AssemblyResult<Box<dyn AudioVoice>> {
        let id = self.opened;
        self.opened += 1;
        lock_log(&self.log).push(AudioEvent::Opened {
            voice: id,
            wav_len: wav.len(),
        });
        Ok(Box::new(RecordingVoice {
            id,
            log: Arc::clone(&self.log),
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/device.rs"]
mod tests;
