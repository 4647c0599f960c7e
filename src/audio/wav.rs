//! Narration track container.
//!
//! Narration arrives as headerless PCM: signed 16-bit little-endian, mono, 24 kHz. Playback and
//! export both want a self-describing file, so the bytes are wrapped in a canonical 44-byte RIFF
//! header.

use std::sync::Arc;
use std::time::Duration;

use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Narration sample rate in Hz.
pub const SAMPLE_RATE: u32 = 24_000;
/// Narration channel count.
pub const CHANNELS: u16 = 1;
/// Bits per narration sample.
pub const BITS_PER_SAMPLE: u16 = 16;
/// Size of the RIFF/WAVE header emitted by [`wav_header`].
pub const WAV_HEADER_LEN: usize = 44;

const BLOCK_ALIGN: u16 = CHANNELS * (BITS_PER_SAMPLE / 8);
const BYTE_RATE: u32 = SAMPLE_RATE * BLOCK_ALIGN as u32;

/// Build the 44-byte WAV header for `data_len` bytes of narration PCM.
///
/// Sizes that do not fit in 32 bits saturate; callers reject such buffers up front.
pub fn wav_header(data_len: u32) -> [u8; WAV_HEADER_LEN] {
    let mut h = [0u8; WAV_HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&36u32.saturating_add(data_len).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes());
    h[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    h[24..28].copy_from_slice(&SAMPLE_RATE.to_le_bytes());
    h[28..32].copy_from_slice(&BYTE_RATE.to_le_bytes());
    h[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    h[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    h
}

/// Prefix `pcm` with a WAV header. The result is `pcm.len() + 44` bytes long.
pub fn wrap_pcm_as_wav(pcm: &[u8]) -> AssemblyResult<Vec<u8>> {
    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|n| n.checked_add(36).is_some())
        .ok_or_else(|| AssemblyError::validation("narration PCM exceeds the 4 GiB WAV limit"))?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(&wav_header(data_len));
    out.extend_from_slice(pcm);
    Ok(out)
}

/// The single narration track of a timeline.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pcm: Arc<[u8]>,
}

impl AudioTrack {
    /// Wrap raw narration PCM (s16le, mono, 24 kHz).
    pub fn from_pcm_s16le(pcm: impl Into<Arc<[u8]>>) -> AssemblyResult<Self> {
        let pcm = pcm.into();
        if pcm.len() % usize::from(BLOCK_ALIGN) != 0 {
            return Err(AssemblyError::validation(
                "narration PCM length must be a whole number of 16-bit samples",
            ));
        }
        Ok(Self { pcm })
    }

    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Whether both handles refer to the same PCM buffer.
    pub fn shares_pcm(&self, other: &AudioTrack) -> bool {
        Arc::ptr_eq(&self.pcm, &other.pcm)
    }

    /// Playback length of the track.
    pub fn duration(&self) -> Duration {
        let samples = (self.pcm.len() / usize::from(BLOCK_ALIGN)) as u64;
        Duration::from_nanos(samples.saturating_mul(1_000_000_000) / u64::from(SAMPLE_RATE))
    }

    /// The track padded with silence, or truncated, to exactly `len` (rounded down to a sample).
    pub fn fit_to(&self, len: Duration) -> AudioTrack {
        let samples = len.as_nanos() * u128::from(SAMPLE_RATE) / 1_000_000_000;
        let target = usize::try_from(samples)
            .unwrap_or(usize::MAX / 2)
            .saturating_mul(usize::from(BLOCK_ALIGN));
        if target == self.pcm.len() {
            return self.clone();
        }
        let mut pcm = Vec::with_capacity(target);
        pcm.extend_from_slice(&self.pcm[..target.min(self.pcm.len())]);
        pcm.resize(target, 0);
        Self { pcm: pcm.into() }
    }

    /// The track as a complete WAV file.
    pub fn to_wav(&self) -> AssemblyResult<Vec<u8>> {
        wrap_pcm_as_wav(&self.pcm)
    }
}

impl std::fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrack")
            .field("pcm_len", &self.pcm.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/wav.rs"]
mod tests;
