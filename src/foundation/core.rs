use std::time::Duration;

use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Absolute 0-based frame index in export timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> AssemblyResult<Self> {
        if den == 0 {
            return Err(AssemblyError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(AssemblyError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole frames per second, the only form the encoder accepts.
    pub fn integer(num: u32) -> AssemblyResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Number of whole frames that fit in `d` (floor).
    ///
    /// Exact for the millisecond durations the timeline uses: 2000 ms at 30 fps is 60 frames.
    pub fn frames_in(self, d: Duration) -> u64 {
        let num = d.as_nanos() * u128::from(self.num);
        let den = 1_000_000_000u128 * u128::from(self.den);
        (num / den) as u64
    }

    /// Duration of `frames` frames.
    pub fn duration_of(self, frames: u64) -> Duration {
        let nanos = u128::from(frames) * 1_000_000_000u128 * u128::from(self.den)
            / u128::from(self.num);
        Duration::from_nanos(nanos as u64)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Fixed vertical export frame.
    pub const VERTICAL_1080P: Canvas = Canvas {
        width: 1080,
        height: 1920,
    };

    /// Reject empty canvases and sizes the raster backend cannot address.
    pub fn validate(self) -> AssemblyResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AssemblyError::validation("canvas width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(AssemblyError::validation(
                "canvas width/height must fit in 16 bits",
            ));
        }
        Ok(())
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
