//! Transition blend laws.
//!
//! [`blend`] maps a transition type and a progress value to the compositing parameters of one
//! side of the handover. Preview and export both go through it, so a given progress value always
//! produces the same frame.

use std::f32::consts::PI;

use crate::scene::timeline::TransitionType;

/// Which side of a scene boundary a frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Outgoing,
    Incoming,
}

/// How to draw one scene frame during a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    /// Multiplier on the frame's alpha, `0..=1`.
    pub opacity: f32,
    /// Horizontal shift in output pixels.
    pub x_offset_px: f32,
    /// Uniform scale about the frame centre.
    pub scale: f32,
    /// Gaussian blur radius in output pixels.
    pub blur_px: f32,
}

impl CompositeParams {
    /// A frame drawn as-is.
    pub const IDENTITY: CompositeParams = CompositeParams {
        opacity: 1.0,
        x_offset_px: 0.0,
        scale: 1.0,
        blur_px: 0.0,
    };

    const HIDDEN: CompositeParams = CompositeParams {
        opacity: 0.0,
        ..Self::IDENTITY
    };

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Peak motion-blur radius, reached half way through the window.
pub const MOTION_BLUR_PEAK_PX: f32 = 20.0;

/// Compositing parameters for `role` at `progress` through a `kind` transition.
///
/// `progress` is clamped to `0..=1`; NaN counts as 0. At 0 the outgoing frame is drawn unchanged
/// and the incoming one is invisible, at 1 the reverse, for every transition type. Instant types
/// (`None`, `HardCut`) have no window and switch wholesale at 1.
pub fn blend(kind: TransitionType, progress: f32, role: Role, frame_width: u32) -> CompositeParams {
    let p = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let w = frame_width as f32;

    match (kind, role) {
        (TransitionType::None | TransitionType::HardCut, Role::Outgoing) => {
            if p < 1.0 {
                CompositeParams::IDENTITY
            } else {
                CompositeParams::HIDDEN
            }
        }
        (TransitionType::None | TransitionType::HardCut, Role::Incoming) => {
            if p < 1.0 {
                CompositeParams::HIDDEN
            } else {
                CompositeParams::IDENTITY
            }
        }
        (TransitionType::Fade, Role::Outgoing) => CompositeParams {
            opacity: 1.0 - p,
            ..CompositeParams::IDENTITY
        },
        (TransitionType::Fade, Role::Incoming) => CompositeParams {
            opacity: p,
            ..CompositeParams::IDENTITY
        },
        (TransitionType::Slide, Role::Outgoing) => CompositeParams {
            x_offset_px: -p * w,
            ..CompositeParams::IDENTITY
        },
        (TransitionType::Slide, Role::Incoming) => CompositeParams {
            x_offset_px: w * (1.0 - p),
            ..CompositeParams::IDENTITY
        },
        (TransitionType::Zoom | TransitionType::MotionBlur, role) => {
            let blur_px = if kind == TransitionType::MotionBlur {
                motion_blur_px(p)
            } else {
                0.0
            };
            match role {
                Role::Outgoing => CompositeParams {
                    opacity: 1.0 - p,
                    x_offset_px: 0.0,
                    scale: 1.0 + 0.5 * p,
                    blur_px,
                },
                Role::Incoming => CompositeParams {
                    opacity: p,
                    x_offset_px: 0.0,
                    scale: 1.5 - 0.5 * p,
                    blur_px,
                },
            }
        }
    }
}

/// Blur radius of a motion-blur transition: `20 * sin(pi * p)`, exactly zero at both ends.
pub fn motion_blur_px(progress: f32) -> f32 {
    if progress <= 0.0 || progress >= 1.0 {
        return 0.0;
    }
    MOTION_BLUR_PEAK_PX * (PI * progress).sin()
}

/// Progress of blended frame `frame` out of `frames` in a transition window.
///
/// The sweep is linear and inclusive: the first frame sits at 0 and the last at exactly 1, so the
/// window ends on a pure incoming frame.
pub fn window_progress(frame: u64, frames: u64) -> f32 {
    if frames <= 1 {
        return 1.0;
    }
    (frame.min(frames - 1) as f64 / (frames - 1) as f64) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
