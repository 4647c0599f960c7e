/// Convenience result type used across the crate.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Error taxonomy for timeline editing, compositing and export.
#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    /// Invalid caller-provided data (project inputs, options, frame sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene index outside the timeline.
    #[error("scene {scene} is out of range (timeline has {count} scenes)")]
    SceneOutOfRange { scene: usize, count: usize },

    /// Selecting a history version that does not exist. The current artifact is left untouched.
    #[error("scene {scene} has no version {version} (history holds {len})")]
    InvalidVersionIndex {
        scene: usize,
        version: usize,
        len: usize,
    },

    /// The audio track could not be attached to the encoder. Export degrades to video-only.
    #[error("audio attach failed: {0}")]
    AudioAttach(String),

    /// No encoder session could be opened. No output is written.
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// A scene artifact could not be decoded into pixels.
    #[error("failed to decode artifact of scene {scene}: {reason}")]
    AssetDecode { scene: usize, reason: String },

    /// Errors while compositing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors reported by an encoder session after it was opened.
    #[error("encode error: {0}")]
    Encode(String),

    /// The caller cancelled the operation. Resources were released and no file was emitted.
    #[error("cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssemblyError {
    /// Build a [`AssemblyError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AssemblyError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`AssemblyError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`AssemblyError::EncoderUnavailable`] value.
    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }

    /// Build a [`AssemblyError::AudioAttach`] value.
    pub fn audio_attach(msg: impl Into<String>) -> Self {
        Self::AudioAttach(msg.into())
    }

    /// Build a [`AssemblyError::AssetDecode`] value for `scene`.
    pub fn asset_decode(scene: usize, reason: impl Into<String>) -> Self {
        Self::AssetDecode {
            scene,
            reason: reason.into(),
        }
    }

    /// `true` for user-initiated cancellation, which callers treat as a non-error outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
