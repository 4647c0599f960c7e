use serde::{Deserialize, Serialize};

use crate::assets::color::Rgba8;
use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Visual preset for the burned-in caption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    CleanMinimal,
    #[default]
    TikTokNative,
    EmotionalCod,
    Storytelling,
    AggressiveHook,
}

impl CaptionStyle {
    /// Corner radius of the caption box, in output pixels.
    pub fn corner_radius(self) -> f64 {
        match self {
            Self::CleanMinimal => 20.0,
            Self::AggressiveHook => 12.0,
            Self::TikTokNative | Self::EmotionalCod | Self::Storytelling => 40.0,
        }
    }

    /// Apply the style's letter case to caption text.
    pub fn transform_text(self, text: &str) -> String {
        match self {
            Self::AggressiveHook => text.to_uppercase(),
            _ => text.to_owned(),
        }
    }
}

/// Vertical placement of the caption box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    Center,
    #[default]
    Bottom,
}

impl CaptionPosition {
    /// Vertical centre of the caption box as a fraction of frame height.
    ///
    /// On the 1920 px export frame these land at 300 px, 960 px and 1520 px.
    pub fn anchor_fraction(self) -> f64 {
        match self {
            Self::Top => 300.0 / 1920.0,
            Self::Center => 0.5,
            Self::Bottom => 1520.0 / 1920.0,
        }
    }
}

/// Global caption appearance shared by every scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    pub style: CaptionStyle,
    pub position: CaptionPosition,
    /// Preview-scale font size; the export frame draws at 1.5x this.
    pub size_px: u32,
    pub text_color: Rgba8,
    pub background_color: Rgba8,
    pub visible: bool,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            style: CaptionStyle::TikTokNative,
            position: CaptionPosition::Bottom,
            size_px: 52,
            text_color: Rgba8::WHITE,
            background_color: Rgba8::BLACK,
            visible: true,
        }
    }
}

impl CaptionSettings {
    pub fn validate(&self) -> AssemblyResult<()> {
        if self.size_px == 0 || self.size_px > 512 {
            return Err(AssemblyError::validation(
                "caption size_px must be in 1..=512",
            ));
        }
        Ok(())
    }
}

/// Split narration into sentence-like segments, each ending in a run of `.`, `!` or `?`.
///
/// Text after the last terminator is dropped. A script with no terminated sentence at all is
/// returned whole as a single segment. Segments are not trimmed here.
pub fn split_script(script: &str) -> Vec<&str> {
    let is_term = |c: char| matches!(c, '.' | '!' | '?');
    let mut out = Vec::new();
    let mut chars = script.char_indices().peekable();

    loop {
        while chars.next_if(|&(_, c)| is_term(c)).is_some() {}
        let Some(&(start, _)) = chars.peek() else {
            break;
        };
        while chars.next_if(|&(_, c)| !is_term(c)).is_some() {}
        let mut end = None;
        while let Some((i, c)) = chars.next_if(|&(_, c)| is_term(c)) {
            end = Some(i + c.len_utf8());
        }
        match end {
            Some(end) => out.push(&script[start..end]),
            None => break,
        }
    }

    if out.is_empty() { vec![script] } else { out }
}

/// One caption per scene, drawn proportionally from the script's segments.
///
/// Scene `i` of `n` takes segment `floor(i / n * segments)`, so the caption count always equals
/// the scene count whatever the sentence count.
pub fn assign_captions(script: &str, scene_count: usize) -> Vec<String> {
    let parts: Vec<&str> = split_script(script).into_iter().map(str::trim).collect();
    (0..scene_count)
        .map(|i| {
            let seg = i * parts.len() / scene_count;
            parts.get(seg).copied().unwrap_or_default().to_owned()
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/captions.rs"]
mod tests;
