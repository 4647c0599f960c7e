use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::assets::handle::{ArtifactId, ImageHandle};
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// A decoded still image.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> AssemblyResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AssemblyError::validation("decoded image has no pixels"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decoded pixel buffers keyed by artifact identity.
///
/// Buffers are temporary: the compositor decodes on first use and the export pipeline releases
/// them as soon as their scene is behind it.
#[derive(Default)]
pub struct ImageCache {
    decoded: HashMap<ArtifactId, DecodedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the decoded pixels for `handle`, decoding on first use.
    ///
    /// Decode failures are reported against `scene` so the caller can name the offending scene.
    pub fn get_or_decode(
        &mut self,
        handle: &ImageHandle,
        scene: usize,
    ) -> AssemblyResult<DecodedImage> {
        if let Some(img) = self.decoded.get(&handle.id()) {
            return Ok(img.clone());
        }
        let img = decode_image(handle.bytes())
            .map_err(|e| AssemblyError::asset_decode(scene, format!("{e:#}")))?;
        tracing::debug!(
            scene,
            artifact = handle.id().0,
            width = img.width,
            height = img.height,
            "decoded scene artifact"
        );
        self.decoded.insert(handle.id(), img.clone());
        Ok(img)
    }

    /// Drop every buffer whose artifact is not in `keep`.
    pub fn retain(&mut self, keep: &[ArtifactId]) {
        self.decoded.retain(|id, _| keep.contains(id));
    }

    pub fn clear(&mut self) {
        self.decoded.clear();
    }

    /// Number of decoded buffers currently held.
    pub fn len(&self) -> usize {
        self.decoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoded.is_empty()
    }
}

/// Encode a solid-colour PNG. Test fixture helper.
#[cfg(test)]
pub(crate) fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
