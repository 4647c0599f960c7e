use crate::assets::decode::ImageCache;
use crate::effects::blur::{BlurScratch, blur_in_place, blur_radius};
use crate::effects::composite::{draw_image_over, over_in_place};
use crate::effects::transitions::{CompositeParams, Role, blend};
use crate::foundation::core::Canvas;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::render::caption::CaptionRenderer;
use crate::render::surface::FrameRGBA;
use crate::scene::timeline::Timeline;

const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Renders one composited frame of a timeline: scene image(s) plus caption.
///
/// Decoded scene images are cached between frames until released.
pub struct FrameCompositor {
    canvas: Canvas,
    images: ImageCache,
    captions: Option<CaptionRenderer>,
    layer: Vec<u8>,
    blur: BlurScratch,
    warned_no_font: bool,
}

impl FrameCompositor {
    pub fn new(canvas: Canvas) -> AssemblyResult<Self> {
        canvas.validate()?;
        Ok(Self {
            canvas,
            images: ImageCache::new(),
            captions: None,
            layer: Vec::new(),
            blur: BlurScratch::default(),
            warned_no_font: false,
        })
    }

    /// Draw captions with `renderer`.
    pub fn with_captions(mut self, renderer: CaptionRenderer) -> Self {
        self.captions = Some(renderer);
        self
    }

    pub fn set_caption_renderer(&mut self, renderer: Option<CaptionRenderer>) {
        self.captions = renderer;
        self.warned_no_font = false;
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Composite `scene` (blending into `next` at `progress` when given) onto `surface`.
    ///
    /// Without `next` the scene is drawn alone at full opacity. With `next` the outgoing and then
    /// the incoming frame are drawn with their [`blend`] parameters. The caption shown is the
    /// outgoing scene's until progress leaves zero, then the incoming scene's, tracking that
    /// frame's horizontal offset.
    pub fn render(
        &mut self,
        surface: &mut FrameRGBA,
        timeline: &Timeline,
        scene: usize,
        next: Option<usize>,
        progress: f32,
    ) -> AssemblyResult<()> {
        if surface.canvas() != self.canvas {
            return Err(AssemblyError::render(format!(
                "surface is {}x{}, compositor canvas is {}x{}",
                surface.width, surface.height, self.canvas.width, self.canvas.height
            )));
        }
        let outgoing = timeline.scene(scene)?;
        surface.fill(BACKGROUND);

        let (caption, caption_x) = match next {
            None => {
                self.draw_scene(surface, timeline, scene, &CompositeParams::IDENTITY)?;
                (outgoing.caption.as_str(), 0.0)
            }
            Some(next) => {
                let incoming = timeline.scene(next)?;
                let w = self.canvas.width;
                let out_p = blend(timeline.transition, progress, Role::Outgoing, w);
                let in_p = blend(timeline.transition, progress, Role::Incoming, w);
                self.draw_scene(surface, timeline, scene, &out_p)?;
                self.draw_scene(surface, timeline, next, &in_p)?;
                caption_during_blend(
                    (outgoing.caption.as_str(), out_p.x_offset_px),
                    (incoming.caption.as_str(), in_p.x_offset_px),
                    progress,
                )
            }
        };

        match self.captions.as_mut() {
            Some(renderer) => renderer.draw(surface, &timeline.captions, caption, caption_x)?,
            None => {
                if timeline.captions.visible && !caption.is_empty() && !self.warned_no_font {
                    tracing::warn!("no caption font configured; captions are not drawn");
                    self.warned_no_font = true;
                }
            }
        }
        Ok(())
    }

    fn draw_scene(
        &mut self,
        surface: &mut FrameRGBA,
        timeline: &Timeline,
        scene: usize,
        params: &CompositeParams,
    ) -> AssemblyResult<()> {
        if !params.is_visible() {
            return Ok(());
        }
        let artifact = &timeline.scene(scene)?.current_artifact;
        let img = self.images.get_or_decode(artifact, scene)?;
        let (w, h) = (self.canvas.width, self.canvas.height);

        if blur_radius(params.blur_px) == 0 {
            return draw_image_over(&mut surface.data, w, h, &img, params);
        }

        // Blur applies to the scaled image before its opacity.
        self.layer.clear();
        self.layer.resize(self.canvas.rgba_len(), 0);
        let unfaded = CompositeParams {
            opacity: 1.0,
            ..*params
        };
        draw_image_over(&mut self.layer, w, h, &img, &unfaded)?;
        blur_in_place(&mut self.layer, w, h, params.blur_px, &mut self.blur)?;
        over_in_place(&mut surface.data, &self.layer, params.opacity)
    }

    /// Drop every decoded image buffer.
    pub fn release_images(&mut self) {
        self.images.clear();
    }

    /// Drop decoded buffers not used by the given scenes of `timeline`.
    pub fn retain_scenes(&mut self, timeline: &Timeline, scenes: &[usize]) {
        let keep: Vec<_> = scenes
            .iter()
            .filter_map(|&i| timeline.scenes.get(i))
            .map(|s| s.current_artifact.id())
            .collect();
        self.images.retain(&keep);
    }

    /// Number of decoded image buffers currently held.
    pub fn resident_images(&self) -> usize {
        self.images.len()
    }
}

/// Caption and horizontal offset shown while `outgoing` blends into `incoming`.
///
/// Progress exactly zero still belongs to the outgoing scene; any later point shows the incoming
/// caption.
fn caption_during_blend<'a>(
    outgoing: (&'a str, f32),
    incoming: (&'a str, f32),
    progress: f32,
) -> (&'a str, f32) {
    if progress > 0.0 { incoming } else { outgoing }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
