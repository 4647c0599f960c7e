//! Burned-in caption box.
//!
//! Text is shaped with parley from a single caller-supplied font and rasterized with vello_cpu
//! into a box-sized layer, which is then composited onto the frame.

use std::borrow::Cow;

use crate::assets::color::Rgba8;
use crate::effects::composite::over_px;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::render::surface::FrameRGBA;
use crate::scene::captions::CaptionSettings;

/// Export font size relative to `CaptionSettings::size_px`.
pub const CAPTION_SCALE: f32 = 1.5;
/// Caption background alpha (~94%).
pub const CAPTION_BG_ALPHA: u8 = 240;
/// Horizontal padding on each side of the text.
pub const CAPTION_PAD_X: f64 = 40.0;
/// Box height as a multiple of the font size.
pub const CAPTION_BOX_LINE_FACTOR: f64 = 1.6;

/// Placement of a caption box on the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionBox {
    /// Box bounds in frame pixels. May extend past the frame during slides.
    pub rect: kurbo::Rect,
    /// Font size the text is laid out at.
    pub font_px: f32,
    pub corner_radius: f64,
}

/// Box for text measuring `text_width` pixels, centred horizontally (then shifted by
/// `x_offset_px`) and centred vertically on the position's anchor.
pub fn caption_box(
    settings: &CaptionSettings,
    text_width: f64,
    frame_width: u32,
    frame_height: u32,
    x_offset_px: f32,
) -> CaptionBox {
    let font_px = settings.size_px as f32 * CAPTION_SCALE;
    let w = text_width.max(0.0) + 2.0 * CAPTION_PAD_X;
    let h = f64::from(font_px) * CAPTION_BOX_LINE_FACTOR;
    let x0 = (f64::from(frame_width) - w) / 2.0 + f64::from(x_offset_px);
    let cy = f64::from(frame_height) * settings.position.anchor_fraction();
    CaptionBox {
        rect: kurbo::Rect::new(x0, cy - h / 2.0, x0 + w, cy + h / 2.0),
        font_px,
        corner_radius: settings.style.corner_radius().min(w / 2.0).min(h / 2.0),
    }
}

type TextBrush = [u8; 4];

/// Lays out and draws caption text with one registered font.
pub struct CaptionRenderer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl CaptionRenderer {
    /// Register `font_bytes` (TTF/OTF) as the caption face.
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> AssemblyResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            AssemblyError::validation("no font families registered from caption font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| AssemblyError::validation("caption font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
        })
    }

    fn layout(&mut self, text: &str, size_px: f32, color: Rgba8) -> parley::Layout<TextBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush([
            color.r, color.g, color.b, color.a,
        ]));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Measured `(width, height)` of `text` as it would be drawn under `settings`.
    pub fn measure(&mut self, settings: &CaptionSettings, text: &str) -> (f32, f32) {
        let text = settings.style.transform_text(text);
        let layout = self.layout(
            &text,
            settings.size_px as f32 * CAPTION_SCALE,
            settings.text_color,
        );
        (layout.width(), layout.height())
    }

    /// Draw the caption box and centred text onto `frame`.
    ///
    /// No-op when captions are hidden or `text` is blank.
    pub fn draw(
        &mut self,
        frame: &mut FrameRGBA,
        settings: &CaptionSettings,
        text: &str,
        x_offset_px: f32,
    ) -> AssemblyResult<()> {
        if !settings.visible || text.trim().is_empty() {
            return Ok(());
        }
        let text = settings.style.transform_text(text.trim());
        let font_px = settings.size_px as f32 * CAPTION_SCALE;
        let layout = self.layout(&text, font_px, settings.text_color);
        let (text_w, text_h) = (f64::from(layout.width()), f64::from(layout.height()));

        let cbox = caption_box(settings, text_w, frame.width, frame.height, x_offset_px);
        let r = cbox.rect;
        // The layer covers only the on-frame part of the box.
        let Some(region) = visible_region(r, frame.width, frame.height) else {
            return Ok(());
        };
        let lw = u16::try_from(region.width)
            .map_err(|_| AssemblyError::render("caption layer too wide"))?;
        let lh = u16::try_from(region.height)
            .map_err(|_| AssemblyError::render("caption layer too tall"))?;
        let (ox, oy) = (f64::from(region.x), f64::from(region.y));

        let mut ctx = vello_cpu::RenderContext::new(lw, lh);

        let bg = settings.background_color.with_alpha_scaled(CAPTION_BG_ALPHA);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        let rr = vello_cpu::kurbo::RoundedRect::new(
            r.x0 - ox,
            r.y0 - oy,
            r.x1 - ox,
            r.y1 - oy,
            cbox.corner_radius,
        );
        ctx.fill_path(&vello_cpu::kurbo::Shape::to_path(&rr, 0.1));

        let tx = r.center().x - text_w / 2.0 - ox;
        let ty = r.center().y - text_h / 2.0 - oy;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((tx, ty)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let [cr, cg, cb, ca] = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(cr, cg, cb, ca));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(lw, lh);
        ctx.render_to_pixmap(&mut layer);

        blit_over(
            frame,
            layer.data_as_u8_slice(),
            lw,
            lh,
            i64::from(region.x),
            i64::from(region.y),
        );
        Ok(())
    }
}

/// Whole-pixel area of the frame touched by a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Pixels of a `frame_width`x`frame_height` frame covered by `rect`, or `None` when `rect` lies
/// entirely outside it.
fn visible_region(rect: kurbo::Rect, frame_width: u32, frame_height: u32) -> Option<PixelRegion> {
    let x0 = rect.x0.floor().max(0.0);
    let y0 = rect.y0.floor().max(0.0);
    let x1 = rect.x1.ceil().min(f64::from(frame_width));
    let y1 = rect.y1.ceil().min(f64::from(frame_height));
    if !(x1 > x0 && y1 > y0) {
        return None;
    }
    Some(PixelRegion {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Composite a premultiplied `lw`x`lh` layer onto `frame` at `(ox, oy)`, clipping to the frame.
fn blit_over(frame: &mut FrameRGBA, layer: &[u8], lw: u16, lh: u16, ox: i64, oy: i64) {
    let (fw, fh) = (i64::from(frame.width), i64::from(frame.height));
    let (lw, lh) = (i64::from(lw), i64::from(lh));
    for ly in 0..lh {
        let fy = oy + ly;
        if fy < 0 || fy >= fh {
            continue;
        }
        for lx in 0..lw {
            let fx = ox + lx;
            if fx < 0 || fx >= fw {
                continue;
            }
            let si = ((ly * lw + lx) * 4) as usize;
            let di = ((fy * fw + fx) * 4) as usize;
            let s = [layer[si], layer[si + 1], layer[si + 2], layer[si + 3]];
            let d = [
                frame.data[di],
                frame.data[di + 1],
                frame.data[di + 2],
                frame.data[di + 3],
            ];
            frame.data[di..di + 4].copy_from_slice(&over_px(d, s, 255));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
