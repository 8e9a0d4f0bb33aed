//! Raster layers backed by tiny-skia pixmaps
//!
//! A [`Canvas`] is one layer of the final picture. It knows how to draw the
//! few primitives a table needs (filled and bordered cells, glyph paths) and
//! how to move pixels in and out of the `image` crate.

use image::RgbaImage;
use resvg::tiny_skia::{
    ColorU8, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect as SkiaRect, Stroke,
    Transform,
};

use crate::error::{RendererError, RendererResult};
use crate::types::{Color, Rect};

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = anti_alias;
    paint
}

fn skia_rect(rect: Rect) -> Option<SkiaRect> {
    SkiaRect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

/// One RGBA layer
#[derive(Clone)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Fully transparent layer
    pub fn new(width: u32, height: u32) -> RendererResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RendererError::InvalidGeometry(format!("cannot create a {}x{} canvas", width, height))
        })?;
        Ok(Self { pixmap })
    }

    /// Layer filled with a single color
    pub fn filled(width: u32, height: u32, color: Color) -> RendererResult<Self> {
        let mut canvas = Self::new(width, height)?;
        canvas.pixmap.fill(resvg::tiny_skia::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        Ok(canvas)
    }

    /// Copy an RGBA image into a new layer of the same size
    pub fn from_image(img: &RgbaImage) -> RendererResult<Self> {
        let mut canvas = Self::new(img.width(), img.height())?;
        for (dst, src) in canvas.pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha color at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Color::rgba(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Fill `rect` and stroke its border inside the rectangle.
    ///
    /// Returns `false` when the rectangle has no area and nothing was drawn.
    pub fn draw_cell(&mut self, rect: Rect, fill: Color, border: Color, thickness: u32) -> bool {
        if rect.is_empty() {
            return false;
        }
        let Some(area) = skia_rect(rect) else {
            return false;
        };
        self.pixmap
            .fill_rect(area, &paint(fill, false), Transform::identity(), None);

        if thickness == 0 {
            return true;
        }
        let t = thickness as f32;
        if rect.width <= t || rect.height <= t {
            self.pixmap
                .fill_rect(area, &paint(border, false), Transform::identity(), None);
            return true;
        }
        let inset = Rect::new(rect.x + t / 2.0, rect.y + t / 2.0, rect.width - t, rect.height - t);
        if let Some(inner) = skia_rect(inset) {
            let outline = PathBuilder::from_rect(inner);
            self.stroke_path(&outline, border, t);
        }
        true
    }

    /// Fill a glyph path, anti-aliased, non-zero winding
    pub fn fill_path(&mut self, path: &Path, color: Color) {
        self.pixmap.fill_path(
            path,
            &paint(color, true),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    pub fn stroke_path(&mut self, path: &Path, color: Color, width: f32) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint(color, false), &stroke, Transform::identity(), None);
    }

    /// Source-over composite of `top` onto a copy of `self`
    pub fn composite(&self, top: &Canvas) -> RendererResult<Canvas> {
        if top.width() != self.width() || top.height() != self.height() {
            return Err(RendererError::InvalidGeometry(format!(
                "layer sizes differ: {}x{} over {}x{}",
                top.width(),
                top.height(),
                self.width(),
                self.height()
            )));
        }
        let mut out = self.clone();
        out.pixmap.draw_pixmap(
            0,
            0,
            top.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(out)
    }

    /// Straight-alpha RGBA copy for encoding
    pub fn to_rgba_image(&self) -> RendererResult<RgbaImage> {
        let mut raw = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), raw)
            .ok_or_else(|| RendererError::ImageError("pixel buffer size mismatch".to_string()))
    }
}
