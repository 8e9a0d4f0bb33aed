//! Font loading, text measurement and glyph drawing
//!
//! A [`Font`] is either a parsed TrueType/OpenType file or the built-in
//! block font. The built-in font has fixed metrics and draws every visible
//! character as an outlined box, so a render can always proceed even on a
//! host without any usable font file.

use std::fs;
use std::path::{Path, PathBuf};

use resvg::tiny_skia::PathBuilder;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::canvas::Canvas;
use crate::error::{RendererError, RendererResult};
use crate::metrics::TextMetrics;
use crate::observer::{RenderEvent, RenderObserver};
use crate::settings::FontSettings;
use crate::types::{Color, TextBox};

/// Fonts tried after the configured one
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const BUILTIN_FONT_NAME: &str = "built-in block font";

#[derive(Debug, Clone)]
pub enum Font {
    TrueType {
        data: Vec<u8>,
        size: f32,
        source: PathBuf,
    },
    Builtin {
        size: f32,
    },
}

impl Font {
    /// Load and validate a TrueType/OpenType file
    pub fn from_file(path: &Path, size: f32) -> RendererResult<Self> {
        let data = fs::read(path).map_err(|e| {
            RendererError::FontError(format!("Failed to read font file {}: {}", path.display(), e))
        })?;
        Face::parse(&data, 0).map_err(|e| {
            RendererError::FontError(format!("Invalid font file {}: {}", path.display(), e))
        })?;
        Ok(Font::TrueType {
            data,
            size,
            source: path.to_path_buf(),
        })
    }

    pub fn builtin(size: f32) -> Self {
        Font::Builtin { size }
    }

    pub fn size(&self) -> f32 {
        match self {
            Font::TrueType { size, .. } | Font::Builtin { size } => *size,
        }
    }

    /// Human readable origin of the font, for logs
    pub fn source_name(&self) -> String {
        match self {
            Font::TrueType { source, .. } => source.display().to_string(),
            Font::Builtin { .. } => BUILTIN_FONT_NAME.to_string(),
        }
    }

    /// Draw `text` with its layout origin (top of the ascender line) at `origin`
    pub fn draw_text(
        &self,
        canvas: &mut Canvas,
        origin: (f32, f32),
        text: &str,
        color: Color,
    ) -> RendererResult<()> {
        match self {
            Font::TrueType { data, size, .. } => {
                let face = parse_face(data)?;
                let layout = TrueTypeLayout::new(&face, *size);
                for (gid, caret) in layout.glyphs(text) {
                    let mut outline = GlyphPath {
                        builder: PathBuilder::new(),
                        x: origin.0 + caret,
                        baseline: origin.1 + layout.ascent,
                        scale: layout.scale,
                    };
                    if face.outline_glyph(gid, &mut outline).is_none() {
                        continue;
                    }
                    if let Some(path) = outline.builder.finish() {
                        canvas.fill_path(&path, color);
                    }
                }
            }
            Font::Builtin { size } => {
                let block = BlockMetrics::new(*size);
                let stroke = (size / 10.0).max(1.0);
                for (left, top, right, bottom) in block.boxes(origin, text) {
                    let mut pb = PathBuilder::new();
                    pb.move_to(left, top);
                    pb.line_to(right, top);
                    pb.line_to(right, bottom);
                    pb.line_to(left, bottom);
                    pb.close();
                    if let Some(path) = pb.finish() {
                        canvas.stroke_path(&path, color, stroke);
                    }
                }
            }
        }
        Ok(())
    }
}

impl TextMetrics for Font {
    fn text_bbox(&self, origin: (f32, f32), text: &str) -> RendererResult<TextBox> {
        let ink = match self {
            Font::TrueType { data, size, .. } => {
                let face = parse_face(data)?;
                let layout = TrueTypeLayout::new(&face, *size);
                let mut ink = InkBox::default();
                for (gid, caret) in layout.glyphs(text) {
                    if let Some(bb) = face.glyph_bounding_box(gid) {
                        ink.add(
                            caret + bb.x_min as f32 * layout.scale,
                            layout.ascent - bb.y_max as f32 * layout.scale,
                            caret + bb.x_max as f32 * layout.scale,
                            layout.ascent - bb.y_min as f32 * layout.scale,
                        );
                    }
                }
                ink
            }
            Font::Builtin { size } => {
                let mut ink = InkBox::default();
                for (l, t, r, b) in BlockMetrics::new(*size).boxes((0.0, 0.0), text) {
                    ink.add(l, t, r, b);
                }
                ink
            }
        };
        Ok(ink.to_text_box(origin))
    }
}

fn parse_face(data: &[u8]) -> RendererResult<Face<'_>> {
    Face::parse(data, 0).map_err(|e| RendererError::FontError(format!("Invalid font data: {}", e)))
}

/// Resolve the font for a render pass.
///
/// Tries the configured path, then (if enabled) the system candidates that
/// exist on disk, then falls back to the built-in font. Every rejected
/// candidate is reported to the observer.
pub fn load_font(settings: &FontSettings, observer: &dyn RenderObserver) -> Font {
    let system = SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .filter(|p| settings.system_fallbacks && p.exists());

    for path in settings.path.as_deref().into_iter().chain(system) {
        match Font::from_file(path, settings.size) {
            Ok(font) => {
                observer.on_event(&RenderEvent::FontLoaded {
                    source: font.source_name(),
                    size: font.size(),
                });
                return font;
            }
            Err(e) => observer.on_event(&RenderEvent::FontFallback {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    let font = Font::builtin(settings.size);
    observer.on_event(&RenderEvent::FontLoaded {
        source: font.source_name(),
        size: font.size(),
    });
    font
}

struct TrueTypeLayout<'a> {
    face: &'a Face<'a>,
    scale: f32,
    ascent: f32,
}

impl<'a> TrueTypeLayout<'a> {
    fn new(face: &'a Face<'a>, size: f32) -> Self {
        let scale = size / face.units_per_em() as f32;
        Self {
            face,
            scale,
            ascent: face.ascender() as f32 * scale,
        }
    }

    /// Glyph ids with their pen position relative to the origin
    fn glyphs(&self, text: &str) -> Vec<(GlyphId, f32)> {
        let mut caret = 0.0;
        text.chars()
            .map(|ch| {
                let gid = self.face.glyph_index(ch).unwrap_or(GlyphId(0));
                let at = caret;
                caret += self.face.glyph_hor_advance(gid).unwrap_or(0) as f32 * self.scale;
                (gid, at)
            })
            .collect()
    }
}

/// Font-unit outline to pixel-space path; y flips around the baseline
struct GlyphPath {
    builder: PathBuilder,
    x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPath {
    fn px(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPath {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.px(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x, y) = self.px(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.px(x1, y1);
        let (x2, y2) = self.px(x2, y2);
        let (x, y) = self.px(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Whole-pixel metrics of the built-in font
#[derive(Debug, Clone, Copy)]
struct BlockMetrics {
    advance: f32,
    inset: f32,
    top: f32,
    ascent: f32,
}

impl BlockMetrics {
    fn new(size: f32) -> Self {
        let ascent = (size * 0.8).round();
        Self {
            advance: (size * 0.6).round(),
            inset: (size * 0.05).round(),
            top: ascent - (size * 0.7).round(),
            ascent,
        }
    }

    /// Ink boxes of the visible characters of `text`
    fn boxes(&self, origin: (f32, f32), text: &str) -> Vec<(f32, f32, f32, f32)> {
        text.chars()
            .enumerate()
            .filter(|(_, ch)| !ch.is_whitespace())
            .map(|(i, _)| {
                let left = origin.0 + i as f32 * self.advance + self.inset;
                (
                    left,
                    origin.1 + self.top,
                    left + self.advance - 2.0 * self.inset,
                    origin.1 + self.ascent,
                )
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct InkBox {
    bounds: Option<(f32, f32, f32, f32)>,
}

impl InkBox {
    fn add(&mut self, left: f32, top: f32, right: f32, bottom: f32) {
        self.bounds = Some(match self.bounds {
            None => (left, top, right, bottom),
            Some((l, t, r, b)) => (l.min(left), t.min(top), r.max(right), b.max(bottom)),
        });
    }

    /// Rounded outward; text without ink collapses onto the origin
    fn to_text_box(&self, origin: (f32, f32)) -> TextBox {
        let (ox, oy) = origin;
        match self.bounds {
            Some((l, t, r, b)) => TextBox {
                left: (ox + l).floor() as i32,
                top: (oy + t).floor() as i32,
                right: (ox + r).ceil() as i32,
                bottom: (oy + b).ceil() as i32,
            },
            None => {
                let (x, y) = (ox.round() as i32, oy.round() as i32);
                TextBox { left: x, top: y, right: x, bottom: y }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;

    #[test]
    fn test_builtin_letter_metrics() {
        let font = Font::builtin(20.0);
        let letter = font.letter_metrics().unwrap();
        assert_eq!(letter.width, 10);
        assert_eq!(letter.height, 14);
    }

    #[test]
    fn test_builtin_text_bbox() {
        let font = Font::builtin(20.0);
        let bbox = font.text_bbox((0.0, 0.0), "Alice").unwrap();
        assert_eq!(bbox, TextBox { left: 1, top: 2, right: 59, bottom: 16 });

        let shifted = font.text_bbox((100.0, 50.0), "Alice").unwrap();
        assert_eq!(shifted.width(), bbox.width());
        assert_eq!(shifted.left, 101);
        assert_eq!(shifted.top, 52);
    }

    #[test]
    fn test_blank_text_has_no_ink() {
        let font = Font::builtin(20.0);
        let bbox = font.text_bbox((5.0, 7.0), "   ").unwrap();
        assert_eq!(bbox.width(), 0);
        assert_eq!(bbox.height(), 0);
        assert_eq!(bbox.left, 5);
    }

    #[test]
    fn test_missing_font_falls_back_to_builtin() {
        let observer = RecordingObserver::new();
        let settings = FontSettings {
            path: Some(PathBuf::from("/nonexistent/font.ttf")),
            system_fallbacks: false,
            ..FontSettings::default()
        };
        let font = load_font(&settings, &observer);
        assert!(matches!(font, Font::Builtin { .. }));

        let events = observer.events();
        assert!(matches!(
            &events[0],
            RenderEvent::FontFallback { path, .. } if path.ends_with("font.ttf")
        ));
        assert_eq!(
            events[1],
            RenderEvent::FontLoaded {
                source: BUILTIN_FONT_NAME.to_string(),
                size: 20.0,
            }
        );
    }

    #[test]
    fn test_invalid_font_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(matches!(Font::from_file(&path, 20.0), Err(RendererError::FontError(_))));
    }

    #[test]
    fn test_builtin_draws_ink() {
        let font = Font::builtin(20.0);
        let mut canvas = Canvas::new(40, 30).unwrap();
        font.draw_text(&mut canvas, (0.0, 0.0), "A", Color::black()).unwrap();
        assert_eq!(canvas.pixel(1, 8).map(|c| c.a), Some(255));
        assert_eq!(canvas.pixel(30, 8), Some(Color::transparent()));
    }

    fn system_font(size: f32) -> Option<Font> {
        SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| Font::from_file(p, size).ok())
    }

    #[test]
    fn test_truetype_metrics() {
        let Some(font) = system_font(20.0) else {
            eprintln!("no system font installed, skipping");
            return;
        };
        assert!(matches!(font, Font::TrueType { .. }));
        assert_eq!(font.size(), 20.0);

        let letter = font.letter_metrics().unwrap();
        assert!(letter.width > 0 && letter.height > 0, "{:?}", letter);
        // a capital sits above the baseline and fits inside the em box
        assert!(letter.height <= 20);

        let one = font.text_bbox((0.0, 0.0), "A").unwrap();
        let two = font.text_bbox((0.0, 0.0), "AA").unwrap();
        assert!(two.width() > one.width());
        assert!(one.top >= 0, "ink above the ascender line: {:?}", one);

        let shifted = font.text_bbox((30.0, 15.0), "A").unwrap();
        assert_eq!(shifted.width(), one.width());
        assert_eq!(shifted.top - one.top, 15);
    }

    #[test]
    fn test_truetype_ink_stays_in_measured_box() {
        let Some(font) = system_font(24.0) else {
            eprintln!("no system font installed, skipping");
            return;
        };
        let origin = (10.0, 10.0);
        let mut canvas = Canvas::new(120, 60).unwrap();
        font.draw_text(&mut canvas, origin, "Hg", Color::black()).unwrap();
        let bbox = font.text_bbox(origin, "Hg").unwrap();

        let mut inked = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let Some(px) = canvas.pixel(x, y) else { continue };
                if px.a == 0 {
                    continue;
                }
                inked += 1;
                let (x, y) = (x as i32, y as i32);
                assert!(
                    x >= bbox.left - 1 && x <= bbox.right && y >= bbox.top - 1 && y <= bbox.bottom,
                    "ink at ({}, {}) outside {:?}",
                    x,
                    y,
                    bbox
                );
            }
        }
        assert!(inked > 0);
    }
}
