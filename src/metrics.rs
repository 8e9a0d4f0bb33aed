//! Text measurement

use crate::error::RendererResult;
use crate::types::TextBox;

/// Glyph used to derive the uniform letter size
pub const REFERENCE_GLYPH: &str = "A";

/// Size of the reference glyph, the per-character unit of adaptive widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterMetrics {
    pub width: u32,
    pub height: u32,
}

/// Reports ink bounding boxes of rendered text
pub trait TextMetrics {
    /// Bounding box of `text` drawn with its layout origin at `origin`
    fn text_bbox(&self, origin: (f32, f32), text: &str) -> RendererResult<TextBox>;

    fn letter_metrics(&self) -> RendererResult<LetterMetrics> {
        let bbox = self.text_bbox((0.0, 0.0), REFERENCE_GLYPH)?;
        Ok(LetterMetrics {
            width: bbox.width().max(0) as u32,
            height: bbox.height().max(0) as u32,
        })
    }
}
