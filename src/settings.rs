//! Render settings
//!
//! Every struct here deserialises from the camelCase `settings` block of an
//! input document. Missing keys keep their defaults, so a block only has to
//! name what it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RendererResult;
use crate::json_helpers::merge_values;
use crate::types::{Color, Padding, TextAlign};

/// Style of the header row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderStyle {
    pub color: Color,
    pub padding: Padding,
    pub text_align: TextAlign,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            color: Color::white(),
            padding: Padding::new(10, 10, 10, 10),
            text_align: TextAlign::Center,
        }
    }
}

/// Style of data cells. `width: None` selects adaptive column widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellStyle {
    pub width: Option<u32>,
    pub height: u32,
    pub color: Color,
    pub padding: Padding,
    pub text_align: TextAlign,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            width: Some(200),
            height: 50,
            color: Color::white(),
            padding: Padding::new(10, 0, 10, 0),
            text_align: TextAlign::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSettings {
    pub path: Option<PathBuf>,
    pub size: f32,
    pub color: Color,
    /// Try well-known system fonts before the built-in block font
    pub system_fallbacks: bool,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            path: None,
            size: 20.0,
            color: Color::black(),
            system_fallbacks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundSettings {
    pub image: Option<PathBuf>,
    pub color: Color,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            image: None,
            color: Color::white(),
        }
    }
}

/// Outer margin and cell borders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableFrame {
    pub margin: u32,
    pub border_color: Color,
    pub border_thickness: u32,
}

impl Default for TableFrame {
    fn default() -> Self {
        Self {
            margin: 40,
            border_color: Color::black(),
            border_thickness: 2,
        }
    }
}

/// Caps applied by truncation when data is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    pub cols: usize,
    pub rows: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { cols: 100, rows: 20 }
    }
}

/// Per-column overrides, positionally aligned to the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnSpec {
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub text_align: Option<TextAlign>,
}

impl ColumnSpec {
    /// Both bounds, or nothing: a single bound never clamps
    pub fn bounds(&self) -> Option<(u32, u32)> {
        match (self.min_width, self.max_width) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// Immutable bundle of everything a render pass reads
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    pub header: HeaderStyle,
    pub cell: CellStyle,
    pub font: FontSettings,
    pub background: BackgroundSettings,
    pub table: TableFrame,
    pub limits: Limits,
    pub cols: Vec<ColumnSpec>,
}

impl RenderSettings {
    /// Column overrides normalised to exactly `count` entries
    pub fn column_specs(&self, count: usize) -> Vec<ColumnSpec> {
        (0..count)
            .map(|i| self.cols.get(i).copied().unwrap_or_default())
            .collect()
    }

    /// Alignment for a column, the column override winning over `default`
    pub fn align_for(&self, col: usize, default: TextAlign) -> TextAlign {
        self.cols
            .get(col)
            .and_then(|spec| spec.text_align)
            .unwrap_or(default)
    }

    /// Deep-merge a JSON settings block over these settings.
    ///
    /// Objects merge key by key, anything else replaces; an explicit `null`
    /// clears an optional value.
    pub fn with_patch(&self, patch: &Value) -> RendererResult<Self> {
        let mut base = serde_json::to_value(self)?;
        merge_values(&mut base, patch);
        Ok(serde_json::from_value(base)?)
    }
}
