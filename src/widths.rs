//! Column width resolution
//!
//! Fixed mode gives every column `cell.width`. Adaptive mode sizes a column
//! by its longest entry (header included, counted in characters) times the
//! reference letter width, then clamps to the column's bounds when both
//! `minWidth` and `maxWidth` are configured.

use std::ops::Deref;

use crate::data::TableData;
use crate::error::RendererResult;
use crate::metrics::TextMetrics;
use crate::settings::{ColumnSpec, RenderSettings};

/// Pixel width of every column, fixed for the rest of a render pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnWidths(Vec<u32>);

impl ColumnWidths {
    pub fn new(widths: Vec<u32>) -> Self {
        Self(widths)
    }

    /// Width of all columns together, `None` when it leaves the pixel range
    pub fn total(&self) -> Option<u32> {
        self.0.iter().try_fold(0u32, |acc, &w| acc.checked_add(w))
    }

    /// Sum of the widths of the columns left of `col`, saturating
    pub fn offset(&self, col: usize) -> u32 {
        self.0
            .iter()
            .take(col)
            .fold(0u32, |acc, &w| acc.saturating_add(w))
    }
}

impl Deref for ColumnWidths {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

/// Longest entry of each column in characters, header included
pub fn max_chars(table: &TableData) -> Vec<usize> {
    (0..table.column_count())
        .map(|col| {
            table
                .column(col)
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Apply a column's bounds to a measured width.
///
/// Checks `max` first, so inverted bounds resolve to `max` for wide content.
pub fn clamp_width(raw: u32, spec: &ColumnSpec) -> u32 {
    match spec.bounds() {
        Some((_, max)) if raw >= max => max,
        Some((min, _)) if raw <= min => min,
        _ => raw,
    }
}

/// Letter metrics are only measured in adaptive mode
pub fn resolve(
    table: &TableData,
    settings: &RenderSettings,
    metrics: &dyn TextMetrics,
) -> RendererResult<ColumnWidths> {
    if let Some(width) = settings.cell.width {
        return Ok(ColumnWidths(vec![width; table.column_count()]));
    }

    let letter = metrics.letter_metrics()?;
    let specs = settings.column_specs(table.column_count());
    let widths = max_chars(table)
        .into_iter()
        .zip(&specs)
        .map(|(chars, spec)| {
            let raw = u32::try_from(chars)
                .unwrap_or(u32::MAX)
                .saturating_mul(letter.width);
            clamp_width(raw, spec)
        })
        .collect();
    Ok(ColumnWidths(widths))
}
