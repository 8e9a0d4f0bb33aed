//! Cell geometry and text placement
//!
//! The header occupies physical row 0 and data row `r` physical row `r + 1`.
//! Columns start at the outer margin and follow the resolved widths left to
//! right. Nothing here touches pixels: the output is a draw plan.

use crate::data::TableData;
use crate::error::RendererResult;
use crate::metrics::TextMetrics;
use crate::settings::RenderSettings;
use crate::types::{Color, Padding, Rect, TextAlign, TextBox};
use crate::widths::ColumnWidths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data(usize),
}

impl RowKind {
    pub fn physical(self) -> u32 {
        match self {
            RowKind::Header => 0,
            RowKind::Data(r) => u32::try_from(r).unwrap_or(u32::MAX).saturating_add(1),
        }
    }

    pub fn data_index(self) -> Option<usize> {
        match self {
            RowKind::Header => None,
            RowKind::Data(r) => Some(r),
        }
    }
}

/// Top-left corner of a cell's background rectangle.
///
/// Saturates at the end of the pixel range; such cells lie outside any
/// canvas [`table_size`](crate::table_size) accepts.
pub fn cell_origin(
    widths: &ColumnWidths,
    row: RowKind,
    col: usize,
    cell_height: u32,
    margin: u32,
) -> (u32, u32) {
    (
        margin.saturating_add(widths.offset(col)),
        margin.saturating_add(row.physical().saturating_mul(cell_height)),
    )
}

pub fn cell_rect(
    widths: &ColumnWidths,
    row: RowKind,
    col: usize,
    cell_height: u32,
    margin: u32,
) -> Rect {
    let (x, y) = cell_origin(widths, row, col, cell_height, margin);
    let width = widths.get(col).copied().unwrap_or(0);
    Rect::new(x as f32, y as f32, width as f32, cell_height as f32)
}

/// Layout origin of text inside `cell`.
///
/// Text is always centered vertically within the padded height; `Left` pins
/// it after the left padding, `Center` centers it horizontally as well. Text
/// wider than the cell is not corrected and overflows.
pub fn text_origin(cell: Rect, text: TextBox, padding: Padding, align: TextAlign) -> (f32, f32) {
    let (tw, th) = (text.width() as f32, text.height() as f32);
    let y = cell.y + (cell.height - th - padding.vertical()) / 2.0;
    let x = match align {
        TextAlign::Left => cell.x + padding.left as f32,
        TextAlign::Center => cell.x + (cell.width - tw - padding.horizontal()) / 2.0,
    };
    (x, y)
}

/// A cell ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCell {
    pub row: RowKind,
    pub col: usize,
    pub rect: Rect,
    pub fill: Color,
    /// Text as drawn (header text is upper-cased)
    pub text: String,
    pub text_origin: (f32, f32),
}

/// Place every cell of `table`: header cells left to right, then each data
/// row top to bottom.
pub fn plan_table(
    table: &TableData,
    widths: &ColumnWidths,
    settings: &RenderSettings,
    metrics: &dyn TextMetrics,
) -> RendererResult<Vec<PlacedCell>> {
    let mut cells = Vec::with_capacity(table.column_count() * (table.row_count() + 1));
    for (col, text) in table.header.iter().enumerate() {
        let text = text.to_uppercase();
        cells.push(place_cell(RowKind::Header, col, text, widths, settings, metrics)?);
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (col, text) in row.iter().enumerate() {
            let text = text.clone();
            cells.push(place_cell(RowKind::Data(r), col, text, widths, settings, metrics)?);
        }
    }
    Ok(cells)
}

fn place_cell(
    row: RowKind,
    col: usize,
    text: String,
    widths: &ColumnWidths,
    settings: &RenderSettings,
    metrics: &dyn TextMetrics,
) -> RendererResult<PlacedCell> {
    let (fill, padding, default_align) = match row {
        RowKind::Header => {
            let header = &settings.header;
            (header.color, header.padding, header.text_align)
        }
        RowKind::Data(_) => {
            let cell = &settings.cell;
            (cell.color, cell.padding, cell.text_align)
        }
    };
    let rect = cell_rect(widths, row, col, settings.cell.height, settings.table.margin);
    let bbox = metrics.text_bbox((0.0, 0.0), &text)?;
    let align = settings.align_for(col, default_align);

    Ok(PlacedCell {
        row,
        col,
        rect,
        fill,
        text_origin: text_origin(rect, bbox, padding, align),
        text,
    })
}
