//! Table and background layers, and their composite

use std::path::Path;

use image::imageops::{self, FilterType};

use crate::canvas::Canvas;
use crate::data::TableData;
use crate::error::{RendererError, RendererResult};
use crate::font::Font;
use crate::layout::{plan_table, PlacedCell};
use crate::observer::{RenderEvent, RenderObserver};
use crate::settings::{BackgroundSettings, RenderSettings};
use crate::widths::ColumnWidths;

/// Full picture size: columns plus margins by header plus rows plus margins
pub fn table_size(
    widths: &ColumnWidths,
    row_count: usize,
    settings: &RenderSettings,
) -> RendererResult<(u32, u32)> {
    let rows = u32::try_from(row_count)
        .ok()
        .and_then(|r| r.checked_add(1))
        .ok_or_else(|| RendererError::InvalidGeometry(format!("{} rows", row_count)))?;
    let margins = settings.table.margin.checked_mul(2);
    let width = widths
        .total()
        .zip(margins)
        .and_then(|(w, m)| w.checked_add(m));
    let height = settings
        .cell
        .height
        .checked_mul(rows)
        .zip(margins)
        .and_then(|(h, m)| h.checked_add(m));
    match (width, height) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(RendererError::InvalidGeometry(
            "table size overflows the pixel range".to_string(),
        )),
    }
}

fn load_background(path: &Path, width: u32, height: u32) -> RendererResult<Canvas> {
    let img = image::open(path)?.to_rgba8();
    let resized = imageops::resize(&img, width, height, FilterType::Triangle);
    Canvas::from_image(&resized)
}

/// Background image stretched to `width x height`, or a solid fill when no
/// image is configured or it cannot be read
pub fn background_layer(
    settings: &BackgroundSettings,
    width: u32,
    height: u32,
    observer: &dyn RenderObserver,
) -> RendererResult<Canvas> {
    let reason = match settings.image.as_deref() {
        Some(path) => match load_background(path, width, height) {
            Ok(layer) => {
                observer.on_event(&RenderEvent::BackgroundLoaded {
                    path: path.to_path_buf(),
                });
                return Ok(layer);
            }
            Err(e) => e.to_string(),
        },
        None => "not configured".to_string(),
    };
    observer.on_event(&RenderEvent::BackgroundFallback {
        path: settings.image.clone(),
        reason,
    });
    Canvas::filled(width, height, settings.color)
}

/// Draw planned cells onto the table layer, in plan order
pub fn draw_cells(
    layer: &mut Canvas,
    cells: &[PlacedCell],
    font: &Font,
    settings: &RenderSettings,
    observer: &dyn RenderObserver,
) -> RendererResult<()> {
    for cell in cells {
        let drawn = layer.draw_cell(
            cell.rect,
            cell.fill,
            settings.table.border_color,
            settings.table.border_thickness,
        );
        if !drawn {
            observer.on_event(&RenderEvent::CellSkipped {
                row: cell.row.data_index(),
                col: cell.col,
            });
            continue;
        }
        font.draw_text(layer, cell.text_origin, &cell.text, settings.font.color)?;
    }
    Ok(())
}

/// One-shot render of a table to its final composite
pub fn render(
    table: &TableData,
    widths: &ColumnWidths,
    settings: &RenderSettings,
    font: &Font,
    observer: &dyn RenderObserver,
) -> RendererResult<Canvas> {
    let (width, height) = table_size(widths, table.row_count(), settings)?;
    let background = background_layer(&settings.background, width, height, observer)?;
    let mut layer = Canvas::new(width, height)?;
    let plan = plan_table(table, widths, settings, font)?;
    draw_cells(&mut layer, &plan, font, settings, observer)?;
    background.composite(&layer)
}
