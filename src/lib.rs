//! Table-to-picture renderer
//!
//! Renders a header row plus a matrix of data rows into a single raster
//! image. Column widths are either fixed or measured from content, cells
//! are laid out on a transparent table layer, and the layer is composited
//! over a background image or a solid color.
//!
//! ```no_run
//! use std::path::Path;
//! use tbl2pic::{RenderSettings, TableData, TableRenderer};
//!
//! let mut renderer = TableRenderer::new(RenderSettings::default());
//! renderer.load_data(TableData::new(["Name", "Age"], [["Alice", "30"], ["Bob", "7"]]));
//! renderer.render_table(Path::new("table.png"))?;
//! # Ok::<(), tbl2pic::RendererError>(())
//! ```

mod canvas;
mod compositor;
mod data;
mod error;
mod font;
mod json_helpers;
mod layout;
mod metrics;
mod observer;
mod renderer;
mod settings;
mod types;
mod widths;

pub use canvas::Canvas;
pub use compositor::{background_layer, render, table_size};
pub use data::{TableData, TableDocument};
pub use error::{RendererError, RendererResult};
pub use font::{load_font, Font, SYSTEM_FONT_CANDIDATES};
pub use layout::{cell_origin, plan_table, text_origin, PlacedCell, RowKind};
pub use metrics::{LetterMetrics, TextMetrics};
pub use observer::{LogObserver, RecordingObserver, RenderEvent, RenderObserver};
pub use renderer::{RenderOutcome, RenderStage, TableRenderer};
pub use settings::{
    BackgroundSettings, CellStyle, ColumnSpec, FontSettings, HeaderStyle, Limits, RenderSettings,
    TableFrame,
};
pub use types::{Color, Padding, Rect, TextAlign, TextBox};
pub use widths::{resolve as resolve_widths, ColumnWidths};
