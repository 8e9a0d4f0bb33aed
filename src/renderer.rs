//! Table renderer
//!
//! ## Pipeline
//!
//! ```text
//! Uninitialized → DataLoaded → WidthsResolved → CanvasCreated
//!     → HeaderDrawn → RowsDrawn → Composited → Saved
//! ```
//!
//! Each stage has its own method and can only run once its predecessor has;
//! calling a stage that already ran is a no-op. [`TableRenderer::render_table`]
//! drives a fresh pass through every stage. All per-pass state (font, widths,
//! layers) lives in [`RenderPass`] and is dropped when the next pass starts.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::canvas::Canvas;
use crate::compositor::{background_layer, draw_cells, table_size};
use crate::data::{TableData, TableDocument};
use crate::error::{RendererError, RendererResult};
use crate::font::{load_font, Font};
use crate::layout::{plan_table, PlacedCell};
use crate::observer::{LogObserver, RenderEvent, RenderObserver};
use crate::settings::RenderSettings;
use crate::widths::{self, ColumnWidths};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderStage {
    Uninitialized,
    DataLoaded,
    WidthsResolved,
    CanvasCreated,
    HeaderDrawn,
    RowsDrawn,
    Composited,
    Saved,
}

impl RenderStage {
    pub fn next(self) -> Option<RenderStage> {
        use RenderStage::*;
        match self {
            Uninitialized => Some(DataLoaded),
            DataLoaded => Some(WidthsResolved),
            WidthsResolved => Some(CanvasCreated),
            CanvasCreated => Some(HeaderDrawn),
            HeaderDrawn => Some(RowsDrawn),
            RowsDrawn => Some(Composited),
            Composited => Some(Saved),
            Saved => None,
        }
    }
}

/// Result of [`TableRenderer::render_table`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Saved { path: PathBuf, width: u32, height: u32 },
    NothingToRender,
}

/// State owned by a single render pass
#[derive(Default)]
struct RenderPass {
    font: Option<Font>,
    widths: Option<ColumnWidths>,
    plan: Vec<PlacedCell>,
    background: Option<Canvas>,
    table_layer: Option<Canvas>,
    image: Option<Canvas>,
}

pub struct TableRenderer {
    settings: RenderSettings,
    observer: Box<dyn RenderObserver>,
    data: TableData,
    stage: RenderStage,
    pass: RenderPass,
}

impl TableRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            observer: Box::new(LogObserver),
            data: TableData::default(),
            stage: RenderStage::Uninitialized,
            pass: RenderPass::default(),
        }
    }

    pub fn with_observer(mut self, observer: impl RenderObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn data(&self) -> &TableData {
        &self.data
    }

    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    pub fn widths(&self) -> Option<&ColumnWidths> {
        self.pass.widths.as_ref()
    }

    /// Composite of the current pass, once it reached `Composited`
    pub fn image(&self) -> Option<&Canvas> {
        self.pass.image.as_ref()
    }

    /// Replace the table, truncated to the configured limits
    pub fn load_data(&mut self, data: TableData) {
        self.data = data.truncated(&self.settings.limits);
        self.pass = RenderPass::default();
        self.stage = RenderStage::DataLoaded;
        self.emit(RenderEvent::StageEntered {
            stage: RenderStage::DataLoaded,
            table: self.data.name.clone(),
        });
    }

    /// Load a parsed document. Its settings block, if any, is merged over the
    /// current settings before the data is truncated.
    pub fn load_document(&mut self, doc: TableDocument) {
        if let Some(patch) = &doc.settings {
            match self.settings.with_patch(patch) {
                Ok(settings) => self.settings = settings,
                Err(e) => self.emit(RenderEvent::SettingsRejected {
                    reason: e.to_string(),
                }),
            }
        }
        self.load_data(doc.data);
    }

    /// Load a JSON document from disk. A missing or malformed file leaves an
    /// empty table, which renders as "nothing to render".
    pub fn load_json(&mut self, path: &Path) {
        let doc = match TableDocument::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                self.emit(RenderEvent::DataLoadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                TableDocument::default()
            }
        };
        self.load_document(doc);
    }

    /// Resolve column widths for the loaded table. A table without a header
    /// or without rows stays at `DataLoaded` and is reported as having
    /// nothing to render, so no later stage can run.
    pub fn resolve_widths(&mut self) -> RendererResult<()> {
        if self.stage == RenderStage::DataLoaded && self.data.is_empty() {
            self.emit(RenderEvent::NothingToRender);
            return Ok(());
        }
        if !self.enter(RenderStage::WidthsResolved)? {
            return Ok(());
        }
        let font = load_font(&self.settings.font, self.observer.as_ref());
        let widths = widths::resolve(&self.data, &self.settings, &font)?;
        self.pass.font = Some(font);
        self.pass.widths = Some(widths);
        self.stage = RenderStage::WidthsResolved;
        Ok(())
    }

    pub fn create_canvas(&mut self) -> RendererResult<()> {
        if !self.enter(RenderStage::CanvasCreated)? {
            return Ok(());
        }
        let current = self.stage;
        let (Some(widths), Some(font)) = (self.pass.widths.as_ref(), self.pass.font.as_ref())
        else {
            return Err(RendererError::OutOfOrder {
                requested: RenderStage::CanvasCreated,
                current,
            });
        };
        let (width, height) = table_size(widths, self.data.row_count(), &self.settings)?;
        let background = background_layer(
            &self.settings.background,
            width,
            height,
            self.observer.as_ref(),
        )?;
        let table_layer = Canvas::new(width, height)?;
        let plan = plan_table(&self.data, widths, &self.settings, font)?;

        self.pass.background = Some(background);
        self.pass.table_layer = Some(table_layer);
        self.pass.plan = plan;
        self.stage = RenderStage::CanvasCreated;
        Ok(())
    }

    pub fn draw_header(&mut self) -> RendererResult<()> {
        if !self.enter(RenderStage::HeaderDrawn)? {
            return Ok(());
        }
        let header_cells = self.data.column_count().min(self.pass.plan.len());
        self.draw_plan(0..header_cells, RenderStage::HeaderDrawn)
    }

    pub fn draw_rows(&mut self) -> RendererResult<()> {
        if !self.enter(RenderStage::RowsDrawn)? {
            return Ok(());
        }
        let header_cells = self.data.column_count().min(self.pass.plan.len());
        self.draw_plan(header_cells..self.pass.plan.len(), RenderStage::RowsDrawn)
    }

    pub fn composite(&mut self) -> RendererResult<()> {
        if !self.enter(RenderStage::Composited)? {
            return Ok(());
        }
        let current = self.stage;
        let (Some(background), Some(table_layer)) =
            (self.pass.background.as_ref(), self.pass.table_layer.as_ref())
        else {
            return Err(RendererError::OutOfOrder {
                requested: RenderStage::Composited,
                current,
            });
        };
        self.pass.image = Some(background.composite(table_layer)?);
        self.stage = RenderStage::Composited;
        Ok(())
    }

    /// Write the composite to `path`. Before `Composited` the request is
    /// refused and reported, and `Ok(false)` is returned.
    pub fn save(&mut self, path: &Path) -> RendererResult<bool> {
        let composited = self.stage >= RenderStage::Composited;
        let Some(image) = self.pass.image.as_ref().filter(|_| composited) else {
            self.emit(RenderEvent::SaveRefused { stage: self.stage });
            return Ok(false);
        };
        write_image(image, path)?;
        let (width, height) = (image.width(), image.height());
        self.stage = RenderStage::Saved;
        self.emit(RenderEvent::Saved {
            path: path.to_path_buf(),
            width,
            height,
        });
        Ok(true)
    }

    /// Run a fresh pass over the loaded table and save it to `output`
    pub fn render_table(&mut self, output: &Path) -> RendererResult<RenderOutcome> {
        if self.stage == RenderStage::Uninitialized {
            self.emit(RenderEvent::NothingToRender);
            return Ok(RenderOutcome::NothingToRender);
        }
        self.pass = RenderPass::default();
        self.stage = RenderStage::DataLoaded;

        self.resolve_widths()?;
        if self.stage == RenderStage::DataLoaded {
            return Ok(RenderOutcome::NothingToRender);
        }
        self.create_canvas()?;
        self.draw_header()?;
        self.draw_rows()?;
        self.composite()?;
        self.save(output)?;

        let (width, height) = self
            .pass
            .image
            .as_ref()
            .map(|img| (img.width(), img.height()))
            .unwrap_or_default();
        Ok(RenderOutcome::Saved {
            path: output.to_path_buf(),
            width,
            height,
        })
    }

    /// `Ok(true)` when `target` should run now, `Ok(false)` when it already ran
    fn enter(&mut self, target: RenderStage) -> RendererResult<bool> {
        if self.stage >= target {
            return Ok(false);
        }
        if self.stage.next() != Some(target) {
            return Err(RendererError::OutOfOrder {
                requested: target,
                current: self.stage,
            });
        }
        self.emit(RenderEvent::StageEntered {
            stage: target,
            table: self.data.name.clone(),
        });
        Ok(true)
    }

    fn draw_plan(
        &mut self,
        cells: std::ops::Range<usize>,
        stage: RenderStage,
    ) -> RendererResult<()> {
        let current = self.stage;
        let (Some(layer), Some(font)) = (self.pass.table_layer.as_mut(), self.pass.font.as_ref())
        else {
            return Err(RendererError::OutOfOrder { requested: stage, current });
        };
        draw_cells(
            layer,
            &self.pass.plan[cells],
            font,
            &self.settings,
            self.observer.as_ref(),
        )?;
        self.stage = stage;
        Ok(())
    }

    fn emit(&self, event: RenderEvent) {
        self.observer.on_event(&event);
    }
}

/// Encode by file extension, PNG when the extension is unknown
fn write_image(canvas: &Canvas, path: &Path) -> RendererResult<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let image = DynamicImage::ImageRgba8(canvas.to_rgba_image()?);
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    image.save_with_format(path, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::types::Color;
    use std::fs;

    fn settings() -> RenderSettings {
        let mut s = RenderSettings::default();
        s.font.system_fallbacks = false;
        s
    }

    fn people() -> TableData {
        TableData::new(["Name", "Age"], [["Alice", "30"], ["Bob", "7"]]).with_name("people")
    }

    #[test]
    fn test_end_to_end_example() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("table.png");
        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_data(people());

        let outcome = renderer.render_table(&output).unwrap();
        assert_eq!(
            outcome,
            RenderOutcome::Saved { path: output.clone(), width: 480, height: 230 }
        );
        assert_eq!(renderer.stage(), RenderStage::Saved);

        let texts: Vec<&str> = renderer.pass.plan.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["NAME", "AGE", "Alice", "30", "Bob", "7"]);

        let saved = image::open(&output).unwrap();
        assert_eq!((saved.width(), saved.height()), (480, 230));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");

        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        renderer.render_table(&first).unwrap();
        renderer.render_table(&second).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_dimensions_follow_widths() {
        let mut s = settings();
        s.cell.width = None;
        s.cell.height = 30;
        s.table.margin = 5;
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = TableRenderer::new(s).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        renderer.render_table(&dir.path().join("t.png")).unwrap();

        // built-in font at size 20: letter width 10; "Alice" and "Age"
        let widths = renderer.widths().unwrap();
        assert_eq!(&**widths, &[50, 30]);
        let image = renderer.image().unwrap();
        assert_eq!((image.width(), image.height()), (80 + 10, 30 * 3 + 10));
    }

    #[test]
    fn test_limits_truncate() {
        let mut s = settings();
        s.limits.cols = 2;
        s.limits.rows = 1;
        let mut renderer = TableRenderer::new(s).with_observer(RecordingObserver::new());
        renderer.load_data(TableData::new(
            ["a", "b", "c", "d", "e"],
            vec![vec!["1", "2", "3", "4", "5"]; 3],
        ));
        let dir = tempfile::tempdir().unwrap();
        renderer.render_table(&dir.path().join("t.png")).unwrap();

        assert_eq!(renderer.data().column_count(), 2);
        assert_eq!(renderer.data().row_count(), 1);
        assert_eq!(renderer.widths().unwrap().len(), 2);
        let image = renderer.image().unwrap();
        assert_eq!((image.width(), image.height()), (480, 180));
    }

    #[test]
    fn test_empty_table_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.png");
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(settings()).with_observer(observer.clone());
        renderer.load_data(TableData::new(["Name"], Vec::<Vec<String>>::new()));

        let outcome = renderer.render_table(&output).unwrap();
        assert_eq!(outcome, RenderOutcome::NothingToRender);
        assert!(!output.exists());
        assert_eq!(renderer.stage(), RenderStage::DataLoaded);
        assert!(observer.events().contains(&RenderEvent::NothingToRender));
    }

    #[test]
    fn test_empty_table_blocks_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("header_only.png");
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(settings()).with_observer(observer.clone());
        renderer.load_data(TableData::new(["Name"], Vec::<Vec<String>>::new()));

        renderer.resolve_widths().unwrap();
        assert_eq!(renderer.stage(), RenderStage::DataLoaded);
        assert!(renderer.widths().is_none());
        assert!(observer.events().contains(&RenderEvent::NothingToRender));

        assert!(matches!(
            renderer.create_canvas(),
            Err(RendererError::OutOfOrder { current: RenderStage::DataLoaded, .. })
        ));
        assert!(renderer.draw_header().is_err());
        assert!(renderer.draw_rows().is_err());
        assert!(renderer.composite().is_err());
        assert!(!renderer.save(&output).unwrap());
        assert!(!output.exists());
        assert_eq!(renderer.stage(), RenderStage::DataLoaded);
    }

    #[test]
    fn test_oversized_table_is_invalid_geometry() {
        let huge = u32::MAX / 2 + 1;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("huge.png");

        let mut wide = settings();
        wide.cell.width = Some(huge);
        let mut renderer = TableRenderer::new(wide).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        assert!(matches!(
            renderer.render_table(&output),
            Err(RendererError::InvalidGeometry(_))
        ));
        assert_eq!(renderer.stage(), RenderStage::WidthsResolved);

        let mut margined = settings();
        margined.table.margin = huge;
        let mut renderer = TableRenderer::new(margined).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        assert!(matches!(
            renderer.render_table(&output),
            Err(RendererError::InvalidGeometry(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_uninitialized_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("none.png");
        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        assert_eq!(renderer.render_table(&output).unwrap(), RenderOutcome::NothingToRender);
        assert!(!output.exists());
    }

    #[test]
    fn test_save_before_composite_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("early.png");
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(settings()).with_observer(observer.clone());
        renderer.load_data(people());
        renderer.resolve_widths().unwrap();

        assert!(!renderer.save(&output).unwrap());
        assert!(!output.exists());
        assert!(observer
            .events()
            .contains(&RenderEvent::SaveRefused { stage: RenderStage::WidthsResolved }));
    }

    #[test]
    fn test_stages_in_order_and_idempotent() {
        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_data(people());

        assert!(matches!(
            renderer.draw_header(),
            Err(RendererError::OutOfOrder {
                requested: RenderStage::HeaderDrawn,
                current: RenderStage::DataLoaded
            })
        ));

        renderer.resolve_widths().unwrap();
        renderer.resolve_widths().unwrap();
        renderer.create_canvas().unwrap();
        renderer.draw_header().unwrap();
        renderer.draw_rows().unwrap();
        renderer.draw_rows().unwrap();
        renderer.composite().unwrap();
        assert_eq!(renderer.stage(), RenderStage::Composited);
        assert!(renderer.image().is_some());
    }

    #[test]
    fn test_header_drawn_before_rows() {
        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        renderer.resolve_widths().unwrap();
        renderer.create_canvas().unwrap();
        renderer.draw_header().unwrap();

        let layer = renderer.pass.table_layer.as_ref().unwrap();
        // header cell interior is filled, first data row is still empty
        assert_eq!(layer.pixel(200, 45), Some(Color::white()));
        assert_eq!(layer.pixel(200, 115), Some(Color::transparent()));
    }

    #[test]
    fn test_missing_background_still_renders() {
        let mut s = settings();
        s.background.image = Some(PathBuf::from("/nonexistent/bg.jpg"));
        s.background.color = Color::rgba(0, 128, 255, 255);
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(s).with_observer(observer.clone());
        renderer.load_data(people());
        let dir = tempfile::tempdir().unwrap();

        let outcome = renderer.render_table(&dir.path().join("t.png")).unwrap();
        assert!(matches!(outcome, RenderOutcome::Saved { .. }));
        let image = renderer.image().unwrap();
        assert_eq!(image.pixel(0, 0), Some(Color::rgba(0, 128, 255, 255)));
        assert_eq!(image.pixel(479, 229), Some(Color::rgba(0, 128, 255, 255)));
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, RenderEvent::BackgroundFallback { path: Some(_), .. })));
    }

    #[test]
    fn test_load_json_with_settings_block() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.json");
        fs::write(
            &input,
            r#"{
                "tableName": "people",
                "header": ["Name", "Age"],
                "data": [["Alice", 30], ["Bob", 7]],
                "settings": { "cell": { "height": 40 }, "table": { "margin": 10 } }
            }"#,
        )
        .unwrap();

        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_json(&input);
        assert_eq!(renderer.settings().cell.height, 40);
        assert_eq!(renderer.data().rows[0], vec!["Alice", "30"]);

        renderer.render_table(&dir.path().join("t.png")).unwrap();
        let image = renderer.image().unwrap();
        assert_eq!((image.width(), image.height()), (420, 140));
    }

    #[test]
    fn test_load_json_missing_file_is_recoverable() {
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(settings()).with_observer(observer.clone());
        renderer.load_json(Path::new("/nonexistent/data.json"));

        assert!(renderer.data().is_empty());
        assert!(matches!(&observer.events()[0], RenderEvent::DataLoadFailed { .. }));
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            renderer.render_table(&dir.path().join("t.png")).unwrap(),
            RenderOutcome::NothingToRender
        );
    }

    #[test]
    fn test_bad_settings_block_keeps_settings() {
        let observer = RecordingObserver::new();
        let mut renderer = TableRenderer::new(settings()).with_observer(observer.clone());
        let doc = TableDocument::from_json_str(
            r#"{
                "header": ["a"],
                "data": [["b"]],
                "settings": { "cell": { "textAlign": "right" } }
            }"#,
        )
        .unwrap();
        renderer.load_document(doc);

        assert_eq!(renderer.settings(), &settings());
        assert!(matches!(&observer.events()[0], RenderEvent::SettingsRejected { .. }));
        assert_eq!(renderer.stage(), RenderStage::DataLoaded);
    }

    #[test]
    fn test_jpeg_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("table.jpg");
        let mut renderer = TableRenderer::new(settings()).with_observer(RecordingObserver::new());
        renderer.load_data(people());
        renderer.render_table(&output).unwrap();

        let saved = image::open(&output).unwrap();
        assert_eq!((saved.width(), saved.height()), (480, 230));
    }
}
