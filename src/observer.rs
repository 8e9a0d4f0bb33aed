//! Render observers
//!
//! The renderer never talks to a logger directly. It reports what happens
//! to a [`RenderObserver`]; [`LogObserver`] is the default and forwards to
//! the `log` facade.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};

use crate::renderer::RenderStage;

/// Something worth reporting during a render pass
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    StageEntered {
        stage: RenderStage,
        table: Option<String>,
    },
    DataLoadFailed {
        path: PathBuf,
        reason: String,
    },
    SettingsRejected {
        reason: String,
    },
    FontLoaded {
        source: String,
        size: f32,
    },
    FontFallback {
        path: PathBuf,
        reason: String,
    },
    BackgroundLoaded {
        path: PathBuf,
    },
    BackgroundFallback {
        path: Option<PathBuf>,
        reason: String,
    },
    CellSkipped {
        row: Option<usize>,
        col: usize,
    },
    NothingToRender,
    SaveRefused {
        stage: RenderStage,
    },
    Saved {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

pub trait RenderObserver: Send {
    fn on_event(&self, event: &RenderEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RenderObserver for LogObserver {
    fn on_event(&self, event: &RenderEvent) {
        match event {
            RenderEvent::StageEntered { stage, table } => {
                debug!("Stage {:?} (table: {})", stage, table.as_deref().unwrap_or("<unnamed>"));
            }
            RenderEvent::DataLoadFailed { path, reason } => {
                error!("Failed to load table data from {}: {}", path.display(), reason);
            }
            RenderEvent::SettingsRejected { reason } => {
                error!("Ignoring settings block: {}", reason);
            }
            RenderEvent::FontLoaded { source, size } => {
                info!("Font loaded: {} at {}px", source, size);
            }
            RenderEvent::FontFallback { path, reason } => {
                warn!("Font {} unavailable ({}), trying next candidate", path.display(), reason);
            }
            RenderEvent::BackgroundLoaded { path } => {
                info!("Background image loaded: {}", path.display());
            }
            RenderEvent::BackgroundFallback { path: Some(path), reason } => {
                warn!(
                    "Background image {} unavailable ({}), using solid color",
                    path.display(),
                    reason
                );
            }
            RenderEvent::BackgroundFallback { path: None, .. } => {
                info!("No background image configured, using solid color");
            }
            RenderEvent::CellSkipped { row, col } => {
                debug!("Skipping zero-area cell at row {:?}, column {}", row, col);
            }
            RenderEvent::NothingToRender => {
                warn!("Table has no header or no rows, nothing to render");
            }
            RenderEvent::SaveRefused { stage } => {
                warn!("Refusing to save from stage {:?}: render the table first", stage);
            }
            RenderEvent::Saved { path, width, height } => {
                info!("Table saved to {} ({}x{})", path.display(), width, height);
            }
        }
    }
}

/// Keeps every event in memory, for callers that inspect a pass afterwards
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RenderObserver for RecordingObserver {
    fn on_event(&self, event: &RenderEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
