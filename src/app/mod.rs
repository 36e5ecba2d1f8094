//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`Session`]: Debounced render passes driven by messages
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
pub mod machine;
mod model;
mod update;

pub use effects::Renderer;
pub use event_loop::{KeystrokeDebouncer, Session};
pub use machine::{ErrorInfo, ErrorOrigin, Machine, UiEvent, UiState};
pub use model::{Model, Pane, PreviewStatus, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::config::DEFAULT_DEBOUNCE_MS;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    source: String,
    file_path: Option<PathBuf>,
    watch_enabled: bool,
    preview_path: PathBuf,
    stylesheet: Option<String>,
    debounce_ms: u64,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application seeded with `source`, writing the preview
    /// document to `preview_path`.
    pub fn new(source: impl Into<String>, preview_path: PathBuf) -> Self {
        Self {
            source: source.into(),
            file_path: None,
            watch_enabled: false,
            preview_path,
            stylesheet: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// File the source came from.
    pub fn with_file_path(mut self, path: Option<PathBuf>) -> Self {
        self.file_path = path;
        self
    }

    /// Enable or disable file watching.
    pub fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Stylesheet linked from the preview document.
    pub fn with_stylesheet(mut self, stylesheet: Option<String>) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    pub const fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
