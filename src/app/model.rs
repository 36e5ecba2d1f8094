use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::text::Line;

use super::machine::Machine;
use crate::editor::EditorBuffer;

/// Rows taken by the status bar.
const STATUS_ROWS: u16 = 1;
/// Rows taken by the editor pane's top and bottom border.
const BORDER_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which right-hand pane the last render left visible.
///
/// Kept apart from the machine state: the machine returns to `Editing` right
/// after an error render while the error pane stays on screen until the next
/// successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Preview,
    Error,
}

/// What the status panel knows about the preview document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStatus {
    pub location: String,
    pub loads: u64,
    pub bytes: usize,
}

impl PreviewStatus {
    pub(super) fn record_load(&mut self, location: String, bytes: usize) {
        self.location = location;
        self.loads += 1;
        self.bytes = bytes;
    }
}

/// The complete application state.
pub struct Model {
    /// Program text being edited
    pub editor: EditorBuffer,
    /// First editor line on screen
    pub editor_scroll_offset: usize,
    pub machine: Machine,
    pub pane: Pane,
    /// Display code from the last successful pass
    pub source_code: String,
    source_lines: Vec<Line<'static>>,
    /// Error text from the last error render
    pub error_text: String,
    /// Scroll offset of the right-hand panel
    pub panel_scroll: u16,
    pub preview: PreviewStatus,
    /// True until the first render pass has finished
    pub loading: bool,
    /// Keystrokes are waiting out the quiet period
    pub render_pending: bool,
    /// File the editor was seeded from, if any
    pub file_path: Option<PathBuf>,
    pub watch_enabled: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub help_visible: bool,
    pub should_quit: bool,
    /// Terminal size
    pub width: u16,
    pub height: u16,
    /// Render passes run, including error renders
    pub render_passes: u64,
    /// Pipeline runs started
    pub pipeline_runs: u64,
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("state", &self.machine.state())
            .field("pane", &self.pane)
            .field("render_passes", &self.render_passes)
            .field("pipeline_runs", &self.pipeline_runs)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new("", (80, 24))
    }
}

impl Model {
    pub fn new(source: &str, terminal_size: (u16, u16)) -> Self {
        Self {
            editor: EditorBuffer::from_text(source),
            editor_scroll_offset: 0,
            machine: Machine::new(),
            pane: Pane::Preview,
            source_code: String::new(),
            source_lines: Vec::new(),
            error_text: String::new(),
            panel_scroll: 0,
            preview: PreviewStatus::default(),
            loading: true,
            render_pending: false,
            file_path: None,
            watch_enabled: false,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            should_quit: false,
            width: terminal_size.0,
            height: terminal_size.1,
            render_passes: 0,
            pipeline_runs: 0,
            toast: None,
        }
    }

    #[must_use]
    pub fn with_file_path(mut self, path: Option<PathBuf>) -> Self {
        self.file_path = path;
        self
    }

    /// Editor lines that fit inside the editor pane.
    pub fn editor_visible_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(STATUS_ROWS + BORDER_ROWS)).max(1)
    }

    /// Scroll the editor so the cursor line is on screen.
    pub(super) fn ensure_cursor_visible(&mut self) {
        let line = self.editor.cursor().line;
        let rows = self.editor_visible_rows();
        if line < self.editor_scroll_offset {
            self.editor_scroll_offset = line;
        } else if line >= self.editor_scroll_offset + rows {
            self.editor_scroll_offset = line + 1 - rows;
        }
    }

    pub(super) fn show_pane(&mut self, pane: Pane) {
        if self.pane != pane {
            self.panel_scroll = 0;
        }
        self.pane = pane;
    }

    /// Store new display code and its highlighted rendering.
    pub(super) fn set_source_code(&mut self, code: String) {
        if code != self.source_code {
            self.source_lines = crate::highlight::highlight_js(&code);
            self.source_code = code;
        }
    }

    pub fn source_lines(&self) -> &[Line<'static>] {
        &self.source_lines
    }

    /// Line count of whichever panel is visible, for scroll clamping.
    pub fn panel_line_count(&self) -> usize {
        match self.pane {
            Pane::Preview => self.source_lines.len(),
            Pane::Error => self.error_text.lines().count(),
        }
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
