//! Terminal UI components.
//!
//! The editor pane sits on the left. The right side shows either the preview
//! status with the transpiled source, or the error panel, depending on the
//! pane the last render pass left visible.

mod overlays;
mod render;
mod status;

pub use render::{render, split_main_columns};

pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PANEL_WIDTH_PERCENT: u16 = 50;
/// Rows of the preview status box above the source panel.
pub const PREVIEW_STATUS_ROWS: u16 = 4;

#[cfg(test)]
mod tests;
