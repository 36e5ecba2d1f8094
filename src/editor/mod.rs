//! Code editor pane text model.
//!
//! Rope-backed buffer with cursor management; the render loop reads its
//! [`EditorBuffer::value`] at the start of every pipeline run.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer, INDENT};
