// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. sandbox::FileSandbox)
    clippy::module_name_repetitions
)]

//! # jsx-sandbox
//!
//! A terminal JSX playground. Code typed into the editor pane is transpiled
//! on every pause in typing and written to a preview document that a
//! browser runs as an ES module.
//!
//! ## Architecture
//!
//! jsx-sandbox uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! Render passes are driven by a two-state machine (`Editing`, `Error`):
//! a debounced keystroke runs the transpile pipeline, and any failure is
//! shown once in the error panel before the machine settles back.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop, state machine and render passes
//! - [`imports`]: Import statement extraction
//! - [`transpiler`]: JSX and ES2015 lowering behind the `Transform` trait
//! - [`pipeline`]: Editor text to sandbox and display code
//! - [`sandbox`]: Preview document construction and delivery
//! - [`editor`]: Rope-backed text buffer
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Syntax highlighting
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod editor;
pub mod highlight;
pub mod imports;
pub mod perf;
pub mod pipeline;
pub mod sandbox;
pub mod transpiler;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model, Session};
    pub use crate::pipeline::{Pipeline, PipelineError, TranspiledArtifact};
    pub use crate::transpiler::{BuiltinTransform, Transform};
}
