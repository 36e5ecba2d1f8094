use std::io::{Write, stdout};

use base64::Engine;
use tracing::{debug, warn};

use super::machine::{ErrorInfo, ErrorOrigin, UiState};
use super::model::{Model, Pane, ToastLevel};
use crate::pipeline::Pipeline;
use crate::sandbox::{Sandbox, sandbox_document};
use crate::transpiler::Transform;

/// Runs render passes: the pipeline, the preview document and the panels.
pub struct Renderer<T, S> {
    pipeline: Pipeline<T>,
    sandbox: S,
    stylesheet: Option<String>,
}

impl<T: Transform, S: Sandbox> Renderer<T, S> {
    pub const fn new(pipeline: Pipeline<T>, sandbox: S, stylesheet: Option<String>) -> Self {
        Self {
            pipeline,
            sandbox,
            stylesheet,
        }
    }

    pub const fn sandbox(&self) -> &S {
        &self.sandbox
    }

    /// Bring the screen in line with the machine state.
    ///
    /// In `Editing` the pipeline runs on the current editor text and both
    /// the preview document and the source panel are replaced. In `Error`
    /// only the error panel is written. Any failure while editing is routed
    /// through [`Renderer::report_uncaught`].
    pub fn render_pass(&mut self, model: &mut Model) {
        let _scope = crate::perf::scope("render.pass");
        model.render_passes += 1;
        match model.machine.state() {
            UiState::Editing => {
                model.show_pane(Pane::Preview);
                if let Err(info) = self.render_editing(model) {
                    self.report_uncaught(model, info);
                }
            }
            UiState::Error => {
                model.show_pane(Pane::Error);
                model.error_text = model.machine.error_message().to_string();
                crate::perf::log_event(
                    "render.error",
                    format!("origin={:?}", model.machine.last_origin()),
                );
            }
        }
        model.loading = false;
    }

    fn render_editing(&mut self, model: &mut Model) -> Result<(), ErrorInfo> {
        let code = model.editor.value();
        model.pipeline_runs += 1;
        let artifact = self.pipeline.run(&code)?;

        let document = sandbox_document(&artifact.sandbox_code, self.stylesheet.as_deref());
        self.sandbox.load(&document).map_err(|err| {
            ErrorInfo::new(
                ErrorOrigin::Sandbox,
                format!("Could not update preview {}: {err}", self.sandbox.location()),
            )
        })?;
        model
            .preview
            .record_load(self.sandbox.location(), document.len());
        model.set_source_code(artifact.display_code);
        crate::perf::log_event(
            "render.editing",
            format!(
                "run={} input={} document={}",
                model.pipeline_runs,
                code.len(),
                document.len()
            ),
        );
        Ok(())
    }

    /// Top-level error boundary: show `info` once, then go back to editing.
    pub fn report_uncaught(&mut self, model: &mut Model, info: ErrorInfo) {
        warn!(origin = ?info.origin, message = %info.message, "uncaught error");
        model.machine.raise(info);
        self.render_pass(model);
        model.machine.settle();
    }
}

/// Copy the display code to the clipboard.
pub(super) fn copy_source(model: &mut Model) {
    if model.source_code.is_empty() {
        model.show_toast(ToastLevel::Warning, "Nothing to copy yet");
        return;
    }
    match copy_to_clipboard(&model.source_code) {
        Ok(()) => {
            let lines = model.source_code.lines().count();
            model.show_toast(ToastLevel::Info, format!("Copied {lines} lines"));
        }
        Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
    }
}

/// Open the preview document in the system browser.
pub(super) fn open_preview(model: &mut Model) {
    if model.preview.loads == 0 {
        model.show_toast(ToastLevel::Warning, "No preview written yet");
        return;
    }
    let location = model.preview.location.clone();
    debug!(%location, "opening preview");
    match open_external(&location) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {location}")),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
    }
}

fn open_external(target: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(target)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", target])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        use std::process::Stdio;
        std::process::Command::new("xdg-open")
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    let mut out = stdout();
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
