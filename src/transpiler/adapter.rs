//! Fixed-preset transpile entry point used by the pipeline.

use tracing::debug;

use super::{Preset, Transform, TransformOptions};
use crate::pipeline::PipelineError;

/// Presets every sandbox module is compiled with, in application order.
pub const SANDBOX_PRESETS: [Preset; 2] = [Preset::Es2015Loose, Preset::React];

impl TransformOptions {
    /// Options for sandbox modules: [`SANDBOX_PRESETS`] and nothing else.
    pub fn sandbox() -> Self {
        Self::with_presets(&SANDBOX_PRESETS)
    }
}

/// Transpile an import-free module with the sandbox presets.
///
/// # Errors
///
/// Syntax errors from `transform` are passed through unchanged. Output that
/// is missing or empty becomes [`PipelineError::TranspileFailure`] carrying
/// the input.
pub fn transpile_module<T: Transform + ?Sized>(
    transform: &T,
    source: &str,
) -> Result<String, PipelineError> {
    let output = transform.transform(source, &TransformOptions::sandbox())?;
    match output.code {
        Some(code) if !code.is_empty() => {
            debug!(input = source.len(), output = code.len(), "module transpiled");
            Ok(code)
        }
        _ => Err(PipelineError::TranspileFailure {
            input: source.to_string(),
        }),
    }
}
