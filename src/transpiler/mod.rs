//! JSX/ES2015 transpilation.
//!
//! - [`Transform`]: the seam the pipeline calls through
//! - [`BuiltinTransform`]: in-process JSX + ES2015-loose lowering
//! - [`adapter`]: fixed-preset wrapper that rejects empty output

pub mod adapter;
mod cursor;
mod jsx;
mod rewrite;

pub use adapter::{SANDBOX_PRESETS, transpile_module};

use thiserror::Error;

/// A named bundle of transform rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// ES2015 target with loose semantics.
    Es2015Loose,
    /// JSX to element factory calls.
    React,
}

impl Preset {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Es2015Loose => "es2015-loose",
            Self::React => "react",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub presets: Vec<Preset>,
}

impl TransformOptions {
    pub fn with_presets(presets: &[Preset]) -> Self {
        Self {
            presets: presets.to_vec(),
        }
    }

    pub fn has(&self, preset: Preset) -> bool {
        self.presets.contains(&preset)
    }
}

/// Result of a transform call. `code` is absent when nothing was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    /// Malformed input; positions are 1-based.
    #[error("SyntaxError: {message} ({line}:{column})")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
}

/// A source-to-source transform.
///
/// Implementations are pure: identical input and options give identical
/// output.
pub trait Transform {
    /// Transform `source` under `options`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Syntax`] when `source` cannot be parsed.
    fn transform(
        &self,
        source: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, TransformError>;
}

impl<T: Transform + ?Sized> Transform for &T {
    fn transform(
        &self,
        source: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, TransformError> {
        (**self).transform(source, options)
    }
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn transform(
        &self,
        source: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, TransformError> {
        (**self).transform(source, options)
    }
}

/// JSX and ES2015-loose lowering implemented as a single rewriting pass.
///
/// Anything the enabled presets don't cover is copied through verbatim, so
/// modern syntax the browser already understands keeps working.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTransform;

impl Transform for BuiltinTransform {
    fn transform(
        &self,
        source: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, TransformError> {
        let _scope = crate::perf::scope("transpiler.builtin");
        let lowering = rewrite::Lowering {
            es2015: options.has(Preset::Es2015Loose),
            jsx: options.has(Preset::React),
        };
        let body = rewrite::rewrite(source, lowering)?;
        let body = body.trim_start();
        if body.is_empty() {
            return Ok(TransformOutput {
                code: Some(String::new()),
            });
        }
        let code = if lowering.es2015 {
            format!("\"use strict\";\n\n{body}")
        } else {
            body.to_string()
        };
        Ok(TransformOutput { code: Some(code) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(source: &str) -> String {
        BuiltinTransform
            .transform(source, &TransformOptions::with_presets(&SANDBOX_PRESETS))
            .unwrap()
            .code
            .unwrap()
    }

    #[test]
    fn test_es2015_output_has_strict_prologue() {
        assert_eq!(sandbox("var a = 1;"), "\"use strict\";\n\nvar a = 1;");
    }

    #[test]
    fn test_leading_blank_lines_are_dropped() {
        assert_eq!(sandbox("\n\n\nvar a = 1;"), "\"use strict\";\n\nvar a = 1;");
    }

    #[test]
    fn test_whitespace_only_input_produces_empty_code() {
        let out = BuiltinTransform
            .transform("  \n\n", &TransformOptions::with_presets(&SANDBOX_PRESETS))
            .unwrap();
        assert_eq!(out.code.as_deref(), Some(""));
    }

    #[test]
    fn test_react_only_leaves_es2015_syntax_alone() {
        let out = BuiltinTransform
            .transform(
                "const f = () => <b/>;",
                &TransformOptions::with_presets(&[Preset::React]),
            )
            .unwrap();
        assert_eq!(
            out.code.as_deref(),
            Some("const f = () => /*#__PURE__*/React.createElement(\"b\", null);")
        );
    }

    #[test]
    fn test_no_presets_is_identity() {
        let src = "const f = () => `x${y}`;";
        let out = BuiltinTransform
            .transform(src, &TransformOptions::default())
            .unwrap();
        assert_eq!(out.code.as_deref(), Some(src));
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::Es2015Loose.name(), "es2015-loose");
        assert_eq!(Preset::React.name(), "react");
    }
}
