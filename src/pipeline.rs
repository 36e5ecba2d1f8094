//! Editor text to sandbox and display code.

use thiserror::Error;
use tracing::debug;

use crate::imports::{self, import_pattern, pure_pattern};
use crate::transpiler::{Transform, TransformError, transpile_module};

/// Longest input excerpt quoted in a [`PipelineError::TranspileFailure`]
/// message.
const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The transform ran but produced no code.
    #[error("Something went wrong transpiling {}.", snippet(input))]
    TranspileFailure { input: String },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

fn snippet(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return "<empty input>".to_string();
    }
    match trimmed.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Output of one pipeline pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspiledArtifact {
    /// Imports (verbatim, in order) followed by the transpiled body.
    pub sandbox_code: String,
    /// Transpiled body without `/*#__PURE__*/` annotations.
    pub display_code: String,
}

/// Derives a [`TranspiledArtifact`] from editor text.
#[derive(Debug, Clone, Default)]
pub struct Pipeline<T> {
    transform: T,
}

impl<T: Transform> Pipeline<T> {
    pub const fn new(transform: T) -> Self {
        Self { transform }
    }

    pub const fn transform(&self) -> &T {
        &self.transform
    }

    /// Run one pass over `code`.
    ///
    /// Import statements are lifted out before transpiling and re-attached
    /// unchanged in front of the sandbox code, so the sandbox resolves them
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Transform`] for syntax errors and
    /// [`PipelineError::TranspileFailure`] when nothing was produced.
    pub fn run(&self, code: &str) -> Result<TranspiledArtifact, PipelineError> {
        let _scope = crate::perf::scope("pipeline.run");
        let pattern = import_pattern();
        let body = imports::replace(code, pattern);
        let transpiled = transpile_module(&self.transform, &body)?;

        let sandbox_code = if imports::has_match(code, pattern) {
            format!("{}\n{transpiled}", imports::extract(code, pattern))
        } else {
            transpiled.clone()
        };
        let display_code = imports::replace(&transpiled, pure_pattern());

        debug!(
            input = code.len(),
            sandbox = sandbox_code.len(),
            display = display_code.len(),
            "pipeline pass complete"
        );
        Ok(TranspiledArtifact {
            sandbox_code,
            display_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::transpiler::{BuiltinTransform, TransformOptions, TransformOutput};

    /// Echoes its input, like a transform with nothing to lower.
    struct Echo;

    impl Transform for Echo {
        fn transform(
            &self,
            source: &str,
            _options: &TransformOptions,
        ) -> Result<TransformOutput, TransformError> {
            Ok(TransformOutput {
                code: Some(format!("/*#__PURE__*/{source}")),
            })
        }
    }

    struct Empty;

    impl Transform for Empty {
        fn transform(
            &self,
            _source: &str,
            _options: &TransformOptions,
        ) -> Result<TransformOutput, TransformError> {
            Ok(TransformOutput {
                code: Some(String::new()),
            })
        }
    }

    fn builtin() -> Pipeline<BuiltinTransform> {
        Pipeline::new(BuiltinTransform)
    }

    #[test]
    fn test_import_and_element() {
        let artifact = builtin().run("import x from 'y'\nconst a = <div/>").unwrap();
        assert_eq!(
            artifact.sandbox_code,
            "import x from 'y'\n\"use strict\";\n\nvar a = /*#__PURE__*/React.createElement(\"div\", null);"
        );
        assert_eq!(
            artifact.display_code,
            "\"use strict\";\n\nvar a = React.createElement(\"div\", null);"
        );
    }

    #[test]
    fn test_without_imports_sandbox_code_is_transpiled_exactly() {
        let artifact = Pipeline::new(Echo).run("run()").unwrap();
        assert_eq!(artifact.sandbox_code, "/*#__PURE__*/run()");
        assert_eq!(artifact.display_code, "run()");
    }

    #[test]
    fn test_imports_are_removed_before_transpiling() {
        let artifact = Pipeline::new(Echo)
            .run("import a from 'a'\nimport 'b';\nrun()")
            .unwrap();
        assert_eq!(
            artifact.sandbox_code,
            "import a from 'a'\nimport 'b';\n/*#__PURE__*/\n\nrun()"
        );
    }

    #[test]
    fn test_unmatched_tag_is_a_syntax_error() {
        let err = builtin().run("const a = <div><p></div>").unwrap_err();
        assert!(matches!(err, PipelineError::Transform(_)));
        assert!(err.to_string().contains("<p>"));
    }

    #[test]
    fn test_empty_transform_output_carries_input() {
        let err = Pipeline::new(Empty).run("import a from 'a'\nrun()").unwrap_err();
        assert_eq!(
            err,
            PipelineError::TranspileFailure {
                input: "\nrun()".to_string()
            }
        );
        assert_eq!(err.to_string(), "Something went wrong transpiling run().");
    }

    #[test]
    fn test_empty_editor_is_a_transpile_failure() {
        let err = builtin().run("").unwrap_err();
        assert!(matches!(err, PipelineError::TranspileFailure { .. }));
        assert!(err.to_string().ends_with("<empty input>."));
    }

    #[test]
    fn test_imports_only_is_a_transpile_failure() {
        let err = builtin().run("import React from 'react'\n").unwrap_err();
        assert!(matches!(err, PipelineError::TranspileFailure { .. }));
    }

    #[test]
    fn test_failure_message_truncates_long_input() {
        let input = "x".repeat(500);
        let message = PipelineError::TranspileFailure { input }.to_string();
        assert!(message.ends_with("x...."));
        assert!(message.len() < 260);
    }

    /// Import statements with distinct bindings, so no line is a
    /// substring of another.
    fn import_lines() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            (
                "[a-z][a-z0-9]{0,6}",
                "[a-z][a-z0-9-]{0,10}",
                prop::bool::ANY,
            ),
            1..5,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(idx, (name, module, semi))| {
                    format!(
                        "import {name}_{idx} from '{module}'{}",
                        if semi { ";" } else { "" }
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_imports_lead_sandbox_code_in_order(
            lines in import_lines(),
            value in 0u32..1000,
        ) {
            let code = format!("{}\nconst v = {value};\n", lines.join("\n"));
            let artifact = builtin().run(&code).unwrap();
            let expected_prefix = format!("{}\n", lines.join("\n"));
            prop_assert!(artifact.sandbox_code.starts_with(&expected_prefix));
            for line in &lines {
                prop_assert_eq!(artifact.sandbox_code.matches(line.as_str()).count(), 1);
            }
            let body = &artifact.sandbox_code[expected_prefix.len()..];
            prop_assert!(!body.contains("import "));
            prop_assert!(!artifact.display_code.contains("import "));
        }

        #[test]
        fn prop_run_is_deterministic_and_pure_free(
            tag in "[a-z]{1,8}",
            text in "[A-Za-z ]{0,20}",
        ) {
            let code = format!("const el = <{tag}>{text}</{tag}>;");
            let first = builtin().run(&code).unwrap();
            let second = builtin().run(&code).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.display_code.contains("#__PURE__"));
        }
    }
}
