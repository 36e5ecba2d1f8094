//! Import statement extraction and marker stripping.
//!
//! Both operations are plain text transforms driven by a pattern: the
//! sandbox resolves imports on its own, so they are lifted out before
//! transpiling and re-attached verbatim afterwards.

use std::sync::OnceLock;

use regex::Regex;

/// Matches one `import` statement.
///
/// Covers default, named, namespace and side-effect imports. Named import
/// braces may span several lines. Dynamic `import(...)`, `import.meta` and
/// identifiers that merely start with `import` are left alone.
pub fn import_pattern() -> &'static Regex {
    static IMPORTS: OnceLock<Regex> = OnceLock::new();
    IMPORTS.get_or_init(|| {
        Regex::new(
            r#"(?m)^[ \t]*import(?:\s*[{*][^;'"]*?\bfrom\s*|\s+[\w$][^;'"]*?\bfrom\s*|\s*)['"][^'"\n]*['"][ \t]*;?"#,
        )
        .expect("import pattern is valid")
    })
}

/// Matches the `/*#__PURE__*/` annotations the transform puts in front of
/// element factory calls.
pub fn pure_pattern() -> &'static Regex {
    static PURE: OnceLock<Regex> = OnceLock::new();
    PURE.get_or_init(|| Regex::new(r"/\*\s*#__PURE__\s*\*/").expect("pure pattern is valid"))
}

/// Collect every match of `pattern`, verbatim and in order, as one block.
///
/// Returns an empty string when nothing matches.
pub fn extract(source: &str, pattern: &Regex) -> String {
    pattern
        .find_iter(source)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Delete every match of `pattern`, leaving all other text untouched.
pub fn replace(source: &str, pattern: &Regex) -> String {
    pattern.replace_all(source, "").into_owned()
}

pub fn has_match(source: &str, pattern: &Regex) -> bool {
    pattern.is_match(source)
}
