//! JSX elements to element factory calls.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use super::TransformError;
use super::cursor::{is_ident_char, is_ident_start};
use super::rewrite::Rewriter;

const DEFAULT_FACTORY: &str = "React.createElement";
const DEFAULT_FRAGMENT: &str = "React.Fragment";

/// Element factory and fragment names, overridable per file with
/// `/** @jsx h */` and `/** @jsxFrag Fragment */` comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Pragma {
    pub(super) factory: String,
    pub(super) fragment: String,
}

impl Default for Pragma {
    fn default() -> Self {
        Self {
            factory: DEFAULT_FACTORY.to_string(),
            fragment: DEFAULT_FRAGMENT.to_string(),
        }
    }
}

fn comment_pattern() -> &'static Regex {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    COMMENTS.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern is valid"))
}

fn pragma_pattern() -> &'static Regex {
    static PRAGMA: OnceLock<Regex> = OnceLock::new();
    PRAGMA.get_or_init(|| {
        Regex::new(r"@(jsx|jsxFrag)\s+([\w$.]+)").expect("pragma pattern is valid")
    })
}

impl Pragma {
    pub(super) fn from_source(source: &str) -> Self {
        let mut pragma = Self::default();
        for comment in comment_pattern().find_iter(source) {
            for caps in pragma_pattern().captures_iter(comment.as_str()) {
                let value = caps[2].to_string();
                match &caps[1] {
                    "jsx" => pragma.factory = value,
                    _ => pragma.fragment = value,
                }
            }
        }
        pragma
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Attr {
    Named { name: String, value: String },
    Spread(String),
}

impl Rewriter<'_> {
    /// Parse one element starting at `<` and return the factory call.
    pub(super) fn jsx_element(&mut self) -> Result<String, TransformError> {
        let start = self.cur.pos();
        self.cur.bump();
        self.skip_jsx_space()?;

        if self.cur.eat('>') {
            let children = self.jsx_children(start, None)?;
            let tag = self.pragma.fragment.clone();
            return Ok(self.create_element(&tag, &[], &children));
        }

        let name = self.jsx_name()?;
        let mut attrs = Vec::new();
        loop {
            self.skip_jsx_space()?;
            match self.cur.peek() {
                Some('/') => {
                    self.cur.bump();
                    self.skip_jsx_space()?;
                    if !self.cur.eat('>') {
                        return Err(self.cur.error("Expected `>` after `/` in JSX tag"));
                    }
                    return Ok(self.create_element(&tag_expression(&name), &attrs, &[]));
                }
                Some('>') => {
                    self.cur.bump();
                    let children = self.jsx_children(start, Some(&name))?;
                    return Ok(self.create_element(&tag_expression(&name), &attrs, &children));
                }
                Some('{') => attrs.push(self.jsx_spread()?),
                Some(c) if is_ident_start(c) => attrs.push(self.jsx_attribute()?),
                Some(c) => {
                    return Err(self.cur.error(format!("Unexpected token `{c}` in JSX tag")));
                }
                None => return Err(self.cur.error_at(start, "Unterminated JSX tag")),
            }
        }
    }

    /// Skip whitespace and comments between the parts of a tag.
    fn skip_jsx_space(&mut self) -> Result<(), TransformError> {
        loop {
            self.cur.take_while(char::is_whitespace);
            if self.cur.starts_with("//") {
                self.cur.take_while(|c| c != '\n');
            } else if self.cur.starts_with("/*") {
                let rest = self.cur.rest();
                let Some(len) = rest[2..].find("*/") else {
                    return Err(self.cur.error("Unterminated comment"));
                };
                self.cur.eat_str(&rest[..len + 4]);
            } else {
                return Ok(());
            }
        }
    }

    fn jsx_name(&mut self) -> Result<String, TransformError> {
        let name = self.cur.take_while(is_jsx_name_char);
        if name.is_empty() {
            return Err(self.cur.error("Expected JSX element name"));
        }
        Ok(name.to_string())
    }

    fn jsx_attribute(&mut self) -> Result<Attr, TransformError> {
        let name = self
            .cur
            .take_while(|c| is_ident_char(c) || c == '-' || c == ':')
            .to_string();
        self.skip_jsx_space()?;
        if !self.cur.eat('=') {
            return Ok(Attr::Named {
                name,
                value: "true".to_string(),
            });
        }
        self.skip_jsx_space()?;

        let value = match self.cur.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.cur.pos();
                self.cur.bump();
                let text = self.cur.take_while(|c| c != quote);
                if !self.cur.eat(quote) {
                    return Err(self.cur.error_at(start, "Unterminated string constant"));
                }
                js_string(&decode_entities(text))
            }
            Some('{') => {
                let start = self.cur.pos();
                self.cur.bump();
                let expr = self.hole()?;
                if is_blank(&expr) {
                    return Err(self.cur.error_at(
                        start,
                        "JSX attributes must only be assigned a non-empty expression",
                    ));
                }
                expression_text(&expr)
            }
            Some('<') => self.jsx_element()?,
            _ => {
                return Err(self
                    .cur
                    .error("JSX value should be either an expression or a quoted JSX text"));
            }
        };
        Ok(Attr::Named { name, value })
    }

    fn jsx_spread(&mut self) -> Result<Attr, TransformError> {
        let start = self.cur.pos();
        self.cur.bump();
        self.skip_jsx_space()?;
        if !self.cur.eat_str("...") {
            return Err(self.cur.error("Expected `...` in JSX spread attribute"));
        }
        let expr = self.hole()?;
        if is_blank(&expr) {
            return Err(self.cur.error_at(start, "Expected an expression after `...`"));
        }
        Ok(Attr::Spread(expression_text(&expr)))
    }

    /// Parse children up to the closing tag for `name` (`None` for a fragment).
    fn jsx_children(
        &mut self,
        start: usize,
        name: Option<&str>,
    ) -> Result<Vec<String>, TransformError> {
        let mut children = Vec::new();
        let mut text_start = self.cur.pos();
        loop {
            match self.cur.peek() {
                None => return Err(self.cur.error_at(start, "Unterminated JSX contents")),
                Some('<') => {
                    push_text(&mut children, self.cur.slice(text_start, self.cur.pos()));
                    if self.cur.starts_with("</") {
                        self.jsx_closing_tag(name)?;
                        return Ok(children);
                    }
                    let element = self.jsx_element()?;
                    children.push(element);
                    text_start = self.cur.pos();
                }
                Some('{') => {
                    push_text(&mut children, self.cur.slice(text_start, self.cur.pos()));
                    self.cur.bump();
                    let expr = self.hole()?;
                    if !is_blank(&expr) {
                        children.push(expression_text(&expr));
                    }
                    text_start = self.cur.pos();
                }
                Some(_) => {
                    self.cur.bump();
                }
            }
        }
    }

    fn jsx_closing_tag(&mut self, name: Option<&str>) -> Result<(), TransformError> {
        let at = self.cur.pos();
        self.cur.eat_str("</");
        self.skip_jsx_space()?;
        let closing = self.cur.take_while(is_jsx_name_char);
        self.skip_jsx_space()?;
        let expected = name.unwrap_or("");
        if closing != expected {
            let message = match name {
                Some(name) => format!("Expected corresponding JSX closing tag for <{name}>"),
                None => "Expected corresponding closing tag for JSX fragment".to_string(),
            };
            return Err(self.cur.error_at(at, message));
        }
        if !self.cur.eat('>') {
            return Err(self.cur.error("Expected `>` to end JSX closing tag"));
        }
        Ok(())
    }

    fn create_element(&self, tag: &str, attrs: &[Attr], children: &[String]) -> String {
        let mut out = format!(
            "/*#__PURE__*/{}({tag}, {}",
            self.pragma.factory,
            props_expression(attrs)
        );
        for child in children {
            out.push_str(", ");
            out.push_str(child);
        }
        out.push(')');
        out
    }
}

fn is_jsx_name_char(ch: char) -> bool {
    is_ident_char(ch) || matches!(ch, '-' | ':' | '.')
}

/// Intrinsic tags become string literals, components stay references.
fn tag_expression(name: &str) -> String {
    let intrinsic = name.contains(['-', ':'])
        || (!name.contains('.') && name.chars().next().is_some_and(char::is_lowercase));
    if intrinsic {
        js_string(name)
    } else {
        name.to_string()
    }
}

fn props_expression(attrs: &[Attr]) -> String {
    if attrs.is_empty() {
        return "null".to_string();
    }
    let mut segments = Vec::new();
    let mut props = Vec::new();
    for attr in attrs {
        match attr {
            Attr::Named { name, value } => props.push(format!("{}: {value}", prop_key(name))),
            Attr::Spread(expr) => {
                if !props.is_empty() {
                    segments.push(object_literal(&props));
                    props.clear();
                }
                segments.push(expr.clone());
            }
        }
    }
    if !props.is_empty() {
        segments.push(object_literal(&props));
    }
    if attrs.iter().any(|a| matches!(a, Attr::Spread(_))) {
        format!("Object.assign({{}}, {})", segments.join(", "))
    } else {
        segments.concat()
    }
}

fn object_literal(props: &[String]) -> String {
    format!("{{ {} }}", props.join(", "))
}

fn prop_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char);
    if valid {
        name.to_string()
    } else {
        js_string(name)
    }
}

fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Trim an embedded expression, keeping a trailing line comment terminated.
fn expression_text(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.lines().last().is_some_and(|line| line.contains("//")) {
        format!("{trimmed}\n")
    } else {
        trimmed.to_string()
    }
}

/// Empty or comment-only expression containers contribute nothing.
fn is_blank(expr: &str) -> bool {
    let mut rest = expr.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(end) => rest = after[end + 2..].trim_start(),
                None => return false,
            }
        } else if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end + 1..]).trim_start();
        } else {
            return rest.is_empty();
        }
    }
}

fn push_text(children: &mut Vec<String>, raw: &str) {
    let cleaned = clean_text(&decode_entities(raw));
    if !cleaned.is_empty() {
        children.push(js_string(&cleaned));
    }
}

/// Collapse JSX text the way React expects: lines are trimmed of
/// surrounding spaces and tabs (except the outer edges of the first and
/// last line), blank lines vanish, and the rest join with a single space.
fn clean_text(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).replace('\t', " "))
        .collect();
    let last_non_empty = lines.iter().rposition(|line| line.contains(|c| c != ' '));
    let last = lines.len().saturating_sub(1);

    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let mut piece = line.as_str();
        if idx != 0 {
            piece = piece.trim_start_matches(' ');
        }
        if idx != last {
            piece = piece.trim_end_matches(' ');
        }
        if piece.is_empty() {
            continue;
        }
        out.push_str(piece);
        if Some(idx) != last_non_empty {
            out.push(' ');
        }
    }
    out
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail[1..]
            .find(';')
            .map(|semi| semi + 1)
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&tail[1..semi]).map(|ch| (ch, semi)));
        if let Some((ch, semi)) = decoded {
            out.push(ch);
            rest = &tail[semi + 1..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn entity(name: &str) -> Option<char> {
    let named = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "times" => '\u{d7}',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()
            } else {
                name.strip_prefix('#').and_then(|dec| dec.parse().ok())
            };
            return code.and_then(char::from_u32);
        }
    };
    Some(named)
}
