//! Single-pass source rewriter.
//!
//! The rewriter walks the source once, copying it to the output and
//! lowering the constructs the enabled presets cover. Brackets are handled
//! by recursion so every nesting level knows which closer ends it; JSX
//! elements are parsed by the methods in `jsx.rs` and spliced back in.
//!
//! Lowering never changes what a program does. `let` and `const` become
//! `var` only where the binding is already function-scoped, and arrows keep
//! their lexical `this` through `.bind(this)`. Arrows that read `arguments`,
//! `super` or `new.target` are left as arrows.

use std::mem;
use std::sync::OnceLock;

use regex::Regex;

use super::TransformError;
use super::cursor::{Cursor, is_ident_char, is_ident_start};
use super::jsx::Pragma;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Lowering {
    pub(super) es2015: bool,
    pub(super) jsx: bool,
}

/// Keywords after which an operand (and so a regex, template or JSX
/// element) begins.
const OPERAND_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "default",
    "extends",
];

/// Operand keywords whose operand may be a bare `a + b`.
const SUM_KEYWORDS: &[&str] = &[
    "return",
    "throw",
    "case",
    "yield",
    "else",
    "do",
    "default",
    "in",
    "of",
    "instanceof",
];

/// Characters that continue an expression onto the next line.
const CONTINUATION: &[char] = &[
    '.', '?', ':', '+', '-', '*', '/', '%', '&', '|', '^', '=', ',', '<', '>', '(', '[', '`', ')',
    ']', '}', ';',
];

/// Bytes of output searched backwards for a `function` or `class` head.
const HEAD_WINDOW: usize = 256;

/// The last significant token written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Keyword(&'static str),
    /// Identifier starting at this output offset.
    Ident { start: usize },
    /// Parenthesised group whose `(` sits at this output offset.
    /// `callable` when it is the parameter list of a `function`.
    Group { open: usize, callable: bool },
    /// Literal, `]`, element or any other finished operand.
    Value,
    Punct(char),
}

impl Prev {
    const fn expects_operand(self) -> bool {
        matches!(self, Self::Start | Self::Keyword(_) | Self::Punct(_))
    }

    const fn ends_operand(self) -> bool {
        matches!(
            self,
            Self::Ident { .. } | Self::Group { .. } | Self::Value | Self::Punct('}')
        )
    }

    /// Whether `a + b` can be written here without parentheses.
    fn accepts_sum(self) -> bool {
        match self {
            Self::Start => true,
            Self::Keyword(keyword) => SUM_KEYWORDS.contains(&keyword),
            Self::Punct(c) => matches!(
                c,
                '=' | '(' | ',' | '[' | '{' | ';' | ':' | '?' | '}' | '|' | '&' | '>' | '<'
            ),
            _ => false,
        }
    }
}

/// What the innermost open bracket holds, as far as declarations care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Program or function body: `let` and `const` are function-scoped here.
    Function,
    ClassBody,
    /// Blocks, parentheses, brackets and object literals.
    Nested,
}

/// Bindings an arrow body reads from its enclosing function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LexicalRefs {
    this: bool,
    /// `arguments`, `super` or `new.target`, which `.bind` cannot carry.
    unbindable: bool,
}

impl LexicalRefs {
    const fn absorb(&mut self, inner: Self) {
        self.this |= inner.this;
        self.unbindable |= inner.unbindable;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Eof,
    /// Matching closer, consumed and written.
    Close(char),
    /// `}` ending an embedded expression, consumed but not written.
    Hole,
    /// End of a concise arrow body; the terminator stays in the input.
    ArrowBody,
}

enum TemplatePart {
    Text(String),
    Expr(String),
}

pub(super) struct Rewriter<'a> {
    pub(super) cur: Cursor<'a>,
    pub(super) out: String,
    pub(super) pragma: Pragma,
    lowering: Lowering,
    prev: Prev,
    /// Output offset just past the last significant token.
    token_end: usize,
    level: Level,
    refs: LexicalRefs,
}

fn function_head_pattern() -> &'static Regex {
    static FUNCTION_HEAD: OnceLock<Regex> = OnceLock::new();
    FUNCTION_HEAD.get_or_init(|| {
        Regex::new(r"(?:^|[^\w$.])function(?:\s*\*\s*(?:[\w$]+\s*)?|\s+[\w$]+\s*|\s*)$")
            .expect("function head pattern is valid")
    })
}

fn class_head_pattern() -> &'static Regex {
    static CLASS_HEAD: OnceLock<Regex> = OnceLock::new();
    CLASS_HEAD.get_or_init(|| {
        Regex::new(r"(?:^|[^\w$.])class(?:\s+[\w$]+)?(?:\s+extends\s+[\w$.]+)?\s*$")
            .expect("class head pattern is valid")
    })
}

/// The last few hundred bytes of `out`, cut on a character boundary.
fn tail(out: &str) -> &str {
    let mut start = out.len().saturating_sub(HEAD_WINDOW);
    while !out.is_char_boundary(start) {
        start += 1;
    }
    &out[start..]
}

/// Rewrite `source` under `lowering`.
pub(super) fn rewrite(source: &str, lowering: Lowering) -> Result<String, TransformError> {
    let mut rewriter = Rewriter {
        cur: Cursor::new(source),
        out: String::with_capacity(source.len() + source.len() / 2),
        pragma: Pragma::from_source(source),
        lowering,
        prev: Prev::Start,
        token_end: 0,
        level: Level::Function,
        refs: LexicalRefs::default(),
    };
    rewriter.run(Stop::Eof)?;
    Ok(rewriter.out)
}

impl Rewriter<'_> {
    fn run(&mut self, stop: Stop) -> Result<(), TransformError> {
        let mut started = false;
        // `?` seen at this level still waiting for its `:`.
        let mut open_ternaries = 0usize;
        loop {
            let Some(ch) = self.cur.peek() else {
                return match stop {
                    Stop::Eof | Stop::ArrowBody => Ok(()),
                    Stop::Close(close) => Err(self
                        .cur
                        .error(format!("Unexpected end of input, expected `{close}`"))),
                    Stop::Hole => Err(self.cur.error("Unexpected end of input, expected `}`")),
                };
            };

            if ch.is_whitespace() {
                if ch == '\n' && stop == Stop::ArrowBody && started && self.ends_statement() {
                    return Ok(());
                }
                self.cur.bump();
                self.out.push(ch);
                continue;
            }

            match ch {
                '/' if self.cur.starts_with("//") => {
                    self.line_comment();
                    continue;
                }
                '/' if self.cur.starts_with("/*") => {
                    self.block_comment()?;
                    continue;
                }
                '\'' | '"' => self.string_literal(ch)?,
                '`' => self.template()?,
                '/' if self.prev.expects_operand() => self.regex_literal()?,
                '<' if self.lowering.jsx && self.prev.expects_operand() && self.jsx_ahead() => {
                    let element = self.jsx_element()?;
                    self.out.push_str(&element);
                    self.finish(Prev::Value);
                }
                '(' | '[' | '{' => self.group(ch)?,
                ')' | ']' | '}' => match stop {
                    Stop::Close(close) if close == ch => {
                        self.cur.bump();
                        self.out.push(ch);
                        return Ok(());
                    }
                    Stop::Hole if ch == '}' => {
                        self.cur.bump();
                        return Ok(());
                    }
                    Stop::ArrowBody => return Ok(()),
                    _ => return Err(self.cur.error(format!("Unexpected token `{ch}`"))),
                },
                ',' | ';' if stop == Stop::ArrowBody => return Ok(()),
                ':' if stop == Stop::ArrowBody && open_ternaries == 0 => return Ok(()),
                ':' => {
                    open_ternaries = open_ternaries.saturating_sub(1);
                    self.punct(":");
                }
                '?' if self.cur.starts_with("??") => self.punct("??"),
                '?' if self.cur.starts_with("?.")
                    && !self.cur.peek_nth(2).is_some_and(|c| c.is_ascii_digit()) =>
                {
                    self.punct("?.");
                }
                '?' => {
                    open_ternaries += 1;
                    self.punct("?");
                }
                '+' | '-' if self.cur.peek_nth(1) == Some(ch) => self.update_operator(ch),
                '=' if self.cur.starts_with("=>") => self.arrow()?,
                '.' if self.cur.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                c if c.is_ascii_digit() => self.number(),
                c if is_ident_start(c) => self.word(),
                _ => {
                    self.cur.bump();
                    self.out.push(ch);
                    self.finish(Prev::Punct(ch));
                }
            }
            started = true;
        }
    }

    fn finish(&mut self, prev: Prev) {
        self.prev = prev;
        self.token_end = self.out.len();
    }

    /// Copy the punctuator `text`; the token takes its last character.
    fn punct(&mut self, text: &str) {
        self.cur.eat_str(text);
        self.out.push_str(text);
        if let Some(last) = text.chars().last() {
            self.finish(Prev::Punct(last));
        }
    }

    /// `++` or `--`: postfix when it follows an operand, and then it ends one.
    fn update_operator(&mut self, ch: char) {
        let postfix = self.prev.ends_operand();
        self.cur.bump();
        self.cur.bump();
        self.out.push(ch);
        self.out.push(ch);
        self.finish(if postfix { Prev::Value } else { Prev::Punct(ch) });
    }

    /// Run `body` against a fresh output buffer and return what it wrote.
    fn capture(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), TransformError>,
    ) -> Result<String, TransformError> {
        let saved_out = mem::take(&mut self.out);
        let saved_prev = self.prev;
        let saved_end = self.token_end;
        self.token_end = 0;
        let result = body(self);
        let captured = mem::replace(&mut self.out, saved_out);
        self.prev = saved_prev;
        self.token_end = saved_end;
        result.map(|()| captured)
    }

    /// Rewrite an embedded expression up to its closing `}`, which must
    /// already be open. Returns the rewritten expression text.
    pub(super) fn hole(&mut self) -> Result<String, TransformError> {
        self.capture(|rw| {
            rw.prev = Prev::Punct('{');
            rw.run(Stop::Hole)
        })
    }

    /// Whether a newline here ends a concise arrow body.
    fn ends_statement(&self) -> bool {
        let next = self.cur.rest().trim_start();
        self.prev.ends_operand()
            && (next.starts_with("++") || next.starts_with("--") || !next.starts_with(CONTINUATION))
    }

    fn jsx_ahead(&self) -> bool {
        self.cur
            .peek_nth(1)
            .is_some_and(|c| c == '>' || is_ident_start(c))
    }

    fn group(&mut self, open: char) -> Result<(), TransformError> {
        let level = match open {
            '{' => self.brace_level(),
            _ => Level::Nested,
        };
        self.group_as(open, level)
    }

    /// Classify a `{` by what precedes it. Anything unrecognised is
    /// `Nested`, which keeps block-scoped declarations as written.
    fn brace_level(&self) -> Level {
        match self.prev {
            Prev::Group { callable: true, .. } => Level::Function,
            Prev::Group { .. } if self.level == Level::ClassBody => Level::Function,
            Prev::Start | Prev::Keyword(_) | Prev::Punct(_) => Level::Nested,
            _ if class_head_pattern().is_match(tail(&self.out)) => Level::ClassBody,
            _ => Level::Nested,
        }
    }

    fn group_as(&mut self, open: char, level: Level) -> Result<(), TransformError> {
        let close = match open {
            '(' => ')',
            '[' => ']',
            _ => '}',
        };
        let open_at = self.out.len();
        let callable = open == '(' && function_head_pattern().is_match(tail(&self.out));
        self.cur.bump();
        self.out.push(open);
        self.prev = Prev::Punct(open);
        let outer = mem::replace(&mut self.level, level);
        let result = self.run(Stop::Close(close));
        self.level = outer;
        result?;
        self.finish(match open {
            '(' => Prev::Group {
                open: open_at,
                callable,
            },
            '[' => Prev::Value,
            _ => Prev::Punct('}'),
        });
        Ok(())
    }

    fn line_comment(&mut self) {
        let text = self.cur.take_while(|c| c != '\n');
        self.out.push_str(text);
    }

    fn block_comment(&mut self) -> Result<(), TransformError> {
        let start = self.cur.pos();
        let Some(len) = self.cur.rest()[2..].find("*/") else {
            return Err(self.cur.error("Unterminated comment"));
        };
        let end = start + 2 + len + 2;
        while self.cur.pos() < end {
            self.cur.bump();
        }
        self.out.push_str(self.cur.slice(start, end));
        Ok(())
    }

    fn string_literal(&mut self, quote: char) -> Result<(), TransformError> {
        let start = self.cur.pos();
        self.cur.bump();
        loop {
            match self.cur.bump() {
                None | Some('\n') => {
                    return Err(self.cur.error_at(start, "Unterminated string constant"));
                }
                Some('\\') => {
                    self.cur.bump();
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        self.out.push_str(self.cur.slice(start, self.cur.pos()));
        self.finish(Prev::Value);
        Ok(())
    }

    fn regex_literal(&mut self) -> Result<(), TransformError> {
        let start = self.cur.pos();
        self.cur.bump();
        let mut in_class = false;
        loop {
            match self.cur.bump() {
                None | Some('\n') => {
                    return Err(self.cur.error_at(start, "Unterminated regular expression"));
                }
                Some('\\') => {
                    self.cur.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        self.cur.take_while(is_ident_char);
        self.out.push_str(self.cur.slice(start, self.cur.pos()));
        self.finish(Prev::Value);
        Ok(())
    }

    fn number(&mut self) {
        let start = self.cur.pos();
        self.cur
            .take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
        let text = self.cur.slice(start, self.cur.pos());
        let hex = text.len() > 1 && text[..2].eq_ignore_ascii_case("0x");
        if !hex
            && (text.ends_with('e') || text.ends_with('E'))
            && matches!(self.cur.peek(), Some('+' | '-'))
        {
            self.cur.bump();
            self.cur.take_while(|c| c.is_ascii_digit() || c == '_');
        }
        self.out.push_str(self.cur.slice(start, self.cur.pos()));
        self.finish(Prev::Value);
    }

    fn word(&mut self) {
        let start = self.out.len();
        let word = self.cur.take_while(is_ident_char);
        let member = self.prev == Prev::Punct('.');
        let declaration = self.lowering.es2015
            && !member
            && self.level == Level::Function
            && matches!(word, "const" | "let")
            && self.binding_ahead();
        self.out.push_str(if declaration { "var" } else { word });

        if !member {
            match word {
                "this" => self.refs.this = true,
                "arguments" | "super" => self.refs.unbindable = true,
                "new" if self.cur.starts_with(".target") => self.refs.unbindable = true,
                _ => {}
            }
        }

        match OPERAND_KEYWORDS.iter().copied().find(|&k| k == word) {
            Some(keyword) if !member => self.finish(Prev::Keyword(keyword)),
            _ => self.finish(Prev::Ident { start }),
        }
    }

    fn binding_ahead(&self) -> bool {
        self.cur.peek().is_some_and(char::is_whitespace)
            && self
                .cur
                .peek_past_whitespace()
                .is_some_and(|c| is_ident_start(c) || c == '{' || c == '[')
    }

    fn arrow(&mut self) -> Result<(), TransformError> {
        let at = self.cur.pos();
        self.cur.eat_str("=>");
        if !self.lowering.es2015 {
            self.out.push_str("=>");
            self.finish(Prev::Punct('>'));
            return Ok(());
        }

        let head = match self.prev {
            Prev::Group { open, .. } => open..open,
            Prev::Ident { start } => start..self.token_end,
            _ => return Err(self.cur.error_at(at, "Unexpected token `=>`")),
        };
        let gap = self.cur.take_while(char::is_whitespace);
        let block = self.cur.peek() == Some('{');

        let outer_refs = mem::take(&mut self.refs);
        let mut body_end = 0;
        let body = self.capture(|rw| {
            if block {
                rw.group_as('{', Level::Function)?;
            } else {
                rw.prev = Prev::Keyword("return");
                rw.run(Stop::ArrowBody)?;
            }
            body_end = rw.token_end;
            Ok(())
        });
        let inner = mem::replace(&mut self.refs, outer_refs);
        self.refs.absorb(inner);
        let body = body?;
        let (body, trailing) = body.split_at(body_end);

        if inner.unbindable {
            self.out.push_str("=>");
            self.out.push_str(gap);
            self.out.push_str(body);
        } else {
            if head.is_empty() {
                self.out.insert_str(head.start, "function ");
            } else {
                let param = self.out[head.clone()].to_string();
                self.out.replace_range(head, &format!("function ({param})"));
            }
            if !self.out.ends_with(char::is_whitespace) {
                self.out.push(' ');
            }
            if block {
                self.out.push_str(body);
            } else {
                self.out.push_str("{ return ");
                self.out.push_str(body);
                self.out.push_str("; }");
            }
            if inner.this {
                self.out.push_str(".bind(this)");
            }
        }
        self.finish(Prev::Value);
        self.out.push_str(trailing);
        Ok(())
    }

    fn template(&mut self) -> Result<(), TransformError> {
        let tagged = matches!(
            self.prev,
            Prev::Ident { .. } | Prev::Group { .. } | Prev::Value
        );
        if self.lowering.es2015 && !tagged {
            self.concat_template()
        } else {
            self.verbatim_template()
        }
    }

    fn verbatim_template(&mut self) -> Result<(), TransformError> {
        let start = self.cur.pos();
        self.cur.bump();
        self.out.push('`');
        loop {
            let Some(ch) = self.cur.bump() else {
                return Err(self.cur.error_at(start, "Unterminated template"));
            };
            match ch {
                '\\' => {
                    self.out.push('\\');
                    if let Some(next) = self.cur.bump() {
                        self.out.push(next);
                    }
                }
                '`' => {
                    self.out.push('`');
                    break;
                }
                '$' if self.cur.eat('{') => {
                    self.out.push_str("${");
                    self.prev = Prev::Punct('{');
                    self.run(Stop::Close('}'))?;
                }
                c => self.out.push(c),
            }
        }
        self.finish(Prev::Value);
        Ok(())
    }

    /// Lower an untagged template literal to string concatenation.
    fn concat_template(&mut self) -> Result<(), TransformError> {
        let start = self.cur.pos();
        let context = self.prev;
        self.cur.bump();
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            let Some(ch) = self.cur.bump() else {
                return Err(self.cur.error_at(start, "Unterminated template"));
            };
            match ch {
                '\\' => match self.cur.bump() {
                    Some('`') => text.push('`'),
                    Some('$') => text.push('$'),
                    Some('\n') => {}
                    Some('\r') => {
                        self.cur.eat('\n');
                    }
                    Some(next) => {
                        text.push('\\');
                        text.push(next);
                    }
                    None => return Err(self.cur.error_at(start, "Unterminated template")),
                },
                '`' => break,
                '$' if self.cur.eat('{') => {
                    parts.push(TemplatePart::Text(mem::take(&mut text)));
                    let expr = self.hole()?;
                    parts.push(TemplatePart::Expr(expr.trim().to_string()));
                }
                '"' => text.push_str("\\\""),
                '\n' => text.push_str("\\n"),
                '\r' => {
                    self.cur.eat('\n');
                    text.push_str("\\n");
                }
                c => text.push(c),
            }
        }
        parts.push(TemplatePart::Text(text));

        let has_expr = parts.len() > 1;
        let member_follows = self
            .cur
            .peek_past_whitespace()
            .is_some_and(|c| matches!(c, '.' | '[' | '('));
        let wrap = has_expr && (!context.accepts_sum() || member_follows);
        let joined = join_template(parts);
        if wrap {
            self.out.push('(');
            self.out.push_str(&joined);
            self.out.push(')');
        } else {
            self.out.push_str(&joined);
        }
        self.finish(Prev::Value);
        Ok(())
    }
}

fn join_template(parts: Vec<TemplatePart>) -> String {
    let mut out = String::new();
    for (idx, part) in parts.into_iter().enumerate() {
        match part {
            TemplatePart::Text(text) if idx == 0 => {
                out.push('"');
                out.push_str(&text);
                out.push('"');
            }
            TemplatePart::Text(text) if text.is_empty() => {}
            TemplatePart::Text(text) => {
                out.push_str(" + \"");
                out.push_str(&text);
                out.push('"');
            }
            TemplatePart::Expr(expr) => {
                out.push_str(" + ");
                if is_simple_operand(&expr) {
                    out.push_str(&expr);
                } else {
                    out.push('(');
                    out.push_str(&expr);
                    out.push(')');
                }
            }
        }
    }
    out
}

fn is_simple_operand(expr: &str) -> bool {
    !expr.is_empty() && expr.chars().all(|c| is_ident_char(c) || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ES2015: Lowering = Lowering {
        es2015: true,
        jsx: false,
    };
    const BOTH: Lowering = Lowering {
        es2015: true,
        jsx: true,
    };

    fn es(src: &str) -> String {
        rewrite(src, ES2015).unwrap()
    }

    #[test]
    fn test_block_scoped_declarations_become_var() {
        assert_eq!(es("let a = 1; const b = 2;"), "var a = 1; var b = 2;");
        assert_eq!(es("const { x } = o"), "var { x } = o");
    }

    #[test]
    fn test_const_as_property_is_untouched() {
        assert_eq!(es("obj.const = 1; obj.let"), "obj.const = 1; obj.let");
    }

    #[test]
    fn test_parenthesised_arrow_with_concise_body() {
        assert_eq!(
            es("useEffect(() => confetti(), [])"),
            "useEffect(function () { return confetti(); }, [])"
        );
    }

    #[test]
    fn test_single_param_arrow() {
        assert_eq!(es("xs.map(x => x * 2)"), "xs.map(function (x) { return x * 2; })");
    }

    #[test]
    fn test_arrow_with_block_body() {
        assert_eq!(
            es("const f = (a, b) => {\n  return a + b\n}"),
            "var f = function (a, b) {\n  return a + b\n}"
        );
    }

    #[test]
    fn test_concise_body_ends_at_newline() {
        assert_eq!(
            es("const f = x => x + 1\nf(2)"),
            "var f = function (x) { return x + 1; }\nf(2)"
        );
    }

    #[test]
    fn test_concise_body_continues_on_operator_line() {
        assert_eq!(
            es("const f = x => x\n  .trim()\nf(a)"),
            "var f = function (x) { return x\n  .trim(); }\nf(a)"
        );
    }

    #[test]
    fn test_concise_body_terminator_skips_trailing_comment() {
        assert_eq!(
            es("const f = () => 1 // one\nf()"),
            "var f = function () { return 1; } // one\nf()"
        );
    }

    #[test]
    fn test_nested_arrows() {
        assert_eq!(
            es("const add = a => b => a + b"),
            "var add = function (a) { return function (b) { return a + b; }; }"
        );
    }

    #[test]
    fn test_template_literal_becomes_concatenation() {
        assert_eq!(es("const s = `a${b}c`"), "var s = \"a\" + b + \"c\"");
        assert_eq!(es("f(`${x.y}`)"), "f(\"\" + x.y)");
        assert_eq!(es("const s = `n=${n + 1}`"), "var s = \"n=\" + (n + 1)");
    }

    #[test]
    fn test_template_without_expressions_and_quotes() {
        assert_eq!(es("`say \"hi\"`"), "\"say \\\"hi\\\"\"");
        assert_eq!(es("`a\nb`"), "\"a\\nb\"");
    }

    #[test]
    fn test_template_followed_by_member_is_wrapped() {
        assert_eq!(es("`${a}b`.length"), "(\"\" + a + \"b\").length");
    }

    #[test]
    fn test_tagged_template_is_verbatim() {
        assert_eq!(es("css`color: ${c};`"), "css`color: ${c};`");
    }

    #[test]
    fn test_strings_comments_and_regex_are_verbatim() {
        let src = "const s = 'let => `x`' // const =>\n/* let */ var r = /=>[`]/g;";
        assert_eq!(
            es(src),
            "var s = 'let => `x`' // const =>\n/* let */ var r = /=>[`]/g;"
        );
    }

    #[test]
    fn test_division_is_not_a_regex() {
        assert_eq!(es("const a = b / c / d"), "var a = b / c / d");
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = rewrite("let a = 1\nlet b = 'oops", ES2015).unwrap_err();
        assert_eq!(
            err,
            TransformError::Syntax {
                message: "Unterminated string constant".to_string(),
                line: 2,
                column: 9,
            }
        );
    }

    #[test]
    fn test_unbalanced_brackets_are_errors() {
        assert!(rewrite("f(1", ES2015).is_err());
        assert!(rewrite("f(1))", ES2015).is_err());
        assert!(rewrite("{ a: [1, 2 }", ES2015).is_err());
    }

    #[test]
    fn test_jsx_inside_arrow_body() {
        assert_eq!(
            rewrite("items.map(i => <li>{i}</li>)", BOTH).unwrap(),
            "items.map(function (i) { return /*#__PURE__*/React.createElement(\"li\", null, i); })"
        );
    }

    #[test]
    fn test_comparison_is_not_jsx() {
        assert_eq!(
            rewrite("for (let i=0;i<n;i++) {}", BOTH).unwrap(),
            "for (let i=0;i<n;i++) {}"
        );
    }

    #[test]
    fn test_declarations_in_function_bodies_become_var() {
        assert_eq!(
            es("function f(a) {\n  const b = a;\n  return b;\n}"),
            "function f(a) {\n  var b = a;\n  return b;\n}"
        );
        assert_eq!(
            es("const g = () => {\n  let n = 0;\n  return n;\n}"),
            "var g = function () {\n  var n = 0;\n  return n;\n}"
        );
        assert_eq!(
            es("class C {\n  m() {\n    const v = 1;\n    return v;\n  }\n}"),
            "class C {\n  m() {\n    var v = 1;\n    return v;\n  }\n}"
        );
    }

    #[test]
    fn test_shadowing_block_declaration_keeps_its_scope() {
        assert_eq!(
            es("let x = 1;\n{ let x = 2; }\nconsole.log(x)"),
            "var x = 1;\n{ let x = 2; }\nconsole.log(x)"
        );
        assert_eq!(
            es("function f(a) {\n  if (a) { const c = a; }\n}"),
            "function f(a) {\n  if (a) { const c = a; }\n}"
        );
    }

    #[test]
    fn test_loop_binding_captured_by_closure_keeps_let() {
        assert_eq!(
            es("for (let i = 0; i < 3; i++) { fns.push(() => i); }"),
            "for (let i = 0; i < 3; i++) { fns.push(function () { return i; }); }"
        );
    }

    #[test]
    fn test_block_after_call_on_next_line_is_not_a_function_body() {
        assert_eq!(es("f()\n{ let y = 1; }"), "f()\n{ let y = 1; }");
        assert_eq!(es("function_like()\n{ let y = 1; }"), "function_like()\n{ let y = 1; }");
    }

    #[test]
    fn test_arrow_reading_this_is_bound() {
        let src = "class A extends React.Component {\n  handle = () => this.setState({ n: 1 })\n  render() {\n    return <button onClick={() => this.handle()} />;\n  }\n}";
        let out = rewrite(src, BOTH).unwrap();
        assert!(out.contains(
            "  handle = function () { return this.setState({ n: 1 }); }.bind(this)\n"
        ));
        assert!(out.contains(
            "{ onClick: function () { return this.handle(); }.bind(this) }"
        ));
    }

    #[test]
    fn test_this_in_nested_arrow_binds_both_levels() {
        assert_eq!(
            es("const f = () => () => this.x"),
            "var f = function () { return function () { return this.x; }.bind(this); }.bind(this)"
        );
    }

    #[test]
    fn test_arrow_without_this_is_not_bound() {
        assert!(!es("xs.map(x => x.id)").contains("bind"));
    }

    #[test]
    fn test_arrow_reading_arguments_stays_an_arrow() {
        assert_eq!(
            es("function f() { return () => arguments[0]; }"),
            "function f() { return () => arguments[0]; }"
        );
        assert_eq!(
            es("const outer = () => { return () => arguments[0]; }"),
            "var outer = () => { return () => arguments[0]; }"
        );
    }

    #[test]
    fn test_arrow_reading_super_stays_an_arrow() {
        assert_eq!(
            es("class B extends A {\n  m() { return () => super.m(); }\n}"),
            "class B extends A {\n  m() { return () => super.m(); }\n}"
        );
    }

    #[test]
    fn test_postfix_update_ends_concise_body() {
        assert_eq!(
            es("const inc = () => count++\nrender()"),
            "var inc = function () { return count++; }\nrender()"
        );
        assert_eq!(
            es("const dec = () => n\n--m"),
            "var dec = function () { return n; }\n--m"
        );
    }

    #[test]
    fn test_arrow_in_ternary_branch_stops_at_colon() {
        assert_eq!(
            es("const f = ok ? x => 1 : y"),
            "var f = ok ? function (x) { return 1; } : y"
        );
        assert_eq!(
            es("const g = ok ? x => x ? 1 : 2 : z"),
            "var g = ok ? function (x) { return x ? 1 : 2; } : z"
        );
    }

    #[test]
    fn test_optional_chaining_and_nullish_are_not_ternaries() {
        assert_eq!(
            es("const f = ok ? x => x?.y ?? 0 : z"),
            "var f = ok ? function (x) { return x?.y ?? 0; } : z"
        );
    }

    #[test]
    fn test_template_after_unary_keyword_is_wrapped() {
        assert_eq!(es("const t = typeof `${a}`;"), "var t = typeof (\"\" + a);");
        assert_eq!(es("void `${a}`"), "void (\"\" + a)");
        assert_eq!(es("return `${a}!`"), "return \"\" + a + \"!\"");
    }
}
