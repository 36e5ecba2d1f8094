use super::TransformError;

/// Byte-offset cursor over the source text.
#[derive(Debug, Clone)]
pub(super) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(super) const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub(super) const fn pos(&self) -> usize {
        self.pos
    }

    pub(super) fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    pub(super) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(super) fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub(super) fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    pub(super) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub(super) fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    pub(super) fn eat_str(&mut self, pat: &str) -> bool {
        if self.starts_with(pat) {
            self.pos += pat.len();
            true
        } else {
            false
        }
    }

    /// Advance while `pred` holds and return the consumed slice.
    pub(super) fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// First character after any run of whitespace, without consuming.
    pub(super) fn peek_past_whitespace(&self) -> Option<char> {
        self.rest().chars().find(|c| !c.is_whitespace())
    }

    /// Build a syntax error located at byte offset `at`.
    pub(super) fn error_at(&self, at: usize, message: impl Into<String>) -> TransformError {
        let (line, column) = line_col(self.src, at);
        TransformError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub(super) fn error(&self, message: impl Into<String>) -> TransformError {
        self.error_at(self.pos, message)
    }
}

/// 1-based line and column (in characters) for a byte offset.
pub(super) fn line_col(src: &str, at: usize) -> (usize, usize) {
    let at = at.min(src.len());
    let before = &src[..at];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

pub(super) fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

pub(super) fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_counts_from_one() {
        let src = "ab\ncd\né";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 4), (2, 2));
        assert_eq!(line_col(src, src.len()), (3, 2));
    }

    #[test]
    fn test_take_while_stops_at_predicate() {
        let mut cur = Cursor::new("abc1 rest");
        assert_eq!(cur.take_while(is_ident_char), "abc1");
        assert_eq!(cur.peek(), Some(' '));
        assert_eq!(cur.peek_past_whitespace(), Some('r'));
    }
}
