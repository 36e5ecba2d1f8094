use ropey::Rope;

/// Spaces inserted by Tab.
pub const INDENT: &str = "  ";

/// Cursor position in the code buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based byte offset within the line.
    pub col: usize,
    /// Column to return to when moving vertically past short lines.
    sticky_col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            sticky_col: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.sticky_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::at(0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rope-backed source buffer for the code editor pane.
///
/// The pipeline only ever reads [`EditorBuffer::value`]; everything else
/// here serves keyboard editing.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The whole program text.
    pub fn value(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole text, keeping the cursor as close to where it was
    /// as the new text allows.
    pub fn set_text(&mut self, text: &str) {
        let Cursor { line, col, .. } = self.cursor;
        self.rope = Rope::from_str(text);
        self.move_to(line, col);
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line terminator.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);
        match s.rsplit_once('\n') {
            Some((head, tail)) => {
                self.cursor.line += head.matches('\n').count() + 1;
                self.cursor.set_col(tail.len());
            }
            None => self.cursor.set_col(self.cursor.col + s.len()),
        }
    }

    /// Break the line at the cursor, carrying the current line's leading
    /// whitespace onto the new line. One extra indent level follows an
    /// opening bracket.
    pub fn newline(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let before = &line[..self.cursor.col.min(line.len())];
        let mut indent: String = before
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        if before.trim_end().ends_with(['{', '(', '[']) {
            indent.push_str(INDENT);
        }
        self.insert_str(&format!("\n{indent}"));
    }

    pub fn indent(&mut self) {
        self.insert_str(INDENT);
    }

    /// Backspace. Returns `false` at the start of the buffer.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.col == 0 {
            if self.cursor.line == 0 {
                return false;
            }
            let prev_len = self.line_len(self.cursor.line - 1);
            let idx = self.cursor_char_idx();
            let terminator = if self.rope.char(idx - 1) == '\n'
                && idx >= 2
                && self.rope.char(idx - 2) == '\r'
            {
                2
            } else {
                1
            };
            self.rope.remove(idx - terminator..idx);
            self.cursor.line -= 1;
            self.cursor.set_col(prev_len);
        } else {
            let prev_len = self.char_before_cursor().map_or(1, char::len_utf8);
            let idx = self.cursor_char_idx();
            self.rope.remove(idx - 1..idx);
            self.cursor.set_col(self.cursor.col - prev_len);
        }
        true
    }

    /// Delete. Returns `false` at the end of the buffer.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(idx..=idx);
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                if let Some(ch) = self.char_before_cursor() {
                    self.cursor.set_col(self.cursor.col - ch.len_utf8());
                } else if self.cursor.line > 0 {
                    self.cursor.line -= 1;
                    self.cursor.set_col(self.line_len(self.cursor.line));
                }
            }
            Direction::Right => {
                let line = self.line_at(self.cursor.line).unwrap_or_default();
                if let Some(ch) = line[self.cursor.col.min(line.len())..].chars().next() {
                    self.cursor.set_col(self.cursor.col + ch.len_utf8());
                } else if self.cursor.line + 1 < self.line_count() {
                    self.cursor.line += 1;
                    self.cursor.set_col(0);
                }
            }
            Direction::Up if self.cursor.line > 0 => self.move_vertically(self.cursor.line - 1),
            Direction::Down if self.cursor.line + 1 < self.line_count() => {
                self.move_vertically(self.cursor.line + 1);
            }
            Direction::Up | Direction::Down => {}
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.set_col(self.line_len(self.cursor.line));
    }

    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.cursor.set_col(self.line_len(self.cursor.line));
            }
            return;
        }
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let before = line[..self.cursor.col.min(line.len())].trim_end();
        let col = before
            .rfind(|c: char| !is_word_char(c))
            .map_or(0, |i| i + before[i..].chars().next().map_or(1, char::len_utf8));
        self.cursor.set_col(col);
    }

    pub fn move_word_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if self.cursor.col >= line.len() {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }
        let after = &line[self.cursor.col..];
        let word_end = after.find(|c| !is_word_char(c)).unwrap_or(after.len());
        let rest = &after[word_end..];
        let gap = rest.find(is_word_char).unwrap_or(rest.len());
        self.cursor.set_col(self.cursor.col + word_end + gap);
    }

    /// Move to a line and byte column, clamped to the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        let mut col = col.min(text.len());
        while !text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    pub const fn move_to_start(&mut self) {
        self.cursor.line = 0;
        self.cursor.set_col(0);
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.line = last;
        self.cursor.set_col(self.line_len(last));
    }

    fn move_vertically(&mut self, line: usize) {
        let sticky = self.cursor.sticky_col;
        self.move_to(line, sticky);
        self.cursor.sticky_col = sticky;
    }

    fn char_before_cursor(&self) -> Option<char> {
        let line = self.line_at(self.cursor.line)?;
        line[..self.cursor.col.min(line.len())].chars().next_back()
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        line_start + line[..self.cursor.col.min(line.len())].chars().count()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor)
            .finish()
    }
}
