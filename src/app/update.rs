use crate::app::Model;
use crate::editor::Direction;

/// All events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Insert pasted text at the cursor
    EditorInsertText(String),
    /// Break the line at the cursor (Enter)
    EditorNewline,
    /// Insert one indent level (Tab)
    EditorIndent,
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    EditorMoveCursor(Direction),
    EditorMoveHome,
    EditorMoveEnd,
    EditorMoveWordLeft,
    EditorMoveWordRight,
    EditorMoveToStart,
    EditorMoveToEnd,

    // Pipeline
    /// Render now without waiting for typing to pause
    ForceRender,
    /// The watched file now holds this text
    SourceChanged(String),

    // Side panel
    PanelScrollUp(u16),
    PanelScrollDown(u16),
    /// Copy the display code to the clipboard
    CopySource,
    /// Open the preview document in the browser
    OpenPreview,

    ToggleHelp,
    HideHelp,
    /// Terminal resized
    Resize(u16, u16),
    Quit,
}

impl Message {
    /// Editor input. Each one restarts the render quiet period.
    pub const fn is_keystroke(&self) -> bool {
        matches!(
            self,
            Self::EditorInsertChar(_)
                | Self::EditorInsertText(_)
                | Self::EditorNewline
                | Self::EditorIndent
                | Self::EditorDeleteBack
                | Self::EditorDeleteForward
                | Self::EditorMoveCursor(_)
                | Self::EditorMoveHome
                | Self::EditorMoveEnd
                | Self::EditorMoveWordLeft
                | Self::EditorMoveWordRight
                | Self::EditorMoveToStart
                | Self::EditorMoveToEnd
        )
    }
}

/// Pure state transition for `msg`.
///
/// Rendering, clipboard and browser work happen in the event loop after
/// this returns.
pub fn update(mut model: Model, msg: Message) -> Model {
    let keystroke = msg.is_keystroke();
    match msg {
        Message::EditorInsertChar(ch) => model.editor.insert_char(ch),
        Message::EditorInsertText(text) => model.editor.insert_str(&text),
        Message::EditorNewline => model.editor.newline(),
        Message::EditorIndent => model.editor.indent(),
        Message::EditorDeleteBack => {
            model.editor.delete_back();
        }
        Message::EditorDeleteForward => {
            model.editor.delete_forward();
        }
        Message::EditorMoveCursor(direction) => model.editor.move_cursor(direction),
        Message::EditorMoveHome => model.editor.move_home(),
        Message::EditorMoveEnd => model.editor.move_end(),
        Message::EditorMoveWordLeft => model.editor.move_word_left(),
        Message::EditorMoveWordRight => model.editor.move_word_right(),
        Message::EditorMoveToStart => model.editor.move_to_start(),
        Message::EditorMoveToEnd => model.editor.move_to_end(),

        Message::SourceChanged(text) => {
            model.editor.set_text(&text);
            model.ensure_cursor_visible();
        }
        // Handled by the render loop
        Message::ForceRender | Message::CopySource | Message::OpenPreview => {}

        Message::PanelScrollUp(n) => {
            model.panel_scroll = model.panel_scroll.saturating_sub(n);
        }
        Message::PanelScrollDown(n) => {
            let max = u16::try_from(model.panel_line_count().saturating_sub(1)).unwrap_or(u16::MAX);
            model.panel_scroll = model.panel_scroll.saturating_add(n).min(max);
        }

        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::Resize(width, height) => {
            model.width = width;
            model.height = height;
            model.ensure_cursor_visible();
        }
        Message::Quit => model.should_quit = true,
    }
    if keystroke {
        model.ensure_cursor_visible();
    }
    model
}
