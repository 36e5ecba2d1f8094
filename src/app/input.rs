use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::event_loop::ResizeDebouncer;
use crate::app::{Message, Model};
use crate::editor::Direction;

/// Side panel lines moved per PageUp/PageDown.
const PANEL_PAGE: u16 = 10;

pub(super) fn handle_event(
    event: &Event,
    model: &Model,
    now_ms: u64,
    resize_debouncer: &mut ResizeDebouncer,
) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(*key, model),
        Event::Paste(text) if !text.is_empty() => Some(Message::EditorInsertText(text.clone())),
        Event::Resize(width, height) => {
            crate::perf::log_event(
                "event.resize.queue",
                format!("width={width} height={height}"),
            );
            resize_debouncer.queue(*width, *height, now_ms);
            None
        }
        _ => None,
    }
}

pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
        return Some(Message::Quit);
    }
    if model.help_visible {
        return Some(match key.code {
            KeyCode::F(1) => Message::ToggleHelp,
            _ => Message::HideHelp,
        });
    }

    let msg = match key.code {
        KeyCode::F(1) => Message::ToggleHelp,
        KeyCode::Char('r') if ctrl => Message::ForceRender,
        KeyCode::Char('y') if ctrl => Message::CopySource,
        KeyCode::Char('o') if ctrl => Message::OpenPreview,
        KeyCode::Up if alt => Message::PanelScrollUp(1),
        KeyCode::Down if alt => Message::PanelScrollDown(1),
        KeyCode::PageUp => Message::PanelScrollUp(PANEL_PAGE),
        KeyCode::PageDown => Message::PanelScrollDown(PANEL_PAGE),

        KeyCode::Left if ctrl => Message::EditorMoveWordLeft,
        KeyCode::Right if ctrl => Message::EditorMoveWordRight,
        KeyCode::Home if ctrl => Message::EditorMoveToStart,
        KeyCode::End if ctrl => Message::EditorMoveToEnd,
        KeyCode::Left => Message::EditorMoveCursor(Direction::Left),
        KeyCode::Right => Message::EditorMoveCursor(Direction::Right),
        KeyCode::Up => Message::EditorMoveCursor(Direction::Up),
        KeyCode::Down => Message::EditorMoveCursor(Direction::Down),
        KeyCode::Home => Message::EditorMoveHome,
        KeyCode::End => Message::EditorMoveEnd,
        KeyCode::Enter => Message::EditorNewline,
        KeyCode::Tab => Message::EditorIndent,
        KeyCode::Backspace => Message::EditorDeleteBack,
        KeyCode::Delete => Message::EditorDeleteForward,
        KeyCode::Char(ch) if !ctrl && !alt => Message::EditorInsertChar(ch),
        _ => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_printable_keys_insert() {
        let model = Model::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('<'), KeyModifiers::SHIFT), &model),
            Some(Message::EditorInsertChar('<'))
        );
    }

    #[test]
    fn test_control_shortcuts() {
        let model = Model::default();
        let ctrl = KeyModifiers::CONTROL;
        assert_eq!(handle_key(key(KeyCode::Char('q'), ctrl), &model), Some(Message::Quit));
        assert_eq!(
            handle_key(key(KeyCode::Char('r'), ctrl), &model),
            Some(Message::ForceRender)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('y'), ctrl), &model),
            Some(Message::CopySource)
        );
        assert_eq!(
            handle_key(key(KeyCode::Left, ctrl), &model),
            Some(Message::EditorMoveWordLeft)
        );
        assert_eq!(handle_key(key(KeyCode::Char('z'), ctrl), &model), None);
    }

    #[test]
    fn test_alt_arrows_scroll_panel() {
        let model = Model::default();
        assert_eq!(
            handle_key(key(KeyCode::Down, KeyModifiers::ALT), &model),
            Some(Message::PanelScrollDown(1))
        );
        assert_eq!(
            handle_key(key(KeyCode::Down, KeyModifiers::NONE), &model),
            Some(Message::EditorMoveCursor(Direction::Down))
        );
    }

    #[test]
    fn test_help_swallows_keys() {
        let mut model = Model::default();
        model.help_visible = true;
        assert_eq!(
            handle_key(key(KeyCode::Char('a'), KeyModifiers::NONE), &model),
            Some(Message::HideHelp)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL), &model),
            Some(Message::Quit)
        );
    }

    #[test]
    fn test_resize_is_queued_not_applied() {
        let model = Model::default();
        let mut debouncer = ResizeDebouncer::new(100);
        assert_eq!(handle_event(&Event::Resize(120, 40), &model, 5, &mut debouncer), None);
        assert!(debouncer.is_pending());
    }
}
