use std::io;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Position;

use super::*;
use crate::app::{Message, Model, Pane, Renderer, Session};
use crate::pipeline::Pipeline;
use crate::sandbox::Sandbox;
use crate::transpiler::BuiltinTransform;

struct NullSandbox;

impl Sandbox for NullSandbox {
    fn load(&mut self, _document: &str) -> io::Result<()> {
        Ok(())
    }

    fn location(&self) -> String {
        "/tmp/preview.html".to_string()
    }
}

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(100, 30);
    Terminal::new(backend).unwrap()
}

fn rendered_model(source: &str) -> Model {
    let mut model = Model::new(source, (100, 30));
    let renderer = Renderer::new(Pipeline::new(BuiltinTransform), NullSandbox, None);
    Session::new(renderer, 300).start(&mut model);
    model
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_loading_indicator_before_first_pass() {
    let model = Model::new("const a = 1;", (100, 30));
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    assert!(text.contains("Loading"));
    assert!(text.contains("[loading]"));
    assert!(!text.contains("Source"));
}

#[test]
fn test_preview_side_shows_transpiled_source() {
    let model = rendered_model("const el = <div className=\"x\" />;");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    assert_eq!(model.pane, Pane::Preview);
    assert!(text.contains("Source"));
    assert!(text.contains("/tmp/preview.html"));
    assert!(text.contains("\"use strict\";"));
    assert!(text.contains("var el = React.createElement"));
    assert!(!text.contains("Error"));
}

#[test]
fn test_error_panel_replaces_preview() {
    let model = rendered_model("const a = <div>;");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    assert_eq!(model.pane, Pane::Error);
    assert!(text.contains("Error"));
    assert!(text.contains("SyntaxError"));
    assert!(!text.contains("Source"));
    assert!(text.contains("[error]"));
}

#[test]
fn test_editor_shows_line_numbers_and_code() {
    let model = rendered_model("const a = 1;\nconst b = 2;");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    assert!(text.contains("1 const a = 1;"));
    assert!(text.contains("2 const b = 2;"));
}

#[test]
fn test_cursor_is_placed_after_gutter() {
    let model = update_model(rendered_model("ab"), Message::EditorMoveEnd);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    // border + one-digit gutter + separator + two columns of text
    assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(5, 1));
}

#[test]
fn test_cursor_accounts_for_wide_characters() {
    let model = update_model(rendered_model("\"日本\""), Message::EditorMoveEnd);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(9, 1));
}

#[test]
fn test_help_overlay_lists_shortcuts() {
    let model = update_model(rendered_model("x"), Message::ToggleHelp);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    assert!(text.contains("Help"));
    assert!(text.contains("Render now"));
    assert!(text.contains("Open preview in browser"));
}

#[test]
fn test_status_bar_names_scratch_buffer() {
    let model = rendered_model("x");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let text = screen_text(&terminal);
    let last_row = text.lines().last().unwrap();
    assert!(last_row.contains("scratch"));
    assert!(last_row.contains("Ln 1, Col 1"));
    assert!(last_row.contains("F1:help"));
}

#[test]
fn test_line_number_width() {
    assert_eq!(render::line_number_width(9), 1);
    assert_eq!(render::line_number_width(10), 2);
    assert_eq!(render::line_number_width(12_345), 5);
}

fn update_model(model: Model, msg: Message) -> Model {
    crate::app::update(model, msg)
}
