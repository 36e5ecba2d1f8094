use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, Pane, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model
        .file_path
        .as_ref()
        .and_then(|path| path.file_name())
        .map_or_else(|| "scratch".to_string(), |s| s.to_string_lossy().to_string());

    let cursor = model.editor.cursor();
    let cursor_info = format!("Ln {}, Col {}", cursor.line + 1, cursor.col + 1);

    let activity = if model.loading {
        " [loading]"
    } else if model.render_pending {
        " [typing]"
    } else if model.pane == Pane::Error {
        " [error]"
    } else {
        ""
    };
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let status = format!(
        " {filename}  {cursor_info}  renders:{}{activity}{watch_indicator}  F1:help",
        model.pipeline_runs
    );

    let background = if model.pane == Pane::Error && !model.loading {
        Color::Red
    } else {
        Color::DarkGray
    };
    let status_bar =
        Paragraph::new(status).style(Style::default().bg(background).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
