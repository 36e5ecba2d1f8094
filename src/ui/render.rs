use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, Pane};

use super::{EDITOR_WIDTH_PERCENT, PANEL_WIDTH_PERCENT, PREVIEW_STATUS_ROWS, overlays, status};

/// Editor buffers longer than this are drawn without highlighting.
const HIGHLIGHT_LINE_LIMIT: usize = 5_000;

pub fn split_main_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PANEL_WIDTH_PERCENT),
        ])
        .split(area)
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let main_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };

    let columns = split_main_columns(main_area);
    render_editor(model, frame, columns[0]);
    if model.loading {
        render_loading(frame, columns[1]);
    } else {
        match model.pane {
            Pane::Preview => render_preview_side(model, frame, columns[1]),
            Pane::Error => render_error_panel(model, frame, columns[1]),
        }
    }

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, status_area);
    } else {
        status::render_status_bar(model, frame, status_area);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = &model.editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Code ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines);
    let start = model.editor_scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + inner.height as usize).min(total_lines);

    let highlighted = (total_lines <= HIGHLIGHT_LINE_LIMIT)
        .then(|| crate::highlight::highlight_js(&buf.value()));

    let content: Vec<Line> = (start..end)
        .map(|line_idx| {
            let number = format!("{:>width$} ", line_idx + 1, width = gutter_width as usize);
            let mut spans = vec![Span::styled(number, Style::default().fg(Color::DarkGray))];
            match highlighted.as_ref().and_then(|lines| lines.get(line_idx)) {
                Some(line) => spans.extend(line.spans.iter().cloned()),
                None => spans.push(Span::raw(buf.line_at(line_idx).unwrap_or_default())),
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(content), inner);

    if model.help_visible {
        return;
    }
    let cursor = buf.cursor();
    if cursor.line < start || cursor.line >= end {
        return;
    }
    let line_text = buf.line_at(cursor.line).unwrap_or_default();
    let before = line_text.get(..cursor.col.min(line_text.len())).unwrap_or("");
    let col = u16::try_from(before.width()).unwrap_or(u16::MAX);
    let row = u16::try_from(cursor.line - start).unwrap_or(u16::MAX);
    let x = inner
        .x
        .saturating_add(gutter_width + 1)
        .saturating_add(col)
        .min(inner.right().saturating_sub(1));
    frame.set_cursor_position(Position::new(x, inner.y.saturating_add(row)));
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Preview ");
    let text = Paragraph::new(Line::styled(
        "Loading…",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC),
    ))
    .block(block);
    frame.render_widget(text, area);
}

fn render_preview_side(model: &Model, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(PREVIEW_STATUS_ROWS),
            Constraint::Min(1),
        ])
        .split(area);

    let label = Style::default().fg(Color::DarkGray);
    let preview = &model.preview;
    let status_lines = vec![
        Line::from(vec![
            Span::styled("Document ", label),
            Span::raw(preview.location.clone()),
        ]),
        Line::from(vec![
            Span::styled("Updates  ", label),
            Span::raw(format!("{}  ({} bytes)", preview.loads, preview.bytes)),
        ]),
    ];
    let status_block = Block::default()
        .borders(Borders::ALL)
        .title(" Preview ")
        .border_style(Style::default().fg(Color::Green));
    frame.render_widget(Paragraph::new(status_lines).block(status_block), chunks[0]);

    let source_block = Block::default()
        .borders(Borders::ALL)
        .title(" 📜 Source ")
        .border_style(Style::default().fg(Color::DarkGray));
    let source = Paragraph::new(model.source_lines().to_vec())
        .block(source_block)
        .scroll((model.panel_scroll, 0));
    frame.render_widget(source, chunks[1]);
}

fn render_error_panel(model: &Model, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" 💩 Error ")
        .border_style(Style::default().fg(Color::Red));
    let lines: Vec<Line> = model
        .error_text
        .lines()
        .map(|line| Line::styled(line.to_string(), Style::default().fg(Color::Red)))
        .collect();
    let panel = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((model.panel_scroll, 0));
    frame.render_widget(panel, area);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
