//! JavaScript highlighting for the editor and source panels.
//!
//! Uses syntect's bundled Sublime Text definitions; the theme is picked for
//! the terminal background.

use std::sync::{Mutex, OnceLock, PoisonError};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Highlight `code` as JavaScript, one ratatui line per source line.
///
/// Falls back to unstyled lines if no JavaScript definition is available.
pub fn highlight_js(code: &str) -> Vec<Line<'static>> {
    let _scope = crate::perf::scope("highlight.js");
    let syntax_set = syntax_set();
    let Some(syntax) = javascript(syntax_set) else {
        return code.lines().map(|l| Line::raw(l.to_string())).collect();
    };
    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    // The newline-aware syntax set wants each line with its terminator.
    LinesWithEndings::from(code)
        .map(|line| {
            let ranges = highlighter
                .highlight_line(line, syntax_set)
                .unwrap_or_default();
            Line::from(
                ranges
                    .into_iter()
                    .filter_map(|(style, text)| {
                        let text = text.trim_end_matches(['\n', '\r']);
                        if text.is_empty() {
                            return None;
                        }
                        let fg = style.foreground;
                        let (r, g, b) = adjust_fg_for_background((fg.r, fg.g, fg.b), mode);
                        Some(Span::styled(
                            text.to_string(),
                            Style::default().fg(Color::Rgb(r, g, b)),
                        ))
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn javascript(syntax_set: &SyntaxSet) -> Option<&SyntaxReference> {
    syntax_set
        .find_syntax_by_token("js")
        .or_else(|| syntax_set.find_syntax_by_name("JavaScript"))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => ["base16-ocean.dark", "base16-eighties.dark", "Solarized (dark)"],
            BackgroundMode::Light => ["InspiredGitHub", "base16-ocean.light", "Solarized (light)"],
        };
        preferred
            .iter()
            .find_map(|name| theme_set.themes.get(*name).cloned())
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: Mutex<Option<HighlightBackground>> = Mutex::new(None);

/// Force the background used to pick a theme; `None` detects it from
/// `COLORFGBG`.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = mode;
}

fn background_mode() -> BackgroundMode {
    let forced = *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    match forced {
        Some(HighlightBackground::Light) => BackgroundMode::Light,
        Some(HighlightBackground::Dark) => BackgroundMode::Dark,
        None => background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()),
    }
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let bg = colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

/// Darken bright foregrounds so they stay readable on light backgrounds.
fn adjust_fg_for_background((r, g, b): (u8, u8, u8), mode: BackgroundMode) -> (u8, u8, u8) {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if mode == BackgroundMode::Dark || luma < 155.0 {
        return (r, g, b);
    }
    let darken = |c: u8| (f32::from(c) * 0.42).round().clamp(0.0, 255.0) as u8;
    (darken(r), darken(g), darken(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_js_colours_keywords() {
        let lines = highlight_js("const a = 1;\nfunction f() { return a }\n");
        assert_eq!(lines.len(), 2);
        assert!(
            lines
                .iter()
                .flat_map(|l| l.spans.iter())
                .any(|span| span.style.fg.is_some())
        );
    }

    #[test]
    fn test_highlight_keeps_text() {
        let lines = highlight_js("var x = \"y\";");
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "var x = \"y\";");
    }

    #[test]
    fn test_highlight_sets_no_background() {
        let lines = highlight_js("let a = `b`");
        assert!(
            lines
                .iter()
                .flat_map(|l| l.spans.iter())
                .all(|span| span.style.bg.is_none())
        );
    }

    #[test]
    fn test_colorfgbg_detection() {
        assert_eq!(background_mode_from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
        assert_eq!(background_mode_from_colorfgbg(Some("0;15")), BackgroundMode::Light);
        assert_eq!(background_mode_from_colorfgbg(Some("junk")), BackgroundMode::Dark);
        assert_eq!(background_mode_from_colorfgbg(None), BackgroundMode::Dark);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = (240, 230, 120);
        let (r, g, b) = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(r < 240 && g < 230 && b < 120);
        assert_eq!(adjust_fg_for_background(bright, BackgroundMode::Dark), bright);
    }
}
