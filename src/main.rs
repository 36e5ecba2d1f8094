//! jsx-sandbox - A terminal JSX playground with a live browser preview.
//!
//! # Usage
//!
//! ```bash
//! jsx-sandbox
//! jsx-sandbox app.jsx
//! jsx-sandbox --watch app.jsx
//! jsx-sandbox --once app.jsx > app.js
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use jsx_sandbox::app::{App, Model, Pane, Renderer};
use jsx_sandbox::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use jsx_sandbox::highlight::{HighlightBackground, set_background_mode};
use jsx_sandbox::perf;
use jsx_sandbox::pipeline::Pipeline;
use jsx_sandbox::sandbox::{FileSandbox, default_preview_path};
use jsx_sandbox::transpiler::BuiltinTransform;

/// Program loaded when no FILE is given.
const STARTER_PROGRAM: &str = r#"import React from 'https://esm.sh/react@18';
import { createRoot } from 'https://esm.sh/react-dom@18/client';

const Greeting = ({ name }) => (
  <div className="greeting">
    <h1>Hello, {name}!</h1>
    <p>Edit this program and the preview follows.</p>
  </div>
);

createRoot(document.getElementById('app')).render(<Greeting name="sandbox" />);
"#;

/// A terminal JSX playground with a live browser preview
#[derive(Parser, Debug)]
#[command(name = "jsx-sandbox", version, about, long_about = None)]
struct Cli {
    /// Program to load into the editor
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Reload the editor whenever FILE changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Where to write the preview document
    #[arg(long, value_name = "PATH")]
    preview: Option<PathBuf>,

    /// Stylesheet linked from the preview document
    #[arg(long, value_name = "HREF")]
    stylesheet: Option<String>,

    /// Quiet period after the last keystroke before rendering
    #[arg(long, value_name = "N")]
    debounce_ms: Option<u64>,

    /// Run one pass without the UI and print the transpiled code
    #[arg(long)]
    once: bool,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as global defaults
    #[arg(long)]
    save: bool,

    /// Clear saved global defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::Read;
    use std::sync::mpsc;
    use std::time::Duration;

    let (tx, rx) = mpsc::channel();

    let mut tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = tty.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    tty.write_all(b"\x1b]11;?\x07")?;
    tty.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let collected = rx
        .recv_timeout(Duration::from_millis(75))
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&collected);
    Ok(parse_osc11_reply(&text))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

fn read_program(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(STARTER_PROGRAM.to_string()),
    }
}

/// One headless pass: write the preview, print the display code.
fn run_once(source: &str, preview_path: PathBuf, stylesheet: Option<String>) -> ExitCode {
    let mut model = Model::new(source, (80, 24));
    let mut renderer = Renderer::new(
        Pipeline::new(BuiltinTransform),
        FileSandbox::new(preview_path),
        stylesheet,
    );
    renderer.render_pass(&mut model);

    match model.pane {
        Pane::Preview => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", model.source_code);
            ExitCode::SUCCESS
        }
        Pane::Error => {
            eprintln!("{}", model.error_text);
            ExitCode::FAILURE
        }
    }
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    tracing::debug!(?effective, "effective flags");

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("JSX_SANDBOX_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            error = %err,
            "failed to initialize render debug log"
        );
    }

    let source = read_program(cli.file.as_ref())?;
    let preview_path = effective.preview.clone().unwrap_or_else(default_preview_path);

    if cli.once {
        return Ok(run_once(&source, preview_path, effective.stylesheet));
    }

    match effective.theme.unwrap_or(ThemeMode::Auto) {
        ThemeMode::Auto => set_background_mode(detect_theme()),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    let mut app = App::new(source, preview_path)
        .with_file_path(cli.file)
        .with_watch(effective.watch)
        .with_stylesheet(effective.stylesheet.clone())
        .with_debounce_ms(effective.debounce_ms())
        .with_config_paths(
            Some(global_path.clone()),
            local_path.exists().then(|| local_path.clone()),
        );

    app.run().context("Application error")?;
    Ok(ExitCode::SUCCESS)
}
