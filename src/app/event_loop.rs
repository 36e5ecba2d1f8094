use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{debug, info};

use super::effects::{Renderer, copy_source, open_preview};
use super::machine::{ErrorInfo, ErrorOrigin, UiEvent};
use crate::app::{App, Message, Model, ToastLevel, update};
use crate::pipeline::Pipeline;
use crate::sandbox::{FileSandbox, Sandbox};
use crate::transpiler::{BuiltinTransform, Transform};
use crate::watcher::SourceWatcher;

/// Quiet period after the last filesystem event before a watched file is
/// read back.
const WATCH_SETTLE: Duration = Duration::from_millis(50);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Trailing-edge debounce for render passes.
///
/// Every keystroke restarts the quiet period; the pass fires once no
/// keystroke has arrived for `delay_ms`.
#[derive(Debug, Clone)]
pub struct KeystrokeDebouncer {
    delay_ms: u64,
    queued_at: Option<u64>,
}

impl KeystrokeDebouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            queued_at: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub const fn queue(&mut self, now_ms: u64) {
        self.queued_at = Some(now_ms);
    }

    pub fn take_ready(&mut self, now_ms: u64) -> bool {
        match self.queued_at {
            Some(queued_at) if now_ms.saturating_sub(queued_at) >= self.delay_ms => {
                self.queued_at = None;
                true
            }
            _ => false,
        }
    }

    /// Milliseconds until the pending pass is due.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.queued_at
            .map(|queued_at| (queued_at + self.delay_ms).saturating_sub(now_ms))
    }

    pub const fn cancel(&mut self) {
        self.queued_at = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.queued_at.is_some()
    }
}

enum FollowUp {
    Nothing,
    RenderNow,
    Copy,
    Open,
}

/// The render loop without the terminal: messages in, render passes out.
pub struct Session<T, S> {
    renderer: Renderer<T, S>,
    keystrokes: KeystrokeDebouncer,
}

impl<T: Transform, S: Sandbox> Session<T, S> {
    pub const fn new(renderer: Renderer<T, S>, debounce_ms: u64) -> Self {
        Self {
            renderer,
            keystrokes: KeystrokeDebouncer::new(debounce_ms),
        }
    }

    pub const fn renderer(&self) -> &Renderer<T, S> {
        &self.renderer
    }

    /// The initial render pass.
    pub fn start(&mut self, model: &mut Model) {
        info!(state = %model.machine.state(), "initial render");
        self.renderer.render_pass(model);
    }

    /// Apply `msg` and run whatever it asks for.
    pub fn dispatch(&mut self, model: &mut Model, msg: Message, now_ms: u64) {
        let keystroke = msg.is_keystroke();
        let follow_up = match &msg {
            Message::ForceRender | Message::SourceChanged(_) => FollowUp::RenderNow,
            Message::CopySource => FollowUp::Copy,
            Message::OpenPreview => FollowUp::Open,
            _ => FollowUp::Nothing,
        };

        *model = update(std::mem::take(model), msg);
        if keystroke {
            model.machine.apply(UiEvent::Keystroke);
            self.keystrokes.queue(now_ms);
        }

        match follow_up {
            FollowUp::RenderNow => {
                self.keystrokes.cancel();
                self.renderer.render_pass(model);
            }
            FollowUp::Copy => copy_source(model),
            FollowUp::Open => open_preview(model),
            FollowUp::Nothing => {}
        }
        model.render_pending = self.keystrokes.is_pending();
    }

    /// Run the debounced pass if the quiet period is over. Returns true
    /// when a pass ran.
    pub fn tick(&mut self, model: &mut Model, now_ms: u64) -> bool {
        let ready = self.keystrokes.take_ready(now_ms);
        if ready {
            debug!(now_ms, "debounced render");
            self.renderer.render_pass(model);
        }
        model.render_pending = self.keystrokes.is_pending();
        ready
    }

    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.keystrokes.remaining_ms(now_ms)
    }

    pub fn report_uncaught(&mut self, model: &mut Model, info: ErrorInfo) {
        self.renderer.report_uncaught(model, info);
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; jsx-sandbox requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = Model::new(&self.source, (size.width, size.height))
            .with_file_path(self.file_path.clone());
        model.watch_enabled = self.watch_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        let renderer = Renderer::new(
            Pipeline::new(BuiltinTransform),
            FileSandbox::new(self.preview_path.clone()),
            self.stylesheet.clone(),
        );
        let mut session = Session::new(renderer, self.debounce_ms);

        let result = Self::event_loop(&mut terminal, &mut model, &mut session);

        let _ = execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();
        result
    }

    fn make_watcher(model: &mut Model) -> Option<SourceWatcher> {
        if !model.watch_enabled {
            return None;
        }
        let Some(path) = model.file_path.clone() else {
            model.watch_enabled = false;
            model.show_toast(ToastLevel::Warning, "Watch needs a file argument");
            return None;
        };
        match SourceWatcher::new(&path, WATCH_SETTLE) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                model.watch_enabled = false;
                model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                crate::perf::log_event(
                    "watcher.error",
                    format!("failed path={} err={err}", path.display()),
                );
                None
            }
        }
    }

    fn event_loop<T: Transform, S: Sandbox>(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        session: &mut Session<T, S>,
    ) -> Result<()> {
        execute!(stdout(), EnableBracketedPaste)?;

        // Paint the loading state before the first pass blocks.
        terminal.draw(|frame| crate::ui::render(model, frame))?;
        session.start(model);

        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut watcher = Self::make_watcher(model);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = elapsed_ms(start);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if let Some(source_watcher) = watcher.as_mut()
                && source_watcher.poll_settled(Instant::now())
            {
                match source_watcher.read_source() {
                    Ok(text) => session.dispatch(model, Message::SourceChanged(text), now_ms),
                    Err(err) => session.report_uncaught(
                        model,
                        ErrorInfo::new(
                            ErrorOrigin::Watcher,
                            format!(
                                "Could not read {}: {err}",
                                source_watcher.target_path().display()
                            ),
                        ),
                    ),
                }
                needs_render = true;
            }

            if session.tick(model, now_ms) {
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if let Some(remaining) = session.remaining_ms(now_ms) {
                remaining.clamp(1, 250)
            } else if resize_debouncer.is_pending() {
                10
            } else if watcher.is_some() {
                50
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = elapsed_ms(start);
                let msg =
                    super::input::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    session.dispatch(model, msg, event_ms);
                    needs_render = true;
                }

                // Coalesce key repeat bursts and pastes into a single frame.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = elapsed_ms(start);
                    let msg = super::input::handle_event(
                        &event::read()?,
                        model,
                        drain_ms,
                        &mut resize_debouncer,
                    );
                    if let Some(msg) = msg {
                        drained += 1;
                        session.dispatch(model, msg, drain_ms);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3} state={} pane={:?}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0,
                        model.machine.state(),
                        model.pane
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
