//! The two-state UI machine.
//!
//! The machine sits in `Editing` almost all the time. An uncaught error moves
//! it to `Error` for exactly one render and it is settled back to `Editing`
//! straight after, so the next keystroke always re-runs the pipeline.

use std::fmt;

use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Editing,
    Error,
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Editing => "editing",
            Self::Error => "error",
        })
    }
}

/// Where an uncaught error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    Pipeline,
    Sandbox,
    Watcher,
}

/// An error as the error panel shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub origin: ErrorOrigin,
}

impl ErrorInfo {
    pub fn new(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin,
        }
    }
}

impl From<PipelineError> for ErrorInfo {
    fn from(err: PipelineError) -> Self {
        Self::new(ErrorOrigin::Pipeline, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Keystroke,
    UncaughtError(ErrorInfo),
}

/// Next state for `event`. Pure.
pub const fn transition(_state: UiState, event: &UiEvent) -> UiState {
    match event {
        UiEvent::Keystroke => UiState::Editing,
        UiEvent::UncaughtError(_) => UiState::Error,
    }
}

/// Current state plus the last error message.
///
/// The message is overwritten by each error and left in place on settle; it
/// is only read while the state is `Error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    state: UiState,
    error_message: String,
    last_origin: Option<ErrorOrigin>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> UiState {
        self.state
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub const fn last_origin(&self) -> Option<ErrorOrigin> {
        self.last_origin
    }

    pub fn apply(&mut self, event: UiEvent) {
        self.state = transition(self.state, &event);
        if let UiEvent::UncaughtError(info) = event {
            self.error_message = info.message;
            self.last_origin = Some(info.origin);
        }
    }

    /// Record `info` and enter `Error`.
    pub fn raise(&mut self, info: ErrorInfo) {
        self.apply(UiEvent::UncaughtError(info));
    }

    /// Return to `Editing` after the error has been rendered.
    pub const fn settle(&mut self) {
        self.state = UiState::Editing;
    }
}
