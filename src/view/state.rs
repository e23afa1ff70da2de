//! Viewer state as a value. Each transition builds a new `ViewState`; nothing is patched
//! in place, so every intermediate state can be asserted on directly.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Displayed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub replay_visible: bool,
    pub view_log_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    pub report: Option<Arc<Report>>,
    pub error: Option<String>,
    pub controls: Controls,
    pub received_at: Option<DateTime<Utc>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            report: None,
            error: None,
            controls: Controls::default(),
            received_at: None,
        }
    }
}

impl ViewState {
    /// Request started: error cleared, report and controls untouched.
    pub fn loading(&self) -> Self {
        Self {
            phase: Phase::Loading,
            error: None,
            ..self.clone()
        }
    }

    pub fn displayed(&self, report: Arc<Report>, received_at: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Displayed,
            report: Some(report),
            error: None,
            controls: Controls {
                replay_visible: true,
                view_log_visible: true,
            },
            received_at: Some(received_at),
        }
    }

    /// Request failed: the previous report and control visibility are kept.
    pub fn failed(&self, message: impl std::fmt::Display) -> Self {
        Self {
            phase: Phase::Error,
            error: Some(format!("Error: {message}")),
            ..self.clone()
        }
    }

    pub fn has_report(&self) -> bool {
        self.report.is_some()
    }

    pub fn status_line(&self) -> String {
        match (&self.report, self.received_at) {
            (Some(report), Some(at)) => format!(
                "{} turns, {} events (received {})",
                report.total_turns,
                report.timeline.len(),
                at.format("%H:%M:%S")
            ),
            _ => String::new(),
        }
    }
}
