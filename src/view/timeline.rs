//! Combat log text: a cursor prefix for playback, or the full log with health snapshots.

use crate::report::{Report, TimelineEntry};

pub const LOG_HEADER: &str = "Combat Log:";
pub const AWAITING: &str = "Awaiting simulation...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    pub header: &'static str,
    pub lines: Vec<String>,
}

impl LogView {
    /// Log shown before any report has been displayed.
    pub fn awaiting() -> Self {
        Self {
            header: LOG_HEADER,
            lines: Vec::new(),
        }
    }

    pub fn to_text(&self) -> String {
        if self.lines.is_empty() {
            return format!("{}\n{AWAITING}", self.header);
        }
        format!("{}\n{}", self.header, self.lines.join("\n"))
    }
}

fn entry_line(entry: &TimelineEntry) -> String {
    format!("Turn {}: {} {}", entry.turn, entry.character, entry.action)
}

/// Entries `0..=turn_index`, clamped to the timeline length.
pub fn render_prefix(report: &Report, turn_index: usize) -> LogView {
    let end = turn_index.saturating_add(1).min(report.timeline.len());
    LogView {
        header: LOG_HEADER,
        lines: report.timeline[..end].iter().map(entry_line).collect(),
    }
}

/// Every entry, each followed by its health snapshot as compact JSON.
pub fn render_full(report: &Report) -> LogView {
    let lines = report
        .timeline
        .iter()
        .map(|entry| {
            let healths = serde_json::to_string(&entry.healths).unwrap_or_else(|_| "{}".into());
            format!("{} - Healths: {healths}", entry_line(entry))
        })
        .collect();
    LogView {
        header: LOG_HEADER,
        lines,
    }
}
