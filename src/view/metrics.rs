//! Narrative metrics (FLUX, CHAOS, Flow, Tension, PULSE).
//!
//! Placeholder heuristics over the timeline until the service reports real statistics.
//! Every ratio is over `total_turns`, so a report without turns is rejected instead of
//! producing NaN or infinity.

use serde::Serialize;
use thiserror::Error;

use crate::report::{classify, ActionKind, Report};

/// Health below which a snapshot counts as a low-health moment.
pub const LOW_HEALTH_THRESHOLD: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("report has no turns; metrics are undefined")]
    NoTurns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricCounts {
    pub damage_events: usize,
    pub heal_events: usize,
    pub low_health_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NarrativeMetrics {
    pub flux: f64,
    pub chaos: f64,
    pub flow: f64,
    pub tension: f64,
    pub pulse: f64,
    pub counts: MetricCounts,
}

pub fn count_events(report: &Report, low_health_threshold: f64) -> MetricCounts {
    let mut counts = MetricCounts::default();
    for entry in &report.timeline {
        match classify(entry).kind {
            ActionKind::Damage => counts.damage_events += 1,
            ActionKind::Heal => counts.heal_events += 1,
            ActionKind::Other => {}
        }
        if entry.healths.values().any(|h| *h < low_health_threshold) {
            counts.low_health_events += 1;
        }
    }
    counts
}

pub fn derive_metrics(
    report: &Report,
    low_health_threshold: f64,
) -> Result<NarrativeMetrics, MetricsError> {
    if report.total_turns == 0 {
        return Err(MetricsError::NoTurns);
    }
    let turns = f64::from(report.total_turns);
    let counts = count_events(report, low_health_threshold);

    // Timelines may hold several entries per turn; keep ratios inside [0, 1].
    let ratio = |events: usize| (events as f64 / turns).min(1.0);

    Ok(NarrativeMetrics {
        flux: ratio(counts.damage_events + counts.heal_events),
        chaos: ratio(counts.damage_events),
        flow: if report.total_turns > 5 && report.total_turns < 15 {
            0.8
        } else {
            0.5
        },
        tension: ratio(counts.low_health_events),
        pulse: if counts.low_health_events > 0 { 1.0 } else { 0.0 },
        counts,
    })
}

impl NarrativeMetrics {
    pub const PLACEHOLDER: &'static str = "Metrics\nFLUX: -\nCHAOS: -\nFlow: -\nTension: -\nPULSE: -";

    pub fn panel_text(&self) -> String {
        format!(
            "Metrics\nFLUX: {:.2}\nCHAOS: {:.2}\nFlow: {:.2}\nTension: {:.2}\nPULSE: {}",
            self.flux, self.chaos, self.flow, self.tension, self.pulse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_buckets_are_exclusive_at_both_ends() {
        for (turns, expected) in [(5, 0.5), (6, 0.8), (14, 0.8), (15, 0.5), (1, 0.5)] {
            let report = Report {
                total_turns: turns,
                ..Report::default()
            };
            let metrics = derive_metrics(&report, LOW_HEALTH_THRESHOLD).expect("turns > 0");
            assert_eq!(metrics.flow, expected, "turns={turns}");
        }
    }

    #[test]
    fn panel_text_formats_two_decimals() {
        let metrics = NarrativeMetrics {
            flux: 0.4,
            chaos: 0.3,
            flow: 0.8,
            tension: 0.2,
            pulse: 1.0,
            counts: MetricCounts::default(),
        };
        assert_eq!(
            metrics.panel_text(),
            "Metrics\nFLUX: 0.40\nCHAOS: 0.30\nFlow: 0.80\nTension: 0.20\nPULSE: 1"
        );
    }
}
