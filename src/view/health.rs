//! Health bar mapping.
//!
//! The service does not report a maximum health, so the scale carries an assumed one.
//! It is the only place that assumption lives; callers get it from configuration or
//! from the report when the service starts sending it.

use std::time::Duration;

use crate::report::Report;

pub const DEFAULT_MAX_HEALTH: f64 = 1000.0;
pub const LOW_HEALTH_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthScale {
    pub max_health: f64,
    pub low_ratio: f64,
}

impl Default for HealthScale {
    fn default() -> Self {
        Self {
            max_health: DEFAULT_MAX_HEALTH,
            low_ratio: LOW_HEALTH_RATIO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthBar {
    /// Unclamped `current / max`.
    pub ratio: f64,
    /// Width of the filled part, in `[0, bar_width]`.
    pub fill_width: f64,
    pub low_health: bool,
}

impl HealthScale {
    /// A report-supplied maximum overrides the configured one.
    pub fn for_report(self, report: &Report) -> Self {
        match report.max_health {
            Some(max) if max > 0.0 => Self {
                max_health: max,
                ..self
            },
            _ => self,
        }
    }

    pub fn map(&self, current: f64, bar_width: f64) -> HealthBar {
        let ratio = if self.max_health > 0.0 {
            current / self.max_health
        } else {
            0.0
        };
        HealthBar {
            ratio,
            fill_width: ratio.clamp(0.0, 1.0) * bar_width,
            low_health: ratio < self.low_ratio,
        }
    }
}

/// Alpha of the pulsing low-health outline at `elapsed` since the scene started.
pub fn pulse_alpha(elapsed: Duration) -> f32 {
    let ms = elapsed.as_secs_f64() * 1000.0;
    (0.7 + 0.3 * (ms / 200.0).sin()) as f32
}
