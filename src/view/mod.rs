//! Pure report-to-view transformations. Nothing here touches the rendering surface.

pub mod health;
pub mod layout;
pub mod metrics;
pub mod state;
pub mod stats;
pub mod timeline;

pub use health::{pulse_alpha, HealthBar, HealthScale, DEFAULT_MAX_HEALTH, LOW_HEALTH_RATIO};
pub use layout::{layout_characters, CharacterSlot, Layout};
pub use metrics::{
    count_events, derive_metrics, MetricCounts, MetricsError, NarrativeMetrics,
    LOW_HEALTH_THRESHOLD,
};
pub use state::{Controls, Phase, ViewState};
pub use stats::stats_lines;
pub use timeline::{render_full, render_prefix, LogView};
