//! View orchestration: calls the combat service, keeps the [`ViewState`], and pushes the
//! derived views to the [`Scene`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;

use crate::client::{parse_turns, ClientError, CombatService};
use crate::config::ViewerConfig;
use crate::playback::{spawn_playback, PlaybackError, PlaybackHandle, PlaybackOutcome};
use crate::report::Report;
use crate::scene::{Align, Color, Rect, Scene, SceneError, Widget};
use crate::view::layout::{
    BAR_HEIGHT, BAR_OFFSET, BAR_WIDTH, LABEL_OFFSET, SPRITE_HEIGHT, SPRITE_WIDTH,
};
use crate::view::stats::NO_RUN_YET;
use crate::view::{
    derive_metrics, layout_characters, pulse_alpha, render_full, render_prefix, stats_lines,
    HealthScale, LogView, NarrativeMetrics, ViewState,
};

const LOADING_TEXT: &str = "Simulating...";

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("a simulation request is already in flight")]
    Busy,
    #[error("no report has been displayed yet")]
    NoReport,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Everything a frame needs besides the report; cheap to clone into the playback task.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub scale: HealthScale,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub started: Instant,
}

impl RenderOptions {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            scale: config.health_scale(),
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            started: Instant::now(),
        }
    }
}

pub fn lock_scene<S>(scene: &Mutex<S>) -> Result<MutexGuard<'_, S>, SceneError> {
    scene.lock().map_err(|_| SceneError::Poisoned)
}

/// Sprites, health bars and name labels for one health snapshot.
pub fn draw_characters<S: Scene + ?Sized>(
    scene: &mut S,
    healths: &std::collections::BTreeMap<String, f64>,
    scale: &HealthScale,
    options: &RenderOptions,
) {
    scene.clear();
    let layout = layout_characters(healths, scale, options.canvas_width, options.canvas_height);
    let alpha = pulse_alpha(options.started.elapsed());
    for slot in &layout.slots {
        scene.push_group(slot.x, slot.y);
        scene.fill_rect(
            Rect::centered(0.0, 0.0, SPRITE_WIDTH, SPRITE_HEIGHT),
            Color::SPRITE,
        );
        let bar = Rect::new(BAR_OFFSET.0, BAR_OFFSET.1, BAR_WIDTH, BAR_HEIGHT);
        scene.fill_rect(bar, Color::BAR_BACK);
        scene.fill_rect(
            Rect::new(bar.x, bar.y, slot.bar.fill_width, BAR_HEIGHT),
            Color::BAR_FILL,
        );
        if slot.bar.low_health {
            scene.stroke_rect(bar, Color::BAR_BACK, alpha);
        }
        scene.text(0.0, LABEL_OFFSET, &slot.name, Align::Center);
        scene.pop_group();
    }
}

/// One playback frame: the snapshot after `timeline[cursor]` and the log up to it.
pub fn render_frame<S: Scene + ?Sized>(
    scene: &mut S,
    report: &Report,
    cursor: usize,
    options: &RenderOptions,
) -> Result<(), SceneError> {
    let scale = options.scale.for_report(report);
    draw_characters(scene, &report.healths_at(cursor), &scale, options);
    scene.set_widget_text(Widget::Log, &render_prefix(report, cursor).to_text());
    scene.present()
}

/// Clears the in-flight flag and hides the loading widget however the request ends,
/// including when the simulate future is dropped mid-flight.
struct InFlightGuard<S: Scene> {
    flag: Arc<AtomicBool>,
    scene: Arc<Mutex<S>>,
}

impl<S: Scene> InFlightGuard<S> {
    fn acquire(flag: &Arc<AtomicBool>, scene: &Arc<Mutex<S>>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            flag: Arc::clone(flag),
            scene: Arc::clone(scene),
        })
    }
}

impl<S: Scene> Drop for InFlightGuard<S> {
    fn drop(&mut self) {
        if let Ok(mut scene) = self.scene.lock() {
            scene.set_visible(Widget::Loading, false);
        }
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Viewer<S: Scene + Send + 'static> {
    scene: Arc<Mutex<S>>,
    config: ViewerConfig,
    options: RenderOptions,
    state: ViewState,
    in_flight: Arc<AtomicBool>,
    playback: Option<PlaybackHandle>,
    /// Bumped on every cancel; a playback task only draws while its generation is current.
    replay_generation: Arc<AtomicU64>,
}

impl<S: Scene + Send + 'static> Viewer<S> {
    /// Set up the static widgets: placeholder metrics, empty log, hidden controls.
    pub fn new(scene: S, config: ViewerConfig) -> Result<Self, ViewerError> {
        let options = RenderOptions::from_config(&config);
        let viewer = Self {
            scene: Arc::new(Mutex::new(scene)),
            config,
            options,
            state: ViewState::default(),
            in_flight: Arc::new(AtomicBool::new(false)),
            playback: None,
            replay_generation: Arc::new(AtomicU64::new(0)),
        };
        {
            let mut scene = lock_scene(&viewer.scene)?;
            scene.set_widget_text(Widget::Loading, LOADING_TEXT);
            scene.set_visible(Widget::Loading, false);
            scene.set_visible(Widget::Error, false);
            scene.set_widget_text(Widget::Metrics, NarrativeMetrics::PLACEHOLDER);
            scene.set_visible(Widget::Metrics, true);
            scene.set_widget_text(Widget::Log, &LogView::awaiting().to_text());
            scene.set_visible(Widget::Log, true);
            scene.set_widget_text(Widget::Stats, NO_RUN_YET);
            scene.set_visible(Widget::Stats, true);
            scene.set_visible(Widget::Status, true);
            scene.set_visible(Widget::LogModal, false);
            scene.set_visible(Widget::ReplayButton, false);
            scene.set_visible(Widget::ViewLogButton, false);
        }
        Ok(viewer)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `f` against the scene, e.g. to inspect what has been drawn.
    pub fn with_scene<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, ViewerError> {
        let scene = lock_scene(&self.scene)?;
        Ok(f(&scene))
    }

    pub fn present(&self) -> Result<(), ViewerError> {
        lock_scene(&self.scene)?.present()?;
        Ok(())
    }

    /// Start a simulation and display its report.
    ///
    /// Service failures are shown in the error widget and returned; the previous report
    /// and control visibility stay as they were.
    pub async fn simulate<C: CombatService>(
        &mut self,
        service: &C,
        turns_input: Option<&str>,
    ) -> Result<(), ViewerError> {
        let guard = InFlightGuard::acquire(&self.in_flight, &self.scene).ok_or_else(|| {
            tracing::warn!("simulate requested while another request is in flight");
            ViewerError::Busy
        })?;
        self.cancel_replay();

        self.state = self.state.loading();
        {
            let mut scene = lock_scene(&self.scene)?;
            scene.set_visible(Widget::Loading, true);
            scene.set_visible(Widget::Error, false);
            scene.present()?;
        }

        let turns = parse_turns(turns_input, self.config.default_turns);
        tracing::info!(turns, "starting simulation");
        let result = self.fetch(service, turns).await;
        drop(guard);

        match result {
            Ok(report) => {
                tracing::info!(
                    total_turns = report.total_turns,
                    entries = report.timeline.len(),
                    "report received"
                );
                self.display(report)?;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "simulation failed");
                self.state = self.state.failed(&err);
                let mut scene = lock_scene(&self.scene)?;
                scene.set_widget_text(Widget::Error, self.state.error.as_deref().unwrap_or(""));
                scene.set_visible(Widget::Error, true);
                scene.present()?;
                Err(err.into())
            }
        }
    }

    async fn fetch<C: CombatService>(&self, service: &C, turns: u32) -> Result<Report, ClientError> {
        let limit = self.config.request_timeout();
        with_timeout(limit, service.simulate(turns)).await?;
        with_timeout(limit, service.fetch_report()).await
    }

    /// Display a report that did not come from the service (a saved file, for instance).
    pub fn load_report(&mut self, report: Report) -> Result<(), ViewerError> {
        if self.is_in_flight() {
            return Err(ViewerError::Busy);
        }
        self.cancel_replay();
        self.display(report)
    }

    fn display(&mut self, report: Report) -> Result<(), ViewerError> {
        let report = Arc::new(report);
        self.state = self.state.displayed(Arc::clone(&report), Utc::now());

        let scale = self.options.scale.for_report(&report);
        let metrics_text = match derive_metrics(&report, self.config.low_health_threshold) {
            Ok(metrics) => metrics.panel_text(),
            Err(err) => {
                tracing::warn!(error = %err, "metrics unavailable");
                NarrativeMetrics::PLACEHOLDER.to_string()
            }
        };

        let mut scene = lock_scene(&self.scene)?;
        draw_characters(&mut *scene, &report.final_healths(), &scale, &self.options);
        let log = if report.timeline.is_empty() {
            LogView::awaiting()
        } else {
            render_prefix(&report, 0)
        };
        scene.set_widget_text(Widget::Log, &log.to_text());
        scene.set_widget_text(Widget::Metrics, &metrics_text);
        scene.set_widget_text(Widget::Stats, &stats_lines(&report).join("\n"));
        scene.set_widget_text(Widget::Status, &self.state.status_line());
        scene.set_visible(Widget::Error, false);
        scene.set_visible(Widget::ReplayButton, self.state.controls.replay_visible);
        scene.set_visible(Widget::ViewLogButton, self.state.controls.view_log_visible);
        scene.present()?;
        Ok(())
    }

    /// Full log with health snapshots, without replaying.
    pub fn show_log(&mut self) -> Result<(), ViewerError> {
        let report = self.state.report.as_ref().ok_or(ViewerError::NoReport)?;
        let log = render_full(report);
        let mut scene = lock_scene(&self.scene)?;
        scene.set_widget_text(Widget::LogModal, &log.to_text());
        scene.set_visible(Widget::LogModal, true);
        scene.present()?;
        Ok(())
    }

    pub fn close_log(&mut self) -> Result<(), ViewerError> {
        let mut scene = lock_scene(&self.scene)?;
        scene.set_visible(Widget::LogModal, false);
        scene.present()?;
        Ok(())
    }

    /// Start (or restart) playback of the current report.
    pub fn replay(&mut self) -> Result<(), ViewerError> {
        if self.is_in_flight() {
            return Err(ViewerError::Busy);
        }
        let report = self.state.report.clone().ok_or(ViewerError::NoReport)?;
        self.cancel_replay();

        let scene = Arc::clone(&self.scene);
        let options = self.options.clone();
        let current = Arc::clone(&self.replay_generation);
        let generation = current.load(Ordering::Acquire);
        let handle = spawn_playback(report, self.config.playback_interval(), move |report, cursor| {
            let mut scene = lock_scene(&scene)?;
            // Checked under the scene lock so a superseded task never draws over newer content.
            if current.load(Ordering::Acquire) != generation {
                return Ok(());
            }
            render_frame(&mut *scene, report, cursor, &options)
        })?;
        self.playback = Some(handle);
        Ok(())
    }

    /// Stop a running playback. Returns whether one was active.
    pub fn cancel_replay(&mut self) -> bool {
        self.replay_generation.fetch_add(1, Ordering::AcqRel);
        match self.playback.take() {
            Some(mut handle) => {
                let active = !handle.is_finished();
                handle.cancel();
                active
            }
            None => false,
        }
    }

    pub fn replay_progress(&self) -> Option<PlaybackOutcome> {
        self.playback.as_ref().map(PlaybackHandle::progress)
    }

    /// Wait for the current playback to finish.
    pub async fn wait_for_replay(&mut self) -> Option<PlaybackOutcome> {
        let handle = self.playback.take()?;
        Some(handle.join().await)
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl std::future::Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(limit)),
    }
}
