//! Timed step-through of a fetched report.
//!
//! [`PlaybackController`] is the state machine; [`spawn_playback`] drives it from a tokio
//! interval and hands back a [`PlaybackHandle`] that can be cancelled or awaited.
//! Dropping the handle cancels the playback.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::report::Report;
use crate::scene::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no report to replay")]
    NoReport,
    #[error("report timeline is empty")]
    EmptyTimeline,
    #[error("playback interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOutcome {
    pub state: PlaybackState,
    pub cursor: usize,
}

/// Cursor over `timeline`, one frame per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackController {
    state: PlaybackState,
    cursor: usize,
    frames: usize,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            cursor: 0,
            frames: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn outcome(&self) -> PlaybackOutcome {
        PlaybackOutcome {
            state: self.state,
            cursor: self.cursor,
        }
    }

    /// Reset to frame 0. Restarts when already running. Returns the first cursor to render.
    pub fn start(&mut self, report: Option<&Report>) -> Result<usize, PlaybackError> {
        let report = report.ok_or(PlaybackError::NoReport)?;
        if report.timeline.is_empty() {
            return Err(PlaybackError::EmptyTimeline);
        }
        self.frames = report.frame_count();
        self.cursor = 0;
        self.state = if self.frames == 1 {
            PlaybackState::Complete
        } else {
            PlaybackState::Running
        };
        Ok(self.cursor)
    }

    /// Advance one frame. Returns the new cursor, or `None` when not running.
    pub fn tick(&mut self) -> Option<usize> {
        if self.state != PlaybackState::Running {
            return None;
        }
        self.cursor += 1;
        if self.cursor + 1 >= self.frames {
            self.state = PlaybackState::Complete;
        }
        Some(self.cursor)
    }

    /// Stop a running playback, leaving the cursor in place. Returns whether it was running.
    pub fn cancel(&mut self) -> bool {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Cancelled;
            true
        } else {
            false
        }
    }
}

pub struct PlaybackHandle {
    cancel: Option<oneshot::Sender<()>>,
    progress: watch::Receiver<PlaybackOutcome>,
    task: JoinHandle<PlaybackOutcome>,
}

impl PlaybackHandle {
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Latest state and cursor published by the task.
    pub fn progress(&self) -> PlaybackOutcome {
        *self.progress.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> PlaybackOutcome {
        let PlaybackHandle {
            cancel: _cancel,
            progress,
            task,
        } = self;
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "playback task aborted");
                let last = *progress.borrow();
                PlaybackOutcome {
                    state: PlaybackState::Cancelled,
                    cursor: last.cursor,
                }
            }
        }
    }
}

/// Render frame 0 immediately, then one frame per `interval` until the last entry.
///
/// A render error stops the playback as cancelled. Once `cancel` has been sent no further
/// frame is rendered, even when a tick is already due.
pub fn spawn_playback<F>(
    report: Arc<Report>,
    interval: Duration,
    mut on_frame: F,
) -> Result<PlaybackHandle, PlaybackError>
where
    F: FnMut(&Report, usize) -> Result<(), SceneError> + Send + 'static,
{
    if interval.is_zero() {
        return Err(PlaybackError::ZeroInterval);
    }
    let mut controller = PlaybackController::new();
    let first = controller.start(Some(&report))?;
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let (progress_tx, progress_rx) = watch::channel(controller.outcome());

    let task = tokio::spawn(async move {
        tracing::info!(frames = controller.frames(), "playback started");
        if !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty)) {
            controller.cancel();
            let _ = progress_tx.send(controller.outcome());
            return controller.outcome();
        }
        if let Err(err) = on_frame(&report, first) {
            tracing::warn!(error = %err, cursor = first, "playback frame failed");
            controller.cancel();
            let _ = progress_tx.send(controller.outcome());
            return controller.outcome();
        }

        let mut ticker = tokio::time::interval(interval);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        while controller.state() == PlaybackState::Running {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    controller.cancel();
                    tracing::info!(cursor = controller.cursor(), "playback cancelled");
                }
                _ = ticker.tick() => {
                    if !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty)) {
                        controller.cancel();
                        tracing::info!(cursor = controller.cursor(), "playback cancelled");
                    } else if let Some(cursor) = controller.tick() {
                        tracing::debug!(cursor, "playback frame");
                        if let Err(err) = on_frame(&report, cursor) {
                            tracing::warn!(error = %err, cursor, "playback frame failed");
                            controller.cancel();
                        }
                    }
                }
            }
            let _ = progress_tx.send(controller.outcome());
        }

        if controller.state() == PlaybackState::Complete {
            tracing::info!(cursor = controller.cursor(), "playback complete");
        }
        controller.outcome()
    });

    Ok(PlaybackHandle {
        cancel: Some(cancel_tx),
        progress: progress_rx,
        task,
    })
}
