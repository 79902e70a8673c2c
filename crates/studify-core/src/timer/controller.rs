//! Focus timer controller.
//!
//! A tick-driven state machine over [`TimerMode`]. It owns no threads and no
//! timers: the driver delivers one `tick()` per elapsed second while the
//! timer runs, and stops delivering as soon as `is_running()` turns false.
//!
//! ## Mode sequence
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... -> Focus (every 4th) -> LongBreak -> Focus
//! ```
//!
//! Completing a focus interval that was started counts it and writes one
//! [`SessionLog`] to the sink. Skipping or resetting never does either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::mode::{TimerDurations, TimerMode};
use super::view::TimerView;
use crate::events::Event;
use crate::session::{SessionLog, SessionLogSink};

/// Mutable timer state. Only the controller changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_secs: u32,
    pub is_running: bool,
    pub completed_focus_count: u32,
    /// Set while a started focus interval is neither completed nor reset.
    pub active_session_started_at: Option<DateTime<Utc>>,
    pub subject_label: String,
}

impl TimerState {
    fn fresh(durations: &TimerDurations) -> Self {
        Self {
            mode: TimerMode::Focus,
            remaining_secs: durations.duration(TimerMode::Focus),
            is_running: false,
            completed_focus_count: 0,
            active_session_started_at: None,
            subject_label: String::new(),
        }
    }
}

pub struct FocusController<S, C> {
    durations: TimerDurations,
    user_id: String,
    state: TimerState,
    sink: S,
    clock: C,
}

impl<S: SessionLogSink, C: Clock> FocusController<S, C> {
    /// Create a controller in `Focus` mode, idle, with a full interval.
    ///
    /// `user_id` is stamped on every session log this controller emits.
    pub fn new(durations: TimerDurations, user_id: impl Into<String>, sink: S, clock: C) -> Self {
        let state = TimerState::fresh(&durations);
        Self {
            durations,
            user_id: user_id.into(),
            state,
            sink,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn durations(&self) -> &TimerDurations {
        &self.durations
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.durations.duration(self.state.mode)
    }

    pub fn view(&self) -> TimerView {
        TimerView::build(
            &self.durations,
            self.state.mode,
            self.state.remaining_secs,
            self.state.is_running,
            self.state.completed_focus_count,
            &self.state.subject_label,
        )
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            view: self.view(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            tracing::debug!(mode = ?self.state.mode, "start ignored: already running");
            return None;
        }
        let now = self.clock.now();
        let fresh = self.state.remaining_secs == self.total_secs();
        if self.state.mode == TimerMode::Focus && fresh {
            self.state.active_session_started_at = Some(now);
        }
        self.state.is_running = true;

        let mode = self.state.mode;
        let remaining_secs = self.state.remaining_secs;
        if fresh {
            Some(Event::TimerStarted {
                mode,
                remaining_secs,
                at: now,
            })
        } else {
            Some(Event::TimerResumed {
                mode,
                remaining_secs,
                at: now,
            })
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            tracing::debug!(mode = ?self.state.mode, "pause ignored: not running");
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Start when idle, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Advance by one elapsed second. Returns the completion events when the
    /// interval reaches zero.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.is_running {
            tracing::debug!("tick ignored: not running");
            return Vec::new();
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            return self.complete();
        }
        Vec::new()
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state.remaining_secs = self.total_secs();
        self.state.is_running = false;
        self.state.active_session_started_at = None;
        Some(Event::TimerReset {
            mode: self.state.mode,
            at: self.clock.now(),
        })
    }

    /// Move to the next mode without counting or logging the current interval.
    pub fn skip(&mut self) -> Option<Event> {
        let from = self.state.mode;
        let to = match from {
            TimerMode::Focus => self
                .durations
                .break_after(self.state.completed_focus_count.saturating_add(1)),
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
        };
        self.switch_mode(to);
        Some(Event::TimerSkipped {
            from,
            to,
            at: self.clock.now(),
        })
    }

    /// Manually pick a mode. Rejected while the timer runs.
    pub fn select_mode(&mut self, mode: TimerMode) -> Option<Event> {
        if self.state.is_running {
            tracing::debug!(?mode, "mode selection ignored: timer running");
            return None;
        }
        Some(self.switch_mode(mode))
    }

    pub fn set_subject_label(&mut self, subject: impl Into<String>) -> Option<Event> {
        self.state.subject_label = subject.into();
        Some(Event::SubjectChanged {
            subject: self.state.subject_label.clone(),
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let finished = self.state.mode;
        let mut events = Vec::with_capacity(3);

        let next = match finished {
            TimerMode::Focus => {
                self.state.completed_focus_count += 1;
                events.push(Event::TimerCompleted {
                    mode: finished,
                    completed_focus_count: self.state.completed_focus_count,
                    at: now,
                });
                if let Some(started_at) = self.state.active_session_started_at.take() {
                    events.push(self.emit_log(started_at, now));
                }
                self.durations.break_after(self.state.completed_focus_count)
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                events.push(Event::TimerCompleted {
                    mode: finished,
                    completed_focus_count: self.state.completed_focus_count,
                    at: now,
                });
                TimerMode::Focus
            }
        };

        tracing::info!(
            finished = ?finished,
            next = ?next,
            completed = self.state.completed_focus_count,
            "interval completed"
        );
        events.push(self.switch_mode(next));
        events
    }

    fn emit_log(&self, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Event {
        let subject = if self.state.subject_label.is_empty() {
            None
        } else {
            Some(self.state.subject_label.clone())
        };
        let log = SessionLog {
            user_id: self.user_id.clone(),
            subject,
            duration_minutes: self.durations.focus_minutes(),
            started_at,
            completed_at,
            was_completed: true,
        };
        match self.sink.write(&log) {
            Ok(()) => Event::SessionLogged {
                log,
                at: completed_at,
            },
            Err(error) => {
                tracing::warn!(%error, "failed to write session log");
                Event::SessionLogFailed {
                    log,
                    error: error.to_string(),
                    at: completed_at,
                }
            }
        }
    }

    fn switch_mode(&mut self, mode: TimerMode) -> Event {
        let from = self.state.mode;
        self.state.mode = mode;
        self.state.remaining_secs = self.durations.duration(mode);
        self.state.is_running = false;
        self.state.active_session_started_at = None;
        Event::ModeSwitched {
            from,
            to: mode,
            duration_secs: self.state.remaining_secs,
            at: self.clock.now(),
        }
    }
}
