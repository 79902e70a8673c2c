use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionLog;
use crate::timer::{TimerMode, TimerView};

/// Every state change in the focus timer produces an Event.
/// The presentation layer renders from them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Started again after a pause, without resetting the interval.
    TimerResumed {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: TimerMode,
        completed_focus_count: u32,
        at: DateTime<Utc>,
    },
    /// A completed focus interval was handed to the session log sink.
    SessionLogged {
        log: SessionLog,
        at: DateTime<Utc>,
    },
    /// A background store confirmed a session log.
    SessionStored {
        log: SessionLog,
        at: DateTime<Utc>,
    },
    /// The session log could not be persisted. The timer has already advanced.
    SessionLogFailed {
        log: SessionLog,
        error: String,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    SubjectChanged {
        subject: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        view: TimerView,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerCompleted { .. } => "timer_completed",
            Event::SessionLogged { .. } => "session_logged",
            Event::SessionStored { .. } => "session_stored",
            Event::SessionLogFailed { .. } => "session_log_failed",
            Event::ModeSwitched { .. } => "mode_switched",
            Event::TimerSkipped { .. } => "timer_skipped",
            Event::TimerReset { .. } => "timer_reset",
            Event::SubjectChanged { .. } => "subject_changed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = Event::TimerReset {
            mode: TimerMode::ShortBreak,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "timer_reset");
        assert_eq!(json["mode"], "short");
        assert_eq!(event.kind(), "timer_reset");
    }
}
