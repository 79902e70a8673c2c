use serde::{Deserialize, Serialize};

use super::mode::{TimerDurations, TimerMode};

/// Render-ready projection of the timer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub mode: TimerMode,
    pub mode_label: String,
    pub remaining_secs: u32,
    pub total_secs: u32,
    /// `MM:SS`; minutes are not wrapped at 60.
    pub display: String,
    /// `remaining / total`, 1.0 for a fresh interval and 0.0 when done.
    pub progress: f64,
    pub is_running: bool,
    pub completed_focus_count: u32,
    /// 1-based number of the focus interval in progress ("Pomodoro N").
    pub pomodoro_number: u32,
    pub focus_minutes_total: u32,
    pub long_breaks_taken: u32,
    pub subject: String,
}

impl TimerView {
    pub(crate) fn build(
        durations: &TimerDurations,
        mode: TimerMode,
        remaining_secs: u32,
        is_running: bool,
        completed_focus_count: u32,
        subject: &str,
    ) -> Self {
        let total_secs = durations.duration(mode);
        Self {
            mode,
            mode_label: mode.label().to_string(),
            remaining_secs,
            total_secs,
            display: format_clock(remaining_secs),
            progress: progress_fraction(remaining_secs, total_secs),
            is_running,
            completed_focus_count,
            pomodoro_number: completed_focus_count.saturating_add(1),
            focus_minutes_total: completed_focus_count.saturating_mul(durations.focus_minutes()),
            long_breaks_taken: completed_focus_count.div_ceil(durations.long_break_every.max(1)),
            subject: subject.to_string(),
        }
    }
}

/// Format seconds as zero-padded `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn progress_fraction(remaining: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    remaining as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(299), "04:59");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn progress_is_remaining_over_total() {
        assert_eq!(progress_fraction(300, 300), 1.0);
        assert_eq!(progress_fraction(150, 300), 0.5);
        assert_eq!(progress_fraction(0, 300), 0.0);
        assert_eq!(progress_fraction(0, 0), 0.0);
    }

    #[test]
    fn derived_counters() {
        let d = TimerDurations::default();
        let view = TimerView::build(&d, TimerMode::ShortBreak, 300, false, 5, "Math");
        assert_eq!(view.pomodoro_number, 6);
        assert_eq!(view.focus_minutes_total, 125);
        assert_eq!(view.long_breaks_taken, 2);
        assert_eq!(view.mode_label, "Short Break");
        assert_eq!(view.display, "05:00");

        let fresh = TimerView::build(&d, TimerMode::Focus, 1500, false, 0, "");
        assert_eq!(fresh.long_breaks_taken, 0);
        assert_eq!(fresh.pomodoro_number, 1);
    }
}
