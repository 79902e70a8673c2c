use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Focus,
    #[serde(rename = "short", alias = "short_break")]
    ShortBreak,
    #[serde(rename = "long", alias = "long_break")]
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Focus, TimerMode::ShortBreak, TimerMode::LongBreak];

    /// Human-readable label shown on the mode tabs.
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(TimerMode::Focus),
            "short" | "short_break" | "short-break" => Ok(TimerMode::ShortBreak),
            "long" | "long_break" | "long-break" => Ok(TimerMode::LongBreak),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// Configured length of each mode, in seconds, plus the long-break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDurations {
    pub focus_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    /// Every n-th completed focus interval is followed by a long break.
    pub long_break_every: u32,
}

impl TimerDurations {
    /// Build a validated set of durations.
    ///
    /// # Errors
    /// Returns an error if any duration or the long-break cadence is zero.
    pub fn new(
        focus_secs: u32,
        short_break_secs: u32,
        long_break_secs: u32,
        long_break_every: u32,
    ) -> Result<Self, ValidationError> {
        let durations = Self {
            focus_secs,
            short_break_secs,
            long_break_secs,
            long_break_every,
        };
        durations.validate()?;
        Ok(durations)
    }

    /// # Errors
    /// Returns the first field that is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("focus_secs", self.focus_secs),
            ("short_break_secs", self.short_break_secs),
            ("long_break_secs", self.long_break_secs),
            ("long_break_every", self.long_break_every),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn duration(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_secs,
            TimerMode::ShortBreak => self.short_break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }

    /// Whole minutes of one focus interval, as written to session logs.
    pub fn focus_minutes(&self) -> u32 {
        self.focus_secs / 60
    }

    /// Break that follows the `completed`-th focus interval.
    pub fn break_after(&self, completed: u32) -> TimerMode {
        if completed % self.long_break_every == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            long_break_every: 4,
        }
    }
}
