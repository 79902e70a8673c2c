//! Session log records and the sinks that persist them.

mod dispatch;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

pub use dispatch::{SessionStore, SinkDispatcher};

/// One completed focus interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    pub user_id: String,
    /// What the user was studying; `None` when the label was empty.
    pub subject: Option<String>,
    pub duration_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub was_completed: bool,
}

/// Destination for completed session logs.
///
/// `write` is called synchronously from the timer. Implementations that talk
/// to slow backends must hand the record off and return immediately.
pub trait SessionLogSink {
    fn write(&self, log: &SessionLog) -> Result<(), SinkError>;
}

impl<T: SessionLogSink + ?Sized> SessionLogSink for &T {
    fn write(&self, log: &SessionLog) -> Result<(), SinkError> {
        (**self).write(log)
    }
}

impl<T: SessionLogSink + ?Sized> SessionLogSink for Box<T> {
    fn write(&self, log: &SessionLog) -> Result<(), SinkError> {
        (**self).write(log)
    }
}

impl<T: SessionLogSink + ?Sized> SessionLogSink for std::sync::Arc<T> {
    fn write(&self, log: &SessionLog) -> Result<(), SinkError> {
        (**self).write(log)
    }
}

/// Sink that drops every record. Used when no user is signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl SessionLogSink for DiscardSink {
    fn write(&self, _log: &SessionLog) -> Result<(), SinkError> {
        Ok(())
    }
}
