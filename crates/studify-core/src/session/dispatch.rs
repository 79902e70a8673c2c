//! Background hand-off of session logs to an async store.
//!
//! The timer must never wait on the network. [`SinkDispatcher`] accepts a
//! record by queueing it and returns; a spawned task performs the write and
//! reports the outcome on a side channel.

use std::future::Future;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{SessionLog, SessionLogSink};
use crate::error::SinkError;
use crate::events::Event;

/// An async backend that stores session logs.
pub trait SessionStore: Send + Sync + 'static {
    fn insert_session(
        &self,
        log: &SessionLog,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Fire-and-forget sink in front of a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SinkDispatcher {
    tx: mpsc::UnboundedSender<SessionLog>,
}

impl SinkDispatcher {
    /// Spawn the writer task on the current runtime.
    ///
    /// Each record produces exactly one report: `SessionStored` or
    /// `SessionLogFailed`. Failed writes are not retried. The task ends once
    /// every dispatcher clone has been dropped and the queue is drained.
    pub fn spawn<S: SessionStore>(
        store: S,
        reports: mpsc::UnboundedSender<Event>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionLog>();
        let handle = tokio::spawn(async move {
            while let Some(log) = rx.recv().await {
                let event = match store.insert_session(&log).await {
                    Ok(()) => {
                        tracing::info!(user = %log.user_id, "session log stored");
                        Event::SessionStored {
                            log,
                            at: Utc::now(),
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "session log write failed");
                        Event::SessionLogFailed {
                            log,
                            error: error.to_string(),
                            at: Utc::now(),
                        }
                    }
                };
                // Nobody listening is fine.
                let _ = reports.send(event);
            }
        });
        (Self { tx }, handle)
    }
}

impl SessionLogSink for SinkDispatcher {
    fn write(&self, log: &SessionLog) -> Result<(), SinkError> {
        self.tx.send(log.clone()).map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStore {
        fail: bool,
        written: Arc<Mutex<Vec<SessionLog>>>,
    }

    impl SessionStore for MemoryStore {
        async fn insert_session(&self, log: &SessionLog) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Unreachable("connection refused".into()));
            }
            self.written.lock().unwrap().push(log.clone());
            Ok(())
        }
    }

    fn sample_log() -> SessionLog {
        let now = Utc::now();
        SessionLog {
            user_id: "user-1".into(),
            subject: Some("Physics".into()),
            duration_minutes: 25,
            started_at: now,
            completed_at: now,
            was_completed: true,
        }
    }

    #[tokio::test]
    async fn stored_logs_are_reported() {
        let store = MemoryStore::default();
        let (reports_tx, mut reports) = mpsc::unbounded_channel();
        let (sink, handle) = SinkDispatcher::spawn(store.clone(), reports_tx);

        sink.write(&sample_log()).unwrap();
        drop(sink);
        handle.await.unwrap();

        assert_eq!(store.written.lock().unwrap().len(), 1);
        assert!(matches!(reports.recv().await, Some(Event::SessionStored { .. })));
    }

    #[tokio::test]
    async fn failed_write_is_reported_not_retried() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let (reports_tx, mut reports) = mpsc::unbounded_channel();
        let (sink, handle) = SinkDispatcher::spawn(store.clone(), reports_tx);

        assert!(sink.write(&sample_log()).is_ok());
        drop(sink);
        handle.await.unwrap();

        match reports.recv().await {
            Some(Event::SessionLogFailed { error, .. }) => {
                assert!(error.contains("unreachable"));
            }
            other => panic!("Expected SessionLogFailed, got {other:?}"),
        }
        assert!(reports.recv().await.is_none());
    }

    #[tokio::test]
    async fn write_after_shutdown_is_closed() {
        let (reports_tx, _reports) = mpsc::unbounded_channel();
        let (sink, handle) = SinkDispatcher::spawn(MemoryStore::default(), reports_tx);
        handle.abort();
        let _ = handle.await;
        assert_eq!(sink.write(&sample_log()), Err(SinkError::Closed));
    }
}
