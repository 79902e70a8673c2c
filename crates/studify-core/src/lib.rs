//! # Studify Core Library
//!
//! Core business logic for the Studify focus timer. The CLI is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Focus controller**: a tick-driven state machine over Focus / Short
//!   Break / Long Break that writes one session log per completed focus
//!   interval
//! - **Focus session**: an async driver that owns one controller and ties
//!   its tick subscription to the running flag
//! - **Session sinks**: local SQLite storage or the hosted REST store, both
//!   behind a fire-and-forget dispatcher
//! - **Storage**: TOML configuration and SQLite session history
//! - **Remote**: client for the hosted database and the stats endpoint
//!
//! ## Key Components
//!
//! - [`FocusController`]: timer state machine
//! - [`FocusSession`]: async driver
//! - [`SessionLogSink`]: where completed sessions go
//! - [`Database`]: local session persistence and statistics
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod remote;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, RemoteError, SinkError, ValidationError};
pub use events::Event;
pub use remote::{RestClient, UserStats};
pub use session::{DiscardSink, SessionLog, SessionLogSink, SessionStore, SinkDispatcher};
pub use storage::{Config, Database, FocusStats, LocalStore};
pub use timer::{
    Clock, Command, FocusController, FocusSession, SystemClock, TickSource, TimerDurations,
    TimerMode, TimerState, TimerView,
};
