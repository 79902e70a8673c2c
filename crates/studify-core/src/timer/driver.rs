//! Async driver for a [`FocusController`].
//!
//! One task owns the controller. It waits on caller commands and, only while
//! the controller is running, on a tick subscription. The subscription is
//! re-synchronised after every transition, so a pause, reset, skip or
//! completion drops it before the loop can poll it again.

use std::future;

use tokio::sync::{mpsc, oneshot};

use super::clock::{Clock, TickSource, TickSubscription};
use super::controller::FocusController;
use super::mode::TimerMode;
use super::view::TimerView;
use crate::events::Event;
use crate::session::SessionLogSink;

/// Caller-facing operations, delivered over a channel.
#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    Skip,
    SelectMode(TimerMode),
    SetSubject(String),
    /// Emit a `StateSnapshot` event.
    Status,
    /// Reply with the current view.
    View(oneshot::Sender<TimerView>),
}

pub struct FocusSession<S, C> {
    controller: FocusController<S, C>,
    ticks: TickSource,
    subscription: Option<TickSubscription>,
}

impl<S: SessionLogSink, C: Clock> FocusSession<S, C> {
    pub fn new(controller: FocusController<S, C>, ticks: TickSource) -> Self {
        Self {
            controller,
            ticks,
            subscription: None,
        }
    }

    pub fn controller(&self) -> &FocusController<S, C> {
        &self.controller
    }

    pub fn is_ticking(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply one command and keep the tick subscription in step with the
    /// controller.
    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let c = &mut self.controller;
        let events: Vec<Event> = match command {
            Command::Start => c.start().into_iter().collect(),
            Command::Pause => c.pause().into_iter().collect(),
            Command::Toggle => c.toggle().into_iter().collect(),
            Command::Reset => c.reset().into_iter().collect(),
            Command::Skip => c.skip().into_iter().collect(),
            Command::SelectMode(mode) => c.select_mode(mode).into_iter().collect(),
            Command::SetSubject(subject) => c.set_subject_label(subject).into_iter().collect(),
            Command::Status => vec![c.snapshot()],
            Command::View(reply) => {
                let _ = reply.send(c.view());
                Vec::new()
            }
        };
        self.sync_ticks();
        events
    }

    /// Deliver one elapsed tick.
    pub fn on_tick(&mut self) -> Vec<Event> {
        let events = self.controller.tick();
        self.sync_ticks();
        events
    }

    fn sync_ticks(&mut self) {
        match (self.controller.is_running(), self.subscription.is_some()) {
            (true, false) => {
                self.subscription = Some(self.ticks.subscribe());
            }
            (false, true) => {
                if let Some(sub) = self.subscription.take() {
                    sub.cancel();
                }
            }
            _ => {}
        }
    }

    /// Run until the command channel closes. Returns the controller so the
    /// caller can inspect the final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::UnboundedSender<Event>,
    ) -> FocusController<S, C> {
        loop {
            let wake = tokio::select! {
                biased;
                command = commands.recv() => Wake::Command(command),
                _ = next_tick(&mut self.subscription) => Wake::Tick,
            };
            let produced = match wake {
                Wake::Command(Some(command)) => self.apply(command),
                Wake::Command(None) => break,
                Wake::Tick => self.on_tick(),
            };
            for event in produced {
                if events.send(event).is_err() {
                    tracing::debug!("event receiver dropped");
                }
            }
        }
        if let Some(sub) = self.subscription.take() {
            sub.cancel();
        }
        self.controller
    }
}

enum Wake {
    Command(Option<Command>),
    Tick,
}

async fn next_tick(subscription: &mut Option<TickSubscription>) {
    match subscription {
        Some(sub) => sub.tick().await,
        None => future::pending::<()>().await,
    }
}
