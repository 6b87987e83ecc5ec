//! ProgressEmitter: counter plus repeating timer feeding a single listener.
//!
//! Each session delivers `1/100, 2/100, ..., 100/100` at a fixed 200ms
//! cadence, then one end-of-stream signal. The first value is delivered
//! synchronously from [`ProgressEmitter::start`]; the rest come from a tokio
//! task that sleeps between ticks.
//!
//! Delivery happens while the state lock is held and only after the session
//! id has been checked, so once `cancel` or `shutdown` returns the listener
//! receives nothing further even if the timer task is mid-wake.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::Stream;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::channel::{ListenArgs, StreamHandler};
use crate::error::{log_emitter_error, EmitterError};
use crate::sink::ProgressSink;
use crate::telemetry::{LifecycleBus, LifecycleEvent, LifecycleEventKind};

/// Number of progress values in a session.
pub const TOTAL_COUNT: u32 = 100;

/// Delay between consecutive ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Progress fraction delivered on tick `count`.
#[inline]
pub fn progress_fraction(count: u32) -> f64 {
    f64::from(count) / f64::from(TOTAL_COUNT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterPhase {
    Idle,
    Running,
}

/// Read-only view of the emitter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterStatus {
    pub phase: EmitterPhase,
    pub counter: u32,
    pub session: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum TickOutcome {
    Delivered,
    Completed,
    Closed(EmitterError),
    Idle,
}

struct EmitterState {
    counter: u32,
    session: u64,
    listener: Option<Box<dyn ProgressSink>>,
    timer: Option<JoinHandle<()>>,
}

impl EmitterState {
    fn new() -> Self {
        Self {
            counter: 1,
            session: 0,
            listener: None,
            timer: None,
        }
    }

    fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    fn tick(&mut self) -> TickOutcome {
        let Some(listener) = self.listener.as_ref() else {
            debug!("Tick fired with no active listener; ignoring");
            return TickOutcome::Idle;
        };

        if self.counter > TOTAL_COUNT {
            if let Err(err) = listener.end_of_stream() {
                debug!("End-of-stream not delivered: {}", err);
            }
            return TickOutcome::Completed;
        }

        let progress = progress_fraction(self.counter);
        debug!("Emitting progress {}", progress);
        if let Err(err) = listener.success(progress) {
            return TickOutcome::Closed(err);
        }
        self.counter += 1;
        TickOutcome::Delivered
    }

    /// Clears the listener and counter, handing back the timer for the
    /// caller to abort or drop.
    fn release(&mut self) -> Option<JoinHandle<()>> {
        self.listener = None;
        self.counter = 1;
        self.timer.take()
    }

    fn status(&self) -> EmitterStatus {
        EmitterStatus {
            phase: if self.is_running() {
                EmitterPhase::Running
            } else {
                EmitterPhase::Idle
            },
            counter: self.counter,
            session: self.session,
        }
    }
}

/// Emits a fixed 100-step progress sequence to one listener per session.
pub struct ProgressEmitter {
    state: Arc<Mutex<EmitterState>>,
    runtime: Handle,
    lifecycle: LifecycleBus,
}

impl ProgressEmitter {
    /// Create an emitter whose timer runs on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(EmitterState::new())),
            runtime,
            lifecycle: LifecycleBus::new(),
        }
    }

    /// Create an emitter on the runtime of the calling context.
    pub fn current() -> Result<Self, EmitterError> {
        let runtime = Handle::try_current().map_err(|err| EmitterError::RuntimeUnavailable {
            details: err.to_string(),
        })?;
        Ok(Self::new(runtime))
    }

    fn lock_recovered(&self) -> MutexGuard<'_, EmitterState> {
        lock_state(&self.state)
    }

    /// Register `sink` and begin a new session.
    ///
    /// The first value is delivered before this returns. A session that is
    /// already running is superseded: its timer is aborted and its listener
    /// released without an end-of-stream signal.
    ///
    /// A panic inside `sink` propagates to the caller; the session it was
    /// part of is discarded the next time the emitter is used.
    pub fn start<S: ProgressSink>(&self, sink: S) -> Result<u64, EmitterError> {
        let mut state = self.lock_recovered();

        if state.is_running() {
            let previous = state.session;
            warn!("Listener already active (session {}); superseding", previous);
            if let Some(timer) = state.release() {
                timer.abort();
            }
            self.lifecycle.publish(
                previous,
                LifecycleEventKind::SessionSuperseded,
                Some("replaced by a new listener".to_string()),
            );
        }

        info!("Adding listener");
        state.session += 1;
        state.counter = 1;
        state.listener = Some(Box::new(sink));
        let session = state.session;
        self.lifecycle
            .publish(session, LifecycleEventKind::SessionStarted, None);

        match state.tick() {
            TickOutcome::Delivered => {
                state.timer = Some(self.runtime.spawn(run_timer(
                    Arc::clone(&self.state),
                    session,
                    self.lifecycle.clone(),
                )));
            }
            outcome => finish_session(&mut state, session, outcome, &self.lifecycle),
        }

        Ok(session)
    }

    /// Stop the current session, if any. Idempotent.
    pub fn cancel(&self) {
        let mut state = self.lock_recovered();
        let was_running = state.is_running();
        if let Some(timer) = state.release() {
            timer.abort();
        }
        if was_running {
            info!("Cancelling listener");
            self.lifecycle
                .publish(state.session, LifecycleEventKind::SessionCancelled, None);
        }
    }

    /// Host teardown: stop the timer and drop the listener unconditionally.
    pub fn shutdown(&self) {
        let mut state = self.lock_recovered();
        if let Some(timer) = state.release() {
            timer.abort();
        }
        info!("Emitter shut down");
        self.lifecycle
            .publish(state.session, LifecycleEventKind::HostShutdown, None);
    }

    pub fn status(&self) -> EmitterStatus {
        self.lock_recovered().status()
    }

    pub fn is_running(&self) -> bool {
        self.lock_recovered().is_running()
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle.subscribe()
    }

    pub fn lifecycle_stream(&self) -> impl Stream<Item = LifecycleEvent> + Send + Unpin {
        self.lifecycle.stream()
    }
}

impl StreamHandler for ProgressEmitter {
    fn on_listen(
        &self,
        _args: ListenArgs,
        sink: Box<dyn ProgressSink>,
    ) -> Result<(), EmitterError> {
        self.start(sink).map(|_| ())
    }

    fn on_cancel(&self, _args: ListenArgs) {
        self.cancel();
    }
}

async fn run_timer(state: Arc<Mutex<EmitterState>>, session: u64, lifecycle: LifecycleBus) {
    loop {
        tokio::time::sleep(TICK_INTERVAL).await;

        let mut guard = lock_state(&state);
        if guard.session != session {
            break;
        }
        match guard.tick() {
            TickOutcome::Delivered => {}
            outcome => {
                finish_session(&mut guard, session, outcome, &lifecycle);
                break;
            }
        }
    }
}

/// Lock the emitter state, discarding a session left half-done by a
/// panicking sink.
///
/// A poisoned lock means a sink panicked mid-tick. The session it belonged to
/// is released (listener dropped, timer aborted, counter reset) and the
/// poison flag cleared, so later starts behave as on a fresh emitter.
fn lock_state(state: &Mutex<EmitterState>) -> MutexGuard<'_, EmitterState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            let mut guard = poisoned.into_inner();
            warn!(
                "Emitter state lock poisoned; discarding session {}",
                guard.session
            );
            if let Some(timer) = guard.release() {
                timer.abort();
            }
            state.clear_poison();
            guard
        }
    }
}

/// Unified cleanup for sessions that end on their own.
fn finish_session(
    state: &mut EmitterState,
    session: u64,
    outcome: TickOutcome,
    lifecycle: &LifecycleBus,
) {
    // Dropping rather than aborting: this may be the timer task itself.
    drop(state.release());
    match outcome {
        TickOutcome::Completed => {
            info!("Session {} completed", session);
            lifecycle.publish(session, LifecycleEventKind::SessionCompleted, None);
        }
        TickOutcome::Closed(err) => {
            log_emitter_error(&err, "tick");
            lifecycle.publish(
                session,
                LifecycleEventKind::SinkClosed,
                Some(err.to_string()),
            );
        }
        TickOutcome::Delivered | TickOutcome::Idle => {}
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
