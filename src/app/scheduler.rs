use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::adapters::esp_http::Publisher;
use crate::domain::endpoint::Endpoint;
use crate::domain::push_session::{Clock, PushOutcome, PushSession};
use crate::domain::reading::Reading;
use crate::domain::telemetry::TelemetrySource;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("push session lock poisoned")]
    StatePoisoned,
    #[error("push interval must be greater than zero")]
    ZeroInterval,
    #[error("failed to spawn push timer: {0}")]
    TimerSpawn(#[source] std::io::Error),
}

/// Receives every completed tick. Called from publish worker threads.
pub trait SessionObserver: Send + Sync + 'static {
    fn on_tick(&self, reading: &Reading, session: &PushSession);
}

impl<F> SessionObserver for F
where
    F: Fn(&Reading, &PushSession) + Send + Sync + 'static,
{
    fn on_tick(&self, reading: &Reading, session: &PushSession) {
        self(reading, session)
    }
}

struct Shared<S, P, Cl> {
    source: S,
    publisher: P,
    clock: Cl,
    session: Mutex<PushSession>,
    observer: Mutex<Option<Arc<dyn SessionObserver>>>,
}

struct Timer {
    // Dropping the sender wakes and terminates the timer thread.
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives `sample -> publish` on a fixed delay. Publishes run on their own
/// worker threads so a hung endpoint never delays the next tick.
pub struct PushScheduler<S, P, Cl> {
    shared: Arc<Shared<S, P, Cl>>,
    timer: Mutex<Option<Timer>>,
}

impl<S, P, Cl> PushScheduler<S, P, Cl>
where
    S: TelemetrySource,
    P: Publisher,
    Cl: Clock + Send + Sync + 'static,
{
    pub fn new(source: S, publisher: P, clock: Cl) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                publisher,
                clock,
                session: Mutex::new(PushSession::idle()),
                observer: Mutex::new(None),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Starts the loop with the first tick fired immediately. When already
    /// running, only the endpoint is replaced; the timer keeps its interval.
    pub fn start(&self, endpoint: Endpoint, interval_ms: u64) -> Result<(), SchedulerError> {
        if interval_ms == 0 {
            return Err(SchedulerError::ZeroInterval);
        }

        let mut timer = self
            .timer
            .lock()
            .map_err(|_| SchedulerError::StatePoisoned)?;

        if timer.is_some() {
            return self.update_endpoint(endpoint);
        }

        let session_id = Uuid::new_v4();
        *self.shared.lock_session()? = PushSession::begin(session_id, endpoint.clone(), interval_ms);

        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let interval = Duration::from_millis(interval_ms);
        let spawned = thread::Builder::new()
            .name("push-timer".to_string())
            .spawn(move || run_timer(shared, session_id, interval, stop_rx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(error) => {
                self.shared.lock_session()?.halt();
                return Err(SchedulerError::TimerSpawn(error));
            }
        };
        *timer = Some(Timer { stop_tx, handle });

        tracing::info!(
            session_id = %session_id,
            endpoint = %endpoint,
            interval_ms,
            "push loop started"
        );

        Ok(())
    }

    /// Takes one sample outside the loop, for display.
    pub fn sample_now(&self) -> Reading {
        self.shared.source.sample()
    }
}

impl<S, P, Cl> PushScheduler<S, P, Cl> {
    /// Cancels future ticks. Requests already dispatched run to completion and
    /// their results are discarded. No-op when idle.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut timer = self
            .timer
            .lock()
            .map_err(|_| SchedulerError::StatePoisoned)?;

        let Some(running) = timer.take() else {
            return Ok(());
        };

        let session_id = {
            let mut session = self.shared.lock_session()?;
            session.halt();
            session.session_id
        };

        drop(running.stop_tx);
        if running.handle.join().is_err() {
            tracing::warn!("push timer thread panicked");
        }

        match session_id {
            Some(session_id) => tracing::info!(session_id = %session_id, "push loop stopped"),
            None => tracing::info!("push loop stopped"),
        }
        Ok(())
    }

    /// Replaces the target for subsequent ticks.
    pub fn update_endpoint(&self, endpoint: Endpoint) -> Result<(), SchedulerError> {
        let mut session = self.shared.lock_session()?;
        tracing::info!(
            previous = ?session.endpoint.as_ref().map(ToString::to_string),
            endpoint = %endpoint,
            "push endpoint updated"
        );
        session.endpoint = Some(endpoint);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<PushSession, SchedulerError> {
        Ok(self.shared.lock_session()?.clone())
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .lock_session()
            .map(|session| session.running)
            .unwrap_or(false)
    }

    /// Installs the tick observer, replacing any previous one.
    pub fn set_observer(&self, observer: impl SessionObserver) {
        let observer: Arc<dyn SessionObserver> = Arc::new(observer);
        *self.shared.lock_observer() = Some(observer);
    }

    pub fn clear_observer(&self) {
        *self.shared.lock_observer() = None;
    }
}

impl<S, P, Cl> Drop for PushScheduler<S, P, Cl> {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            tracing::warn!(error = %error, "failed to stop push loop on drop");
        }
    }
}

impl<S, P, Cl> Shared<S, P, Cl> {
    fn lock_session(&self) -> Result<MutexGuard<'_, PushSession>, SchedulerError> {
        self.session
            .lock()
            .map_err(|_| SchedulerError::StatePoisoned)
    }

    fn lock_observer(&self) -> MutexGuard<'_, Option<Arc<dyn SessionObserver>>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, session_id: Uuid, reading: Reading, outcome: PushOutcome) {
        let snapshot = {
            let Ok(mut session) = self.lock_session() else {
                tracing::warn!("push session lock poisoned; dropping publish result");
                return;
            };
            if !session.is_current(session_id) {
                tracing::debug!(session_id = %session_id, "discarding result of stopped session");
                return;
            }
            session.record_outcome(outcome);
            session.clone()
        };

        let observer = self.lock_observer().clone();
        if let Some(observer) = observer {
            observer.on_tick(&reading, &snapshot);
        }
    }
}

impl<S, P, Cl> Shared<S, P, Cl>
where
    S: TelemetrySource,
    P: Publisher,
    Cl: Clock + Send + Sync + 'static,
{
    /// Synchronous part of a tick. Returns false once the session is gone.
    fn tick(self: &Arc<Self>, session_id: Uuid) -> bool {
        let reading = self.source.sample();

        let endpoint = {
            let Ok(mut session) = self.lock_session() else {
                tracing::error!("push session lock poisoned; timer exiting");
                return false;
            };
            if !session.is_current(session_id) {
                return false;
            }
            let Some(endpoint) = session.endpoint.clone() else {
                return false;
            };
            session.record_dispatch(reading);
            endpoint
        };

        tracing::debug!(
            endpoint = %endpoint,
            battery_level = reading.level_percent,
            charge_counter = reading.charge_counter_micro_ah,
            current_avg = reading.avg_current_micro_a,
            current_now = reading.now_current_micro_a,
            "dispatching reading"
        );

        let shared = Arc::clone(self);
        let worker_endpoint = endpoint.clone();
        let spawned = thread::Builder::new()
            .name("push-publish".to_string())
            .spawn(move || shared.publish(session_id, worker_endpoint, reading));

        if let Err(error) = spawned {
            tracing::warn!(endpoint = %endpoint, error = %error, "failed to spawn publish worker");
            self.complete(
                session_id,
                reading,
                PushOutcome::Failed {
                    at: self.clock.now(),
                    message: format!("publish worker unavailable: {error}"),
                },
            );
        }

        true
    }

    fn publish(&self, session_id: Uuid, endpoint: Endpoint, reading: Reading) {
        let outcome = match self.publisher.send(&endpoint, &reading) {
            Ok(summary) => PushOutcome::Delivered {
                at: self.clock.now(),
                status: summary.status,
            },
            Err(error) => {
                tracing::warn!(endpoint = %endpoint, error = %error, "reading delivery failed");
                PushOutcome::Failed {
                    at: self.clock.now(),
                    message: error.to_string(),
                }
            }
        };

        self.complete(session_id, reading, outcome);
    }
}

fn run_timer<S, P, Cl>(
    shared: Arc<Shared<S, P, Cl>>,
    session_id: Uuid,
    interval: Duration,
    stop_rx: Receiver<()>,
) where
    S: TelemetrySource,
    P: Publisher,
    Cl: Clock + Send + Sync + 'static,
{
    loop {
        if !shared.tick(session_id) {
            break;
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::debug!(session_id = %session_id, "push timer exited");
}
