use crate::adapters::esp_http::Publisher;
use crate::app::scheduler::{PushScheduler, SchedulerError};
use crate::domain::endpoint::Endpoint;
use crate::domain::push_session::{Clock, PushSession};
use crate::domain::reading::Reading;
use crate::domain::telemetry::TelemetrySource;

pub trait PushQueryHandler {
    fn snapshot(&self) -> Result<PushSession, SchedulerError>;
    fn sample_now(&self) -> Reading;
}

pub trait PushCommandHandler {
    fn start(&self, endpoint: Endpoint, interval_ms: u64) -> Result<PushSession, SchedulerError>;
    fn stop(&self) -> Result<PushSession, SchedulerError>;
    fn update_endpoint(&self, endpoint: Endpoint) -> Result<PushSession, SchedulerError>;
}

/// Everything the control API needs from a running agent.
pub trait PushControl: PushQueryHandler + PushCommandHandler + Send + Sync {}

impl<T> PushControl for T where T: PushQueryHandler + PushCommandHandler + Send + Sync {}

impl<S, P, Cl> PushQueryHandler for PushScheduler<S, P, Cl>
where
    S: TelemetrySource,
    P: Publisher,
    Cl: Clock + Send + Sync + 'static,
{
    fn snapshot(&self) -> Result<PushSession, SchedulerError> {
        PushScheduler::snapshot(self)
    }

    fn sample_now(&self) -> Reading {
        PushScheduler::sample_now(self)
    }
}

impl<S, P, Cl> PushCommandHandler for PushScheduler<S, P, Cl>
where
    S: TelemetrySource,
    P: Publisher,
    Cl: Clock + Send + Sync + 'static,
{
    fn start(&self, endpoint: Endpoint, interval_ms: u64) -> Result<PushSession, SchedulerError> {
        PushScheduler::start(self, endpoint, interval_ms)?;
        PushScheduler::snapshot(self)
    }

    fn stop(&self) -> Result<PushSession, SchedulerError> {
        PushScheduler::stop(self)?;
        PushScheduler::snapshot(self)
    }

    fn update_endpoint(&self, endpoint: Endpoint) -> Result<PushSession, SchedulerError> {
        PushScheduler::update_endpoint(self, endpoint)?;
        PushScheduler::snapshot(self)
    }
}
