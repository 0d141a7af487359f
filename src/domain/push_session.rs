use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::domain::endpoint::Endpoint;
use crate::domain::reading::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimestampMs(pub i64);

impl TimestampMs {
    pub fn to_rfc3339(self) -> String {
        let datetime = DateTime::<Utc>::from_timestamp_millis(self.0)
            .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
        datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

pub trait Clock {
    fn now(&self) -> TimestampMs;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered { at: TimestampMs, status: u16 },
    Failed { at: TimestampMs, message: String },
}

impl PushOutcome {
    pub fn at(&self) -> TimestampMs {
        match self {
            PushOutcome::Delivered { at, .. } | PushOutcome::Failed { at, .. } => *at,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, PushOutcome::Delivered { .. })
    }
}

/// State of one push loop. Handed out as a snapshot; only the scheduler
/// mutates the live copy.
#[derive(Debug, Clone, PartialEq)]
pub struct PushSession {
    pub session_id: Option<Uuid>,
    pub running: bool,
    pub interval_ms: u64,
    pub endpoint: Option<Endpoint>,
    pub last_reading: Option<Reading>,
    pub last_result: Option<PushOutcome>,
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl PushSession {
    pub fn idle() -> Self {
        Self {
            session_id: None,
            running: false,
            interval_ms: 0,
            endpoint: None,
            last_reading: None,
            last_result: None,
            dispatched: 0,
            delivered: 0,
            failed: 0,
        }
    }

    pub fn begin(session_id: Uuid, endpoint: Endpoint, interval_ms: u64) -> Self {
        Self {
            session_id: Some(session_id),
            running: true,
            interval_ms,
            endpoint: Some(endpoint),
            ..Self::idle()
        }
    }

    pub fn is_current(&self, session_id: Uuid) -> bool {
        self.running && self.session_id == Some(session_id)
    }

    pub fn record_dispatch(&mut self, reading: Reading) {
        self.last_reading = Some(reading);
        self.dispatched += 1;
    }

    pub fn record_outcome(&mut self, outcome: PushOutcome) {
        if outcome.is_delivered() {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
        self.last_result = Some(outcome);
    }

    pub fn halt(&mut self) {
        self.running = false;
    }
}

impl Default for PushSession {
    fn default() -> Self {
        Self::idle()
    }
}
