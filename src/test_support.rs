use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use crate::adapters::esp_http::{PublishError, Publisher, ResponseSummary};
use crate::domain::endpoint::Endpoint;
use crate::domain::push_session::{Clock, PushSession, TimestampMs};
use crate::domain::reading::Reading;
use crate::domain::telemetry::TelemetrySource;

/// Clock that advances one second per call.
#[derive(Debug, Default)]
pub struct SteppingClock {
    next: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> TimestampMs {
        TimestampMs(self.next.fetch_add(1_000, Ordering::Relaxed))
    }
}

/// Source whose level field carries the sample index, and which tracks how
/// many `sample` calls overlap.
#[derive(Debug, Default)]
pub struct CountingSource {
    samples: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    sample_delay: Duration,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_delay(sample_delay: Duration) -> Self {
        Self {
            sample_delay,
            ..Self::default()
        }
    }

    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl TelemetrySource for CountingSource {
    fn sample(&self) -> Reading {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        if !self.sample_delay.is_zero() {
            thread::sleep(self.sample_delay);
        }
        let index = self.samples.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);

        Reading::new(index as i32, 1_000, -200, -250)
    }
}

/// Publisher with an injectable delay that fails on chosen call indexes.
#[derive(Debug, Default)]
pub struct FakePublisher {
    delay: Duration,
    failing_calls: HashSet<usize>,
    calls: AtomicUsize,
    sent: Mutex<Vec<(Endpoint, Reading)>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.failing_calls = calls.iter().copied().collect();
        self
    }

    pub fn sent(&self) -> Vec<(Endpoint, Reading)> {
        self.sent.lock().expect("sent lock should be available").clone()
    }
}

impl Publisher for FakePublisher {
    fn send(&self, endpoint: &Endpoint, reading: &Reading) -> Result<ResponseSummary, PublishError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.sent
            .lock()
            .expect("sent lock should be available")
            .push((endpoint.clone(), *reading));

        if self.failing_calls.contains(&call) {
            return Err(PublishError::Unreachable("connection refused".to_string()));
        }

        Ok(ResponseSummary {
            status: 200,
            body: "OK".to_string(),
        })
    }
}

pub fn endpoint(host: &str) -> Endpoint {
    Endpoint::parse(host).expect("test endpoint should parse")
}

/// Returns an observer closure that forwards every tick over a channel.
pub fn channel_observer() -> (
    impl Fn(&Reading, &PushSession) + Send + Sync + 'static,
    mpsc::Receiver<(Reading, PushSession)>,
) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let observer = move |reading: &Reading, session: &PushSession| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send((*reading, session.clone()));
        }
    };
    (observer, rx)
}

pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `action` with a plain-text subscriber on the current thread and
/// returns what it logged.
pub fn capture_logs(action: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, action);

    let bytes = buffer.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
