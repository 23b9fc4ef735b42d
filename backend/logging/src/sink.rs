//! External sink: best-effort forwarding of entries to a remote collector.
//!
//! `forward` never blocks and never fails into the caller. Failed deliveries
//! are counted and dropped; nothing is logged back into the facade.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::debug;
use uarwatch_core::LogEntry;

/// Default per-request timeout for the HTTP sink.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Deliveries allowed in flight at once; entries beyond it are dropped.
pub const DEFAULT_SINK_MAX_IN_FLIGHT: usize = 64;

pub trait LogSink: Send + Sync {
    fn name(&self) -> &str;

    /// Hand `entry` to the remote side. Must return immediately.
    fn forward(&self, entry: Arc<LogEntry>);
}

/// Sink used when no endpoint is configured.
#[derive(Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn name(&self) -> &str {
        "noop"
    }

    fn forward(&self, _entry: Arc<LogEntry>) {}
}

/// POSTs each entry as JSON on a spawned tokio task, with a cap on
/// concurrent deliveries.
pub struct HttpSink {
    client: Client,
    endpoint: String,
    in_flight: Arc<Semaphore>,
    dropped: Arc<AtomicU64>,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            in_flight: Arc::new(Semaphore::new(DEFAULT_SINK_MAX_IN_FLIGHT)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.in_flight = Arc::new(Semaphore::new(max));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Entries that could not be delivered.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn forward(&self, entry: Arc<LogEntry>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let Ok(permit) = self.in_flight.clone().try_acquire_owned() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let request = self.client.post(&self.endpoint).json(entry.as_ref());
        let dropped = self.dropped.clone();
        let process_id = entry.process_id.clone();
        runtime.spawn(async move {
            let _permit = permit;
            let delivered = match request.send().await {
                Ok(resp) => resp.status().is_success(),
                Err(e) => {
                    debug!(process_id = %process_id, "Audit sink delivery failed: {e}");
                    false
                }
            };
            if !delivered {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
        });
    }
}

/// Keeps forwarded entries in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Arc<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Arc<LogEntry>> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn forward(&self, entry: Arc<LogEntry>) {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

/// Build the sink for an optional endpoint; no endpoint means no-op.
pub fn sink_for(endpoint: Option<&str>, timeout: Duration) -> Arc<dyn LogSink> {
    match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
        Some(endpoint) => Arc::new(HttpSink::new(endpoint, timeout)),
        None => Arc::new(NoopSink),
    }
}
