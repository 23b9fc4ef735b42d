//! Session, process and sequence identifiers.
//!
//! The session id is generated once per facade. Process ids are date-scoped
//! (`<YYYYMMDD><seq5>`) but the counter behind them runs for the lifetime of
//! the generator and does not reset when the local date rolls over.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Local};
use uuid::Uuid;

/// Width of the rendered sequence field.
const PROCESS_SEQ_MODULUS: u64 = 100_000;

/// Upper bound (exclusive) of the random offset in sequence numbers.
const SEQUENCE_RANDOM_SPAN: u64 = 1_000;

/// Source of wall-clock time for identifiers and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to an explicit instant; tests move it by hand.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: RwLock::new(now) }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Produces the identifiers stamped on every entry.
pub struct IdGenerator {
    clock: Arc<dyn Clock>,
    process_counter: AtomicU64,
}

impl IdGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            process_counter: AtomicU64::new(1),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// `session_<epoch-millis>_<9 random hex chars>`.
    pub fn new_session_id(&self) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "session_{}_{}",
            self.clock.now().timestamp_millis(),
            &random[..9]
        )
    }

    /// `<YYYYMMDD><seq5>`; the counter is monotonic for the generator's lifetime.
    pub fn next_process_id(&self) -> String {
        let seq = self.process_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{:05}",
            self.clock.now().format("%Y%m%d"),
            seq % PROCESS_SEQ_MODULUS
        )
    }

    /// Current time in millis scaled by 1000 plus a random offset below 1000.
    ///
    /// Unique in practice, not strictly monotonic.
    pub fn next_sequence_no(&self) -> u64 {
        let millis = self.clock.now().timestamp_millis().max(0) as u64;
        let offset = (Uuid::new_v4().as_u128() % SEQUENCE_RANDOM_SPAN as u128) as u64;
        millis * SEQUENCE_RANDOM_SPAN + offset
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
