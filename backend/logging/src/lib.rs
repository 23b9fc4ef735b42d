//! Audit logging pipeline for the UAR dashboard.
//!
//! `LoggingService` is the facade: it stamps ids and timestamps, sanitizes
//! details, appends to the bounded newest-first `EventStore` and forwards to
//! an optional `LogSink`. Reads go through `query`, `stats` and `export`.

pub mod emitters;
pub mod ids;
pub mod logger;
pub mod query;
pub mod redact;
pub mod service;
pub mod sink;
pub mod stats;
pub mod store;

pub use ids::{Clock, IdGenerator, ManualClock, SystemClock};
pub use logger::init_logger;
pub use query::LogFilter;
pub use redact::{DetailsLimits, redact_sensitive_data, sanitize_details};
pub use service::{LogRecord, LoggerOptions, LoggingService, MIRROR_TARGET};
pub use sink::{DEFAULT_SINK_MAX_IN_FLIGHT, DEFAULT_SINK_TIMEOUT, HttpSink, LogSink, MemorySink, NoopSink, sink_for};
pub use stats::{ActionCount, LogStats, TOP_ACTIONS};
pub use store::{DEFAULT_MAX_ENTRIES, EventStore};
