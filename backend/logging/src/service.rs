//! Logging facade: the single entry point that builds entries and writes them
//! into the event store.
//!
//! One `LoggingService` is constructed at startup and shared by `Arc` with
//! every hook and consumer. Tests build fresh instances with small bounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, error, info, warn};
use uarwatch_core::{
    AuditResult, ClientContext, Details, LogCategory, LogEntry, LogLevel, LogStatus,
};

use crate::ids::{Clock, IdGenerator, SystemClock};
use crate::query::{self, LogFilter};
use crate::redact::{DetailsLimits, sanitize_details};
use crate::sink::{LogSink, NoopSink};
use crate::stats::LogStats;
use crate::store::{DEFAULT_MAX_ENTRIES, EventStore};

/// Tracing target used when entries are mirrored to diagnostics.
pub const MIRROR_TARGET: &str = "uar_audit";

const DEFAULT_USER: &str = "system";
const DEFAULT_MODULE: &str = "System";
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub max_entries: usize,
    pub enabled: bool,
    /// Also emit every stored entry as a `tracing` event.
    pub mirror_to_tracing: bool,
    pub details: DetailsLimits,
    pub client_context: ClientContext,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            enabled: true,
            mirror_to_tracing: false,
            details: DetailsLimits::default(),
            client_context: ClientContext::default(),
        }
    }
}

impl LoggerOptions {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// Everything a caller can say about one event before it becomes an entry.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub category: LogCategory,
    pub action: String,
    pub details: Details,
    pub user_id: Option<String>,
    pub module: Option<String>,
    pub function_name: Option<String>,
    pub status: Option<LogStatus>,
    pub duration_ms: Option<f64>,
}

impl LogRecord {
    pub fn new(level: LogLevel, category: LogCategory, action: impl Into<String>) -> Self {
        Self {
            level,
            category,
            action: action.into(),
            details: Details::new(),
            user_id: None,
            module: None,
            function_name: None,
            status: None,
            duration_ms: None,
        }
    }

    pub fn info(category: LogCategory, action: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, category, action)
    }

    pub fn warn(category: LogCategory, action: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, category, action)
    }

    pub fn error(category: LogCategory, action: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, category, action)
    }

    pub fn debug(category: LogCategory, action: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, category, action)
    }

    pub fn details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Add one key to the details bag.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn user_opt(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn function(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn status(mut self, status: LogStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

pub struct LoggingService {
    ids: IdGenerator,
    session_id: String,
    store: EventStore,
    sink: Arc<dyn LogSink>,
    enabled: AtomicBool,
    mirror_to_tracing: bool,
    details_limits: DetailsLimits,
    context: RwLock<ClientContext>,
}

impl LoggingService {
    pub fn new(options: LoggerOptions, sink: Arc<dyn LogSink>) -> Self {
        Self::with_clock(options, sink, Arc::new(SystemClock))
    }

    pub fn with_clock(options: LoggerOptions, sink: Arc<dyn LogSink>, clock: Arc<dyn Clock>) -> Self {
        let ids = IdGenerator::new(clock);
        let session_id = ids.new_session_id();
        info!(
            session_id = %session_id,
            max_entries = options.max_entries,
            sink = sink.name(),
            "Audit logging service initialized"
        );
        Self {
            ids,
            session_id,
            store: EventStore::new(options.max_entries),
            sink,
            enabled: AtomicBool::new(options.enabled),
            mirror_to_tracing: options.mirror_to_tracing,
            details_limits: options.details,
            context: RwLock::new(options.client_context),
        }
    }

    /// In-memory service with default options and no sink.
    pub fn in_memory(max_entries: usize) -> Self {
        Self::new(
            LoggerOptions::default().with_max_entries(max_entries),
            Arc::new(NoopSink),
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        debug!(enabled, "Audit logging toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn client_context(&self) -> ClientContext {
        self.context.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        self.context.write().unwrap_or_else(|e| e.into_inner()).url = url.into();
    }

    /// Build an entry from `record`, store it and forward it to the sink.
    ///
    /// Returns the stored entry, or `None` while logging is disabled.
    pub fn log(&self, record: LogRecord) -> Option<Arc<LogEntry>> {
        if !self.is_enabled() {
            return None;
        }

        let LogRecord {
            level,
            category,
            action,
            details,
            user_id,
            module,
            function_name,
            status,
            duration_ms,
        } = record;
        let details = sanitize_details(details, self.details_limits);
        let client_context = self.client_context();

        // time and ids are taken under the store lock so insertion order
        // matches timestamp order across threads
        let entry = self.store.append_with(|| {
            let now = self.ids.clock().now();
            let stamp = now.format(TIMESTAMP_FORMAT).to_string();
            LogEntry {
                sequence_no: self.ids.next_sequence_no(),
                process_id: self.ids.next_process_id(),
                user_id: user_id.unwrap_or_else(|| DEFAULT_USER.to_string()),
                module: module.unwrap_or_else(|| DEFAULT_MODULE.to_string()),
                function_name: function_name.unwrap_or_else(|| action.clone()),
                started_at: stamp.clone(),
                ended_at: stamp,
                status: status.unwrap_or_else(|| level.default_status()),
                details,
                level,
                category,
                action,
                session_id: self.session_id.clone(),
                client_context,
                duration: duration_ms,
                timestamp: now.to_utc(),
            }
        });

        if self.mirror_to_tracing {
            mirror(&entry);
        }
        self.sink.forward(entry.clone());
        Some(entry)
    }

    // Level shorthands. User, module and function overrides go through
    // `log(LogRecord::info(..).user(..).module(..).function(..))`; unset
    // fields get the same defaults as here.

    pub fn info(&self, category: LogCategory, action: impl Into<String>, details: Details) -> Option<Arc<LogEntry>> {
        self.log(LogRecord::info(category, action).details(details))
    }

    pub fn warn(&self, category: LogCategory, action: impl Into<String>, details: Details) -> Option<Arc<LogEntry>> {
        self.log(LogRecord::warn(category, action).details(details))
    }

    pub fn error(&self, category: LogCategory, action: impl Into<String>, details: Details) -> Option<Arc<LogEntry>> {
        self.log(LogRecord::error(category, action).details(details))
    }

    pub fn debug(&self, category: LogCategory, action: impl Into<String>, details: Details) -> Option<Arc<LogEntry>> {
        self.log(LogRecord::debug(category, action).details(details))
    }

    // -----------------------------------------------------------------------
    // Read API
    // -----------------------------------------------------------------------

    pub fn entries(&self) -> Vec<Arc<LogEntry>> {
        self.store.all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn query(&self, filter: &LogFilter) -> Vec<Arc<LogEntry>> {
        query::query(&self.store.all(), filter)
    }

    pub fn stats(&self) -> LogStats {
        LogStats::from_entries(&self.store.all(), &self.session_id)
    }

    pub fn find_by_process_id(&self, process_id: &str) -> Option<Arc<LogEntry>> {
        self.store.find_by_process_id(process_id)
    }

    pub fn export(&self) -> AuditResult<String> {
        self.store.export()
    }

    pub fn clear(&self) {
        self.store.clear();
        info!(session_id = %self.session_id, "Audit log cleared");
    }
}

fn mirror(entry: &LogEntry) {
    let details = Value::Object(entry.details.clone());
    match entry.level {
        LogLevel::Error => error!(
            target: MIRROR_TARGET,
            category = %entry.category,
            process_id = %entry.process_id,
            user_id = %entry.user_id,
            details = %details,
            "{}", entry.action
        ),
        LogLevel::Warn => warn!(
            target: MIRROR_TARGET,
            category = %entry.category,
            process_id = %entry.process_id,
            user_id = %entry.user_id,
            details = %details,
            "{}", entry.action
        ),
        LogLevel::Info => info!(
            target: MIRROR_TARGET,
            category = %entry.category,
            process_id = %entry.process_id,
            user_id = %entry.user_id,
            details = %details,
            "{}", entry.action
        ),
        LogLevel::Debug => debug!(
            target: MIRROR_TARGET,
            category = %entry.category,
            process_id = %entry.process_id,
            user_id = %entry.user_id,
            details = %details,
            "{}", entry.action
        ),
    }
}
