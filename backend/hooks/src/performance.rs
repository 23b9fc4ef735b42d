//! Page-load timing and periodic memory sampling.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use uarwatch_core::{Details, LogCategory};
use uarwatch_logging::{LogRecord, LoggingService};

use crate::registry::Hook;
use crate::types::EnvEvent;

pub const DEFAULT_MEMORY_INTERVAL: Duration = Duration::from_secs(60);

/// One memory reading, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub resident_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_resident_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_bytes: Option<u64>,
}

/// Source of memory readings. `None` means the platform has none to offer.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> Option<MemorySample>;
}

/// Probe for platforms without introspection.
#[derive(Debug, Default)]
pub struct NullProbe;

impl MemoryProbe for NullProbe {
    fn sample(&self) -> Option<MemorySample> {
        None
    }
}

/// Reads `VmRSS`, `VmHWM` and `VmSize` from `/proc/self/status`.
#[derive(Debug, Default)]
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn sample(&self) -> Option<MemorySample> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_proc_status(&status)
    }
}

/// Parse the kB figures out of a `/proc/<pid>/status` document.
pub fn parse_proc_status(status: &str) -> Option<MemorySample> {
    let field = |name: &str| -> Option<u64> {
        status
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    };
    Some(MemorySample {
        resident_bytes: field("VmRSS")?,
        peak_resident_bytes: field("VmHWM"),
        virtual_bytes: field("VmSize"),
    })
}

/// Probe for the current platform.
pub fn default_probe() -> Arc<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Arc::new(ProcStatusProbe)
    } else {
        Arc::new(NullProbe)
    }
}

pub struct PerformanceHook {
    logger: Arc<LoggingService>,
    probe: Arc<dyn MemoryProbe>,
    interval: Duration,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl PerformanceHook {
    pub fn new(logger: Arc<LoggingService>, probe: Arc<dyn MemoryProbe>, interval: Duration) -> Self {
        Self {
            logger,
            probe,
            interval: interval.max(Duration::from_secs(1)),
            sampler: Mutex::new(None),
        }
    }

    fn stop_sampler(&self) {
        if let Some(task) = self.sampler.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }
}

fn sample_memory(logger: &LoggingService, probe: &dyn MemoryProbe) {
    let Some(sample) = probe.sample() else {
        return;
    };
    let details = match serde_json::to_value(sample) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return,
    };
    logger.log(
        LogRecord::debug(LogCategory::Performance, "memory_usage")
            .module("Performance")
            .details(details),
    );
}

#[async_trait]
impl Hook for PerformanceHook {
    fn name(&self) -> &str {
        "performance_hook"
    }

    fn on_attach(&self) {
        self.stop_sampler();
        let logger = self.logger.clone();
        let probe = self.probe.clone();
        let period = self.interval;
        let task = tokio::spawn(async move {
            // first sample one full period after attach
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                sample_memory(&logger, probe.as_ref());
            }
        });
        *self.sampler.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        debug!(interval_secs = period.as_secs(), "Memory sampler started");
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        if let EnvEvent::Load {
            url,
            timing: Some(timing),
            ..
        } = event
        {
            let mut details: Details = match serde_json::to_value(timing)? {
                serde_json::Value::Object(map) => map,
                _ => Details::new(),
            };
            details.insert("url".into(), url.as_str().into());
            self.logger
                .log_performance("page_load", timing.load_complete_ms, details);
        }
        Ok(())
    }

    fn on_detach(&self) {
        self.stop_sampler();
    }
}
