//! `uarwatch run`: feed NDJSON environment events through the pipeline.
//!
//! Events are read from stdin until EOF or ctrl-c. Pending debounced hooks
//! are given time to fire, then stats are printed and the log is exported.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use uarwatch_config::{config_dir, config_file_path, load_and_prepare, validate};
use uarwatch_core::{Details, LogCategory, LogEntry};
use uarwatch_hooks::{ApiInterceptor, AuthToken, EnvBus, EnvEvent, EnvironmentHooks};
use uarwatch_logging::{init_logger, sink_for, LogFilter, LoggingService};

use crate::config::Settings;

/// Bus depth for stdin replay; bursts are larger than interactive traffic.
const REPLAY_BUS_CAPACITY: usize = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub published: usize,
    pub rejected: usize,
}

pub async fn run(config: Option<PathBuf>, export: Option<PathBuf>, filter: LogFilter) -> Result<()> {
    let path = config.unwrap_or_else(|| config_file_path(&config_dir()));
    let cfg = load_and_prepare(&path).await?;
    let settings = Settings::from_config(&cfg);

    init_logger(settings.log_dir.as_deref(), &settings.log_level);
    for warning in validate(&cfg).warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    info!(config = %path.display(), "Starting uarwatch pipeline");

    let stdin = BufReader::new(tokio::io::stdin());
    let (logger, summary) = run_pipeline(stdin, &settings, &path).await?;
    info!(published = summary.published, rejected = summary.rejected, "Input drained");

    println!("{}", serde_json::to_string_pretty(&logger.stats())?);
    if !filter.is_empty() {
        let hits = logger.query(&filter);
        let hits: Vec<&LogEntry> = hits.iter().map(Arc::as_ref).collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
    }

    if let Some(out) = export {
        let doc = logger.export().context("Failed to export audit log")?;
        tokio::fs::write(&out, doc)
            .await
            .with_context(|| format!("Failed to write export: {}", out.display()))?;
        info!(path = %out.display(), entries = logger.len(), "Exported audit log");
    }
    Ok(())
}

/// Build the service and hooks, replay `reader`, drain, and stop.
pub async fn run_pipeline<R>(
    reader: R,
    settings: &Settings,
    config_path: &Path,
) -> Result<(Arc<LoggingService>, PumpSummary)>
where
    R: AsyncBufRead + Unpin,
{
    let sink = sink_for(settings.sink_endpoint.as_deref(), settings.sink_timeout);
    let logger = Arc::new(LoggingService::new(settings.logger.clone(), sink));
    let bus = EnvBus::with_capacity(REPLAY_BUS_CAPACITY);
    let hooks = build_hooks(logger.clone(), bus.clone(), settings);

    hooks.start();
    logger.info(
        LogCategory::System,
        "pipeline_started",
        details(json!({ "config": config_path.display().to_string(), "hooks": hooks.hook_names() })),
    );

    let mut summary = PumpSummary::default();
    tokio::select! {
        res = pump_events(reader, &bus, &mut summary) => res?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted; shutting down"),
    }

    tokio::time::sleep(settings.drain_period()).await;
    hooks.stop();
    logger.info(
        LogCategory::System,
        "pipeline_stopped",
        details(json!({ "published": summary.published, "rejected": summary.rejected })),
    );
    Ok((logger, summary))
}

/// Built-in hooks, plus the API interceptor when an origin is configured.
pub fn build_hooks(logger: Arc<LoggingService>, bus: EnvBus, settings: &Settings) -> EnvironmentHooks {
    let hooks = EnvironmentHooks::with_defaults(logger.clone(), bus, &settings.hooks);
    match &settings.api_origin {
        Some(origin) => {
            let interceptor = ApiInterceptor::new(
                Arc::new(reqwest::Client::new()),
                logger,
                origin.as_str(),
                AuthToken::new(),
            );
            hooks.with_interceptor(Arc::new(interceptor))
        }
        None => hooks,
    }
}

/// Publish every well-formed line of `reader` on `bus`. Malformed lines are
/// counted and skipped.
pub async fn pump_events<R>(reader: R, bus: &EnvBus, summary: &mut PumpSummary) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("Failed to read event stream")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<EnvEvent>(line) {
            Ok(event) => {
                bus.publish(event);
                summary.published += 1;
                // let hook tasks keep up with the replay
                tokio::task::yield_now().await;
            }
            Err(e) => {
                summary.rejected += 1;
                warn!(line = line_no, "Skipping malformed event: {e}");
            }
        }
    }
    Ok(())
}

fn details(value: serde_json::Value) -> Details {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Details::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uarwatch_config::{apply_all_defaults, UarwatchConfig};
    use uarwatch_core::LogLevel;

    const EVENTS: &str = r#"
{"type":"load","url":"https://uar.example.com/dashboard"}
{"type":"click","element":{"tag":"button","text":"Start Review"}}
{"type":"click","element":{"tag":"span"}}
not json at all
{"type":"resize","width":1024,"height":768}
{"type":"resize","width":1280,"height":800}
{"type":"visibility_change","visible":false}
"#;

    fn settings() -> Settings {
        let mut settings = Settings::from_config(&apply_all_defaults(UarwatchConfig::default()));
        settings.logger.max_entries = 100;
        settings
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_origin_attaches_interceptor() {
        let logger = Arc::new(LoggingService::in_memory(10));

        let hooks = build_hooks(logger.clone(), EnvBus::new(), &settings());
        assert!(hooks.interceptor().is_none());

        let mut with_api = settings();
        with_api.api_origin = Some("https://uar.example.com/api".into());
        let hooks = build_hooks(logger, EnvBus::new(), &with_api);
        let interceptor = hooks.interceptor().cloned().unwrap();
        assert!(!interceptor.is_attached());
        hooks.start();
        assert!(interceptor.is_attached());
        hooks.stop();
        assert!(!interceptor.is_attached());
    }

    #[tokio::test]
    async fn test_pump_counts_and_publishes() {
        let bus = EnvBus::new();
        let mut rx = bus.subscribe();
        let mut summary = PumpSummary::default();
        pump_events(EVENTS.as_bytes(), &bus, &mut summary).await.unwrap();

        assert_eq!(summary, PumpSummary { published: 6, rejected: 1 });
        assert_eq!(rx.recv().await.unwrap().kind(), "load");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_replay() {
        let (logger, summary) = run_pipeline(EVENTS.as_bytes(), &settings(), Path::new("uarwatch.yaml"))
            .await
            .unwrap();
        assert_eq!(summary.rejected, 1);

        let actions: Vec<String> = logger.entries().iter().rev().map(|e| e.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                "pipeline_started",
                "page_load",
                "click",
                "page_hidden",
                "window_resize",
                "pipeline_stopped"
            ]
        );

        let resized = logger.query(&LogFilter::new().action_contains("resize"));
        assert_eq!(resized[0].details["width"], 1280);
        assert_eq!(resized[0].level, LogLevel::Debug);

        let stats = logger.stats();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.errors, 0);
        assert_eq!(logger.client_context().url, "https://uar.example.com/dashboard");
    }
}
