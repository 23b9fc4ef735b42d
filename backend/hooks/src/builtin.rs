/// Built-in environment hooks.
///
/// Each hook observes one slice of the environment and turns it into audit
/// entries through the shared `LoggingService`. None of them touch the store.
use std::cell::Cell;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use uarwatch_core::{Details, LogCategory};
use uarwatch_logging::{LogRecord, LoggingService};

use crate::debounce::Debouncer;
use crate::registry::Hook;
use crate::types::{EnvEvent, FormInfo};

/// Shortest quiet period accepted for resize events.
pub const MIN_RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);
/// Shortest quiet period accepted for input changes.
pub const MIN_INPUT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Clicked element text is cut to this many characters.
const CLICK_TEXT_CHARS: usize = 100;

fn details(value: serde_json::Value) -> Details {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Details::new(),
    }
}

// ---------------------------------------------------------------------------
// Global error hook
// ---------------------------------------------------------------------------

type PanicHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

thread_local! {
    static IN_PANIC_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Turns uncaught errors and unhandled rejections into `error`/`system`
/// entries. With `capture_panics` it also chains a process panic hook.
pub struct GlobalErrorHook {
    logger: Arc<LoggingService>,
    capture_panics: bool,
    previous: Mutex<Option<PanicHook>>,
}

impl GlobalErrorHook {
    pub fn new(logger: Arc<LoggingService>, capture_panics: bool) -> Self {
        Self {
            logger,
            capture_panics,
            previous: Mutex::new(None),
        }
    }

    fn install_panic_hook(&self) {
        let mut previous = self.previous.lock().unwrap_or_else(|e| e.into_inner());
        if previous.is_some() {
            return;
        }
        let chained: PanicHook = Arc::from(panic::take_hook());
        *previous = Some(chained.clone());

        let logger = self.logger.clone();
        panic::set_hook(Box::new(move |info| {
            // a panic raised while recording a panic only reaches the chained hook
            let reentered = IN_PANIC_HOOK.with(|flag| flag.replace(true));
            if !reentered {
                record_panic(&logger, info);
                IN_PANIC_HOOK.with(|flag| flag.set(false));
            }
            (*chained)(info);
        }));
        debug!("Panic hook installed");
    }

    fn restore_panic_hook(&self) {
        let Some(previous) = self.previous.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            return;
        };
        // replaces whatever is installed now; hooks set after ours are lost
        let _ = panic::take_hook();
        panic::set_hook(Box::new(move |info| (*previous)(info)));
        debug!("Panic hook restored");
    }
}

fn record_panic(logger: &LoggingService, info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string());
    let location = info.location();
    let thread = std::thread::current();

    logger.log(
        LogRecord::error(LogCategory::System, "uncaught_error")
            .module("GlobalErrorHandler")
            .details(details(json!({
                "message": message,
                "source": location.map(|l| l.file()),
                "line": location.map(|l| l.line()),
                "column": location.map(|l| l.column()),
                "thread": thread.name().unwrap_or("unnamed"),
            }))),
    );
}

#[async_trait]
impl Hook for GlobalErrorHook {
    fn name(&self) -> &str {
        "global_error_hook"
    }

    fn on_attach(&self) {
        if self.capture_panics {
            self.install_panic_hook();
        }
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        match event {
            EnvEvent::UncaughtError {
                message,
                source,
                line,
                column,
                stack,
            } => {
                self.logger.log(
                    LogRecord::error(LogCategory::System, "uncaught_error")
                        .module("GlobalErrorHandler")
                        .details(details(json!({
                            "message": message,
                            "source": source,
                            "line": line,
                            "column": column,
                            "stack": stack,
                        }))),
                );
            }
            EnvEvent::UnhandledRejection { reason } => {
                self.logger.log(
                    LogRecord::error(LogCategory::System, "unhandled_rejection")
                        .module("GlobalErrorHandler")
                        .detail("reason", reason.as_str()),
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn on_detach(&self) {
        self.restore_panic_hook();
    }
}

// ---------------------------------------------------------------------------
// Visibility hook
// ---------------------------------------------------------------------------

pub struct VisibilityHook {
    logger: Arc<LoggingService>,
}

impl VisibilityHook {
    pub fn new(logger: Arc<LoggingService>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Hook for VisibilityHook {
    fn name(&self) -> &str {
        "visibility_hook"
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        if let EnvEvent::VisibilityChange { visible } = event {
            let action = if *visible { "page_visible" } else { "page_hidden" };
            self.logger.log(
                LogRecord::info(LogCategory::System, action)
                    .module("Visibility")
                    .detail("visible", *visible),
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resize hook
// ---------------------------------------------------------------------------

/// Logs the viewport size once resizing has been quiet for the debounce
/// period.
pub struct ResizeHook {
    logger: Arc<LoggingService>,
    debouncer: Debouncer,
}

impl ResizeHook {
    /// `quiet` below 500 ms is raised to 500 ms.
    pub fn new(logger: Arc<LoggingService>, quiet: Duration) -> Self {
        Self {
            logger,
            debouncer: Debouncer::new(quiet.max(MIN_RESIZE_DEBOUNCE)),
        }
    }
}

#[async_trait]
impl Hook for ResizeHook {
    fn name(&self) -> &str {
        "resize_hook"
    }

    fn on_attach(&self) {
        self.debouncer.rearm();
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        if let EnvEvent::Resize { width, height } = *event {
            let logger = self.logger.clone();
            self.debouncer.call(move || {
                logger.log(
                    LogRecord::debug(LogCategory::System, "window_resize")
                        .module("Viewport")
                        .details(details(json!({ "width": width, "height": height }))),
                );
            });
        }
        Ok(())
    }

    fn on_detach(&self) {
        self.debouncer.dispose();
    }
}

// ---------------------------------------------------------------------------
// Navigation hook
// ---------------------------------------------------------------------------

/// Logs page load, in-app navigation and unload, and keeps the facade's
/// client URL current.
pub struct NavigationHook {
    logger: Arc<LoggingService>,
}

impl NavigationHook {
    pub fn new(logger: Arc<LoggingService>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Hook for NavigationHook {
    fn name(&self) -> &str {
        "navigation_hook"
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        match event {
            EnvEvent::Load { url, referrer, .. } => {
                self.logger.set_current_url(url.as_str());
                self.logger.log(
                    LogRecord::info(LogCategory::Navigation, "page_load")
                        .module("Router")
                        .details(details(json!({
                            "from": referrer.as_deref().unwrap_or(""),
                            "to": url,
                        }))),
                );
            }
            EnvEvent::Navigate { from, to } => {
                self.logger.set_current_url(to.as_str());
                self.logger.log_navigation(from, to, Details::new());
            }
            EnvEvent::Unload { url } => {
                self.logger.log(
                    LogRecord::info(LogCategory::Navigation, "page_unload")
                        .module("Router")
                        .details(details(json!({ "from": url, "to": null }))),
                );
            }
            _ => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interaction hook
// ---------------------------------------------------------------------------

/// Clicks on buttons and links, form submissions, and debounced input
/// changes. Input values are never recorded.
pub struct InteractionHook {
    logger: Arc<LoggingService>,
    input_debouncer: Debouncer,
}

impl InteractionHook {
    /// `quiet` below 1 s is raised to 1 s.
    pub fn new(logger: Arc<LoggingService>, quiet: Duration) -> Self {
        Self {
            logger,
            input_debouncer: Debouncer::new(quiet.max(MIN_INPUT_DEBOUNCE)),
        }
    }

    fn form_details(form: &FormInfo) -> Details {
        details(json!({
            "formId": form.id,
            "formName": form.name,
            "formAction": form.action,
            "method": form.method.as_deref().map(str::to_ascii_uppercase),
        }))
    }
}

#[async_trait]
impl Hook for InteractionHook {
    fn name(&self) -> &str {
        "interaction_hook"
    }

    fn on_attach(&self) {
        self.input_debouncer.rearm();
    }

    async fn on_event(&self, event: &EnvEvent) -> Result<()> {
        match event {
            EnvEvent::Click { element } if element.is_interactive() => {
                let text: Option<String> = element
                    .text
                    .as_deref()
                    .map(|t| t.trim().chars().take(CLICK_TEXT_CHARS).collect());
                let info = details(json!({
                    "tag": element.tag.to_ascii_lowercase(),
                    "id": element.id,
                    "class": element.class,
                    "text": text,
                    "role": element.role,
                    "href": element.href,
                }));
                self.logger.log_user_action("click", info, None, Some("UI"));
            }
            EnvEvent::Submit { form } => {
                self.logger
                    .log_user_action("form_submit", Self::form_details(form), None, Some("UI"));
            }
            EnvEvent::InputChange {
                input_type,
                name,
                value,
            } => {
                let info = details(json!({
                    "inputType": input_type,
                    "name": name,
                    "hasValue": !value.is_empty(),
                }));
                let logger = self.logger.clone();
                self.input_debouncer.call(move || {
                    logger.log_user_action("input_change", info, None, Some("UI"));
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn on_detach(&self) {
        self.input_debouncer.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
