/// Environment hook layer.
///
/// Owns the hook set and the API interceptor and attaches or detaches them
/// as a unit. Construction never touches process-global state; only
/// `start()` does (the panic hook, when enabled). Callers:
/// 1. Startup builds one `LoggingService` and one `EnvBus`.
/// 2. `EnvironmentHooks::with_defaults(...)` registers the built-in hooks.
/// 3. `start()` attaches; `stop()` detaches. Both are idempotent.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;
use uarwatch_logging::LoggingService;

use crate::api::ApiInterceptor;
use crate::builtin::{
    GlobalErrorHook, InteractionHook, MIN_INPUT_DEBOUNCE, MIN_RESIZE_DEBOUNCE, NavigationHook,
    ResizeHook, VisibilityHook,
};
use crate::bus::EnvBus;
use crate::performance::{DEFAULT_MEMORY_INTERVAL, MemoryProbe, PerformanceHook, default_probe};
use crate::registry::{HookHandle, HookRegistry};

/// Tunables for the built-in hooks.
#[derive(Debug, Clone)]
pub struct HookSettings {
    pub resize_debounce: Duration,
    pub input_debounce: Duration,
    pub memory_interval: Duration,
    /// Chain a process panic hook while started.
    pub capture_panics: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            resize_debounce: MIN_RESIZE_DEBOUNCE,
            input_debounce: MIN_INPUT_DEBOUNCE,
            memory_interval: DEFAULT_MEMORY_INTERVAL,
            capture_panics: false,
        }
    }
}

pub struct EnvironmentHooks {
    bus: EnvBus,
    registry: HookRegistry,
    interceptor: Option<Arc<ApiInterceptor>>,
    handles: Mutex<Option<Vec<HookHandle>>>,
}

impl EnvironmentHooks {
    pub fn new(bus: EnvBus, registry: HookRegistry) -> Self {
        Self {
            bus,
            registry,
            interceptor: None,
            handles: Mutex::new(None),
        }
    }

    /// Register the built-in hooks with the platform memory probe.
    pub fn with_defaults(logger: Arc<LoggingService>, bus: EnvBus, settings: &HookSettings) -> Self {
        Self::with_probe(logger, bus, settings, default_probe())
    }

    pub fn with_probe(
        logger: Arc<LoggingService>,
        bus: EnvBus,
        settings: &HookSettings,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(GlobalErrorHook::new(logger.clone(), settings.capture_panics)));
        registry.register(Arc::new(VisibilityHook::new(logger.clone())));
        registry.register(Arc::new(ResizeHook::new(logger.clone(), settings.resize_debounce)));
        registry.register(Arc::new(NavigationHook::new(logger.clone())));
        registry.register(Arc::new(InteractionHook::new(logger.clone(), settings.input_debounce)));
        registry.register(Arc::new(PerformanceHook::new(logger, probe, settings.memory_interval)));
        Self::new(bus, registry)
    }

    /// Attach/detach `interceptor` together with the hooks.
    pub fn with_interceptor(mut self, interceptor: Arc<ApiInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn interceptor(&self) -> Option<&Arc<ApiInterceptor>> {
        self.interceptor.as_ref()
    }

    pub fn bus(&self) -> &EnvBus {
        &self.bus
    }

    pub fn hook_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn is_running(&self) -> bool {
        self.handles.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Attach everything. Returns false when already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        if handles.is_some() {
            return false;
        }
        *handles = Some(self.registry.attach_all(&self.bus));
        if let Some(interceptor) = &self.interceptor {
            interceptor.attach();
        }
        info!(hooks = self.registry.len(), "Environment hooks started");
        true
    }

    /// Detach everything. Returns false when not running.
    pub fn stop(&self) -> bool {
        let Some(mut attached) = self.handles.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            return false;
        };
        for handle in attached.iter_mut() {
            handle.detach();
        }
        if let Some(interceptor) = &self.interceptor {
            interceptor.detach();
        }
        info!("Environment hooks stopped");
        true
    }
}

impl Drop for EnvironmentHooks {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, ApiResponse, AuthToken, HttpTransport};
    use crate::performance::NullProbe;
    use crate::types::EnvEvent;
    use async_trait::async_trait;
    use uarwatch_core::AuditResult;

    struct Ok200;

    #[async_trait]
    impl HttpTransport for Ok200 {
        async fn send(&self, _request: ApiRequest) -> AuditResult<ApiResponse> {
            Ok(ApiResponse { status: 200, ..Default::default() })
        }
    }

    fn layer(logger: &Arc<LoggingService>) -> EnvironmentHooks {
        EnvironmentHooks::with_probe(
            logger.clone(),
            EnvBus::new(),
            &HookSettings::default(),
            Arc::new(NullProbe),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_construction_attaches_nothing() {
        let logger = Arc::new(LoggingService::in_memory(50));
        let hooks = layer(&logger);
        assert!(!hooks.is_running());
        assert_eq!(hooks.bus().subscriber_count(), 0);
        assert_eq!(hooks.hook_names().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop_idempotent() {
        let logger = Arc::new(LoggingService::in_memory(50));
        let hooks = layer(&logger);

        assert!(hooks.start());
        assert!(!hooks.start());
        assert_eq!(hooks.bus().subscriber_count(), 6);

        assert!(hooks.stop());
        assert!(!hooks.stop());
        assert!(!hooks.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_duplicate_listeners() {
        let logger = Arc::new(LoggingService::in_memory(50));
        let hooks = layer(&logger);

        hooks.start();
        hooks.stop();
        hooks.start();
        settle().await;
        assert_eq!(hooks.bus().subscriber_count(), 6);

        hooks.bus().publish(EnvEvent::VisibilityChange { visible: false });
        settle().await;
        assert_eq!(logger.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_layer_emits_nothing() {
        let logger = Arc::new(LoggingService::in_memory(50));
        let hooks = layer(&logger);
        hooks.start();
        hooks.stop();
        settle().await;

        hooks.bus().publish(EnvEvent::UnhandledRejection { reason: "x".into() });
        hooks.bus().publish(EnvEvent::Resize { width: 10, height: 10 });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(logger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interceptor_follows_layer() {
        let logger = Arc::new(LoggingService::in_memory(50));
        let interceptor = Arc::new(ApiInterceptor::new(
            Arc::new(Ok200),
            logger.clone(),
            "",
            AuthToken::new(),
        ));
        let hooks = layer(&logger).with_interceptor(interceptor.clone());

        assert!(hooks.interceptor().is_some());
        assert!(!interceptor.is_attached());
        hooks.start();
        assert!(interceptor.is_attached());
        interceptor.send(ApiRequest::get("/api/apps")).await.unwrap();
        assert_eq!(logger.len(), 1);

        hooks.stop();
        assert!(!interceptor.is_attached());
    }
}
