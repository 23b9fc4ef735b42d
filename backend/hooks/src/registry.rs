/// Hook trait, attachment and registry.
///
/// Attaching a hook subscribes it to the `EnvBus` and spawns its dispatch
/// loop. Hooks only ever call the logging facade. Errors returned by a hook
/// are non-fatal: they are reported and the event is dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::EnvBus;
use crate::types::EnvEvent;

// ---------------------------------------------------------------------------
// Hook trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Hook: Send + Sync {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Called once per attach, before any event is dispatched. Runs inside
    /// the tokio runtime, so it may spawn background work.
    fn on_attach(&self) {}

    /// Handle one environment event.
    async fn on_event(&self, event: &EnvEvent) -> Result<()>;

    /// Called on detach. Must cancel timers and background tasks.
    fn on_detach(&self) {}
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Live attachment of one hook. Dropping it detaches.
pub struct HookHandle {
    hook: Arc<dyn Hook>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl HookHandle {
    pub fn name(&self) -> &str {
        self.hook.name()
    }

    pub fn is_attached(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop dispatching immediately. Idempotent.
    pub fn detach(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.hook.on_detach();
        debug!(hook = self.hook.name(), "Hook detached");
    }
}

impl Drop for HookHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Subscribe `hook` to `bus`. Must be called from within a tokio runtime.
pub fn attach(hook: Arc<dyn Hook>, bus: &EnvBus) -> HookHandle {
    // subscribe before spawning so nothing published after attach is missed
    let mut rx = bus.subscribe();
    let active = Arc::new(AtomicBool::new(true));

    hook.on_attach();

    let task = {
        let hook = hook.clone();
        let active = active.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if !active.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Err(e) = hook.on_event(&event).await {
                            warn!(hook = hook.name(), kind = event.kind(), "Hook failed: {e:#}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(hook = hook.name(), skipped, "Hook lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    debug!(hook = hook.name(), "Hook attached");
    HookHandle {
        hook,
        active,
        task: Some(task),
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered set of hooks that are attached and detached together.
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    pub fn names(&self) -> Vec<String> {
        self.hooks.iter().map(|h| h.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Attach every registered hook, in registration order.
    pub fn attach_all(&self, bus: &EnvBus) -> Vec<HookHandle> {
        self.hooks.iter().map(|h| attach(h.clone(), bus)).collect()
    }
}
