//! Last-call-wins timer owned by a hook.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Default)]
struct Slot {
    pending: Option<JoinHandle<()>>,
    disposed: bool,
}

pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Slot>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `f` once `delay` has passed without another call. A newer call
    /// replaces the pending one. Ignored after `dispose` until `rearm`.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No tokio runtime; debounced call dropped");
            return;
        };

        let mut slot = self.slot();
        if slot.disposed {
            return;
        }
        if let Some(previous) = slot.pending.take() {
            previous.abort();
        }
        let delay = self.delay;
        slot.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.slot()
            .pending
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Cancel the pending call and refuse new ones. A call racing with this
    /// either lands before it (and is cancelled) or after it (and is ignored).
    pub fn dispose(&self) {
        let mut slot = self.slot();
        slot.disposed = true;
        if let Some(pending) = slot.pending.take() {
            pending.abort();
        }
    }

    /// Accept calls again after `dispose`.
    pub fn rearm(&self) {
        self.slot().disposed = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.slot().disposed
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.dispose();
    }
}
