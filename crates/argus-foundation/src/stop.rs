use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct StopShared {
    stopped: AtomicBool,
    notify: Notify,
}

/// Owner side of a cooperative stop signal. One controller per supervised
/// task group; tokens are handed to each task.
pub struct StopController {
    shared: Arc<StopShared>,
}

impl Default for StopController {
    fn default() -> Self {
        Self::new()
    }
}

impl StopController {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(StopShared {
                stopped: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn token(&self) -> StopToken {
        StopToken {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }
}

/// Task side of the stop signal. Cheap to clone.
#[derive(Clone)]
pub struct StopToken {
    shared: Arc<StopShared>,
}

impl StopToken {
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once stop has been requested. Registers with the notifier
    /// before re-checking the flag so a concurrent `stop()` is never missed.
    pub async fn stopped(&self) {
        loop {
            if self.is_stopped() {
                return;
            }
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}
