//! "Report abuse" flow and the clipboard affordance timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("No async runtime available to schedule the timer")]
    NoRuntime,
}

/// A one-shot deferred callback backed by a tokio task.
///
/// Scheduling replaces any pending callback. Once `cancel` (or drop) returns,
/// the callback has either already finished or will never run: the task checks
/// the flag and runs the callback under the same lock that `cancel` takes.
/// The callback must therefore not touch its own timer.
#[derive(Debug, Default)]
pub struct DeferredTimer {
    handle: Option<JoinHandle<()>>,
    cancelled: Arc<Mutex<bool>>,
}

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeferredTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, callback: F) -> Result<(), TimerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        self.cancel();

        let cancelled = Arc::new(Mutex::new(false));
        self.cancelled = Arc::clone(&cancelled);
        self.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let guard = lock(&cancelled);
            if !*guard {
                callback();
            }
        }));
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Returns whether a callback was still pending.
    pub fn cancel(&mut self) -> bool {
        *lock(&self.cancelled) = true;
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }
}

impl Drop for DeferredTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Switches between the player and the report form, and owns the
/// copy-to-clipboard reset timer of the page.
#[derive(Debug, Default)]
pub struct ReportFlowController {
    open: bool,
    copied: Arc<AtomicBool>,
    timer: DeferredTimer,
    disposed: bool,
}

impl ReportFlowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Returns the new open flag.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.open {
            "Back"
        } else {
            "Report abuse"
        }
    }

    pub fn is_copied(&self) -> bool {
        self.copied.load(Ordering::Acquire)
    }

    /// Flag the share link as copied and clear the flag after `reset_after`.
    pub fn copy_share_link(&mut self, reset_after: Duration) -> Result<(), TimerError> {
        if self.disposed {
            return Ok(());
        }
        self.copied.store(true, Ordering::Release);
        let copied = Arc::clone(&self.copied);
        let scheduled = self.timer.schedule(reset_after, move || {
            copied.store(false, Ordering::Release);
        });
        if scheduled.is_err() {
            self.copied.store(false, Ordering::Release);
        }
        scheduled
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancel the pending clipboard timer before the page is discarded.
    pub fn dispose_on_teardown(&mut self) {
        if self.disposed {
            return;
        }
        let was_pending = self.timer.cancel();
        self.disposed = true;
        debug!(was_pending, "Report flow disposed");
    }
}
