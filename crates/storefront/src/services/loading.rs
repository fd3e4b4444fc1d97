//! Loading flag with a hard ceiling.
//!
//! [`LoadingIndicator::start`] raises the flag and arms a timer. When the
//! timer fires the flag drops even if the work is still running; the work
//! itself is never cancelled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::debug;

/// Shared loading flag. Clones observe the same flag.
#[derive(Clone)]
pub struct LoadingIndicator {
    inner: Arc<Inner>,
}

struct Inner {
    loading: AtomicBool,
    /// Bumped on every start/stop so a stale timer never clears a newer start.
    generation: AtomicU64,
    ceiling: Duration,
    timer: Mutex<Option<AbortHandle>>,
}

impl LoadingIndicator {
    #[must_use]
    pub fn new(ceiling: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                loading: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                ceiling,
                timer: Mutex::new(None),
            }),
        }
    }

    /// Raise the flag and (re)arm the ceiling timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.loading.store(true, Ordering::Release);

        let weak = Arc::downgrade(&self.inner);
        let ceiling = self.inner.ceiling;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ceiling).await;
            if let Some(inner) = weak.upgrade()
                && inner.generation.load(Ordering::Acquire) == generation
            {
                debug!(?ceiling, "Loading ceiling reached, clearing flag");
                inner.loading.store(false, Ordering::Release);
            }
        });

        self.replace_timer(Some(handle.abort_handle()));
    }

    /// Lower the flag and disarm the timer.
    pub fn stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.loading.store(false, Ordering::Release);
        self.replace_timer(None);
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    fn replace_timer(&self, next: Option<AbortHandle>) {
        let previous = match self.inner.timer.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        if let Some(timer) = previous {
            timer.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timer = match self.timer.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(timer) = timer {
            timer.abort();
        }
    }
}
