//! Cross-thread handle to a running app, and the process-wide current
//! app used by the package-level `stop`/`mark_dirty` helpers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::watcher::Job;

/// Cloneable, `Send` handle to an [`App`](super::App).
///
/// Watchers and background threads use it to enqueue work onto the
/// loop, flag a re-render, print above an inline widget, or stop the
/// app.
#[derive(Clone)]
pub struct AppHandle {
    pub(crate) jobs: Sender<Job>,
    pub(crate) updates: Sender<Job>,
    updates_rx: Receiver<Job>,
    dirty: Arc<AtomicBool>,
    stop: Arc<Mutex<Option<Sender<()>>>>,
}

impl AppHandle {
    pub(crate) fn new(
        jobs: Sender<Job>,
        updates: Sender<Job>,
        updates_rx: Receiver<Job>,
        dirty: Arc<AtomicBool>,
        stop: Arc<Mutex<Option<Sender<()>>>>,
    ) -> Self {
        Self {
            jobs,
            updates,
            updates_rx,
            dirty,
            stop,
        }
    }

    /// Flag that the UI needs a re-render on the next frame tick.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Whether a re-render is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Atomically read and clear the dirty flag.
    pub(crate) fn check_and_clear_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Enqueue a closure onto the FIFO event queue. May block briefly
    /// when the queue is full; then the closure is dropped.
    pub fn queue(&self, f: impl FnOnce(&mut super::App) + Send + 'static) {
        if self
            .jobs
            .send_timeout(Box::new(f), std::time::Duration::from_millis(100))
            .is_err()
        {
            tracing::warn!("event queue full; dropped a queued closure");
        }
    }

    /// Enqueue a closure onto the single-slot update queue.
    /// Newest-wins: a pending older closure is discarded.
    pub fn queue_update(&self, f: impl FnOnce(&mut super::App) + Send + 'static) {
        let job: Job = Box::new(f);
        match self.updates.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                let _ = self.updates_rx.try_recv();
                if self.updates.try_send(job).is_err() {
                    tracing::warn!("update queue unavailable; dropped closure");
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Print a line of text above an inline-mode widget. Runs on the
    /// loop thread; a no-op in full-screen mode.
    pub fn print_above(&self, text: impl Into<String>) {
        let text = text.into();
        self.queue_update(move |app| {
            if let Err(e) = app.print_above_now(&text) {
                tracing::warn!("print_above failed: {e}");
            }
        });
    }

    /// Stop the app. Idempotent: the stop channel closes exactly once.
    pub fn stop(&self) {
        if let Ok(mut guard) = self.stop.lock() {
            guard.take();
        }
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        match self.stop.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }
}

static CURRENT: Mutex<Option<AppHandle>> = Mutex::new(None);

/// Install the handle of the app entering `run`. Fails when another
/// run is already active.
pub(crate) fn set_current(handle: AppHandle) -> bool {
    match CURRENT.lock() {
        Ok(mut guard) => {
            if guard.is_some() {
                false
            } else {
                *guard = Some(handle);
                true
            }
        }
        Err(_) => false,
    }
}

pub(crate) fn clear_current() {
    if let Ok(mut guard) = CURRENT.lock() {
        *guard = None;
    }
}

/// Handle to the currently running app, if any.
pub fn current() -> Option<AppHandle> {
    CURRENT.lock().ok().and_then(|g| g.clone())
}

/// Stop the currently running app.
pub fn stop() {
    if let Some(h) = current() {
        h.stop();
    }
}

/// Mark the currently running app dirty.
pub fn mark_dirty() {
    if let Some(h) = current() {
        h.mark_dirty();
    }
}

/// Queue a closure onto the currently running app's update queue.
pub fn queue_update(f: impl FnOnce(&mut super::App) + Send + 'static) {
    if let Some(h) = current() {
        h.queue_update(f);
    }
}
