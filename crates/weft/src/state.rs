//! Reactive state cells.
//!
//! A [`State`] holds a value with set-if-changed semantics: writing an
//! equal value is a no-op; a real change notifies subscribers
//! synchronously and marks the owning app dirty so the next frame
//! re-renders. [`batch`] coalesces notifications across several writes.
//!
//! Subscribers must not capture the state they are bound to by strong
//! handle, or the cell can never be dropped; capture clones of *other*
//! states or plain data instead.

use std::cell::{Cell as StdCell, RefCell};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::app::AppHandle;

static NEXT_STATE_ID: AtomicU64 = AtomicU64::new(1);

type SubscriberFn<T> = Box<dyn FnMut(&T) + Send>;

struct StateInner<T> {
    value: T,
    subscribers: Vec<SubscriberFn<T>>,
    generation: u64,
    app: Option<AppHandle>,
}

/// A reactive cell. Cloning produces another handle to the same value;
/// handles may be captured by watcher closures on other threads, but
/// subscribers always run on the thread performing the write (the loop
/// thread, for writes done via queued closures).
pub struct State<T> {
    id: u64,
    inner: Arc<Mutex<StateInner<T>>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + 'static> State<T> {
    /// Create a new state cell.
    pub fn new(value: T) -> Self {
        Self {
            id: NEXT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Mutex::new(StateInner {
                value,
                subscribers: Vec::new(),
                generation: 0,
                app: None,
            })),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Borrow the value under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Change generation counter; bumps on every real change.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Set a new value. Equal values are a no-op; otherwise subscribers
    /// fire and the owning app is marked dirty.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.lock();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.generation += 1;
        }
        self.changed();
    }

    /// Update the value in place. Notifies only if the value actually
    /// changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut inner = self.lock();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                return;
            }
            inner.generation += 1;
        }
        self.changed();
    }

    /// Subscribe to changes. The callback receives the new value.
    pub fn bind(&self, f: impl FnMut(&T) + Send + 'static) {
        self.lock().subscribers.push(Box::new(f));
    }

    /// Attach the owning app so changes mark it dirty. States created
    /// via [`App::state`](crate::app::App::state) are attached already.
    pub fn attach(&self, app: &AppHandle) {
        self.lock().app = Some(app.clone());
    }

    fn changed(&self) {
        // Store happened in the caller; subscribers fire before the app
        // is flagged so they observe a consistent world, then the dirty
        // mark schedules the re-render.
        let this = self.clone();
        if !queue_in_batch(self.id, move || this.run_subscribers()) {
            self.run_subscribers();
        }
        let app = self.lock().app.clone();
        if let Some(app) = app {
            app.mark_dirty();
        }
    }

    fn run_subscribers(&self) {
        let (mut subs, value) = {
            let mut inner = self.lock();
            (std::mem::take(&mut inner.subscribers), inner.value.clone())
        };
        for s in &mut subs {
            s(&value);
        }
        let mut inner = self.lock();
        let added = std::mem::take(&mut inner.subscribers);
        subs.extend(added);
        inner.subscribers = subs;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StateInner<T>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ---------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------

thread_local! {
    static BATCH_DEPTH: StdCell<u32> = const { StdCell::new(0) };
    static PENDING: RefCell<Vec<Box<dyn FnOnce()>>> = const { RefCell::new(Vec::new()) };
    static PENDING_IDS: RefCell<HashSet<u64>> = RefCell::new(HashSet::new());
}

/// Check if a batch is active on this thread.
pub fn is_batching() -> bool {
    BATCH_DEPTH.with(|d| d.get() > 0)
}

/// Queue a state's notification for the end of the current batch.
/// Returns false when no batch is active (notify immediately).
fn queue_in_batch(id: u64, notify: impl FnOnce() + 'static) -> bool {
    if !is_batching() {
        return false;
    }
    PENDING_IDS.with(|ids| {
        if ids.borrow_mut().insert(id) {
            PENDING.with(|p| p.borrow_mut().push(Box::new(notify)));
        }
    });
    true
}

/// Run a closure with batched notifications.
///
/// Subscriber callbacks for every state changed inside the closure fire
/// once, after the outermost batch returns, each seeing the final value.
pub fn batch(f: impl FnOnce()) {
    BATCH_DEPTH.with(|d| d.set(d.get() + 1));

    f();

    BATCH_DEPTH.with(|d| {
        let depth = d.get().saturating_sub(1);
        d.set(depth);
        if depth == 0 {
            flush_pending();
        }
    });
}

fn flush_pending() {
    let pending: Vec<Box<dyn FnOnce()>> = PENDING.with(|p| p.borrow_mut().drain(..).collect());
    PENDING_IDS.with(|ids| ids.borrow_mut().clear());
    for notify in pending {
        notify();
    }
}
