//! Watchers: background event sources.
//!
//! A watcher runs on its own thread and enqueues closures onto the main
//! loop's event queue; the loop drains and runs them on the UI thread.
//! Every watcher observes the stop channel and exits promptly once it
//! closes. The contract is not "run this code in parallel" but "produce
//! events the main loop will drain".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, select, tick};

use crate::app::App;

/// A unit of work for the main loop. The loop passes the app in so
/// queued closures can drive it (print above an inline widget, change
/// its height, stop it).
pub type Job = Box<dyn FnOnce(&mut App) + Send + 'static>;

/// How long a producer blocks on a full event queue before dropping.
const ENQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Context handed to watchers: the event queue, the stop channel, and
/// thread bookkeeping so the app can join producers at shutdown.
#[derive(Clone)]
pub struct WatcherCtx {
    jobs: Sender<Job>,
    stop: Receiver<()>,
    dropped: Arc<AtomicU64>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WatcherCtx {
    pub(crate) fn new(jobs: Sender<Job>, stop: Receiver<()>) -> Self {
        Self {
            jobs,
            stop,
            dropped: Arc::new(AtomicU64::new(0)),
            handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The stop channel. Receiving anything, or a disconnect, means
    /// shut down.
    pub fn stop_channel(&self) -> &Receiver<()> {
        &self.stop
    }

    /// Enqueue a closure onto the main loop. Blocks briefly when the
    /// queue is full, then drops the closure and counts it.
    pub fn enqueue(&self, job: Job) {
        if self.jobs.send_timeout(job, ENQUEUE_TIMEOUT).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("event queue full; dropped a queued closure");
        }
    }

    /// Number of closures dropped because the queue stayed full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Spawn a watcher thread tracked for join at shutdown.
    pub fn spawn(&self, name: &str, f: impl FnOnce(WatcherCtx) + Send + 'static) {
        let ctx = self.clone();
        match std::thread::Builder::new()
            .name(format!("weft-{name}"))
            .spawn(move || f(ctx))
        {
            Ok(handle) => {
                if let Ok(mut handles) = self.handles.lock() {
                    handles.push(handle);
                }
            }
            Err(e) => tracing::warn!("failed to spawn watcher thread: {e}"),
        }
    }

    /// Join every watcher thread spawned through this context. Call
    /// after closing the stop channel.
    pub(crate) fn join_all(&self) {
        let handles = match self.handles.lock() {
            Ok(mut g) => std::mem::take(&mut *g),
            Err(_) => return,
        };
        for h in handles {
            if h.join().is_err() {
                tracing::warn!("watcher thread panicked");
            }
        }
    }
}

/// A background event source.
pub trait Watcher {
    /// Start producing. Implementations spawn via [`WatcherCtx::spawn`]
    /// and must exit promptly once the stop channel closes.
    fn start(&mut self, ctx: &WatcherCtx);
}

/// Fires its handler once after a delay.
pub struct Timer {
    delay: Duration,
    handler: Option<Box<dyn FnOnce() + Send>>,
}

impl Timer {
    /// Create a timer firing `handler` once after `delay`.
    pub fn new(delay: Duration, handler: impl FnOnce() + Send + 'static) -> Self {
        Self {
            delay,
            handler: Some(Box::new(handler)),
        }
    }
}

impl Watcher for Timer {
    fn start(&mut self, ctx: &WatcherCtx) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        let delay = self.delay;
        ctx.spawn("timer", move |ctx| {
            let deadline = after(delay);
            select! {
                recv(deadline) -> _ => ctx.enqueue(Box::new(move |_| handler())),
                recv(ctx.stop_channel()) -> _ => {}
            }
        });
    }
}

/// Fires its handler on every interval tick.
pub struct Ticker {
    interval: Duration,
    handler: Option<Arc<Mutex<Box<dyn FnMut() + Send>>>>,
}

impl Ticker {
    /// Create a ticker firing `handler` every `interval`.
    pub fn new(interval: Duration, handler: impl FnMut() + Send + 'static) -> Self {
        Self {
            interval,
            handler: Some(Arc::new(Mutex::new(Box::new(handler)))),
        }
    }
}

impl Watcher for Ticker {
    fn start(&mut self, ctx: &WatcherCtx) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        let interval = self.interval;
        ctx.spawn("ticker", move |ctx| {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let h = Arc::clone(&handler);
                        ctx.enqueue(Box::new(move |_| {
                            if let Ok(mut f) = h.lock() {
                                f();
                            }
                        }));
                    }
                    recv(ctx.stop_channel()) -> _ => return,
                }
            }
        });
    }
}

/// Forwards values received from a user channel to its handler.
pub struct ChannelWatcher<T> {
    rx: Option<Receiver<T>>,
    handler: Option<Arc<Mutex<Box<dyn FnMut(T) + Send>>>>,
}

impl<T: Send + 'static> ChannelWatcher<T> {
    /// Create a watcher draining `rx`, calling `handler` on the loop
    /// thread for each received value.
    pub fn new(rx: Receiver<T>, handler: impl FnMut(T) + Send + 'static) -> Self {
        Self {
            rx: Some(rx),
            handler: Some(Arc::new(Mutex::new(Box::new(handler)))),
        }
    }
}

impl<T: Send + 'static> Watcher for ChannelWatcher<T> {
    fn start(&mut self, ctx: &WatcherCtx) {
        let (Some(rx), Some(handler)) = (self.rx.take(), self.handler.take()) else {
            return;
        };
        ctx.spawn("channel", move |ctx| {
            loop {
                select! {
                    recv(rx) -> msg => match msg {
                        Ok(value) => {
                            let h = Arc::clone(&handler);
                            ctx.enqueue(Box::new(move |_| {
                                if let Ok(mut f) = h.lock() {
                                    f(value);
                                }
                            }));
                        }
                        Err(_) => return,
                    },
                    recv(ctx.stop_channel()) -> _ => return,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::el;
    use crossbeam_channel::{bounded, unbounded};
    use std::sync::atomic::AtomicU32;
    use weft_core::TestTerminal;

    fn test_ctx(cap: usize) -> (WatcherCtx, Receiver<Job>, Sender<()>) {
        let (jobs_tx, jobs_rx) = bounded(cap);
        let (stop_tx, stop_rx) = bounded(0);
        (WatcherCtx::new(jobs_tx, stop_rx), jobs_rx, stop_tx)
    }

    fn test_app() -> App {
        App::new(el()).with_terminal(Box::new(TestTerminal::new(10, 5)))
    }

    fn drain_and_run(rx: &Receiver<Job>, app: &mut App, timeout: Duration) -> usize {
        let mut n = 0;
        while let Ok(job) = rx.recv_timeout(timeout) {
            job(app);
            n += 1;
        }
        n
    }

    #[test]
    fn timer_fires_once() {
        let (ctx, jobs, stop) = test_ctx(16);
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let mut timer = Timer::new(Duration::from_millis(5), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        timer.start(&ctx);

        let mut app = test_app();
        let ran = drain_and_run(&jobs, &mut app, Duration::from_millis(500));
        assert_eq!(ran, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        drop(stop);
        ctx.join_all();
    }

    #[test]
    fn timer_cancelled_by_stop() {
        let (ctx, jobs, stop) = test_ctx(16);
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let mut timer = Timer::new(Duration::from_secs(60), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        timer.start(&ctx);

        drop(stop);
        ctx.join_all();
        assert!(jobs.try_recv().is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ticker_fires_repeatedly() {
        let (ctx, jobs, stop) = test_ctx(64);
        let fired = Arc::new(AtomicU32::new(0));
        let f = Arc::clone(&fired);
        let mut ticker = Ticker::new(Duration::from_millis(3), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        ticker.start(&ctx);

        let mut app = test_app();
        let mut ran = 0;
        while ran < 3 {
            match jobs.recv_timeout(Duration::from_millis(500)) {
                Ok(job) => {
                    job(&mut app);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        drop(stop);
        ctx.join_all();
        assert!(fired.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn channel_watcher_forwards_values() {
        let (ctx, jobs, stop) = test_ctx(16);
        let (tx, rx) = unbounded();
        let sum = Arc::new(AtomicU32::new(0));
        let s = Arc::clone(&sum);
        let mut watcher = ChannelWatcher::new(rx, move |v: u32| {
            s.fetch_add(v, Ordering::SeqCst);
        });
        watcher.start(&ctx);

        tx.send(3).ok();
        tx.send(4).ok();

        let mut app = test_app();
        let mut ran = 0;
        while ran < 2 {
            match jobs.recv_timeout(Duration::from_millis(500)) {
                Ok(job) => {
                    job(&mut app);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        assert_eq!(sum.load(Ordering::SeqCst), 7);

        drop(stop);
        ctx.join_all();
    }

    #[test]
    fn channel_watcher_exits_on_sender_drop() {
        let (ctx, _jobs, stop) = test_ctx(16);
        let (tx, rx) = unbounded::<u32>();
        let mut watcher = ChannelWatcher::new(rx, move |_| {});
        watcher.start(&ctx);
        drop(tx);
        // The watcher thread exits on its own; join must not hang.
        ctx.join_all();
        drop(stop);
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (ctx, jobs, _stop) = test_ctx(1);
        ctx.enqueue(Box::new(|_| {}));
        ctx.enqueue(Box::new(|_| {})); // queue full → dropped after timeout
        assert_eq!(ctx.dropped_count(), 1);
        assert!(jobs.try_recv().is_ok());
    }
}
