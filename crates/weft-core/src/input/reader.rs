//! Background input reader.
//!
//! A single thread polls stdin with a bounded timeout, feeds raw bytes
//! through the [`Parser`](super::parser::Parser), and sends decoded
//! events over a channel. SIGWINCH is observed via a signal flag; resize
//! bursts are debounced (~16 ms, extended by further signals) before the
//! final dimensions are emitted.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use crate::error::{CoreError, Result};

use super::event::Event;
use super::parser::Parser;

/// Debounce window for resize bursts.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(16);

/// Handle to the background input reader thread.
pub struct InputReader {
    events: Receiver<Event>,
    handle: Option<JoinHandle<()>>,
}

impl InputReader {
    /// Spawn the reader thread. It polls stdin with `poll_interval` as
    /// the bounded timeout and exits when `stop` is closed or stdin hits
    /// EOF.
    pub fn spawn(stop: Receiver<()>, poll_interval: Duration) -> Result<Self> {
        let (tx, rx) = unbounded();

        let winch = Arc::new(AtomicBool::new(false));
        #[cfg(unix)]
        signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(&winch))
            .map_err(|e| CoreError::Input(format!("signal registration failed: {e}")))?;

        let handle = std::thread::Builder::new()
            .name("weft-input".into())
            .spawn(move || read_loop(&tx, &stop, &winch, poll_interval))
            .map_err(|e| CoreError::Input(format!("failed to spawn reader: {e}")))?;

        Ok(Self {
            events: rx,
            handle: Some(handle),
        })
    }

    /// The channel of decoded events.
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Wait for the reader thread to exit. Call after closing the stop
    /// channel.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("input reader thread panicked");
        }
    }
}

fn read_loop(
    tx: &Sender<Event>,
    stop: &Receiver<()>,
    winch: &AtomicBool,
    poll_interval: Duration,
) {
    let mut parser = Parser::new();
    let mut debounce = ResizeDebounce::new(RESIZE_DEBOUNCE);
    let mut buf = [0u8; 1024];

    loop {
        match stop.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {}
        }

        let now = Instant::now();
        if winch.swap(false, Ordering::Relaxed) {
            debounce.signal(now);
        }
        if debounce.expired(now)
            && let Ok((w, h)) = crossterm::terminal::size()
            && tx.send(Event::Resize(w, h)).is_err()
        {
            return;
        }

        if poll_stdin(poll_interval) {
            let n = match std::io::stdin().lock().read(&mut buf) {
                Ok(0) => return, // EOF
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    return;
                }
            };
            for ev in parser.feed(&buf[..n]) {
                if tx.send(ev).is_err() {
                    return;
                }
            }
        } else if let Some(ev) = parser.idle_flush()
            && tx.send(ev).is_err()
        {
            return;
        }
    }
}

/// Poll stdin for readability with a bounded timeout.
#[cfg(unix)]
fn poll_stdin(timeout: Duration) -> bool {
    let mut fds = libc::pollfd {
        fd: 0,
        events: libc::POLLIN,
        revents: 0,
    };
    let ms = timeout.as_millis().min(1000) as i32;
    let r = unsafe { libc::poll(&mut fds, 1, ms) };
    r > 0 && (fds.revents & libc::POLLIN) != 0
}

#[cfg(not(unix))]
fn poll_stdin(timeout: Duration) -> bool {
    std::thread::sleep(timeout);
    false
}

/// Collapses a burst of resize signals into one emission. Each signal
/// extends the deadline; the resize fires once the window elapses with
/// no further signals.
#[derive(Debug)]
struct ResizeDebounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl ResizeDebounce {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    fn signal(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    fn expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_fires_after_window() {
        let mut d = ResizeDebounce::new(Duration::from_millis(16));
        let t0 = Instant::now();
        d.signal(t0);
        assert!(!d.expired(t0));
        assert!(!d.expired(t0 + Duration::from_millis(10)));
        assert!(d.expired(t0 + Duration::from_millis(16)));
        // One-shot: a second query is false.
        assert!(!d.expired(t0 + Duration::from_millis(32)));
    }

    #[test]
    fn debounce_extended_by_later_signal() {
        let mut d = ResizeDebounce::new(Duration::from_millis(16));
        let t0 = Instant::now();
        d.signal(t0);
        d.signal(t0 + Duration::from_millis(10));
        assert!(!d.expired(t0 + Duration::from_millis(16)));
        assert!(d.expired(t0 + Duration::from_millis(26)));
    }

    #[test]
    fn debounce_idle_without_signal() {
        let mut d = ResizeDebounce::new(Duration::from_millis(16));
        assert!(!d.expired(Instant::now()));
    }
}
