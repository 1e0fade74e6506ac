use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Periodic elapsed-time tick for a playing session.
///
/// The tick thread only calls `notify`; the owner decides what a tick means
/// on its own thread. At most one tick loop runs at a time and `stop` returns
/// only after the loop has exited.
pub struct Ticker {
    interval: Duration,
    notify: Arc<dyn Fn() + Send + Sync>,
    running: Option<TickLoop>,
}

struct TickLoop {
    stop: Sender<()>,
    join: JoinHandle<()>,
}

impl Ticker {
    pub fn new(interval: Duration, notify: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            interval,
            notify: Arc::new(notify),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking. No-op while a loop is already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let (stop, stop_rx) = mpsc::channel::<()>();
        let notify = self.notify.clone();
        let interval = self.interval;
        let join = thread::spawn(move || {
            // Dropping the sender ends the wait immediately.
            while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                notify();
            }
        });
        self.running = Some(TickLoop { stop, join });
    }

    /// Cancel the running loop and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(tick) = self.running.take() {
            drop(tick.stop);
            let _ = tick.join.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
