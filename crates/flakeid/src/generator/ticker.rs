use core::{ops::ControlFlow, time::Duration};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

/// A background thread that runs a callback once per millisecond.
///
/// The thread starts in [`Ticker::start`] and runs until the callback returns
/// [`ControlFlow::Break`] or [`Ticker::stop`] is called. Dropping a `Ticker`
/// stops and joins it, so the thread never outlives its owner.
#[derive(Debug)]
pub struct Ticker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the ticker thread.
    ///
    /// `on_tick` is first called one millisecond after start and then at
    /// each following millisecond boundary measured from start. Ticks missed
    /// because the thread was descheduled are skipped, not replayed.
    pub fn start<F>(mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || {
            let _exit = ClearOnExit(Arc::clone(&flag));
            let start = Instant::now();
            let mut tick = 1;

            while flag.load(Ordering::Acquire) {
                // Compute the absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                // Park if we are early; `stop` unparks us
                let now = Instant::now();
                if now < target {
                    thread::park_timeout(target - now);
                    continue;
                }

                if on_tick().is_break() {
                    break;
                }

                // Align to next tick after the current actual time
                tick = u64::try_from(start.elapsed().as_millis())
                    .unwrap_or(u64::MAX)
                    .saturating_add(1);
            }

            tracing::debug!("ticker thread exited");
        });

        tracing::debug!("ticker thread started");
        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Returns `false` once the ticker has been stopped or its callback
    /// asked it to exit.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the thread and waits for it to exit. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            // A panicked callback has already stopped ticking.
            let _ = handle.join();
        }
    }
}

/// Clears the running flag however the thread exits, including by a panic in
/// the callback.
struct ClearOnExit(Arc<AtomicBool>);

impl Drop for ClearOnExit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
