//! A time source that ticks at a fixed period on a tokio runtime.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::{trace, warn};

use crate::{lock, TickCallback, TickHandle, TimeSource};

#[derive(Debug, Clone)]
pub struct Config {
    /// Time between a tick being scheduled and its callback running.
    pub period: Duration,
}

impl Default for Config {
    /// Roughly one display repaint at 60Hz.
    fn default() -> Self {
        Self {
            period: Duration::from_millis(16),
        }
    }
}

#[derive(Debug)]
pub struct FrameTimer {
    config: Config,
    /// Runtime the tick tasks are spawned on.
    runtime: Handle,
    /// `now()` is measured from this instant.
    origin: Instant,
    next_handle: AtomicU64,
    /// Tasks for ticks that have not fired yet.
    pending: Arc<Mutex<HashMap<TickHandle, JoinHandle<()>>>>,
}

impl FrameTimer {
    pub fn new(config: Config, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            origin: Instant::now(),
            next_handle: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the number of ticks that are scheduled but have not fired.
    pub fn pending_ticks(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl TimeSource for FrameTimer {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn schedule_tick(&self, callback: TickCallback) -> TickHandle {
        let handle = TickHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let period = self.config.period;
        let pending = Arc::clone(&self.pending);

        // The task can only remove its entry after it has been inserted.
        let mut tasks = lock(&self.pending);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(period).await;

            // A missing entry means the tick was cancelled while the task was waking up.
            let fired = lock(&pending).remove(&handle).is_some();
            if fired {
                trace!(handle = handle.id(), "frame tick");
                callback();
            }
        });

        tasks.insert(handle, task);

        handle
    }

    fn cancel(&self, handle: TickHandle) {
        match lock(&self.pending).remove(&handle) {
            Some(task) => task.abort(),
            None => warn!(
                handle = handle.id(),
                "cancelled a tick that already fired or was never scheduled"
            ),
        }
    }
}
