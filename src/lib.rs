use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};

use tracing::{debug, trace};

pub use error::{Error, Result};
pub use stream::ProgressStream;
pub use time_source::{TickCallback, TickHandle, TimeSource};

mod error;
pub mod fall;
pub mod frame_timer;
mod stream;
mod time_source;

/// A linear progress ramp from 0 to 1 over a fixed duration.
///
/// The clock is a recipe: building one has no side effects. Every call to
/// [`ProgressClock::subscribe`] or [`ProgressClock::stream`] runs its own
/// independent session, with its own start timestamp and pending tick.
#[derive(Debug, Clone)]
pub struct ProgressClock {
    /// How long the ramp lasts, in milliseconds.
    duration: f64,
    /// Provides the current time and the ticks that advance the ramp.
    time_source: Arc<dyn TimeSource>,
}

/// Receives the values emitted by a session.
pub trait Observer: Send {
    /// Called once per tick with a value in `[0, 1]`.
    fn on_progress(&mut self, progress: f64);

    /// Called once after the terminal `1.0` has been emitted.
    /// Never called for a cancelled session.
    fn on_complete(&mut self) {}
}

impl<F> Observer for F
where
    F: FnMut(f64) + Send,
{
    fn on_progress(&mut self, progress: f64) {
        self(progress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Completed,
    Cancelled,
}

impl ProgressClock {
    pub fn new(duration: f64, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            duration,
            time_source,
        }
    }

    /// The ramp duration in milliseconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Starts a session that pushes every progress value to `observer`.
    ///
    /// Fails with [`Error::InvalidDuration`] before touching the time source
    /// when the duration is not strictly positive.
    pub fn subscribe<O>(&self, observer: O) -> Result<Subscription>
    where
        O: Observer + 'static,
    {
        self.validate()?;
        Ok(self.start(Box::new(observer)))
    }

    /// Returns the ramp as a [`futures::Stream`]. The session starts on the first poll.
    pub fn stream(&self) -> Result<ProgressStream> {
        self.validate()?;
        Ok(ProgressStream::new(self.clone()))
    }

    fn validate(&self) -> Result<()> {
        if self.duration > 0.0 && self.duration.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidDuration {
                duration: self.duration,
            })
        }
    }

    /// Starts a session. The duration must have been validated.
    fn start(&self, observer: Box<dyn Observer>) -> Subscription {
        let start = self.time_source.now();

        let session = Arc::new(Session {
            duration: self.duration,
            start,
            time_source: Arc::clone(&self.time_source),
            live: AtomicBool::new(true),
            state: Mutex::new(SessionState::Running),
            pending: Mutex::new(None),
            observer: Mutex::new(observer),
        });

        debug!(duration = self.duration, start, "progress clock session started");

        session.schedule_next();

        Subscription { session }
    }
}

/// A running session. Dropping it cancels the session.
#[must_use = "dropping a subscription cancels its session"]
pub struct Subscription {
    session: Arc<Session>,
}

impl Subscription {
    /// Stops the session and unregisters its pending tick.
    /// Does nothing once the session has completed or was already cancelled.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.session.state)
    }

    /// The time source reading captured when the session started.
    pub fn start_timestamp(&self) -> f64 {
        self.session.start
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("duration", &self.session.duration)
            .field("start", &self.session.start)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.session.cancel();
    }
}

struct Session {
    duration: f64,
    /// Time source reading when the session started.
    start: f64,
    time_source: Arc<dyn TimeSource>,
    /// Cleared exactly once, by completion or by cancellation.
    /// Every tick checks it before doing anything.
    live: AtomicBool,
    state: Mutex<SessionState>,
    /// The tick registered with the time source, if any.
    pending: Mutex<Option<TickHandle>>,
    observer: Mutex<Box<dyn Observer>>,
}

impl Session {
    fn progress(&self, now: f64) -> f64 {
        // A time source that goes backwards yields 0, never a negative value.
        let elapsed = (now - self.start).max(0.0);
        (elapsed / self.duration).min(1.0)
    }

    fn schedule_next(self: &Arc<Self>) {
        // Holding `pending` while checking `live` means a concurrent cancel
        // either prevents this registration or sees it and unregisters it.
        let mut pending = lock(&self.pending);

        if !self.live.load(Ordering::Acquire) {
            return;
        }

        let session: Weak<Session> = Arc::downgrade(self);
        let handle = self.time_source.schedule_tick(Box::new(move || {
            if let Some(session) = session.upgrade() {
                session.tick();
            }
        }));

        *pending = Some(handle);
    }

    fn tick(self: &Arc<Self>) {
        if !self.live.load(Ordering::Acquire) {
            trace!("tick fired after the session ended, ignoring");
            return;
        }

        lock(&self.pending).take();

        let progress = self.progress(self.time_source.now());

        if progress < 1.0 {
            trace!(progress, "progress clock tick");
            lock(&self.observer).on_progress(progress);
            // The observer may have cancelled the session.
            self.schedule_next();
            return;
        }

        if self
            .live
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        *lock(&self.state) = SessionState::Completed;

        debug!(duration = self.duration, start = self.start, "progress clock session completed");

        let mut observer = lock(&self.observer);
        observer.on_progress(1.0);
        observer.on_complete();
    }

    fn cancel(&self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }

        *lock(&self.state) = SessionState::Cancelled;

        if let Some(handle) = lock(&self.pending).take() {
            self.time_source.cancel(handle);
        }

        debug!(duration = self.duration, start = self.start, "progress clock session cancelled");
    }
}

/// Locks `mutex`, recovering the guard if a previous holder panicked.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
