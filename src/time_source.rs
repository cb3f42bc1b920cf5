//! The host capability that drives a progress clock.

/// Identifies a tick registered with a [`TimeSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A callback registered to run on the next tick.
pub type TickCallback = Box<dyn FnOnce() + Send>;

pub trait TimeSource: std::fmt::Debug + Send + Sync {
    /// Returns the current time in milliseconds.
    /// Expected to be non-decreasing, but callers must tolerate regressions.
    fn now(&self) -> f64;

    /// Registers `callback` to run once on the next tick.
    /// The callback must not run before this method returns.
    fn schedule_tick(&self, callback: TickCallback) -> TickHandle;

    /// Unregisters a pending tick. Unknown or already fired handles are ignored.
    fn cancel(&self, handle: TickHandle);
}
