//! Platform abstraction traits for hookdom runtime services.
//!
//! The core never blocks or spawns threads. It tells the embedding
//! environment that queued work exists and leaves the decision of when to run
//! the next cooperative turn to the host event loop.

/// Receives wake-up requests from a [`Runtime`](crate::Runtime).
///
/// Implementations must be cheap and must not drain the runtime themselves;
/// they only arrange for the owner of the runtime to do so later. They must be
/// safe to share across threads so a waker can be forwarded to an event loop.
pub trait RuntimeScheduler: Send + Sync {
    /// Called when the task queue goes from empty to non-empty.
    fn request_drain(&self);
}
