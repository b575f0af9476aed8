//! Observer interface between sessions and their caller.
//!
//! The core reports through these two capability methods and depends on
//! nothing else, never on a concrete UI. Both are invoked synchronously
//! from the session's worker.

/// Receives human-readable status lines and per-part progress.
pub trait SessionObserver: Send + Sync {
    /// A status line suitable for a log pane.
    fn on_log(&self, _message: &str) {}

    /// Percentage (0–100) of the in-flight part. Non-decreasing while a
    /// part is moving; resets to 0 when the next part starts.
    fn on_progress(&self, _percent: u8) {}
}

/// Observer that discards everything.
pub struct NullObserver;

impl SessionObserver for NullObserver {}
