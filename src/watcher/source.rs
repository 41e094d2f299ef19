//! Event sources that feed the watcher loop.

use super::WatchError;

/// What the OS told the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// Clipboard content changed.
    ClipboardUpdate,
    /// Some other message; already dispatched by the source.
    Other,
}

/// A blocking stream of OS notifications.
pub trait EventSource {
    /// Wait for the next event.
    ///
    /// `Ok(None)` means the source was torn down and the loop should end.
    fn next_event(&mut self) -> Result<Option<WatchEvent>, WatchError>;
}
