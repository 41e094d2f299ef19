//! Clipboard change watcher.
//!
//! The watcher owns one thread's event loop. Every clipboard update runs the
//! extraction sequence in [`extract_text`] and hands the decoded text to the
//! caller's handler, synchronously, on that same thread. Anything that goes
//! wrong while reading the clipboard only skips that one notification.
//!
//! On Windows the loop is a hidden message-only window registered with
//! `AddClipboardFormatListener`. Other platforms fail registration.

mod backoff;
mod extract;
mod source;
#[cfg(windows)]
mod win32;

pub use backoff::{BackoffPolicy, RetryExhausted, Sleeper, ThreadSleeper};
pub use extract::{decode_wide, extract_text, AccessError, ClipboardAccess, ExtractSkip};
pub use source::{EventSource, WatchEvent};
#[cfg(windows)]
pub use win32::{Win32Clipboard, Win32EventSource};

use thiserror::Error;

/// Setting up the watcher failed; nothing is running.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("no clipboard handler was supplied")]
    MissingHandler,
    #[error("clipboard watching is only supported on Windows")]
    Unsupported,
    #[error("{step} failed: {message}")]
    Os { step: &'static str, message: String },
}

/// Fatal watcher errors. Clipboard read problems are never reported here.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to register clipboard listener: {0}")]
    Registration(#[from] RegistrationError),
    #[error("clipboard message loop failed: {0}")]
    Loop(String),
}

/// Callback receiving the text of each clipboard change.
pub type Handler<'h> = Box<dyn FnMut(&str) + 'h>;

/// Counters for one watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Notifications that reached the handler.
    pub delivered: u64,
    /// Notifications dropped during extraction.
    pub skipped: u64,
}

/// Builds a [`ClipboardWatcher`].
pub struct WatcherBuilder<'h> {
    handler: Option<Handler<'h>>,
    backoff: BackoffPolicy,
    sleeper: Option<Box<dyn Sleeper + 'h>>,
}

impl Default for WatcherBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> WatcherBuilder<'h> {
    pub fn new() -> Self {
        Self {
            handler: None,
            backoff: BackoffPolicy::default(),
            sleeper: None,
        }
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&str) + 'h,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Retry policy for opening the clipboard.
    pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = policy;
        self
    }

    /// Replace the thread sleeper used between retries.
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'h,
    {
        self.sleeper = Some(Box::new(sleeper));
        self
    }

    pub fn build(self) -> Result<ClipboardWatcher<'h>, RegistrationError> {
        let handler = self.handler.ok_or(RegistrationError::MissingHandler)?;
        Ok(ClipboardWatcher {
            handler,
            backoff: self.backoff,
            sleeper: self.sleeper.unwrap_or_else(|| Box::new(ThreadSleeper)),
            stats: WatchStats::default(),
        })
    }
}

/// Delivers clipboard text to a handler, one notification at a time.
pub struct ClipboardWatcher<'h> {
    handler: Handler<'h>,
    backoff: BackoffPolicy,
    sleeper: Box<dyn Sleeper + 'h>,
    stats: WatchStats,
}

impl<'h> ClipboardWatcher<'h> {
    pub fn builder() -> WatcherBuilder<'h> {
        WatcherBuilder::new()
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    /// Register with the OS clipboard and block until the loop ends.
    #[cfg(windows)]
    pub fn watch(&mut self) -> Result<(), WatchError> {
        let mut source = Win32EventSource::register()?;
        let mut clipboard = source.clipboard();
        log::info!("Clipboard listener registered");
        self.run(&mut source, &mut clipboard)
    }

    /// Register with the OS clipboard and block until the loop ends.
    #[cfg(not(windows))]
    pub fn watch(&mut self) -> Result<(), WatchError> {
        Err(RegistrationError::Unsupported.into())
    }

    /// Drive the loop from any event source and clipboard.
    ///
    /// Returns `Ok(())` once the source reports teardown.
    pub fn run<S, A>(&mut self, source: &mut S, clipboard: &mut A) -> Result<(), WatchError>
    where
        S: EventSource + ?Sized,
        A: ClipboardAccess + ?Sized,
    {
        while let Some(event) = source.next_event()? {
            if event == WatchEvent::ClipboardUpdate {
                self.on_clipboard_update(clipboard);
            }
        }

        log::info!(
            "Clipboard watcher stopped ({} delivered, {} skipped)",
            self.stats.delivered,
            self.stats.skipped
        );
        Ok(())
    }

    fn on_clipboard_update<A: ClipboardAccess + ?Sized>(&mut self, clipboard: &mut A) {
        match extract_text(clipboard, &self.backoff, self.sleeper.as_mut()) {
            Ok(text) => {
                self.stats.delivered += 1;
                (self.handler)(&text);
            }
            Err(skip @ ExtractSkip::Contended { .. }) => {
                self.stats.skipped += 1;
                log::warn!("Skipping clipboard change: {}", skip);
            }
            Err(skip) => {
                self.stats.skipped += 1;
                log::debug!("Skipping clipboard change: {}", skip);
            }
        }
    }
}

/// Call `handler` with the text of every clipboard change until the OS
/// tears the listener down.
pub fn watch<F: FnMut(&str)>(handler: F) -> Result<(), WatchError> {
    ClipboardWatcher::builder().handler(handler).build()?.watch()
}
