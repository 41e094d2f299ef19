//! Turning one clipboard notification into an owned string.

use super::backoff::{BackoffPolicy, Sleeper};
use std::string::FromUtf16Error;
use thiserror::Error;

/// Error reported by the platform clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AccessError(pub String);

/// Why a notification produced no text. None of these stop the watcher.
#[derive(Debug, Error)]
pub enum ExtractSkip {
    #[error("clipboard holds no unicode text")]
    NoText,
    #[error("clipboard still locked after {attempts} attempts: {last_error}")]
    Contended {
        attempts: u32,
        last_error: AccessError,
    },
    #[error("clipboard returned a null text handle")]
    NullHandle,
    #[error("could not lock clipboard memory: {0}")]
    Lock(AccessError),
    #[error("clipboard text is not valid UTF-16")]
    Decode(#[from] FromUtf16Error),
}

/// Low-level access to a clipboard shared with other processes.
///
/// `open` is a single attempt; retrying is the caller's job. `read_wide` is
/// only called between a successful `open` and the matching `close`.
pub trait ClipboardAccess {
    /// Whether unicode text is currently on the clipboard.
    fn has_text(&self) -> bool;

    fn open(&mut self) -> Result<(), AccessError>;

    fn close(&mut self);

    /// Copy the text payload out as UTF-16 code units.
    ///
    /// Returns `Ok(None)` when the clipboard hands back a null handle. The
    /// returned buffer is owned; nothing may point into clipboard memory
    /// once this returns.
    fn read_wide(&mut self) -> Result<Option<Vec<u16>>, AccessError>;
}

/// Closes the clipboard when dropped.
struct OpenClipboard<'a, A: ClipboardAccess + ?Sized> {
    access: &'a mut A,
}

impl<A: ClipboardAccess + ?Sized> Drop for OpenClipboard<'_, A> {
    fn drop(&mut self) {
        self.access.close();
    }
}

/// Decode UTF-16 up to the first NUL, or the whole buffer if there is none.
pub fn decode_wide(units: &[u16]) -> Result<String, FromUtf16Error> {
    let len = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16(&units[..len])
}

/// Run the extraction sequence: check format, open with backoff, copy,
/// decode, close.
pub fn extract_text<A, S>(
    access: &mut A,
    policy: &BackoffPolicy,
    sleeper: &mut S,
) -> Result<String, ExtractSkip>
where
    A: ClipboardAccess + ?Sized,
    S: Sleeper + ?Sized,
{
    if !access.has_text() {
        return Err(ExtractSkip::NoText);
    }

    policy
        .retry(sleeper, |_| access.open())
        .map_err(|exhausted| ExtractSkip::Contended {
            attempts: exhausted.attempts,
            last_error: exhausted.last_error,
        })?;

    let mut session = OpenClipboard { access };
    let units = session
        .access
        .read_wide()
        .map_err(ExtractSkip::Lock)?
        .ok_or(ExtractSkip::NullHandle)?;
    let text = decode_wide(&units)?;
    Ok(text)
}
