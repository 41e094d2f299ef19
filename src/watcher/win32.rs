//! Win32 clipboard listener.
//!
//! A message-only window is registered with `AddClipboardFormatListener`;
//! `WM_CLIPBOARDUPDATE` is posted to it on every change. `DestroyWindow`
//! triggers `WM_DESTROY`, which posts `WM_QUIT` and ends the loop.
//!
//! # Safety
//! Every FFI call sits in a local `unsafe` block. Clipboard memory is only
//! touched while both the clipboard is open and the global handle is locked,
//! and both are released by guards.

use super::extract::{AccessError, ClipboardAccess};
use super::source::{EventSource, WatchEvent};
use super::{RegistrationError, WatchError};
use std::io;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{
    ERROR_CLASS_ALREADY_EXISTS, HGLOBAL, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM,
};
use windows::Win32::System::DataExchange::{
    AddClipboardFormatListener, CloseClipboard, GetClipboardData, IsClipboardFormatAvailable,
    OpenClipboard, RemoveClipboardFormatListener,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Memory::{GlobalLock, GlobalSize, GlobalUnlock};
use windows::Win32::System::Ole::CF_UNICODETEXT;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostQuitMessage, RegisterClassExW, TranslateMessage, HWND_MESSAGE, MSG, WINDOW_EX_STYLE,
    WINDOW_STYLE, WM_CLIPBOARDUPDATE, WM_DESTROY, WNDCLASSEXW,
};

const WINDOW_CLASS: PCWSTR = w!("GoosnifferClipboardWatcher");

fn os_error(step: &'static str) -> RegistrationError {
    RegistrationError::Os {
        step,
        message: io::Error::last_os_error().to_string(),
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Hidden window receiving clipboard notifications for this thread.
///
/// Must be created and polled on the same thread.
pub struct Win32EventSource {
    hwnd: HWND,
}

impl Win32EventSource {
    /// Register the window class, create the window and subscribe to
    /// clipboard updates.
    pub fn register() -> Result<Self, RegistrationError> {
        // SAFETY: plain Win32 calls; the class name is a static string and
        // the window procedure lives for the whole program.
        unsafe {
            let module = GetModuleHandleW(None).map_err(|e| RegistrationError::Os {
                step: "GetModuleHandleW",
                message: e.to_string(),
            })?;
            let instance = HINSTANCE(module.0);

            let class = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(window_proc),
                hInstance: instance,
                lpszClassName: WINDOW_CLASS,
                ..Default::default()
            };
            if RegisterClassExW(&class) == 0 {
                let err = io::Error::last_os_error();
                // A second watcher in the same process reuses the class.
                if err.raw_os_error() != Some(ERROR_CLASS_ALREADY_EXISTS.0 as i32) {
                    return Err(RegistrationError::Os {
                        step: "RegisterClassExW",
                        message: err.to_string(),
                    });
                }
            }

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS,
                PCWSTR::null(),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                Some(HWND_MESSAGE),
                None,
                Some(instance),
                None,
            )
            .map_err(|e| RegistrationError::Os {
                step: "CreateWindowExW",
                message: e.to_string(),
            })?;

            if AddClipboardFormatListener(hwnd).is_err() {
                let err = os_error("AddClipboardFormatListener");
                let _ = DestroyWindow(hwnd);
                return Err(err);
            }

            Ok(Self { hwnd })
        }
    }

    /// Clipboard access owned by this window.
    pub fn clipboard(&self) -> Win32Clipboard {
        Win32Clipboard { owner: self.hwnd }
    }
}

impl EventSource for Win32EventSource {
    fn next_event(&mut self) -> Result<Option<WatchEvent>, WatchError> {
        let mut msg = MSG::default();
        // SAFETY: msg is a valid out pointer; a null window filter is needed
        // to see WM_QUIT, which is a thread message.
        let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match ret.0 {
            -1 => Err(WatchError::Loop(io::Error::last_os_error().to_string())),
            0 => Ok(None),
            _ if msg.message == WM_CLIPBOARDUPDATE => Ok(Some(WatchEvent::ClipboardUpdate)),
            _ => {
                // SAFETY: msg was filled in by GetMessageW.
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
                Ok(Some(WatchEvent::Other))
            }
        }
    }
}

impl Drop for Win32EventSource {
    fn drop(&mut self) {
        // SAFETY: both calls fail harmlessly if the window is already gone.
        unsafe {
            let _ = RemoveClipboardFormatListener(self.hwnd);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

/// The system clipboard, opened on behalf of the watcher window.
pub struct Win32Clipboard {
    owner: HWND,
}

/// Unlocks a global memory handle when dropped.
struct GlobalLockGuard {
    handle: HGLOBAL,
}

impl Drop for GlobalLockGuard {
    fn drop(&mut self) {
        // SAFETY: the handle was locked by GlobalLock in read_wide.
        unsafe {
            let _ = GlobalUnlock(self.handle);
        }
    }
}

impl ClipboardAccess for Win32Clipboard {
    fn has_text(&self) -> bool {
        // SAFETY: no pointers involved.
        unsafe { IsClipboardFormatAvailable(u32::from(CF_UNICODETEXT.0)).is_ok() }
    }

    fn open(&mut self) -> Result<(), AccessError> {
        // SAFETY: owner is a live window created by Win32EventSource.
        unsafe { OpenClipboard(Some(self.owner)) }.map_err(|e| AccessError(e.to_string()))
    }

    fn close(&mut self) {
        // SAFETY: only called after a successful open.
        unsafe {
            let _ = CloseClipboard();
        }
    }

    fn read_wide(&mut self) -> Result<Option<Vec<u16>>, AccessError> {
        // SAFETY: the clipboard is open (trait contract). The locked region is
        // read only within GlobalSize bytes and copied before the guard unlocks.
        unsafe {
            let handle = match GetClipboardData(u32::from(CF_UNICODETEXT.0)) {
                Ok(handle) if !handle.is_invalid() => handle,
                _ => return Ok(None),
            };
            let global = HGLOBAL(handle.0);

            let ptr = GlobalLock(global) as *const u16;
            if ptr.is_null() {
                return Err(AccessError(io::Error::last_os_error().to_string()));
            }
            let _lock = GlobalLockGuard { handle: global };

            let capacity = GlobalSize(global) / std::mem::size_of::<u16>();
            let units = std::slice::from_raw_parts(ptr, capacity);
            let len = units.iter().position(|&u| u == 0).unwrap_or(capacity);
            Ok(Some(units[..len].to_vec()))
        }
    }
}
