//! macOS privacy (TCC) checks for screen recording and the microphone.
//!
//! Screen recording has its own CoreGraphics preflight/request pair
//! (macOS 10.15+). Without it `AVCaptureScreenInput` still runs but only
//! delivers the desktop wallpaper. Microphone access goes through
//! `AVCaptureDevice` authorization.

use std::sync::mpsc;
use std::time::Duration;

use block::ConcreteBlock;
use cocoa::base::id;
use objc::runtime::{BOOL, NO};
use objc::{class, msg_send, sel, sel_impl};

use screen_capture_core::CaptureError;

use crate::ffi::{AVMediaTypeAudio, CGPreflightScreenCaptureAccess, CGRequestScreenCaptureAccess};

/// How long `request_microphone_access` waits for the user to answer.
const MICROPHONE_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    NotDetermined,
    Restricted,
    Denied,
    Granted,
}

impl PermissionStatus {
    /// Map an `AVAuthorizationStatus` value.
    pub fn from_av_authorization_status(status: i64) -> Self {
        match status {
            1 => Self::Restricted,
            2 => Self::Denied,
            3 => Self::Granted,
            _ => Self::NotDetermined,
        }
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Whether this process may record the screen. Never prompts.
pub fn check_screen_recording_permission() -> bool {
    unsafe { CGPreflightScreenCaptureAccess() }
}

/// Ask for screen recording access. The system shows its prompt at most
/// once per app; a grant only takes effect after the process restarts.
pub fn request_screen_recording_permission() -> bool {
    unsafe { CGRequestScreenCaptureAccess() }
}

/// `PermissionDenied` unless screen recording is already allowed.
pub fn ensure_screen_recording_permission() -> Result<(), CaptureError> {
    if check_screen_recording_permission() {
        Ok(())
    } else {
        log::warn!("Screen recording permission not granted");
        Err(CaptureError::PermissionDenied)
    }
}

pub fn check_microphone_permission() -> PermissionStatus {
    let status: i64 = unsafe {
        msg_send![class!(AVCaptureDevice), authorizationStatusForMediaType: AVMediaTypeAudio]
    };
    PermissionStatus::from_av_authorization_status(status)
}

/// Prompt for microphone access if undetermined and wait for the answer.
///
/// Must not be called from the main thread of an app whose run loop
/// delivers the completion handler.
pub fn request_microphone_permission() -> PermissionStatus {
    let current = check_microphone_permission();
    if current != PermissionStatus::NotDetermined {
        return current;
    }

    let (tx, rx) = mpsc::channel();
    let block = ConcreteBlock::new(move |granted: BOOL| {
        let _ = tx.send(granted != NO);
    });
    let block = block.copy();

    unsafe {
        let media_type: id = AVMediaTypeAudio;
        let _: () = msg_send![class!(AVCaptureDevice),
            requestAccessForMediaType: media_type
            completionHandler: &*block];
    }

    match rx.recv_timeout(MICROPHONE_PROMPT_TIMEOUT) {
        Ok(true) => PermissionStatus::Granted,
        Ok(false) => PermissionStatus::Denied,
        Err(_) => {
            log::warn!("Timed out waiting for microphone permission prompt");
            PermissionStatus::NotDetermined
        }
    }
}
