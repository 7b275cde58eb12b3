use crate::models::error::CaptureError;
use crate::models::frame::Frame;

/// Callback-style observer for capture session events.
///
/// Any number of handlers can be registered on a session; each one is
/// invoked in registration order. Lifecycle methods run on the thread that
/// called `start`/`stop`/`pause`/`resume`; `on_frame` and frame-path
/// `on_error` calls run on the backend's frame delivery thread.
pub trait CaptureHandler: Send + Sync {
    fn on_start(&self) {}

    fn on_finish(&self) {}

    fn on_pause(&self) {}

    fn on_resume(&self) {}

    fn on_error(&self, _error: &CaptureError) {}

    /// Called once per delivered frame. Keep this short; it runs on the
    /// capture queue and delays the next frame.
    fn on_frame(&self, _frame: &Frame) {}
}
