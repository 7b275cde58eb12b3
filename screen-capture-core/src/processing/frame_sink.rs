use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::event::CaptureEvent;
use crate::models::frame::Frame;
use crate::models::summary::CaptureDiagnostics;
use crate::processing::frame_copy::{copy_pixel_buffer, CopyError};
use crate::session::event_hub::EventHub;
use crate::traits::pixel_buffer::PixelBuffer;

const GATE_CLOSED: u8 = 0;
const GATE_OPEN: u8 = 1;
const GATE_PAUSED: u8 = 2;

/// State shared between a session and the frame callback.
///
/// The frame path never takes the session's own locks; it only reads the
/// gate atomically, so a backend whose `stop_running` waits for the capture
/// queue cannot deadlock against it.
pub(crate) struct SinkState {
    pub(crate) hub: EventHub,
    pub(crate) diagnostics: Mutex<CaptureDiagnostics>,
    gate: AtomicU8,
    next_sequence: AtomicU64,
}

impl SinkState {
    pub(crate) fn new() -> Self {
        Self {
            hub: EventHub::new(),
            diagnostics: Mutex::new(CaptureDiagnostics::default()),
            gate: AtomicU8::new(GATE_CLOSED),
            next_sequence: AtomicU64::new(0),
        }
    }

    pub(crate) fn open(&self) {
        self.gate.store(GATE_OPEN, Ordering::SeqCst);
    }

    pub(crate) fn pause(&self) {
        self.gate.store(GATE_PAUSED, Ordering::SeqCst);
    }

    pub(crate) fn close(&self) {
        self.gate.store(GATE_CLOSED, Ordering::SeqCst);
    }
}

/// Frame delivery endpoint handed to a backend on `start_running`.
///
/// Backends call [`FrameSink::deliver`] from their capture queue once per
/// frame callback. Cheap to clone.
#[derive(Clone)]
pub struct FrameSink {
    state: Arc<SinkState>,
}

impl FrameSink {
    pub(crate) fn new(state: Arc<SinkState>) -> Self {
        Self { state }
    }

    /// Handle one frame callback.
    ///
    /// `buffer` is `None` when the platform delivered a sample without an
    /// image buffer; such frames are dropped silently. Otherwise the buffer
    /// is locked, copied, unlocked and published as a `CaptureEvent::Frame`.
    pub fn deliver<P: PixelBuffer + ?Sized>(&self, buffer: Option<&P>, timestamp: Duration) {
        match self.state.gate.load(Ordering::SeqCst) {
            GATE_OPEN => {}
            GATE_PAUSED => {
                self.state.diagnostics.lock().frames_skipped += 1;
                return;
            }
            _ => return,
        }

        let Some(buffer) = buffer else {
            log::trace!("frame callback without pixel buffer, dropping");
            self.state.diagnostics.lock().frames_dropped += 1;
            return;
        };

        let pixels = match copy_pixel_buffer(buffer) {
            Ok(pixels) => pixels,
            Err(error) => {
                log::warn!("Failed to copy pixel buffer: {}", error);
                {
                    let mut diagnostics = self.state.diagnostics.lock();
                    match error {
                        CopyError::Lock(_) => diagnostics.lock_failures += 1,
                        CopyError::SizeOverflow { .. } | CopyError::NullBaseAddress => {
                            diagnostics.copy_failures += 1
                        }
                    }
                }
                self.state
                    .hub
                    .publish(CaptureEvent::Error(CaptureError::Backend(error.to_string())));
                return;
            }
        };

        let frame = Frame {
            sequence: self.state.next_sequence.fetch_add(1, Ordering::SeqCst),
            width: pixels.width,
            height: pixels.height,
            bytes_per_row: pixels.bytes_per_row,
            pixel_format: pixels.pixel_format,
            timestamp,
            data: pixels.data,
        };

        {
            let mut diagnostics = self.state.diagnostics.lock();
            diagnostics.frames_delivered += 1;
            diagnostics.bytes_delivered += frame.data.len() as u64;
        }

        self.state.hub.publish(CaptureEvent::Frame(Arc::new(frame)));
    }

    /// Whether frames are currently being forwarded.
    pub fn is_accepting(&self) -> bool {
        self.state.gate.load(Ordering::SeqCst) == GATE_OPEN
    }
}
