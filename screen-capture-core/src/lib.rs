//! # screen-capture-core
//!
//! Platform-agnostic screen capture core library.
//!
//! Builds and validates capture sessions, copies every delivered pixel
//! buffer into an owned frame, and publishes lifecycle and frame events.
//! Platform backends (macOS AVFoundation) implement the `CaptureBackend`
//! trait and plug into the generic `ScreenCapture` session.
//!
//! ## Architecture
//!
//! ```text
//! screen-capture-core (this crate)
//! ├── traits/       ← CaptureBackend, CaptureGraph, PixelBuffer, CaptureHandler
//! ├── models/       ← CaptureError, CaptureOptions, CaptureEvent, Frame, devices
//! ├── processing/   ← pixel buffer copy, FrameSink
//! ├── session/      ← ScreenCapture (builder + controller), EventHub
//! └── backend/      ← SyntheticBackend (in-memory)
//! ```
//!
//! ## Usage
//! ```no_run
//! use screen_capture_core::{CaptureEvent, CaptureOptions, ScreenCapture, SyntheticBackend};
//!
//! let backend = SyntheticBackend::new();
//! let mut capture = ScreenCapture::new(&backend, CaptureOptions::default())?;
//! let events = capture.subscribe();
//! capture.start()?;
//! for event in events.iter().take(10) {
//!     if let CaptureEvent::Frame(frame) = event {
//!         println!("frame {} ({} bytes)", frame.sequence, frame.data.len());
//!     }
//! }
//! capture.stop()?;
//! # Ok::<(), screen_capture_core::CaptureError>(())
//! ```

pub mod backend;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use backend::synthetic::{SyntheticBackend, SyntheticBehavior, SyntheticPixelBuffer};
pub use models::config::{AudioInput, CaptureOptions, FrameInterval, ScreenId, VideoCodec};
pub use models::devices::{AudioDevice, DisplayInfo, MediaType, TransportType};
pub use models::error::CaptureError;
pub use models::event::CaptureEvent;
pub use models::frame::{Frame, PixelFormat};
pub use models::geometry::CropRect;
pub use models::state::CaptureState;
pub use models::summary::{CaptureDiagnostics, SessionSummary};
pub use processing::frame_copy::{copy_pixel_buffer, CopiedPixels, CopyError};
pub use processing::frame_sink::FrameSink;
pub use session::event_hub::{EventHub, EventReceiver, SUBSCRIBER_FRAME_CAPACITY};
pub use session::screen_capture::ScreenCapture;
pub use traits::capture_backend::{CaptureBackend, CaptureGraph, ScreenInputSettings};
pub use traits::capture_handler::CaptureHandler;
pub use traits::pixel_buffer::PixelBuffer;
