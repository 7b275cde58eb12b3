//! # screen-capture-macos
//!
//! AVFoundation backend for screen-capture-kit.
//!
//! Provides:
//! - `AvFoundationBackend`: `CaptureBackend` built on `AVCaptureSession`,
//!   `AVCaptureScreenInput`, `AVCaptureDeviceInput` and
//!   `AVCaptureVideoDataOutput`
//! - `displays` / `audio_devices`: device enumeration via CoreGraphics and
//!   `AVCaptureDevice`
//! - `permissions`: screen recording and microphone authorization
//!
//! ## Platform Requirements
//! - macOS 10.15+ (screen recording permission APIs)
//!
//! ## Usage
//! ```ignore
//! use screen_capture_core::{CaptureEvent, CaptureOptions};
//! use screen_capture_macos::{AvFoundationBackend, MacScreenCapture};
//!
//! let mut capture = MacScreenCapture::new(&AvFoundationBackend::new(), CaptureOptions::default())?;
//! let events = capture.subscribe();
//! capture.start()?;
//! ```

#[cfg(target_os = "macos")]
pub mod audio_devices;
#[cfg(target_os = "macos")]
mod backend;
#[cfg(target_os = "macos")]
mod delegate;
#[cfg(target_os = "macos")]
pub mod displays;
#[cfg(target_os = "macos")]
mod ffi;
#[cfg(target_os = "macos")]
mod foundation;
#[cfg(target_os = "macos")]
pub mod graph;
#[cfg(target_os = "macos")]
pub mod permissions;
#[cfg(target_os = "macos")]
pub mod pixel_buffer;

#[cfg(target_os = "macos")]
pub use backend::{AvFoundationBackend, MacScreenCapture};
#[cfg(target_os = "macos")]
pub use graph::AvCaptureGraph;
#[cfg(target_os = "macos")]
pub use pixel_buffer::CvPixelBuffer;
