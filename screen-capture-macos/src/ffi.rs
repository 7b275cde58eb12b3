//! Raw bindings to the C parts of CoreMedia, CoreVideo, CoreGraphics and
//! libdispatch used by the capture graph.

#![allow(non_upper_case_globals)]

use std::ffi::{c_char, c_void};
use std::time::Duration;

use cocoa::base::id;
use core_foundation::string::CFStringRef;
use objc::{Encode, Encoding};

pub type CMSampleBufferRef = *mut c_void;
pub type CVPixelBufferRef = *mut c_void;
pub type CVReturn = i32;
pub type DispatchQueue = *mut c_void;

pub const kCVReturnSuccess: CVReturn = 0;
pub const kCVPixelBufferLock_ReadOnly: u64 = 0x0000_0001;
pub const kCVPixelFormatType_32BGRA: u32 = u32::from_be_bytes(*b"BGRA");

pub const kCMTimeFlags_Valid: u32 = 1 << 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CMTime {
    pub value: i64,
    pub timescale: i32,
    pub flags: u32,
    pub epoch: i64,
}

impl CMTime {
    pub fn new(value: i64, timescale: i32) -> Self {
        Self {
            value,
            timescale,
            flags: kCMTimeFlags_Valid,
            epoch: 0,
        }
    }

    /// Non-negative duration, or zero for invalid/negative times.
    pub fn to_duration(&self) -> Duration {
        if self.flags & kCMTimeFlags_Valid == 0 || self.timescale <= 0 || self.value < 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.value as f64 / self.timescale as f64)
    }
}

unsafe impl Encode for CMTime {
    fn encode() -> Encoding {
        unsafe { Encoding::from_str("{?=qiIq}") }
    }
}

#[link(name = "CoreMedia", kind = "framework")]
extern "C" {
    pub fn CMSampleBufferGetImageBuffer(sbuf: CMSampleBufferRef) -> CVPixelBufferRef;
    pub fn CMSampleBufferGetPresentationTimeStamp(sbuf: CMSampleBufferRef) -> CMTime;
}

#[link(name = "CoreVideo", kind = "framework")]
extern "C" {
    pub static kCVPixelBufferPixelFormatTypeKey: CFStringRef;

    pub fn CVPixelBufferLockBaseAddress(buffer: CVPixelBufferRef, flags: u64) -> CVReturn;
    pub fn CVPixelBufferUnlockBaseAddress(buffer: CVPixelBufferRef, flags: u64) -> CVReturn;
    pub fn CVPixelBufferGetBaseAddress(buffer: CVPixelBufferRef) -> *mut c_void;
    pub fn CVPixelBufferGetBytesPerRow(buffer: CVPixelBufferRef) -> usize;
    pub fn CVPixelBufferGetWidth(buffer: CVPixelBufferRef) -> usize;
    pub fn CVPixelBufferGetHeight(buffer: CVPixelBufferRef) -> usize;
    pub fn CVPixelBufferGetPixelFormatType(buffer: CVPixelBufferRef) -> u32;
    pub fn CVPixelBufferIsPlanar(buffer: CVPixelBufferRef) -> u8;
}

#[link(name = "AVFoundation", kind = "framework")]
extern "C" {
    pub static AVMediaTypeAudio: id;
    pub static AVMediaTypeVideo: id;
    pub static AVMediaTypeMuxed: id;
}

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    pub fn CGPreflightScreenCaptureAccess() -> bool;
    pub fn CGRequestScreenCaptureAccess() -> bool;
}

// libdispatch ships in libSystem.
extern "C" {
    pub fn dispatch_queue_create(label: *const c_char, attr: *mut c_void) -> DispatchQueue;
    pub fn dispatch_sync_f(
        queue: DispatchQueue,
        context: *mut c_void,
        work: extern "C" fn(*mut c_void),
    );
    pub fn dispatch_release(object: *mut c_void);
}
