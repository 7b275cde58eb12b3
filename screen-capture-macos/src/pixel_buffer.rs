//! `CVPixelBuffer` adapter for the core frame copy.

use screen_capture_core::{PixelBuffer, PixelFormat};

use crate::ffi::*;

/// A `CVPixelBuffer` borrowed from a `CMSampleBuffer` for the duration of
/// one delegate callback. Not retained.
pub struct CvPixelBuffer {
    raw: CVPixelBufferRef,
}

impl CvPixelBuffer {
    /// Wrap a borrowed pixel buffer. `None` for a null reference.
    ///
    /// # Safety
    /// `raw` must be null or a valid `CVPixelBufferRef` that outlives the wrapper.
    pub unsafe fn from_borrowed(raw: CVPixelBufferRef) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(Self { raw })
        }
    }

    /// The image buffer attached to `sample_buffer`, if any.
    ///
    /// # Safety
    /// `sample_buffer` must be a valid `CMSampleBufferRef`.
    pub unsafe fn from_sample_buffer(sample_buffer: CMSampleBufferRef) -> Option<Self> {
        Self::from_borrowed(CMSampleBufferGetImageBuffer(sample_buffer))
    }

    pub fn is_planar(&self) -> bool {
        unsafe { CVPixelBufferIsPlanar(self.raw) != 0 }
    }
}

// SAFETY: CoreVideo guarantees the base address covers
// `bytes_per_row * height` bytes of a non-planar buffer while it is locked;
// planar buffers are refused in `lock_base_address`.
unsafe impl PixelBuffer for CvPixelBuffer {
    fn lock_base_address(&self) -> Result<(), String> {
        if self.is_planar() {
            return Err(format!(
                "planar pixel format {} is not supported",
                self.pixel_format()
            ));
        }
        let status = unsafe { CVPixelBufferLockBaseAddress(self.raw, kCVPixelBufferLock_ReadOnly) };
        if status != kCVReturnSuccess {
            return Err(format!("CVPixelBufferLockBaseAddress returned {}", status));
        }
        Ok(())
    }

    fn unlock_base_address(&self) {
        let status =
            unsafe { CVPixelBufferUnlockBaseAddress(self.raw, kCVPixelBufferLock_ReadOnly) };
        if status != kCVReturnSuccess {
            log::warn!("CVPixelBufferUnlockBaseAddress returned {}", status);
        }
    }

    fn base_address(&self) -> *const u8 {
        unsafe { CVPixelBufferGetBaseAddress(self.raw) as *const u8 }
    }

    fn bytes_per_row(&self) -> usize {
        unsafe { CVPixelBufferGetBytesPerRow(self.raw) }
    }

    fn width(&self) -> usize {
        unsafe { CVPixelBufferGetWidth(self.raw) }
    }

    fn height(&self) -> usize {
        unsafe { CVPixelBufferGetHeight(self.raw) }
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat(unsafe { CVPixelBufferGetPixelFormatType(self.raw) })
    }
}
