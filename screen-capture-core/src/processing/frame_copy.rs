//! Copying pixel data out of platform-owned buffers.
//!
//! The platform recycles a pixel buffer as soon as the frame callback
//! returns, and its memory is only addressable while locked. Every frame is
//! therefore copied into an owned `Vec<u8>` between lock and unlock.

use thiserror::Error;

use crate::models::frame::PixelFormat;
use crate::traits::pixel_buffer::PixelBuffer;

/// Why a pixel buffer could not be copied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// The platform refused to lock the base address.
    #[error("pixel buffer lock failed: {0}")]
    Lock(String),

    #[error("pixel buffer size overflows: {bytes_per_row} x {height}")]
    SizeOverflow { bytes_per_row: usize, height: usize },

    #[error("pixel buffer has no base address")]
    NullBaseAddress,
}

/// Owned copy of one pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedPixels {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub pixel_format: PixelFormat,
}

/// RAII guard that unlocks the base address when dropped.
struct BaseAddressLock<'a, P: PixelBuffer + ?Sized> {
    buffer: &'a P,
}

impl<'a, P: PixelBuffer + ?Sized> BaseAddressLock<'a, P> {
    fn acquire(buffer: &'a P) -> Result<Self, CopyError> {
        buffer.lock_base_address().map_err(CopyError::Lock)?;
        Ok(Self { buffer })
    }
}

impl<P: PixelBuffer + ?Sized> Drop for BaseAddressLock<'_, P> {
    fn drop(&mut self) {
        self.buffer.unlock_base_address();
    }
}

/// Lock `buffer`, copy `bytes_per_row * height` bytes, unlock.
///
/// The lock is held only for the duration of the copy. If locking fails the
/// buffer is left untouched and never unlocked.
pub fn copy_pixel_buffer<P: PixelBuffer + ?Sized>(buffer: &P) -> Result<CopiedPixels, CopyError> {
    let lock = BaseAddressLock::acquire(buffer)?;

    let bytes_per_row = buffer.bytes_per_row();
    let height = buffer.height();
    let len = bytes_per_row
        .checked_mul(height)
        .ok_or(CopyError::SizeOverflow {
            bytes_per_row,
            height,
        })?;

    let data = if len == 0 {
        Vec::new()
    } else {
        let base = buffer.base_address();
        if base.is_null() {
            return Err(CopyError::NullBaseAddress);
        }
        // SAFETY: the buffer is locked and `PixelBuffer` guarantees `len`
        // readable bytes at a non-null base address while locked.
        unsafe { std::slice::from_raw_parts(base, len) }.to_vec()
    };

    let width = buffer.width();
    let pixel_format = buffer.pixel_format();
    drop(lock);

    Ok(CopiedPixels {
        data,
        width,
        height,
        bytes_per_row,
        pixel_format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Test buffer that records every call and refuses reads while unlocked.
    struct TracedBuffer {
        pixels: Vec<u8>,
        bytes_per_row: usize,
        height: usize,
        fail_lock: bool,
        null_base: bool,
        locked: Cell<bool>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl TracedBuffer {
        fn new(bytes_per_row: usize, height: usize) -> Self {
            Self {
                pixels: (0..bytes_per_row * height).map(|i| i as u8).collect(),
                bytes_per_row,
                height,
                fail_lock: false,
                null_base: false,
                locked: Cell::new(false),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    unsafe impl PixelBuffer for TracedBuffer {
        fn lock_base_address(&self) -> Result<(), String> {
            self.calls.borrow_mut().push("lock");
            if self.fail_lock {
                return Err("kCVReturnError".into());
            }
            self.locked.set(true);
            Ok(())
        }

        fn unlock_base_address(&self) {
            self.calls.borrow_mut().push("unlock");
            self.locked.set(false);
        }

        fn base_address(&self) -> *const u8 {
            self.calls.borrow_mut().push("base_address");
            assert!(self.locked.get(), "base address read while unlocked");
            if self.null_base {
                return std::ptr::null();
            }
            self.pixels.as_ptr()
        }

        fn bytes_per_row(&self) -> usize {
            self.bytes_per_row
        }

        fn width(&self) -> usize {
            self.bytes_per_row / 4
        }

        fn height(&self) -> usize {
            self.height
        }

        fn pixel_format(&self) -> PixelFormat {
            PixelFormat::BGRA
        }
    }

    #[test]
    fn copies_stride_times_height() {
        let buffer = TracedBuffer::new(16, 3);
        let pixels = copy_pixel_buffer(&buffer).unwrap();

        assert_eq!(pixels.data.len(), 16 * 3);
        assert_eq!(pixels.data, buffer.pixels);
        assert_eq!(pixels.width, 4);
        assert_eq!(pixels.pixel_format, PixelFormat::BGRA);
    }

    #[test]
    fn reads_only_between_lock_and_unlock() {
        let buffer = TracedBuffer::new(8, 2);
        copy_pixel_buffer(&buffer).unwrap();

        assert_eq!(*buffer.calls.borrow(), vec!["lock", "base_address", "unlock"]);
        assert!(!buffer.locked.get());
    }

    #[test]
    fn failed_lock_is_not_unlocked() {
        let mut buffer = TracedBuffer::new(8, 2);
        buffer.fail_lock = true;

        assert_eq!(
            copy_pixel_buffer(&buffer),
            Err(CopyError::Lock("kCVReturnError".into()))
        );
        assert_eq!(*buffer.calls.borrow(), vec!["lock"]);
    }

    #[test]
    fn null_base_address_is_not_a_lock_failure() {
        let mut buffer = TracedBuffer::new(8, 2);
        buffer.null_base = true;

        assert_eq!(copy_pixel_buffer(&buffer), Err(CopyError::NullBaseAddress));
        assert_eq!(*buffer.calls.borrow(), vec!["lock", "base_address", "unlock"]);
    }

    #[test]
    fn oversized_buffer_is_unlocked() {
        let mut buffer = TracedBuffer::new(0, 0);
        buffer.bytes_per_row = usize::MAX;
        buffer.height = 2;

        assert!(matches!(
            copy_pixel_buffer(&buffer),
            Err(CopyError::SizeOverflow { height: 2, .. })
        ));
        assert_eq!(*buffer.calls.borrow(), vec!["lock", "unlock"]);
    }

    #[test]
    fn empty_buffer_skips_base_address() {
        let buffer = TracedBuffer::new(0, 0);
        let pixels = copy_pixel_buffer(&buffer).unwrap();

        assert!(pixels.data.is_empty());
        assert_eq!(*buffer.calls.borrow(), vec!["lock", "unlock"]);
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut buffer = TracedBuffer::new(4, 1);
        let pixels = copy_pixel_buffer(&buffer).unwrap();

        buffer.pixels[0] = 0xFF;
        assert_eq!(pixels.data[0], 0);
    }
}
