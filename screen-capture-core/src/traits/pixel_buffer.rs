use crate::models::frame::PixelFormat;

/// A platform-owned pixel buffer handed to the frame callback.
///
/// Equivalent to a `CVPixelBuffer`. The buffer is only borrowed for the
/// duration of one callback; the platform recycles it afterwards.
///
/// # Safety
///
/// Between a successful `lock_base_address` and the matching
/// `unlock_base_address`, `base_address` must either be null or point to at
/// least `bytes_per_row() * height()` readable bytes.
pub unsafe trait PixelBuffer {
    /// Lock the base address for read-only CPU access.
    fn lock_base_address(&self) -> Result<(), String>;

    /// Release a lock taken by `lock_base_address`.
    fn unlock_base_address(&self);

    fn base_address(&self) -> *const u8;

    fn bytes_per_row(&self) -> usize;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn pixel_format(&self) -> PixelFormat;
}
