use std::fmt;
use std::time::Duration;

/// Pixel format of a captured frame, as a big-endian four-character code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// `kCVPixelFormatType_32BGRA`
    pub const BGRA: PixelFormat = PixelFormat::from_fourcc(*b"BGRA");
    /// `kCVPixelFormatType_420YpCbCr8BiPlanarVideoRange`
    pub const NV12_VIDEO_RANGE: PixelFormat = PixelFormat::from_fourcc(*b"420v");

    pub const fn from_fourcc(code: [u8; 4]) -> Self {
        PixelFormat(u32::from_be_bytes(code))
    }

    pub fn fourcc(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({})", self)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.fourcc();
        if code.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "{}", String::from_utf8_lossy(&code))
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

/// One captured frame, copied out of the platform pixel buffer.
///
/// `data` holds `bytes_per_row * height` bytes. Rows may carry padding past
/// `width * bytes_per_pixel`; the stride is preserved as delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Per-session frame number, starting at 0.
    pub sequence: u64,
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub pixel_format: PixelFormat,
    /// Presentation timestamp reported by the platform.
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

impl Frame {
    /// Bytes of row `index`, including any stride padding.
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        if index >= self.height {
            return None;
        }
        let start = index * self.bytes_per_row;
        self.data.get(start..start + self.bytes_per_row)
    }
}
