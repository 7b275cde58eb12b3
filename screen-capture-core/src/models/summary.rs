use serde::{Deserialize, Serialize};

use super::config::CaptureOptions;
use super::devices::{AudioDevice, DisplayInfo};

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDiagnostics {
    pub frames_delivered: u64,
    /// Callbacks that arrived without a pixel buffer.
    pub frames_dropped: u64,
    /// Frames discarded because the session was paused.
    pub frames_skipped: u64,
    pub bytes_delivered: u64,
    /// Buffers the platform refused to lock.
    pub lock_failures: u64,
    /// Locked buffers that could not be read (no base address, bad size).
    pub copy_failures: u64,
}

/// Description of a built session.
///
/// Serializable for JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: String,
    pub display: DisplayInfo,
    pub audio_device: Option<AudioDevice>,
    pub options: CaptureOptions,
    pub diagnostics: CaptureDiagnostics,
}

impl SessionSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
