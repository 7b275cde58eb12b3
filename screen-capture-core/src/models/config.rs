use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::devices::AudioDevice;
use super::error::CaptureError;
use super::geometry::CropRect;

/// Highest frame rate accepted by [`CaptureOptions::validate`].
pub const MAX_FRAMES_PER_SECOND: u32 = 240;

/// Which display to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenId {
    /// The display that currently holds the menu bar.
    #[default]
    Main,
    /// A specific display, by platform display identifier.
    Display(u32),
}

/// Which audio input, if any, to attach alongside the screen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioInput {
    /// The system default audio input. Video-only when the system has none.
    #[default]
    SystemDefault,
    /// No audio input.
    Disabled,
    /// A specific device, usually one returned by `CaptureBackend::audio_devices`.
    Device(AudioDevice),
}

/// Codec hint carried with the session. Not interpreted by the capture path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Hevc,
    ProRes422,
    ProRes4444,
    Jpeg,
}

/// Minimum duration between two frames, as a rational `value / timescale` seconds.
///
/// Mirrors `CMTime(value: 1, timescale: fps)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInterval {
    pub value: i64,
    pub timescale: i32,
}

impl FrameInterval {
    pub fn from_fps(frames_per_second: u32) -> Self {
        Self {
            value: 1,
            timescale: frames_per_second.min(i32::MAX as u32) as i32,
        }
    }

    pub fn as_secs_f64(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.value as f64 / self.timescale as f64
    }
}

/// Options for a screen capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Target frame rate (default: 60).
    pub frames_per_second: u32,

    /// Region of the display to capture, in display points. None = whole display.
    pub crop_rect: Option<CropRect>,

    /// Draw the mouse cursor into captured frames.
    pub show_cursor: bool,

    /// Highlight mouse clicks in captured frames.
    pub highlight_clicks: bool,

    /// Display to capture (default: main display).
    pub screen: ScreenId,

    /// Audio input to attach (default: system default input).
    pub audio: AudioInput,

    /// Codec hint forwarded with the session.
    pub video_codec: Option<VideoCodec>,
}

impl CaptureOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.frames_per_second == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.frames_per_second > MAX_FRAMES_PER_SECOND {
            return Err(format!(
                "frame rate {} exceeds maximum of {}",
                self.frames_per_second, MAX_FRAMES_PER_SECOND
            ));
        }
        if let Some(rect) = &self.crop_rect {
            rect.validate()?;
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> FrameInterval {
        FrameInterval::from_fps(self.frames_per_second)
    }

    /// Parse options from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        serde_json::from_str(json).map_err(|e| {
            CaptureError::InvalidConfiguration(format!("failed to parse options: {}", e))
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::InvalidConfiguration(format!(
                "failed to read options from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, CaptureError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CaptureError::InvalidConfiguration(format!("failed to serialize options: {}", e))
        })
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
            crop_rect: None,
            show_cursor: false,
            highlight_clicks: false,
            screen: ScreenId::Main,
            audio: AudioInput::SystemDefault,
            video_codec: None,
        }
    }
}
