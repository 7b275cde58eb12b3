use serde::{Deserialize, Serialize};

/// Media type advertised by a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
    Muxed,
}

/// Transport type for a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    BuiltIn,
    Bluetooth,
    BluetoothLE,
    Usb,
    Virtual,
    Aggregate,
    Unknown,
}

/// An audio capture device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub media_types: Vec<MediaType>,
    pub is_default: bool,
    pub transport_type: Option<TransportType>,
}

impl AudioDevice {
    pub fn has_media_type(&self, media_type: MediaType) -> bool {
        self.media_types.contains(&media_type)
    }
}

/// A display that can be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    pub is_main: bool,
}
