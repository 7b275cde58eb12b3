use crate::models::config::{CaptureOptions, FrameInterval};
use crate::models::devices::{AudioDevice, DisplayInfo};
use crate::models::error::CaptureError;
use crate::models::geometry::CropRect;
use crate::processing::frame_sink::FrameSink;

/// Settings applied to the screen input before it is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenInputSettings {
    pub min_frame_interval: FrameInterval,
    pub crop_rect: Option<CropRect>,
    pub captures_cursor: bool,
    pub captures_mouse_clicks: bool,
}

impl ScreenInputSettings {
    pub fn from_options(options: &CaptureOptions) -> Self {
        Self {
            min_frame_interval: options.frame_interval(),
            crop_rect: options.crop_rect,
            captures_cursor: options.show_cursor,
            captures_mouse_clicks: options.highlight_clicks,
        }
    }
}

/// Platform capture framework: device enumeration and session graphs.
///
/// Implemented by:
/// - `AvFoundationBackend` (macOS, `screen-capture-macos`)
/// - `SyntheticBackend` (in-memory, this crate)
pub trait CaptureBackend: Send + Sync {
    type Graph: CaptureGraph;

    /// All displays that can currently be captured.
    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError>;

    /// The main display, if any is attached.
    fn main_display(&self) -> Option<DisplayInfo>;

    /// All audio capture devices.
    fn audio_devices(&self) -> Result<Vec<AudioDevice>, CaptureError>;

    /// The system default audio input, if any.
    fn default_audio_device(&self) -> Option<AudioDevice>;

    /// Create an empty capture session graph.
    fn new_graph(&self) -> Result<Self::Graph, CaptureError>;
}

/// One platform capture session and the inputs/outputs wired onto it.
///
/// Methods that can be refused by the platform return the refusal reason;
/// the session builder maps it to the matching `CaptureError` kind.
/// Dropping the graph releases everything attached to it.
pub trait CaptureGraph: Send {
    /// Create and configure (but do not attach) the screen input.
    fn create_screen_input(
        &mut self,
        display_id: u32,
        settings: &ScreenInputSettings,
    ) -> Result<DisplayInfo, String>;

    fn attach_audio_input(&mut self, device: &AudioDevice) -> Result<(), String>;

    /// Attach the input created by `create_screen_input`.
    fn attach_screen_input(&mut self) -> Result<(), String>;

    fn attach_frame_output(&mut self) -> Result<(), String>;

    /// Start the session, delivering frames to `sink` from a background
    /// queue distinct from the calling thread.
    fn start_running(&mut self, sink: FrameSink) -> Result<(), String>;

    /// Stop the session. Returns once the platform reports it stopped; a
    /// frame callback already in progress may still complete afterwards.
    fn stop_running(&mut self);

    fn is_running(&self) -> bool;
}
