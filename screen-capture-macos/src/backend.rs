use screen_capture_core::{AudioDevice, CaptureBackend, CaptureError, DisplayInfo, ScreenCapture};

use crate::audio_devices;
use crate::displays;
use crate::graph::AvCaptureGraph;

/// `CaptureBackend` over AVFoundation, CoreGraphics display enumeration and
/// `AVCaptureDevice` audio devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvFoundationBackend;

impl AvFoundationBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for AvFoundationBackend {
    type Graph = AvCaptureGraph;

    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        displays::list_displays()
    }

    fn main_display(&self) -> Option<DisplayInfo> {
        displays::main_display()
    }

    fn audio_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        audio_devices::list_audio_devices()
    }

    fn default_audio_device(&self) -> Option<AudioDevice> {
        audio_devices::default_audio_device()
    }

    fn new_graph(&self) -> Result<AvCaptureGraph, CaptureError> {
        AvCaptureGraph::new().map_err(CaptureError::Backend)
    }
}

/// A screen capture session driven by AVFoundation.
pub type MacScreenCapture = ScreenCapture<AvFoundationBackend>;
