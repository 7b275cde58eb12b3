//! In-memory capture backend.
//!
//! Generates BGRA test-pattern frames on a background thread at the
//! configured frame interval. Used by the test suite and for running the
//! capture pipeline on machines without a supported capture framework.
//! Each wiring step can be made to fail, and every graph operation is
//! recorded for inspection.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::devices::{AudioDevice, DisplayInfo, MediaType, TransportType};
use crate::models::error::CaptureError;
use crate::models::frame::PixelFormat;
use crate::processing::frame_sink::FrameSink;
use crate::traits::capture_backend::{CaptureBackend, CaptureGraph, ScreenInputSettings};
use crate::traits::pixel_buffer::PixelBuffer;

const BYTES_PER_PIXEL: usize = 4;

/// Identifier of the main display created by [`SyntheticBackend::new`].
pub const SYNTHETIC_MAIN_DISPLAY: u32 = 1;

/// Failure injection and frame generation knobs.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBehavior {
    pub reject_audio_input: bool,
    pub reject_screen_input: bool,
    pub reject_frame_output: bool,
    pub fail_start: bool,
    /// Every Nth callback arrives without a pixel buffer.
    pub missing_buffer_every: Option<u64>,
    /// Padding bytes appended to every row.
    pub row_padding: usize,
    /// Stop producing frames after this many callbacks per run.
    pub frame_limit: Option<u64>,
}

/// A recorded call on a [`SyntheticGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOperation {
    CreateScreenInput(u32),
    AttachAudioInput(String),
    AttachScreenInput,
    AttachFrameOutput,
    StartRunning,
    StopRunning,
}

pub struct SyntheticBackend {
    displays: Vec<DisplayInfo>,
    audio_devices: Vec<AudioDevice>,
    behavior: SyntheticBehavior,
    operations: Arc<Mutex<Vec<GraphOperation>>>,
}

impl SyntheticBackend {
    /// One 64x36 main display and one default microphone.
    pub fn new() -> Self {
        Self {
            displays: vec![DisplayInfo {
                id: SYNTHETIC_MAIN_DISPLAY,
                width: 64,
                height: 36,
                is_main: true,
            }],
            audio_devices: vec![AudioDevice {
                id: "synthetic-mic".into(),
                name: "Synthetic Microphone".into(),
                media_types: vec![MediaType::Audio],
                is_default: true,
                transport_type: Some(TransportType::Virtual),
            }],
            behavior: SyntheticBehavior::default(),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// No displays and no audio devices.
    pub fn empty() -> Self {
        Self {
            displays: Vec::new(),
            audio_devices: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_display(mut self, display: DisplayInfo) -> Self {
        self.displays.push(display);
        self
    }

    pub fn with_audio_device(mut self, device: AudioDevice) -> Self {
        self.audio_devices.push(device);
        self
    }

    pub fn with_behavior(mut self, behavior: SyntheticBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// All graph operations recorded so far, across every graph.
    pub fn operations(&self) -> Vec<GraphOperation> {
        self.operations.lock().clone()
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    type Graph = SyntheticGraph;

    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        Ok(self.displays.clone())
    }

    fn main_display(&self) -> Option<DisplayInfo> {
        self.displays.iter().find(|d| d.is_main).copied()
    }

    fn audio_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        Ok(self.audio_devices.clone())
    }

    fn default_audio_device(&self) -> Option<AudioDevice> {
        self.audio_devices
            .iter()
            .find(|d| d.is_default && d.has_media_type(MediaType::Audio))
            .cloned()
    }

    fn new_graph(&self) -> Result<SyntheticGraph, CaptureError> {
        Ok(SyntheticGraph {
            displays: self.displays.clone(),
            audio_devices: self.audio_devices.clone(),
            behavior: self.behavior.clone(),
            operations: Arc::clone(&self.operations),
            screen: None,
            screen_attached: false,
            audio_attached: false,
            output_attached: false,
            running: Arc::new(AtomicBool::new(false)),
            producer: None,
            producer_panicked: false,
        })
    }
}

pub struct SyntheticGraph {
    displays: Vec<DisplayInfo>,
    audio_devices: Vec<AudioDevice>,
    behavior: SyntheticBehavior,
    operations: Arc<Mutex<Vec<GraphOperation>>>,
    screen: Option<(DisplayInfo, ScreenInputSettings)>,
    screen_attached: bool,
    audio_attached: bool,
    output_attached: bool,
    running: Arc<AtomicBool>,
    producer: Option<thread::JoinHandle<()>>,
    producer_panicked: bool,
}

impl SyntheticGraph {
    fn join_producer(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.producer.take() {
            if let Err(panic) = handle.join() {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                log::error!("Synthetic capture thread panicked: {}", message);
                self.producer_panicked = true;
            }
        }
    }

    /// Whether the producer thread panicked (for example in a frame handler).
    pub fn producer_panicked(&self) -> bool {
        self.producer_panicked
    }

    pub fn has_audio_input(&self) -> bool {
        self.audio_attached
    }

    pub fn has_screen_input(&self) -> bool {
        self.screen_attached
    }

    pub fn has_frame_output(&self) -> bool {
        self.output_attached
    }

    fn record(&self, operation: GraphOperation) {
        self.operations.lock().push(operation);
    }

    /// Pixel dimensions of generated frames: the crop rect if set, else the display.
    fn frame_size(display: &DisplayInfo, settings: &ScreenInputSettings) -> (usize, usize) {
        match settings.crop_rect {
            Some(rect) => (rect.width.round() as usize, rect.height.round() as usize),
            None => (display.width as usize, display.height as usize),
        }
    }
}

impl CaptureGraph for SyntheticGraph {
    fn create_screen_input(
        &mut self,
        display_id: u32,
        settings: &ScreenInputSettings,
    ) -> Result<DisplayInfo, String> {
        self.record(GraphOperation::CreateScreenInput(display_id));
        let display = self
            .displays
            .iter()
            .find(|d| d.id == display_id)
            .copied()
            .ok_or_else(|| format!("no display with id {}", display_id))?;
        self.screen = Some((display, *settings));
        Ok(display)
    }

    fn attach_audio_input(&mut self, device: &AudioDevice) -> Result<(), String> {
        self.record(GraphOperation::AttachAudioInput(device.id.clone()));
        if self.behavior.reject_audio_input {
            return Err("audio input rejected".into());
        }
        if self.audio_attached {
            return Err("session already has an audio input".into());
        }
        if !self.audio_devices.iter().any(|d| d.id == device.id) {
            return Err(format!("unknown audio device '{}'", device.id));
        }
        self.audio_attached = true;
        Ok(())
    }

    fn attach_screen_input(&mut self) -> Result<(), String> {
        self.record(GraphOperation::AttachScreenInput);
        if self.screen.is_none() {
            return Err("no screen input created".into());
        }
        if self.behavior.reject_screen_input {
            return Err("screen input rejected".into());
        }
        if self.screen_attached {
            return Err("session already has a screen input".into());
        }
        self.screen_attached = true;
        Ok(())
    }

    fn attach_frame_output(&mut self) -> Result<(), String> {
        self.record(GraphOperation::AttachFrameOutput);
        if self.behavior.reject_frame_output {
            return Err("frame output rejected".into());
        }
        if self.output_attached {
            return Err("session already has a frame output".into());
        }
        self.output_attached = true;
        Ok(())
    }

    fn start_running(&mut self, sink: FrameSink) -> Result<(), String> {
        self.record(GraphOperation::StartRunning);
        if self.behavior.fail_start {
            return Err("synthetic start failure".into());
        }
        if self.running.load(Ordering::SeqCst) {
            return Err("session already running".into());
        }
        let (display, settings) = match (&self.screen, self.screen_attached && self.output_attached) {
            (Some(screen), true) => *screen,
            _ => return Err("session is not fully wired".into()),
        };

        let (width, height) = Self::frame_size(&display, &settings);
        let interval = Duration::from_secs_f64(settings.min_frame_interval.as_secs_f64());
        let behavior = self.behavior.clone();

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("synthetic-capture".into())
            .spawn(move || {
                // Start producing once the session has opened its gate.
                while running.load(Ordering::SeqCst) && !sink.is_accepting() {
                    thread::sleep(Duration::from_millis(1));
                }

                let started = Instant::now();
                let mut callbacks: u64 = 0;
                while running.load(Ordering::SeqCst) {
                    if behavior.frame_limit.is_some_and(|limit| callbacks >= limit) {
                        break;
                    }
                    thread::sleep(interval);
                    callbacks += 1;

                    let timestamp = started.elapsed();
                    let missing = behavior
                        .missing_buffer_every
                        .is_some_and(|n| n > 0 && callbacks % n == 0);
                    if missing {
                        sink.deliver::<SyntheticPixelBuffer>(None, timestamp);
                        continue;
                    }

                    let buffer =
                        SyntheticPixelBuffer::generate(width, height, behavior.row_padding, callbacks);
                    sink.deliver(Some(&buffer), timestamp);
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                format!("failed to spawn synthetic capture thread: {}", e)
            })?;

        self.producer = Some(handle);
        Ok(())
    }

    fn stop_running(&mut self) {
        self.record(GraphOperation::StopRunning);
        self.join_producer();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SyntheticGraph {
    fn drop(&mut self) {
        self.join_producer();
    }
}

/// Heap-backed BGRA pixel buffer with lock accounting.
pub struct SyntheticPixelBuffer {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    bytes_per_row: usize,
    locks: AtomicU32,
}

impl SyntheticPixelBuffer {
    /// A `width` x `height` test pattern seeded by `seed`.
    pub fn generate(width: usize, height: usize, row_padding: usize, seed: u64) -> Self {
        let bytes_per_row = width * BYTES_PER_PIXEL + row_padding;
        let pixels = (0..bytes_per_row * height)
            .map(|i| (i as u64).wrapping_add(seed) as u8)
            .collect();
        Self {
            pixels,
            width,
            height,
            bytes_per_row,
            locks: AtomicU32::new(0),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locks.load(Ordering::SeqCst) > 0
    }
}

// SAFETY: `pixels` holds exactly `bytes_per_row * height` bytes and is
// never reallocated while the buffer is shared.
unsafe impl PixelBuffer for SyntheticPixelBuffer {
    fn lock_base_address(&self) -> Result<(), String> {
        self.locks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unlock_base_address(&self) {
        let _ = self
            .locks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn base_address(&self) -> *const u8 {
        self.pixels.as_ptr()
    }

    fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::BGRA
    }
}
