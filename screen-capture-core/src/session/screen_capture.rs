use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::config::{AudioInput, CaptureOptions, ScreenId, VideoCodec};
use crate::models::devices::{AudioDevice, DisplayInfo, MediaType};
use crate::models::error::CaptureError;
use crate::models::event::CaptureEvent;
use crate::models::state::CaptureState;
use crate::models::summary::{CaptureDiagnostics, SessionSummary};
use crate::processing::frame_sink::{FrameSink, SinkState};
use crate::session::event_hub::EventReceiver;
use crate::traits::capture_backend::{CaptureBackend, CaptureGraph, ScreenInputSettings};
use crate::traits::capture_handler::CaptureHandler;

/// A screen capture session: one screen input, an optional audio input and
/// one frame output, wired onto a backend capture graph.
///
/// Construction either returns a fully wired, ready-to-start session or an
/// error; a partially wired graph is never exposed.
///
/// ```text
/// [Screen Input] ─┐
///                 ├→ [Capture Graph] → [Frame Output] → FrameSink → EventHub → subscribers
/// [Audio Input] ──┘                                    (lock/copy/unlock)       handlers
/// ```
pub struct ScreenCapture<B: CaptureBackend> {
    id: Uuid,
    created_at: DateTime<Utc>,
    options: CaptureOptions,
    display: DisplayInfo,
    audio_device: Option<AudioDevice>,
    graph: B::Graph,
    state: CaptureState,
    shared: Arc<SinkState>,
}

impl<B: CaptureBackend> ScreenCapture<B> {
    /// Build a session from `options`.
    ///
    /// Checks, in order: options are valid, the screen resolves to a
    /// capturable display, the audio device supports audio, then the audio
    /// input, screen input and frame output attach.
    pub fn new(backend: &B, options: CaptureOptions) -> Result<Self, CaptureError> {
        options
            .validate()
            .map_err(CaptureError::InvalidConfiguration)?;

        let mut graph = backend.new_graph()?;

        let display_id = match options.screen {
            ScreenId::Main => backend.main_display().ok_or(CaptureError::InvalidScreen)?.id,
            ScreenId::Display(id) => id,
        };

        let settings = ScreenInputSettings::from_options(&options);
        let display = graph
            .create_screen_input(display_id, &settings)
            .map_err(|reason| {
                log::warn!("Display {} is not capturable: {}", display_id, reason);
                CaptureError::InvalidScreen
            })?;

        let audio_device = match &options.audio {
            AudioInput::SystemDefault => backend.default_audio_device(),
            AudioInput::Disabled => None,
            AudioInput::Device(device) => Some(device.clone()),
        };

        if let Some(device) = &audio_device {
            if !device.has_media_type(MediaType::Audio) {
                return Err(CaptureError::InvalidAudioDevice);
            }
            graph.attach_audio_input(device).map_err(|reason| {
                log::warn!("Could not add audio input '{}': {}", device.name, reason);
                CaptureError::CouldNotAddMic
            })?;
        }

        graph.attach_screen_input().map_err(|reason| {
            log::warn!("Could not add screen input for display {}: {}", display.id, reason);
            CaptureError::CouldNotAddScreen
        })?;

        graph.attach_frame_output().map_err(|reason| {
            log::warn!("Could not add frame output: {}", reason);
            CaptureError::CouldNotAddOutput
        })?;

        let id = Uuid::new_v4();
        log::info!(
            "Capture session {} ready: display {} ({}x{}), {} fps, audio: {}",
            id,
            display.id,
            display.width,
            display.height,
            options.frames_per_second,
            audio_device.as_ref().map(|d| d.name.as_str()).unwrap_or("none"),
        );

        Ok(Self {
            id,
            created_at: Utc::now(),
            options,
            display,
            audio_device,
            graph,
            state: CaptureState::Ready,
            shared: Arc::new(SinkState::new()),
        })
    }

    /// Receive every event published from now on.
    ///
    /// A subscriber that stops reading keeps at most
    /// [`SUBSCRIBER_FRAME_CAPACITY`](crate::session::event_hub::SUBSCRIBER_FRAME_CAPACITY)
    /// frames; lifecycle and error events are never discarded.
    pub fn subscribe(&self) -> EventReceiver {
        self.shared.hub.subscribe()
    }

    pub fn add_handler(&self, handler: Arc<dyn CaptureHandler>) {
        self.shared.hub.add_handler(handler);
    }

    /// Start frame delivery. Transitions: ready/stopped → running.
    ///
    /// The backend starts with the frame gate closed; `Started` is published
    /// only once it is running and before the gate opens, so it precedes
    /// every frame of this run. A refused start publishes only `Error`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if !self.state.can_start() {
            return Err(CaptureError::InvalidState(format!(
                "can only start from ready or stopped state, session is {:?}",
                self.state
            )));
        }

        if let Err(reason) = self.graph.start_running(FrameSink::new(Arc::clone(&self.shared))) {
            log::error!("Capture session {} failed to start: {}", self.id, reason);
            let error = CaptureError::Backend(reason);
            self.shared.hub.publish(CaptureEvent::Error(error.clone()));
            return Err(error);
        }

        self.shared.hub.publish(CaptureEvent::Started);
        self.shared.open();
        self.state = CaptureState::Running;
        log::info!("Capture session {} started", self.id);
        Ok(())
    }

    /// Stop frame delivery. Transitions: running/paused → stopped.
    ///
    /// A frame callback already in progress on the capture queue may still
    /// publish after this returns.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_active() {
            return Err(CaptureError::InvalidState(format!(
                "can only stop from running or paused state, session is {:?}",
                self.state
            )));
        }

        self.shared.close();
        self.graph.stop_running();
        self.state = CaptureState::Stopped;
        self.shared.hub.publish(CaptureEvent::Finished);

        log::info!(
            "Capture session {} stopped after {} frames",
            self.id,
            self.shared.diagnostics.lock().frames_delivered
        );
        Ok(())
    }

    /// Stop forwarding frames without stopping the platform session.
    /// Transitions: running → paused.
    pub fn pause(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_running() {
            return Err(CaptureError::InvalidState(format!(
                "can only pause from running state, session is {:?}",
                self.state
            )));
        }

        self.shared.pause();
        self.state = CaptureState::Paused;
        self.shared.hub.publish(CaptureEvent::Paused);
        Ok(())
    }

    /// Transitions: paused → running.
    pub fn resume(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_paused() {
            return Err(CaptureError::InvalidState(format!(
                "can only resume from paused state, session is {:?}",
                self.state
            )));
        }

        self.shared.open();
        self.state = CaptureState::Running;
        self.shared.hub.publish(CaptureEvent::Resumed);
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn display(&self) -> &DisplayInfo {
        &self.display
    }

    pub fn audio_device(&self) -> Option<&AudioDevice> {
        self.audio_device.as_ref()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_device.is_some()
    }

    /// Codec hint given at construction. Not used by the capture path.
    pub fn video_codec(&self) -> Option<VideoCodec> {
        self.options.video_codec
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        *self.shared.diagnostics.lock()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.to_string(),
            created_at: self.created_at.to_rfc3339(),
            display: self.display,
            audio_device: self.audio_device.clone(),
            options: self.options.clone(),
            diagnostics: self.diagnostics(),
        }
    }

    /// The underlying backend graph.
    pub fn graph(&self) -> &B::Graph {
        &self.graph
    }
}

impl<B: CaptureBackend> Drop for ScreenCapture<B> {
    fn drop(&mut self) {
        if self.state.is_active() {
            if let Err(e) = self.stop() {
                log::warn!("Failed to stop capture session {} on drop: {}", self.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::synthetic::{
        GraphOperation, SyntheticBackend, SyntheticBehavior, SYNTHETIC_MAIN_DISPLAY,
    };
    use crate::models::frame::Frame;
    use crate::models::geometry::CropRect;
    use crate::session::event_hub::SUBSCRIBER_FRAME_CAPACITY;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_options() -> CaptureOptions {
        CaptureOptions {
            frames_per_second: 240,
            audio: AudioInput::Disabled,
            ..Default::default()
        }
    }

    fn camera_only_device() -> AudioDevice {
        AudioDevice {
            id: "camera".into(),
            name: "FaceTime HD Camera".into(),
            media_types: vec![MediaType::Video],
            is_default: false,
            transport_type: None,
        }
    }

    fn failing(behavior: SyntheticBehavior) -> SyntheticBackend {
        SyntheticBackend::new().with_behavior(behavior)
    }

    /// Receive events until `frames` frame events have arrived.
    fn collect_until_frames(rx: &EventReceiver, frames: usize) -> Vec<CaptureEvent> {
        let deadline = Instant::now() + TIMEOUT;
        let mut events = Vec::new();
        while events.iter().filter(|e: &&CaptureEvent| e.is_frame()).count() < frames {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(event) => events.push(event),
                Err(_) => panic!("timed out waiting for {} frames, got {:?}", frames, events.len()),
            }
        }
        events
    }

    fn frames_of(events: &[CaptureEvent]) -> Vec<Arc<Frame>> {
        events
            .iter()
            .filter_map(|e| match e {
                CaptureEvent::Frame(frame) => Some(Arc::clone(frame)),
                _ => None,
            })
            .collect()
    }

    fn count(events: &[CaptureEvent], wanted: &CaptureEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    // --- Construction ---

    #[test]
    fn unknown_screen_is_invalid_screen() {
        let backend = SyntheticBackend::new();
        let options = CaptureOptions {
            screen: ScreenId::Display(99),
            ..fast_options()
        };

        let result = ScreenCapture::new(&backend, options);
        assert_eq!(result.err(), Some(CaptureError::InvalidScreen));
        assert_eq!(backend.operations(), vec![GraphOperation::CreateScreenInput(99)]);
    }

    #[test]
    fn no_main_display_is_invalid_screen() {
        let backend = SyntheticBackend::empty();
        let result = ScreenCapture::new(&backend, fast_options());
        assert_eq!(result.err(), Some(CaptureError::InvalidScreen));
    }

    #[test]
    fn device_without_audio_fails_before_any_attach() {
        let backend = SyntheticBackend::new().with_audio_device(camera_only_device());
        let options = CaptureOptions {
            audio: AudioInput::Device(camera_only_device()),
            ..fast_options()
        };

        let result = ScreenCapture::new(&backend, options);
        assert_eq!(result.err(), Some(CaptureError::InvalidAudioDevice));
        assert_eq!(
            backend.operations(),
            vec![GraphOperation::CreateScreenInput(SYNTHETIC_MAIN_DISPLAY)]
        );
    }

    #[test]
    fn rejected_audio_input_is_could_not_add_mic() {
        let backend = failing(SyntheticBehavior {
            reject_audio_input: true,
            reject_screen_input: true,
            reject_frame_output: true,
            ..Default::default()
        });
        let options = CaptureOptions {
            audio: AudioInput::SystemDefault,
            ..fast_options()
        };

        let result = ScreenCapture::new(&backend, options);
        assert_eq!(result.err(), Some(CaptureError::CouldNotAddMic));
    }

    #[test]
    fn rejected_screen_input_is_could_not_add_screen() {
        let backend = failing(SyntheticBehavior {
            reject_screen_input: true,
            reject_frame_output: true,
            ..Default::default()
        });

        let result = ScreenCapture::new(&backend, fast_options());
        assert_eq!(result.err(), Some(CaptureError::CouldNotAddScreen));
        assert!(!backend.operations().contains(&GraphOperation::AttachFrameOutput));
    }

    #[test]
    fn rejected_output_is_could_not_add_output() {
        let backend = failing(SyntheticBehavior {
            reject_frame_output: true,
            ..Default::default()
        });

        let result = ScreenCapture::new(&backend, fast_options());
        assert_eq!(result.err(), Some(CaptureError::CouldNotAddOutput));
    }

    #[test]
    fn invalid_options_fail_before_touching_backend() {
        let backend = SyntheticBackend::new();
        let options = CaptureOptions {
            frames_per_second: 0,
            ..fast_options()
        };

        let result = ScreenCapture::new(&backend, options);
        assert!(matches!(result.err(), Some(CaptureError::InvalidConfiguration(_))));
        assert!(backend.operations().is_empty());
    }

    #[test]
    fn disabled_audio_builds_video_only_session() {
        let backend = SyntheticBackend::new();
        let capture = ScreenCapture::new(&backend, fast_options()).unwrap();

        assert!(!capture.has_audio());
        assert!(!capture.graph().has_audio_input());
        assert!(capture.graph().has_screen_input());
        assert!(capture.graph().has_frame_output());
        assert_eq!(capture.state(), CaptureState::Ready);
    }

    #[test]
    fn system_default_without_devices_is_video_only() {
        let backend = SyntheticBackend::empty().with_display(DisplayInfo {
            id: 5,
            width: 32,
            height: 32,
            is_main: true,
        });
        let options = CaptureOptions {
            audio: AudioInput::SystemDefault,
            ..fast_options()
        };

        let capture = ScreenCapture::new(&backend, options).unwrap();
        assert!(!capture.has_audio());
        assert_eq!(capture.display().id, 5);
    }

    #[test]
    fn system_default_attaches_microphone() {
        let backend = SyntheticBackend::new();
        let options = CaptureOptions {
            audio: AudioInput::SystemDefault,
            ..fast_options()
        };

        let capture = ScreenCapture::new(&backend, options).unwrap();
        assert_eq!(capture.audio_device().map(|d| d.id.as_str()), Some("synthetic-mic"));
        assert_eq!(
            backend.operations(),
            vec![
                GraphOperation::CreateScreenInput(SYNTHETIC_MAIN_DISPLAY),
                GraphOperation::AttachAudioInput("synthetic-mic".into()),
                GraphOperation::AttachScreenInput,
                GraphOperation::AttachFrameOutput,
            ]
        );
    }

    #[test]
    fn codec_hint_is_forwarded() {
        let backend = SyntheticBackend::new();
        let options = CaptureOptions {
            video_codec: Some(VideoCodec::ProRes4444),
            ..fast_options()
        };

        let capture = ScreenCapture::new(&backend, options).unwrap();
        assert_eq!(capture.video_codec(), Some(VideoCodec::ProRes4444));
    }

    // --- Start / stop ---

    #[test]
    fn start_precedes_frames_and_stop_finishes_once() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        assert_eq!(capture.state(), CaptureState::Running);
        let mut events = collect_until_frames(&rx, 3);
        capture.stop().unwrap();
        assert_eq!(capture.state(), CaptureState::Stopped);
        events.extend(rx.try_iter());

        assert_eq!(events.first(), Some(&CaptureEvent::Started));
        assert_eq!(count(&events, &CaptureEvent::Started), 1);
        assert_eq!(count(&events, &CaptureEvent::Finished), 1);
        // The synthetic graph joins its producer on stop, so nothing follows Finished.
        assert_eq!(events.last(), Some(&CaptureEvent::Finished));
    }

    #[test]
    fn frames_are_stride_times_height_and_independent() {
        let backend = failing(SyntheticBehavior {
            row_padding: 16,
            ..Default::default()
        });
        let options = CaptureOptions {
            crop_rect: Some(CropRect::new(0.0, 0.0, 10.0, 6.0)),
            ..fast_options()
        };
        let mut capture = ScreenCapture::new(&backend, options).unwrap();
        let rx = capture.subscribe();
        let other = capture.subscribe();

        capture.start().unwrap();
        let events = collect_until_frames(&rx, 2);
        capture.stop().unwrap();

        let frames = frames_of(&events);
        for frame in &frames {
            assert_eq!(frame.width, 10);
            assert_eq!(frame.height, 6);
            assert_eq!(frame.bytes_per_row, 10 * 4 + 16);
            assert_eq!(frame.data.len(), frame.bytes_per_row * frame.height);
        }
        assert_eq!(frames[1].sequence, frames[0].sequence + 1);

        let first_for_other = frames_of(&other.try_iter().collect::<Vec<_>>())
            .into_iter()
            .next()
            .unwrap();
        let original = first_for_other.data.clone();

        let mut mine = frames[0].clone();
        Arc::make_mut(&mut mine).data.fill(0xEE);
        let second_snapshot = frames[1].data.clone();

        assert_eq!(first_for_other.data, original);
        assert_eq!(frames[1].data, second_snapshot);
        assert_ne!(mine.data, original);
    }

    #[test]
    fn double_start_is_rejected_without_second_event() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        assert!(matches!(capture.start(), Err(CaptureError::InvalidState(_))));
        capture.stop().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(count(&events, &CaptureEvent::Started), 1);
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        assert!(matches!(capture.stop(), Err(CaptureError::InvalidState(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn double_stop_finishes_once() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        capture.stop().unwrap();
        assert!(capture.stop().is_err());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(count(&events, &CaptureEvent::Finished), 1);
    }

    #[test]
    fn session_can_restart_after_stop() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        collect_until_frames(&rx, 1);
        capture.stop().unwrap();
        rx.try_iter().for_each(drop);

        capture.start().unwrap();
        let events = collect_until_frames(&rx, 1);
        capture.stop().unwrap();

        assert_eq!(events.first(), Some(&CaptureEvent::Started));
    }

    #[test]
    fn failed_start_reports_error_and_stays_ready() {
        let backend = failing(SyntheticBehavior {
            fail_start: true,
            ..Default::default()
        });
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        assert!(matches!(capture.start(), Err(CaptureError::Backend(_))));
        assert_eq!(capture.state(), CaptureState::Ready);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], CaptureEvent::Error(CaptureError::Backend(_))));
        assert_eq!(count(&events, &CaptureEvent::Started), 0);
    }

    #[test]
    fn failed_start_never_reaches_on_start() {
        let backend = failing(SyntheticBehavior {
            fail_start: true,
            ..Default::default()
        });
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let handler = Arc::new(RecordingHandler::default());
        capture.add_handler(handler.clone());

        assert!(capture.start().is_err());
        assert!(capture.start().is_err());

        assert_eq!(handler.starts.load(Ordering::SeqCst), 0);
        assert_eq!(handler.finishes.load(Ordering::SeqCst), 0);
        assert_eq!(handler.errors.load(Ordering::SeqCst), 2);
        assert_eq!(capture.state(), CaptureState::Ready);
    }

    #[test]
    fn dropping_running_session_finishes() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        drop(capture);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.last(), Some(&CaptureEvent::Finished));
        assert!(backend.operations().contains(&GraphOperation::StopRunning));
    }

    // --- Pause / resume ---

    #[test]
    fn pause_skips_frames_until_resume() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        collect_until_frames(&rx, 1);

        capture.pause().unwrap();
        assert_eq!(capture.state(), CaptureState::Paused);
        wait_until(|| capture.diagnostics().frames_skipped >= 2);

        capture.resume().unwrap();
        let mut events = Vec::new();
        loop {
            let event = rx.recv_timeout(TIMEOUT).unwrap();
            let frame_after_resume = event.is_frame() && events.contains(&CaptureEvent::Resumed);
            events.push(event);
            if frame_after_resume {
                break;
            }
        }
        capture.stop().unwrap();

        assert_eq!(count(&events, &CaptureEvent::Paused), 1);
        assert_eq!(count(&events, &CaptureEvent::Resumed), 1);
    }

    #[test]
    fn pause_requires_running() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();

        assert!(matches!(capture.pause(), Err(CaptureError::InvalidState(_))));
        assert!(matches!(capture.resume(), Err(CaptureError::InvalidState(_))));
    }

    #[test]
    fn stop_from_paused_finishes() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        capture.pause().unwrap();
        capture.stop().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.last(), Some(&CaptureEvent::Finished));
    }

    // --- Frame path ---

    #[test]
    fn missing_buffers_are_counted_not_reported() {
        let backend = failing(SyntheticBehavior {
            missing_buffer_every: Some(2),
            frame_limit: Some(6),
            ..Default::default()
        });
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let rx = capture.subscribe();

        capture.start().unwrap();
        wait_until(|| capture.diagnostics().frames_dropped == 3);
        capture.stop().unwrap();

        let diagnostics = capture.diagnostics();
        assert_eq!(diagnostics.frames_delivered, 3);
        assert_eq!(diagnostics.lock_failures, 0);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(!events.iter().any(|e| matches!(e, CaptureEvent::Error(_))));
        assert_eq!(frames_of(&events).len(), 3);
    }

    #[derive(Default)]
    struct RecordingHandler {
        starts: AtomicUsize,
        finishes: AtomicUsize,
        pauses: AtomicUsize,
        resumes: AtomicUsize,
        errors: AtomicUsize,
        frames: AtomicUsize,
    }

    impl CaptureHandler for RecordingHandler {
        fn on_start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_finish(&self) {
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &CaptureError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_frame(&self, _frame: &Frame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn handlers_and_subscribers_coexist() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let handler = Arc::new(RecordingHandler::default());
        capture.add_handler(handler.clone());
        let rx = capture.subscribe();

        capture.start().unwrap();
        collect_until_frames(&rx, 2);
        capture.stop().unwrap();

        assert_eq!(handler.starts.load(Ordering::SeqCst), 1);
        assert_eq!(handler.finishes.load(Ordering::SeqCst), 1);
        assert!(handler.frames.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn handlers_see_pause_and_resume() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let handler = Arc::new(RecordingHandler::default());
        capture.add_handler(handler.clone());

        capture.start().unwrap();
        capture.pause().unwrap();
        capture.resume().unwrap();
        capture.pause().unwrap();
        capture.stop().unwrap();

        assert_eq!(handler.starts.load(Ordering::SeqCst), 1);
        assert_eq!(handler.pauses.load(Ordering::SeqCst), 2);
        assert_eq!(handler.resumes.load(Ordering::SeqCst), 1);
        assert_eq!(handler.finishes.load(Ordering::SeqCst), 1);
        assert_eq!(handler.errors.load(Ordering::SeqCst), 0);
    }

    struct PanickingHandler;

    impl CaptureHandler for PanickingHandler {
        fn on_frame(&self, _frame: &Frame) {
            panic!("frame handler failure");
        }
    }

    #[test]
    fn panicking_frame_handler_surfaces_on_stop() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        capture.add_handler(Arc::new(PanickingHandler));

        capture.start().unwrap();
        wait_until(|| capture.diagnostics().frames_delivered >= 1);
        capture.stop().unwrap();

        assert!(capture.graph().producer_panicked());
    }

    #[test]
    fn idle_subscriber_backlog_is_bounded() {
        let backend = SyntheticBackend::new();
        let mut capture = ScreenCapture::new(&backend, fast_options()).unwrap();
        let idle = capture.subscribe();

        capture.start().unwrap();
        wait_until(|| capture.diagnostics().frames_delivered > SUBSCRIBER_FRAME_CAPACITY as u64 * 3);
        capture.stop().unwrap();

        assert_eq!(idle.queued_frames(), SUBSCRIBER_FRAME_CAPACITY);
        assert!(idle.discarded_frames() > 0);

        let events: Vec<_> = idle.try_iter().collect();
        assert_eq!(frames_of(&events).len(), SUBSCRIBER_FRAME_CAPACITY);
        assert_eq!(events.first(), Some(&CaptureEvent::Started));
        assert_eq!(events.last(), Some(&CaptureEvent::Finished));
    }

    #[test]
    fn summary_serializes() {
        let backend = SyntheticBackend::new();
        let capture = ScreenCapture::new(&backend, fast_options()).unwrap();

        let summary = capture.summary();
        assert_eq!(summary.id, capture.id().to_string());
        assert_eq!(summary.display.id, SYNTHETIC_MAIN_DISPLAY);

        let json = summary.to_json().unwrap();
        assert!(json.contains(&capture.id().to_string()));
        assert!(json.contains("\"frames_per_second\": 240"));
    }
}
