//! Capture the main display for a few seconds and log frame statistics.
//!
//! ```text
//! RUST_LOG=info cargo run -p screen-capture-macos --example record_frames -- [options.json]
//! ```

#[cfg(target_os = "macos")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::time::{Duration, Instant};

    use screen_capture_core::{CaptureBackend, CaptureEvent, CaptureOptions};
    use screen_capture_macos::permissions;
    use screen_capture_macos::{AvFoundationBackend, MacScreenCapture};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match std::env::args().nth(1) {
        Some(path) => CaptureOptions::from_json_file(std::path::Path::new(&path))?,
        None => CaptureOptions::default(),
    };

    if !permissions::check_screen_recording_permission() {
        permissions::request_screen_recording_permission();
        permissions::ensure_screen_recording_permission()?;
    }

    let backend = AvFoundationBackend::new();
    for display in backend.displays()? {
        log::info!("display {}: {}x{} main={}", display.id, display.width, display.height, display.is_main);
    }
    for device in backend.audio_devices()? {
        log::info!("audio device {} ({}) default={}", device.name, device.id, device.is_default);
    }

    let mut capture = MacScreenCapture::new(&backend, options)?;
    let events = capture.subscribe();
    capture.start()?;

    let deadline = Instant::now() + Duration::from_secs(5);
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(remaining) {
            Ok(CaptureEvent::Frame(frame)) if frame.sequence % 60 == 0 => {
                log::info!(
                    "frame {} {}x{} {} ({} bytes)",
                    frame.sequence,
                    frame.width,
                    frame.height,
                    frame.pixel_format,
                    frame.data.len()
                );
            }
            Ok(CaptureEvent::Error(error)) => log::error!("capture error: {}", error),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    capture.stop()?;
    println!("{}", capture.summary().to_json()?);
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("record_frames requires macOS");
}
