use thiserror::Error;

/// Errors that can occur while building or driving a screen capture session.
///
/// The first five variants are construction failures and are reported in the
/// order the session builder checks them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen identifier does not resolve to a capturable display")]
    InvalidScreen,

    #[error("audio device does not support the audio media type")]
    InvalidAudioDevice,

    #[error("could not add screen input to the capture session")]
    CouldNotAddScreen,

    #[error("could not add microphone input to the capture session")]
    CouldNotAddMic,

    #[error("could not add frame output to the capture session")]
    CouldNotAddOutput,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("backend error: {0}")]
    Backend(String),
}

