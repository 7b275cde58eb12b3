use std::sync::Arc;

use super::error::CaptureError;
use super::frame::Frame;

/// Event published by a capture session.
///
/// Frame payloads are shared between subscribers; use `Arc::make_mut` or
/// `Arc::unwrap_or_clone` to get a private, mutable copy.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Started,
    Finished,
    Paused,
    Resumed,
    Error(CaptureError),
    Frame(Arc<Frame>),
}

impl CaptureEvent {
    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame(_))
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Error(_) => "error",
            Self::Frame(_) => "frame",
        }
    }
}
