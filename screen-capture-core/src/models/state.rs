/// Capture session state machine.
///
/// State transitions:
/// ```text
/// ready → running ↔ paused
///            ↓        ↓
///          stopped ───┘
///            ↓
///         running (restart)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Ready,
    Running,
    Paused,
    Stopped,
}

impl CaptureState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether the platform session is live (running or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, Self::Ready | Self::Stopped)
    }
}
