use thiserror::Error;

/// Errors from session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The camera is busy, absent or refused to start.
    #[error("camera hardware unavailable: {0}")]
    HardwareUnavailable(String),
    /// The rendering surface could not be attached.
    #[error("failed to bind preview surface: {0}")]
    SurfaceBindingFailed(String),
    /// `open` was called on a session that already holds the camera.
    #[error("session is already open")]
    AlreadyOpen,
    /// A capture trigger has not fired yet; retry afterwards.
    #[error("a capture trigger is outstanding, retry once it completes")]
    CaptureTriggerPending,
}

impl SessionError {
    /// True for failures the host reports as "camera in use".
    pub fn is_in_use_signal(&self) -> bool {
        matches!(
            self,
            SessionError::HardwareUnavailable(_) | SessionError::SurfaceBindingFailed(_)
        )
    }

    /// True for failures the caller may simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::CaptureTriggerPending)
    }
}
