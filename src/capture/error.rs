use thiserror::Error;

/// Errors from a capture request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The session is not streaming.
    #[error("camera is not previewing")]
    NotPreviewing,
    /// Another capture is still outstanding.
    #[error("a capture is already in progress")]
    CaptureInProgress,
    /// No destination could be prepared.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Writing the image bytes failed; nothing is left behind.
    #[error("failed to write capture: {0}")]
    WriteFailed(String),
    /// The hardware refused the capture trigger.
    #[error("hardware capture failed: {0}")]
    Hardware(String),
    /// The hardware dropped the capture without delivering bytes.
    #[error("capture was abandoned before the hardware delivered an image")]
    Abandoned,
}

impl CaptureError {
    /// True for local precondition violations returned before the
    /// hardware is touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CaptureError::NotPreviewing | CaptureError::CaptureInProgress
        )
    }
}
