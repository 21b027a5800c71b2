//! A capture in flight between hardware delivery and persistence.

use super::{CaptureError, MediaKind, ResourceLocator, Storage};
use crate::orientation::Rotation;
use std::io::Write;
use std::time::Instant;

/// Encoded image bytes awaiting persistence.
///
/// Owns the buffer until [`CaptureRequest::persist`] consumes it.
pub struct CaptureRequest {
    data: Vec<u8>,
    sequence: u64,
    rotation: Rotation,
    received_at: Instant,
}

impl CaptureRequest {
    /// Wraps bytes delivered by the hardware.
    pub fn new(data: Vec<u8>, sequence: u64, rotation: Rotation) -> Self {
        Self {
            data,
            sequence,
            rotation,
            received_at: Instant::now(),
        }
    }

    /// Raw encoded bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Per-coordinator capture number, starting at 1.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Rotation tag the hardware was configured with.
    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Writes the bytes verbatim to a fresh destination.
    ///
    /// Never retries. A failed write removes whatever was created.
    pub fn persist<S: Storage + ?Sized>(self, storage: &S) -> Result<ResourceLocator, CaptureError> {
        let path = storage
            .allocate_destination(MediaKind::Image)
            .map_err(|e| CaptureError::StorageUnavailable(e.to_string()))?;

        let written = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| {
                file.write_all(&self.data)?;
                file.sync_all()
            });

        match written {
            Ok(()) => {
                tracing::info!(
                    sequence = self.sequence,
                    bytes = self.data.len(),
                    rotation = %self.rotation,
                    elapsed_ms = self.received_at.elapsed().as_millis() as u64,
                    path = %path.display(),
                    "capture persisted"
                );
                Ok(ResourceLocator::from_path(path))
            }
            Err(e) => {
                tracing::warn!(sequence = self.sequence, path = %path.display(), error = %e, "capture write failed");
                if e.kind() != std::io::ErrorKind::AlreadyExists {
                    let _ = std::fs::remove_file(&path);
                }
                Err(CaptureError::WriteFailed(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for CaptureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRequest")
            .field("sequence", &self.sequence)
            .field("rotation", &self.rotation)
            .field("bytes", &self.data.len())
            .finish()
    }
}
