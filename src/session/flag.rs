use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds a shared busy flag set and clears it when dropped.
///
/// Moved into hardware callbacks so the flag clears even if the hardware
/// drops a callback without ever invoking it.
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Sets the flag only if it was clear.
    pub(crate) fn try_arm(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
