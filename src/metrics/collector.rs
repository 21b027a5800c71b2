//! Metrics collection and registry.

use crate::capture::CaptureStats;
use crate::orientation::Facing;
use crate::session::{SessionState, SessionStats};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of camera state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Current session state.
    pub state: SessionState,
    /// Current facing.
    pub facing: Facing,
    /// Successful hardware acquisitions.
    pub opens: u64,
    /// Failed hardware acquisitions.
    pub open_failures: u64,
    /// Times streaming was started.
    pub previews_started: u64,
    /// Completed facing swaps.
    pub facing_swaps: u64,
    /// Captures handed to the hardware.
    pub captures_triggered: u64,
    /// Captures persisted successfully.
    pub captures_succeeded: u64,
    /// Accepted captures that failed afterwards.
    pub captures_failed: u64,
    /// Capture requests rejected on a local precondition.
    pub captures_rejected: u64,
    /// Total bytes written.
    pub bytes_persisted: u64,
}

/// Prometheus metrics registry for the camera.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    session_state: IntGauge,
    facing: IntGauge,
    sessions_opened: IntCounter,
    open_failures: IntCounter,
    previews_started: IntCounter,
    facing_swaps: IntCounter,

    // Capture metrics
    captures_triggered: IntCounter,
    captures_succeeded: IntCounter,
    captures_failed: IntCounter,
    captures_rejected: IntCounter,
    bytes_persisted: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all camera metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_state = IntGauge::new(
            "quick_camera_session_state",
            "Session state (0=closed, 1=configured, 2=previewing)",
        )?;
        let facing = IntGauge::new("quick_camera_facing", "Selected camera (0=back, 1=front)")?;
        let sessions_opened = IntCounter::new(
            "quick_camera_sessions_opened_total",
            "Total successful camera acquisitions",
        )?;
        let open_failures = IntCounter::new(
            "quick_camera_open_failures_total",
            "Total failed camera acquisitions",
        )?;
        let previews_started = IntCounter::new(
            "quick_camera_previews_started_total",
            "Total times preview streaming started",
        )?;
        let facing_swaps = IntCounter::new(
            "quick_camera_facing_swaps_total",
            "Total front/back camera swaps",
        )?;

        let captures_triggered = IntCounter::new(
            "quick_camera_captures_triggered_total",
            "Total captures handed to the hardware",
        )?;
        let captures_succeeded = IntCounter::new(
            "quick_camera_captures_succeeded_total",
            "Total captures persisted",
        )?;
        let captures_failed = IntCounter::new(
            "quick_camera_captures_failed_total",
            "Total accepted captures that failed",
        )?;
        let captures_rejected = IntCounter::new(
            "quick_camera_captures_rejected_total",
            "Total capture requests rejected before triggering",
        )?;
        let bytes_persisted = IntCounter::new(
            "quick_camera_bytes_persisted_total",
            "Total image bytes written to storage",
        )?;

        registry.register(Box::new(session_state.clone()))?;
        registry.register(Box::new(facing.clone()))?;
        registry.register(Box::new(sessions_opened.clone()))?;
        registry.register(Box::new(open_failures.clone()))?;
        registry.register(Box::new(previews_started.clone()))?;
        registry.register(Box::new(facing_swaps.clone()))?;
        registry.register(Box::new(captures_triggered.clone()))?;
        registry.register(Box::new(captures_succeeded.clone()))?;
        registry.register(Box::new(captures_failed.clone()))?;
        registry.register(Box::new(captures_rejected.clone()))?;
        registry.register(Box::new(bytes_persisted.clone()))?;

        Ok(Self {
            registry,
            session_state,
            facing,
            sessions_opened,
            open_failures,
            previews_started,
            facing_swaps,
            captures_triggered,
            captures_succeeded,
            captures_failed,
            captures_rejected,
            bytes_persisted,
        })
    }

    /// Updates all metrics from a snapshot of camera state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_state.set(snapshot.state.as_gauge());
        self.facing.set(match snapshot.facing {
            Facing::Back => 0,
            Facing::Front => 1,
        });

        // Counters only move forward by the difference
        advance(&self.sessions_opened, snapshot.opens);
        advance(&self.open_failures, snapshot.open_failures);
        advance(&self.previews_started, snapshot.previews_started);
        advance(&self.facing_swaps, snapshot.facing_swaps);
        advance(&self.captures_triggered, snapshot.captures_triggered);
        advance(&self.captures_succeeded, snapshot.captures_succeeded);
        advance(&self.captures_failed, snapshot.captures_failed);
        advance(&self.captures_rejected, snapshot.captures_rejected);
        advance(&self.bytes_persisted, snapshot.bytes_persisted);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("session_state", &self.session_state.get())
            .field("captures_succeeded", &self.captures_succeeded.get())
            .finish_non_exhaustive()
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from session and capture counters.
    pub fn from_components(session: &SessionStats, capture: &CaptureStats) -> Self {
        Self {
            state: session.state,
            facing: session.facing,
            opens: session.opens,
            open_failures: session.open_failures,
            previews_started: session.previews_started,
            facing_swaps: session.facing_swaps,
            captures_triggered: capture.triggered,
            captures_succeeded: capture.succeeded,
            captures_failed: capture.failed,
            captures_rejected: capture.rejected,
            bytes_persisted: capture.bytes_persisted,
        }
    }
}
