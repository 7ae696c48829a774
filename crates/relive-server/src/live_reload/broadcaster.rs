//! Debounced reload broadcasting.
//!
//! Editors and build tools emit bursts of raw events for one logical save
//! (truncate then write, several files touched at once). Broadcasting on each
//! would reload the page several times in a row, so a change arriving less
//! than the interval after the last broadcast is dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::registry::ReloadRegistry;

/// Default minimum time between two broadcasts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Turns change notifications into reload broadcasts, at most one per interval.
///
/// State is per instance, so two servers debounce independently.
#[derive(Debug)]
pub(crate) struct Broadcaster {
    registry: Arc<ReloadRegistry>,
    interval: Duration,
    last_broadcast: Mutex<Option<Instant>>,
}

impl Broadcaster {
    /// Create a broadcaster. An `interval` of zero disables debouncing.
    pub(crate) fn new(registry: Arc<ReloadRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            last_broadcast: Mutex::new(None),
        }
    }

    /// Handle one raw change notification.
    ///
    /// Returns `true` if a broadcast was sent.
    pub(crate) fn notify_change(&self) -> bool {
        self.notify_change_at(Instant::now())
    }

    fn notify_change_at(&self, now: Instant) -> bool {
        // Held through the broadcast so broadcasts keep notification order
        let mut last = self
            .last_broadcast
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last
            && now.saturating_duration_since(previous) < self.interval
        {
            return false;
        }

        *last = Some(now);
        let delivered = self.registry.broadcast();
        tracing::debug!(delivered, "Reload broadcast");
        true
    }
}
