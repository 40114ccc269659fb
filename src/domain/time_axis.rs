// Time-axis reducer - distinct observation instants inside the trailing window
use super::sensor_event::SensorEvent;
use std::collections::BTreeSet;
use std::time::Duration;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

/// Strictly ascending, de-duplicated epoch-millisecond instants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeAxis {
    instants: Vec<i64>,
}

impl TimeAxis {
    /// Rebuild the axis from the full buffer contents.
    ///
    /// Instants older than `latest - window` are dropped. Events whose timestamp
    /// cannot be read contribute nothing.
    pub fn compute(events: &[SensorEvent], window: Duration) -> Self {
        let distinct: BTreeSet<i64> = events.iter().filter_map(SensorEvent::epoch_ms).collect();

        let Some(&latest) = distinct.last() else {
            return Self::default();
        };

        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let cutoff = latest.saturating_sub(window_ms);

        Self {
            instants: distinct.range(cutoff..).copied().collect(),
        }
    }

    pub fn instants(&self) -> &[i64] {
        &self.instants
    }

    pub fn latest(&self) -> Option<i64> {
        self.instants.last().copied()
    }

    /// Position of an instant on the axis, if it is inside the window.
    pub fn position(&self, epoch_ms: i64) -> Option<usize> {
        self.instants.binary_search(&epoch_ms).ok()
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }
}

pub fn compute_axis(events: &[SensorEvent], window: Duration) -> TimeAxis {
    TimeAxis::compute(events, window)
}
