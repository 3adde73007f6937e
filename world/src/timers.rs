//! Pending continuations keyed by [`TimerKey`].

use std::{collections::BTreeMap, time::Duration};

use koma_rush_core::TimerKey;

/// At most one pending deadline per key; re-arming replaces the old one.
#[derive(Clone, Debug, Default)]
pub(crate) struct TimerQueue {
    pending: BTreeMap<TimerKey, Duration>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn arm(&mut self, timer: TimerKey, deadline: Duration) {
        let _ = self.pending.insert(timer, deadline);
    }

    pub(crate) fn cancel(&mut self, timer: TimerKey) -> bool {
        self.pending.remove(&timer).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn deadline(&self, timer: TimerKey) -> Option<Duration> {
        self.pending.get(&timer).copied()
    }

    /// Removes and returns every timer due at `now`, earliest deadline first.
    pub(crate) fn drain_due(&mut self, now: Duration) -> Vec<TimerKey> {
        let mut due: Vec<(Duration, TimerKey)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(timer, deadline)| (*deadline, *timer))
            .collect();
        due.sort();
        for (_, timer) in &due {
            let _ = self.pending.remove(timer);
        }
        due.into_iter().map(|(_, timer)| timer).collect()
    }
}
