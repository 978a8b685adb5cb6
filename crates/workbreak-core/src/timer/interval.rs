use serde::{Deserialize, Serialize};

/// A closed span during which the session stayed in one phase.
///
/// Timestamps are clock milliseconds. `end >= start` always holds for
/// intervals produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
    pub working: bool,
}

impl Interval {
    pub fn new(start: u64, end: u64, working: bool) -> Self {
        Self { start, end, working }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Portion of this interval at or after `since`, or 0 if it ended earlier.
    pub fn duration_since(&self, since: u64) -> u64 {
        if self.end < since {
            return 0;
        }
        self.end.saturating_sub(self.start.max(since))
    }
}
