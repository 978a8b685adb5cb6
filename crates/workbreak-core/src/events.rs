use serde::{Deserialize, Serialize};

use crate::timer::Interval;

/// Every state change in a session produces an Event.
/// Drivers render them; the controller forwards reminder events to the sink.
///
/// `at` fields are clock milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: String,
        at: u64,
    },
    PhaseToggled {
        /// The interval that was just closed.
        closed: Interval,
        /// Phase of the newly opened interval.
        working: bool,
        at: u64,
    },
    ReminderDue {
        worked_since_last_ms: u64,
        at: u64,
    },
    SessionSaved {
        worked_ms: u64,
        interval_count: usize,
        /// Whether the open interval was appended to the log on save.
        closed_open_interval: bool,
        at: u64,
    },
    StateSnapshot {
        working: bool,
        is_running: bool,
        elapsed_ms: u64,
        worked_ms: u64,
        since_last_reminder_ms: u64,
        interval_count: usize,
        at: u64,
    },
}
