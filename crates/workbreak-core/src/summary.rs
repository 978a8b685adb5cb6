use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::to_wall;
use crate::error::Result;
use crate::format::format_time;
use crate::timer::{Interval, SessionState};

/// Report of a saved session, printed by drivers when the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Wall-clock start, when the session ran on a wall-anchored clock.
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub worked_ms: u64,
    pub worked: String,
    pub break_ms: u64,
    pub reminders: u32,
    pub intervals: Vec<Interval>,
}

impl SessionSummary {
    /// Summarize `state` as of `now` (or as of its stop time once saved).
    pub fn from_state(state: &SessionState, now: u64) -> Self {
        let end = state.stopped_at().unwrap_or(now);
        let worked_ms = state.worked_time(end);
        let span_ms = end.saturating_sub(state.session_start());
        Self {
            session_id: state.id().to_string(),
            started_at: to_wall(state.session_start()),
            stopped_at: state.stopped_at().and_then(to_wall),
            worked_ms,
            worked: format_time(worked_ms),
            break_ms: span_ms.saturating_sub(worked_ms),
            reminders: state.reminder_count(),
            intervals: state.intervals().to_vec(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
