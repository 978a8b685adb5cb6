//! Session state and its mutations.
//!
//! `SessionState` is pure data: the interval log, the open interval and two
//! phase flags. It owns no timers or other resources, so a snapshot can be
//! cloned, serialized and inspected freely.
//!
//! ## State Transitions
//!
//! ```text
//! working:    false <-> true   (every toggle_phase)
//! is_running: true  ->  false  (save, exactly once)
//! ```
//!
//! Once stopped, every mutation is a no-op and derivations are pinned to the
//! moment of stopping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::accounting;
use super::interval::Interval;
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    id: String,
    session_start: u64,
    intervals: Vec<Interval>,
    last_interval_start: u64,
    working: bool,
    is_running: bool,
    #[serde(default)]
    last_off_screen_notification: Option<u64>,
    /// Display cache of `now - last_interval_start`, refreshed by `tick`.
    #[serde(default)]
    time_elapsed: u64,
    #[serde(default)]
    stopped_at: Option<u64>,
    #[serde(default)]
    reminder_count: u32,
}

impl SessionState {
    /// Start a session at `now`: empty log, on break, running.
    pub fn new(now: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_start: now,
            intervals: Vec::new(),
            last_interval_start: now,
            working: false,
            is_running: true,
            last_off_screen_notification: None,
            time_elapsed: 0,
            stopped_at: None,
            reminder_count: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_start(&self) -> u64 {
        self.session_start
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn last_interval_start(&self) -> u64 {
        self.last_interval_start
    }

    pub fn working(&self) -> bool {
        self.working
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn last_off_screen_notification(&self) -> Option<u64> {
        self.last_off_screen_notification
    }

    pub fn stopped_at(&self) -> Option<u64> {
        self.stopped_at
    }

    /// Number of reminders fired this session.
    pub fn reminder_count(&self) -> u32 {
        self.reminder_count
    }

    /// Elapsed time in the open interval as of the last display tick.
    pub fn elapsed_time(&self) -> u64 {
        self.time_elapsed
    }

    /// Total worked time as of `now` (or as of stopping, once stopped).
    pub fn worked_time(&self, now: u64) -> u64 {
        accounting::total_worked_time(self, now)
    }

    pub fn worked_time_since_last_notification(&self, now: u64) -> u64 {
        accounting::worked_time_since_last_notification(self, now)
    }

    pub fn notification_due(&self, now: u64) -> bool {
        self.is_running && accounting::notification_due(self, now)
    }

    /// `now` as seen by derivations: frozen at the stop time once stopped.
    pub(crate) fn effective_now(&self, now: u64) -> u64 {
        self.stopped_at.unwrap_or(now)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: u64) -> Event {
        Event::StateSnapshot {
            working: self.working,
            is_running: self.is_running,
            elapsed_ms: self.time_elapsed,
            worked_ms: self.worked_time(now),
            since_last_reminder_ms: self.worked_time_since_last_notification(now),
            interval_count: self.intervals.len(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Close the open interval at `now` and open one in the other phase.
    pub fn toggle_phase(&mut self, now: u64) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        let closed = self.close_open_interval(now);
        self.working = !self.working;
        self.time_elapsed = 0;
        debug!(
            start = closed.start,
            end = closed.end,
            working = self.working,
            "phase toggled"
        );
        Some(Event::PhaseToggled {
            closed,
            working: self.working,
            at: closed.end,
        })
    }

    /// Freeze the session. The open interval is left out of the log.
    pub fn save(&mut self, now: u64) -> Option<Event> {
        self.stop(now, false)
    }

    /// Freeze the session after appending the open interval to the log.
    pub fn save_and_close(&mut self, now: u64) -> Option<Event> {
        self.stop(now, true)
    }

    /// Refresh the elapsed-time display cache. Returns the new value.
    pub fn tick(&mut self, now: u64) -> Option<u64> {
        if !self.is_running {
            return None;
        }
        self.time_elapsed = now.saturating_sub(self.last_interval_start);
        Some(self.time_elapsed)
    }

    /// Record a reminder at `now` if one is due.
    pub fn check_notification(&mut self, now: u64) -> Option<Event> {
        if !self.notification_due(now) {
            return None;
        }
        let worked_since_last_ms = self.worked_time_since_last_notification(now);
        self.last_off_screen_notification = Some(now);
        self.reminder_count += 1;
        info!(worked_since_last_ms, at = now, "reminder due");
        Some(Event::ReminderDue {
            worked_since_last_ms,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn close_open_interval(&mut self, now: u64) -> Interval {
        if now < self.last_interval_start {
            warn!(
                now,
                last_interval_start = self.last_interval_start,
                "clock went backwards, clamping interval end"
            );
        }
        let end = now.max(self.last_interval_start);
        let closed = Interval::new(self.last_interval_start, end, self.working);
        self.intervals.push(closed);
        self.last_interval_start = end;
        closed
    }

    fn stop(&mut self, now: u64, close_open: bool) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        let now = now.max(self.last_interval_start);
        if close_open {
            self.close_open_interval(now);
        }
        self.time_elapsed = now.saturating_sub(self.last_interval_start);
        self.is_running = false;
        self.stopped_at = Some(now);
        let worked_ms = self.worked_time(now);
        info!(
            session_id = %self.id,
            worked_ms,
            intervals = self.intervals.len(),
            "session saved"
        );
        Some(Event::SessionSaved {
            worked_ms,
            interval_count: self.intervals.len(),
            closed_open_interval: close_open,
            at: now,
        })
    }
}
