//! Derived-time calculations over a session's interval log.
//!
//! Every function here is pure: it reads a [`SessionState`] and a `now`
//! reading and never mutates. Durations saturate at zero.

use super::interval::Interval;
use super::state::SessionState;

/// Continuous working time after which a reminder is due (20 minutes).
pub const REMINDER_THRESHOLD_MS: u64 = 1_200_000;

/// Closed intervals plus the open span, filtered to working phases.
///
/// The open span is only included once the log holds at least one closed
/// interval; with an empty log the open span is tracked through the
/// `time_elapsed` display cache instead.
pub fn worked_intervals(state: &SessionState, now: u64) -> Vec<Interval> {
    let Some(last) = state.intervals().last() else {
        return Vec::new();
    };
    let now = state.effective_now(now);

    state
        .intervals()
        .iter()
        .copied()
        .chain(std::iter::once(Interval::new(last.end, now, state.working())))
        .filter(|interval| interval.working)
        .collect()
}

/// Total working time across the whole session, in milliseconds.
pub fn total_worked_time(state: &SessionState, now: u64) -> u64 {
    if state.intervals().is_empty() {
        return if state.working() { state.elapsed_time() } else { 0 };
    }
    worked_intervals(state, now)
        .iter()
        .map(Interval::duration_ms)
        .fold(0, u64::saturating_add)
}

/// Working time accrued since the last reminder, or since session start if
/// none has fired yet.
pub fn worked_time_since_last_notification(state: &SessionState, now: u64) -> u64 {
    if state.intervals().is_empty() {
        return if state.working() { state.elapsed_time() } else { 0 };
    }
    let since = state
        .last_off_screen_notification()
        .unwrap_or(state.session_start());
    worked_intervals(state, now)
        .iter()
        .map(|interval| interval.duration_since(since))
        .fold(0, u64::saturating_add)
}

/// A reminder is due while working once the threshold has accrued.
pub fn notification_due(state: &SessionState, now: u64) -> bool {
    if !state.working() {
        return false;
    }
    worked_time_since_last_notification(state, now) >= REMINDER_THRESHOLD_MS
}
