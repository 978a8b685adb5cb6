//! Human-readable rendering of durations and interval logs.

use crate::timer::Interval;

pub const WORKING_GLYPH: char = '█';
pub const BREAK_GLYPH: char = '░';

/// Render milliseconds as `HH:MM:SS.cc`.
///
/// Hours are not wrapped, so sessions longer than a day show e.g. `26:00:00.00`.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    let centis = (ms % 1000) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Proportional strip of the interval log, `width` characters wide.
///
/// Each interval gets a share of the strip proportional to its duration;
/// rounding is distributed so the strip is always exactly `width` long.
/// Returns an empty string for an empty or zero-length log.
pub fn timeline_bar(intervals: &[Interval], width: usize) -> String {
    let total: u64 = intervals.iter().map(Interval::duration_ms).sum();
    if total == 0 || width == 0 {
        return String::new();
    }

    let mut bar = String::with_capacity(width * WORKING_GLYPH.len_utf8());
    let mut covered_ms = 0u64;
    let mut drawn = 0usize;
    for interval in intervals {
        covered_ms += interval.duration_ms();
        let target = ((covered_ms as u128 * width as u128) / total as u128) as usize;
        let glyph = if interval.working {
            WORKING_GLYPH
        } else {
            BREAK_GLYPH
        };
        for _ in drawn..target {
            bar.push(glyph);
        }
        drawn = drawn.max(target);
    }
    bar
}
