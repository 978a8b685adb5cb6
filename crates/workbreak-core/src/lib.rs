//! # workbreak Core Library
//!
//! This library provides the core logic for the workbreak interval timer:
//! the user flips between working and on-break phases, every phase is
//! recorded as a closed interval, and a spoken reminder fires after twenty
//! minutes of work without one.
//!
//! ## Architecture
//!
//! - **Interval log**: [`SessionState`], pure data mutated by phase toggles
//!   and a terminal save
//! - **Accounting engine**: pure derivations of elapsed, worked and
//!   since-last-reminder time from the log plus a `now` reading
//! - **Controller**: [`SessionController`] owns the display and reminder
//!   tickers and serializes every state update behind one lock
//! - **Storage**: TOML-based configuration
//!
//! The engine never reads the system time; callers supply a [`Clock`].

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod reminder;
pub mod storage;
pub mod summary;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ConfigError, CoreError, ReminderError};
pub use events::Event;
pub use reminder::{BellSink, CommandSink, NullSink, ReminderSink, Utterance};
pub use storage::Config;
pub use summary::SessionSummary;
pub use timer::{Interval, SessionController, SessionState, TickPeriods, REMINDER_THRESHOLD_MS};
