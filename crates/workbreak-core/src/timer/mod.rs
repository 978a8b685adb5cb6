mod accounting;
mod controller;
mod interval;
mod state;

pub use accounting::{
    notification_due, total_worked_time, worked_intervals, worked_time_since_last_notification,
    REMINDER_THRESHOLD_MS,
};
pub use controller::{SessionController, TickPeriods};
pub use interval::Interval;
pub use state::SessionState;
