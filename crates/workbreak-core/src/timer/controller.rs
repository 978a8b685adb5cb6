//! Session controller: owns the periodic tickers around a [`SessionState`].
//!
//! The state is pure data behind a mutex; the controller alone holds the two
//! ticker handles. Every read-modify-write of the state happens under the
//! lock, and reminders are delivered while it is held, so once `save` has
//! flipped the session to stopped no ticker can produce another side effect.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::state::SessionState;
use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::reminder::{ReminderSink, Utterance};
use crate::storage::Config;

const EVENT_CAPACITY: usize = 64;

/// Periods of the two session tickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPeriods {
    /// Elapsed-time display refresh.
    pub display: Duration,
    /// Reminder check.
    pub notification_check: Duration,
}

impl Default for TickPeriods {
    fn default() -> Self {
        Self {
            display: Duration::from_millis(10),
            notification_check: Duration::from_millis(20_000),
        }
    }
}

pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ReminderSink>,
    utterance: Arc<Utterance>,
    periods: TickPeriods,
    close_open_interval_on_save: bool,
    display_ticker: Option<JoinHandle<()>>,
    notification_ticker: Option<JoinHandle<()>>,
    snapshots: watch::Sender<Event>,
    events: broadcast::Sender<Event>,
}

impl SessionController {
    /// Create a session starting at the clock's current reading.
    pub fn new(
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ReminderSink>,
        utterance: Utterance,
        periods: TickPeriods,
    ) -> Self {
        let now = clock.now_ms();
        let state = SessionState::new(now);
        let (snapshots, _) = watch::channel(state.snapshot(now));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            sink,
            utterance: Arc::new(utterance),
            periods,
            close_open_interval_on_save: false,
            display_ticker: None,
            notification_ticker: None,
            snapshots,
            events,
        }
    }

    /// Create a session with tick periods, reminder payload and save policy
    /// taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured reminder message cannot be decoded.
    pub fn from_config(
        config: &Config,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ReminderSink>,
    ) -> Result<Self> {
        let utterance = config.utterance()?;
        Ok(Self::new(clock, sink, utterance, config.tick_periods())
            .close_open_interval_on_save(config.session.close_open_interval_on_save))
    }

    /// Append the open interval to the log when saving.
    pub fn close_open_interval_on_save(mut self, close: bool) -> Self {
        self.close_open_interval_on_save = close;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Event {
        let guard = self.state.lock().await;
        guard.snapshot(self.clock.now_ms())
    }

    /// Latest display snapshot, refreshed on every display tick.
    pub fn subscribe(&self) -> watch::Receiver<Event> {
        self.snapshots.subscribe()
    }

    /// Discrete session events: start, toggles, reminders, save.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.display_ticker.is_some() || self.notification_ticker.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Spawn both tickers. Must be called from within a tokio runtime.
    pub async fn start(&mut self) -> Option<Event> {
        if self.is_ticking() {
            return None;
        }
        let (session_id, at) = {
            let guard = self.state.lock().await;
            if !guard.is_running() {
                return None;
            }
            (guard.id().to_string(), guard.session_start())
        };

        self.display_ticker = Some(self.spawn_display_ticker());
        self.notification_ticker = Some(self.spawn_notification_ticker());
        debug!(%session_id, periods = ?self.periods, "session tickers started");

        let event = Event::SessionStarted { session_id, at };
        let _ = self.events.send(event.clone());
        Some(event)
    }

    pub async fn toggle_phase(&self) -> Option<Event> {
        let (event, snapshot) = {
            let mut guard = self.state.lock().await;
            let now = self.clock.now_ms();
            let event = guard.toggle_phase(now)?;
            guard.tick(now);
            (event, guard.snapshot(now))
        };
        self.snapshots.send_replace(snapshot);
        let _ = self.events.send(event.clone());
        Some(event)
    }

    /// Freeze the session and cancel both tickers before returning.
    ///
    /// Calling it again is a no-op returning `None`.
    pub async fn save(&mut self) -> Option<Event> {
        let saved = {
            let mut guard = self.state.lock().await;
            let now = self.clock.now_ms();
            let event = if self.close_open_interval_on_save {
                guard.save_and_close(now)
            } else {
                guard.save(now)
            };
            event.map(|event| (event, guard.snapshot(now)))
        };

        self.cancel_tickers().await;

        let (event, snapshot) = saved?;
        self.snapshots.send_replace(snapshot);
        let _ = self.events.send(event.clone());
        Some(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn spawn_display_ticker(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let clock = self.clock.clone();
        let snapshots = self.snapshots.clone();
        let period = self.periods.display;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let snapshot = {
                    let mut guard = state.lock().await;
                    let now = clock.now_ms();
                    if guard.tick(now).is_none() {
                        break;
                    }
                    guard.snapshot(now)
                };
                snapshots.send_replace(snapshot);
            }
        })
    }

    fn spawn_notification_ticker(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let clock = self.clock.clone();
        let sink = self.sink.clone();
        let utterance = self.utterance.clone();
        let events = self.events.clone();
        let period = self.periods.notification_check;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut guard = state.lock().await;
                if !guard.is_running() {
                    break;
                }
                let now = clock.now_ms();
                if let Some(event) = guard.check_notification(now) {
                    if let Err(e) = sink.remind(&utterance) {
                        warn!(error = %e, "failed to deliver reminder");
                    }
                    let _ = events.send(event);
                }
            }
        })
    }

    async fn cancel_tickers(&mut self) {
        for handle in [self.display_ticker.take(), self.notification_ticker.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
            // Wait for the abort to land so nothing runs after we return.
            let _ = handle.await;
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        for handle in [&self.display_ticker, &self.notification_ticker]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ReminderError;
    use crate::timer::{Interval, REMINDER_THRESHOLD_MS};

    #[derive(Default)]
    struct RecordingSink {
        spoken: std::sync::Mutex<Vec<Utterance>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.spoken.lock().unwrap().len()
        }
    }

    impl ReminderSink for RecordingSink {
        fn remind(&self, utterance: &Utterance) -> Result<(), ReminderError> {
            self.spoken.lock().unwrap().push(utterance.clone());
            Ok(())
        }
    }

    fn controller(clock: &ManualClock, sink: &Arc<RecordingSink>) -> SessionController {
        SessionController::new(
            Arc::new(clock.clone()),
            sink.clone(),
            Utterance::new("en-US", "Look away"),
            TickPeriods {
                display: Duration::from_secs(1),
                notification_check: Duration::from_secs(20),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reminder_fires_once_threshold_is_reached() {
        let clock = ManualClock::new(0);
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller(&clock, &sink);
        let mut events = controller.subscribe_events();

        assert!(matches!(controller.start().await, Some(Event::SessionStarted { .. })));
        assert!(matches!(events.recv().await, Ok(Event::SessionStarted { .. })));
        controller.toggle_phase().await;
        assert!(matches!(events.recv().await, Ok(Event::PhaseToggled { working: true, .. })));

        clock.set(REMINDER_THRESHOLD_MS - 1);
        time::sleep(Duration::from_secs(21)).await;
        assert_eq!(sink.count(), 0);

        clock.set(1_500_000);
        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.spoken.lock().unwrap()[0].text, "Look away");
        assert!(matches!(events.recv().await, Ok(Event::ReminderDue { at: 1_500_000, .. })));

        let state = controller.state().await;
        assert_eq!(state.last_off_screen_notification(), Some(1_500_000));
    }

    #[tokio::test(start_paused = true)]
    async fn no_reminder_while_on_break() {
        let clock = ManualClock::new(0);
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller(&clock, &sink);
        controller.start().await;

        clock.set(REMINDER_THRESHOLD_MS * 3);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn display_ticker_refreshes_elapsed_time() {
        let clock = ManualClock::new(1_000);
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller(&clock, &sink);
        let mut snapshots = controller.subscribe();
        controller.start().await;

        clock.set(4_000);
        time::sleep(Duration::from_millis(1_500)).await;
        snapshots.changed().await.unwrap();
        let snapshot = snapshots.borrow().clone();
        match snapshot {
            Event::StateSnapshot { elapsed_ms, .. } => assert_eq!(elapsed_ms, 3_000),
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn save_cancels_tickers_and_freezes_state() {
        let clock = ManualClock::new(0);
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller(&clock, &sink);
        controller.start().await;
        controller.toggle_phase().await;

        clock.set(10_000);
        assert!(matches!(controller.save().await, Some(Event::SessionSaved { .. })));
        assert!(!controller.is_ticking());
        let frozen = controller.state().await;

        clock.set(REMINDER_THRESHOLD_MS * 5);
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(sink.count(), 0);
        assert_eq!(controller.state().await, frozen);
        assert_eq!(frozen.worked_time(REMINDER_THRESHOLD_MS * 5), 10_000);

        assert!(controller.save().await.is_none());
        assert!(controller.toggle_phase().await.is_none());
        assert!(controller.start().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn from_config_rejects_undecodable_message() {
        let mut config = Config::default();
        config.reminder.encoded_message = Some("%%%".into());
        let result = SessionController::from_config(
            &config,
            Arc::new(ManualClock::new(0)),
            Arc::new(RecordingSink::default()),
        );
        assert!(matches!(result, Err(crate::error::CoreError::Reminder(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn save_can_close_the_open_interval() {
        let clock = ManualClock::new(0);
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller(&clock, &sink).close_open_interval_on_save(true);
        controller.start().await;
        controller.toggle_phase().await;

        clock.set(7_000);
        controller.save().await;
        let state = controller.state().await;
        assert_eq!(state.intervals().last(), Some(&Interval::new(0, 7_000, true)));
    }
}
