//! Client-side countdown timers.
//!
//! A timer runs until the wall clock reaches its deadline, then is done
//! until dismissed. One shared one-second tick re-evaluates every timer;
//! the alarm fires on the running-to-done transition only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use homeboard_protocol::TIMERS_WIDGET;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::board::WidgetBoard;
use crate::clock::Clock;
use crate::render::WidgetView;

pub const DEFAULT_LABEL: &str = "Timer";
const TIMERS_TITLE: &str = "Timers";
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub label: String,
    pub end_time: DateTime<Utc>,
    pub total_duration: Duration,
    pub done: bool,
}

impl Timer {
    pub fn state(&self) -> TimerState {
        if self.done {
            TimerState::Done
        } else {
            TimerState::Running
        }
    }

    /// Time left, rounded up to whole seconds. Zero once the deadline passed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = (self.end_time - now).num_milliseconds();
        if left <= 0 {
            Duration::ZERO
        } else {
            Duration::from_secs((left as u64).div_ceil(1000))
        }
    }
}

/// Side effect run once when a timer completes.
pub trait AlarmSink: Send + Sync {
    fn alarm(&self, timer: &Timer);
}

impl<F> AlarmSink for F
where
    F: Fn(&Timer) + Send + Sync,
{
    fn alarm(&self, timer: &Timer) {
        self(timer)
    }
}

pub struct TimerSubsystem {
    clock: Arc<dyn Clock>,
    alarm: Arc<dyn AlarmSink>,
    max_minutes: u32,
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerSubsystem {
    pub fn new(clock: Arc<dyn Clock>, alarm: Arc<dyn AlarmSink>, max_minutes: u32) -> Self {
        Self {
            clock,
            alarm,
            max_minutes,
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Start a timer of `minutes` whole minutes. Out-of-range durations are
    /// ignored and return `None`.
    pub fn start_timer(&mut self, minutes: i64, label: &str) -> Option<u64> {
        if minutes < 1 || minutes > i64::from(self.max_minutes) {
            debug!(
                event = "core.timers.rejected",
                minutes,
                max_minutes = self.max_minutes,
            );
            return None;
        }

        let total_duration = Duration::from_secs(minutes as u64 * 60);
        let end_time = self.clock.now() + chrono::Duration::minutes(minutes);
        let label = match label.trim() {
            "" => DEFAULT_LABEL.to_string(),
            l => l.to_string(),
        };
        let id = self.next_id;
        self.next_id += 1;

        info!(event = "core.timers.started", id, minutes, label = %label);
        self.timers.push(Timer {
            id,
            label,
            end_time,
            total_duration,
            done: false,
        });
        Some(id)
    }

    /// Start a timer from user-typed minutes. Non-numeric text is ignored.
    pub fn start_timer_from_input(&mut self, input: &str, label: &str) -> Option<u64> {
        match input.trim().parse::<i64>() {
            Ok(minutes) => self.start_timer(minutes, label),
            Err(_) => {
                debug!(event = "core.timers.rejected_input", input = %input);
                None
            }
        }
    }

    /// Mark every timer past its deadline done, firing its alarm once.
    /// Returns the ids that completed on this beat.
    pub fn tick(&mut self) -> Vec<u64> {
        let now = self.clock.now();
        let mut completed = Vec::new();
        for timer in self.timers.iter_mut().filter(|t| !t.done) {
            if now >= timer.end_time {
                timer.done = true;
                completed.push(timer.id);
                info!(event = "core.timers.done", id = timer.id, label = %timer.label);
                self.alarm.alarm(timer);
            }
        }
        completed
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: u64) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn view(&self) -> WidgetView {
        render_timers(&self.timers, self.clock.now())
    }
}

fn format_remaining(left: Duration) -> String {
    let secs = left.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Timer list view; a pure function of the timers and the wall clock.
pub fn render_timers(timers: &[Timer], now: DateTime<Utc>) -> WidgetView {
    let lines = timers
        .iter()
        .map(|t| match t.state() {
            TimerState::Done => format!("{} DONE", t.label),
            TimerState::Running => format!("{} {}", t.label, format_remaining(t.remaining(now))),
        })
        .collect();
    let view = WidgetView::for_widget(TIMERS_WIDGET, TIMERS_TITLE, lines);
    let done = timers.iter().filter(|t| t.done).count();
    if done > 0 {
        view.with_badge(format!("{done} done"))
    } else {
        view
    }
}

/// Async wrapper: owns the subsystem, runs the shared tick once the first
/// timer exists, and keeps the timer widget on the board current.
pub struct TimerService {
    inner: Arc<Mutex<TimerSubsystem>>,
    board: Arc<WidgetBoard>,
    ticking: AtomicBool,
    cancel: CancellationToken,
}

impl TimerService {
    pub fn new(subsystem: TimerSubsystem, board: Arc<WidgetBoard>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(subsystem)),
            board,
            ticking: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start_timer(&self, minutes: i64, label: &str) -> Option<u64> {
        let id = self.lock().start_timer(minutes, label)?;
        self.after_create();
        Some(id)
    }

    /// Must be called from within a tokio runtime.
    pub fn start_timer_from_input(&self, input: &str, label: &str) -> Option<u64> {
        let id = self.lock().start_timer_from_input(input, label)?;
        self.after_create();
        Some(id)
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let removed = self.lock().dismiss(id);
        if removed {
            self.publish();
        }
        removed
    }

    pub fn timers(&self) -> Vec<Timer> {
        self.lock().timers().to_vec()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::Acquire)
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerSubsystem> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self) {
        let view = self.lock().view();
        self.board.apply(view);
    }

    fn after_create(&self) {
        self.publish();
        if self.ticking.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(event = "core.timers.tick_started");

        let inner = self.inner.clone();
        let board = self.board.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut beat = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
            beat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = beat.tick() => {
                        let view = {
                            let mut timers = inner.lock().unwrap_or_else(|e| e.into_inner());
                            timers.tick();
                            timers.view()
                        };
                        board.apply(view);
                    }
                }
            }
        });
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicUsize;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_718_000_000, 0).unwrap()
    }

    struct CountingAlarm(AtomicUsize);

    impl AlarmSink for CountingAlarm {
        fn alarm(&self, _timer: &Timer) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn subsystem() -> (TimerSubsystem, Arc<ManualClock>, Arc<CountingAlarm>) {
        let clock = Arc::new(ManualClock::new(start()));
        let alarm = Arc::new(CountingAlarm(AtomicUsize::new(0)));
        let timers = TimerSubsystem::new(clock.clone(), alarm.clone(), 180);
        (timers, clock, alarm)
    }

    #[test]
    fn test_five_minute_timer_deadline_and_single_alarm() {
        let (mut timers, clock, alarm) = subsystem();
        let id = timers.start_timer(5, "test").unwrap();
        let timer = timers.get(id).unwrap();
        assert_eq!(timer.end_time, start() + chrono::Duration::milliseconds(300_000));
        assert_eq!(timer.total_duration, Duration::from_millis(300_000));

        clock.advance(chrono::Duration::milliseconds(299_999));
        assert!(timers.tick().is_empty());
        assert_eq!(timers.get(id).unwrap().state(), TimerState::Running);

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(timers.tick(), vec![id]);
        assert_eq!(timers.get(id).unwrap().state(), TimerState::Done);

        for _ in 0..5 {
            clock.advance(chrono::Duration::seconds(1));
            assert!(timers.tick().is_empty());
        }
        assert_eq!(alarm.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let (mut timers, _, _) = subsystem();
        for minutes in [0, -5, 181] {
            assert!(timers.start_timer(minutes, "x").is_none(), "{minutes}");
        }
        assert!(timers.timers().is_empty());
        assert!(timers.start_timer(180, "max").is_some());
        assert!(timers.start_timer(1, "min").is_some());
    }

    #[test]
    fn test_non_numeric_input_is_rejected() {
        let (mut timers, _, _) = subsystem();
        assert!(timers.start_timer_from_input("ten", "x").is_none());
        assert!(timers.start_timer_from_input("", "x").is_none());
        assert!(timers.start_timer_from_input("2.5", "x").is_none());
        assert!(timers.timers().is_empty());
        assert!(timers.start_timer_from_input(" 15 ", "tea").is_some());
    }

    #[test]
    fn test_blank_label_defaults() {
        let (mut timers, _, _) = subsystem();
        let id = timers.start_timer(3, "   ").unwrap();
        assert_eq!(timers.get(id).unwrap().label, DEFAULT_LABEL);
    }

    #[test]
    fn test_timers_are_independent_and_dismissable() {
        let (mut timers, clock, alarm) = subsystem();
        let short = timers.start_timer(1, "eggs").unwrap();
        let long = timers.start_timer(10, "laundry").unwrap();

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(timers.tick(), vec![short]);
        assert_eq!(timers.get(long).unwrap().state(), TimerState::Running);

        assert!(timers.dismiss(short));
        assert!(!timers.dismiss(short));
        assert_eq!(timers.timers().len(), 1);
        assert_eq!(alarm.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_view_is_pure_function_of_timers_and_clock() {
        let (mut timers, clock, _) = subsystem();
        timers.start_timer(90, "roast").unwrap();
        clock.advance(chrono::Duration::milliseconds(500));
        let a = timers.view();
        let b = timers.view();
        assert_eq!(a, b);
        assert_eq!(a.widget, TIMERS_WIDGET);
        assert_eq!(a.lines, vec!["roast 1:30:00"]);

        clock.advance(chrono::Duration::minutes(89));
        assert_eq!(timers.view().lines, vec!["roast 01:00"]);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(timers.view().lines, vec!["roast 00:59"]);
    }

    #[test]
    fn test_empty_view_is_placeholder() {
        let (timers, _, _) = subsystem();
        assert!(timers.view().is_placeholder());
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_ticks_lazily_and_updates_board() {
        let clock = Arc::new(ManualClock::new(start()));
        let alarm = Arc::new(CountingAlarm(AtomicUsize::new(0)));
        let board = Arc::new(WidgetBoard::new());
        let service = TimerService::new(
            TimerSubsystem::new(clock.clone(), alarm.clone(), 180),
            board.clone(),
        );
        assert!(!service.is_ticking());
        assert!(service.start_timer(0, "nope").is_none());
        assert!(!service.is_ticking());

        let id = service.start_timer(1, "tea").unwrap();
        assert!(service.is_ticking());
        assert_eq!(board.view(TIMERS_WIDGET).unwrap().lines, vec!["tea 01:00"]);

        clock.advance(chrono::Duration::seconds(60));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(board.view(TIMERS_WIDGET).unwrap().lines, vec!["tea DONE"]);
        assert_eq!(alarm.0.load(Ordering::SeqCst), 1);

        assert!(service.dismiss(id));
        assert!(board.view(TIMERS_WIDGET).unwrap().is_placeholder());
        service.shutdown();
    }
}
