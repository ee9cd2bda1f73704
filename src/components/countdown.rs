//! Elapsed and remaining time displays, refreshed once a second.

use chrono::{DateTime, Duration, Utc};

use super::{data_instant, impl_any, timer::Interval, Component, ComponentEvent, Dataset, TickContext};

const TICK_MS: i64 = 1_000;

/// `HH:MM:SS`, hours unbounded. Negative input renders as zero.
pub fn format_hms(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Time since a start instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTimer {
    pub elapsed: i64,
    start_time: Option<DateTime<Utc>>,
    interval: Interval,
}

impl SessionTimer {
    /// Starts immediately when `data-start-time` is present.
    pub fn from_dataset(dataset: &Dataset, now: DateTime<Utc>) -> Self {
        let mut timer = Self::default();
        if let Some(start) = data_instant(dataset, "start-time") {
            timer.start_time = Some(start);
            timer.start(now);
        }
        timer
    }

    /// Starts counting; without a start instant, counts from `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        let start = *self.start_time.get_or_insert(now);
        self.elapsed = (now - start).num_seconds().max(0);
        self.interval = Interval::start(now, Duration::milliseconds(TICK_MS));
    }

    pub fn start_at(&mut self, start: DateTime<Utc>, now: DateTime<Utc>) {
        self.start_time = Some(start);
        self.start(now);
    }

    pub fn stop(&mut self) {
        self.interval.cancel();
    }

    pub fn reset(&mut self) {
        self.stop();
        self.elapsed = 0;
        self.start_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_active()
    }

    pub fn formatted(&self) -> String {
        format_hms(self.elapsed)
    }
}

impl Component for SessionTimer {
    fn name(&self) -> &'static str {
        "sessionTimer"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        if self.interval.poll(ctx.now) {
            if let Some(start) = self.start_time {
                self.elapsed = (ctx.now - start).num_seconds().max(0);
            }
        }
        Vec::new()
    }

    fn destroy(&mut self) {
        self.stop();
    }

    impl_any!();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountdownState {
    /// No end time configured.
    #[default]
    Idle,
    Running,
    Expired,
}

/// Counts down to an end instant. Expiry stops the tick and emits
/// [`ComponentEvent::CountdownExpired`] exactly once; only [`Countdown::start_until`]
/// runs it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    pub remaining: i64,
    state: CountdownState,
    end_time: Option<DateTime<Utc>>,
    interval: Interval,
    pending: Vec<ComponentEvent>,
}

impl Countdown {
    /// Starts immediately when `data-end-time` is present.
    pub fn from_dataset(dataset: &Dataset, now: DateTime<Utc>) -> Self {
        let mut countdown = Self::default();
        if let Some(end) = data_instant(dataset, "end-time") {
            countdown.start_until(end, now);
        }
        countdown
    }

    pub fn start_until(&mut self, end: DateTime<Utc>, now: DateTime<Utc>) {
        self.end_time = Some(end);
        self.state = CountdownState::Running;
        self.interval = Interval::start(now, Duration::milliseconds(TICK_MS));
        // Expiry found at start is reported on the next tick.
        if let Some(event) = self.update_remaining(now) {
            self.pending.push(event);
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }

    pub fn stop(&mut self) {
        self.interval.cancel();
    }

    pub fn formatted(&self) -> String {
        format_hms(self.remaining)
    }

    fn update_remaining(&mut self, now: DateTime<Utc>) -> Option<ComponentEvent> {
        if self.state != CountdownState::Running {
            return None;
        }
        let end = self.end_time?;
        let left = end - now;
        if left <= Duration::zero() {
            self.remaining = 0;
            self.state = CountdownState::Expired;
            self.stop();
            tracing::debug!(%end, "countdown expired");
            Some(ComponentEvent::CountdownExpired)
        } else {
            self.remaining = left.num_seconds();
            None
        }
    }
}

impl Component for Countdown {
    fn name(&self) -> &'static str {
        "countdown"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.interval.poll(ctx.now) {
            events.extend(self.update_remaining(ctx.now));
        }
        events
    }

    fn destroy(&mut self) {
        self.stop();
    }

    impl_any!();
}
