//! Disposable timer handles polled against a clock.
//!
//! A handle never fires after `cancel()`; components cancel theirs in
//! `destroy()` so an unmounted subtree leaves nothing running.

use chrono::{DateTime, Duration, Utc};

/// Longest delay or period a handle accepts: one day.
pub const MAX_TIMER_MS: u64 = 24 * 60 * 60 * 1_000;

/// `Some(ms)` when `ms` is within `1..=MAX_TIMER_MS`.
pub fn bounded_ms(ms: u64) -> Option<u64> {
    (1..=MAX_TIMER_MS).contains(&ms).then_some(ms)
}

/// Converts milliseconds to a duration, saturating at [`MAX_TIMER_MS`].
pub fn millis(ms: u64) -> Duration {
    i64::try_from(ms.min(MAX_TIMER_MS))
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or_else(|| Duration::milliseconds(1))
}

fn at_least_one_ms(period: Duration) -> Duration {
    if period <= Duration::zero() {
        Duration::milliseconds(1)
    } else {
        period
    }
}

/// Repeating timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    period: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn start(now: DateTime<Utc>, period: Duration) -> Self {
        let period = at_least_one_ms(period);
        let next_due = now.checked_add_signed(period);
        if next_due.is_none() {
            tracing::warn!(?period, "interval out of range, not started");
        }
        Self { period, next_due }
    }

    /// A handle that is already disposed.
    pub fn idle() -> Self {
        Self {
            period: Duration::milliseconds(1),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Reports whether the interval elapsed since the last poll. Missed
    /// periods collapse into one firing.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let period_ms = self.period.num_milliseconds().max(1);
        let behind = (now - due).num_milliseconds() / period_ms;
        self.next_due = behind
            .checked_add(1)
            .and_then(|periods| periods.checked_mul(period_ms))
            .and_then(Duration::try_milliseconds)
            .and_then(|skip| due.checked_add_signed(skip));
        if self.next_due.is_none() {
            tracing::warn!(?due, "interval ran past the end of time, stopped");
        }
        true
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::idle()
    }
}

/// One-shot timer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeout {
    due: Option<DateTime<Utc>>,
}

impl Timeout {
    pub fn start(now: DateTime<Utc>, delay: Duration) -> Self {
        let due = now.checked_add_signed(delay);
        if due.is_none() {
            tracing::warn!(?delay, "timeout out of range, not started");
        }
        Self { due }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.due.is_some()
    }

    /// Fires once when due, then disposes itself.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn interval_fires_each_period_and_collapses_missed_ones() {
        let mut interval = Interval::start(t0(), Duration::seconds(1));
        assert!(!interval.poll(t0()));
        assert!(interval.poll(t0() + Duration::seconds(1)));
        assert!(!interval.poll(t0() + Duration::milliseconds(1500)));
        assert!(interval.poll(t0() + Duration::seconds(5)));
        assert!(!interval.poll(t0() + Duration::milliseconds(5500)));
        assert!(interval.poll(t0() + Duration::seconds(6)));
    }

    #[test]
    fn cancelled_handles_never_fire() {
        let mut interval = Interval::start(t0(), Duration::seconds(1));
        interval.cancel();
        assert!(!interval.poll(t0() + Duration::hours(1)));

        let mut timeout = Timeout::start(t0(), Duration::seconds(2));
        timeout.cancel();
        assert!(!timeout.poll(t0() + Duration::seconds(3)));
    }

    #[test]
    fn long_gap_fires_once_and_moves_past_now() {
        let mut interval = Interval::start(t0(), Duration::milliseconds(1));
        let late = t0() + Duration::milliseconds(1) + Duration::milliseconds((1_i64 << 32) - 1);
        assert!(interval.poll(late));
        assert!(!interval.poll(late));
        assert!(interval.poll(late + Duration::milliseconds(1)));
    }

    #[test]
    fn handles_near_the_end_of_time_stay_idle() {
        let end = DateTime::<Utc>::MAX_UTC - Duration::milliseconds(10);
        let mut interval = Interval::start(end, Duration::days(1));
        assert!(!interval.is_active());
        assert!(!interval.poll(DateTime::<Utc>::MAX_UTC));

        let timeout = Timeout::start(end, Duration::days(1));
        assert!(!timeout.is_active());
    }

    #[test]
    fn millis_saturates_and_bounds_reject_out_of_range() {
        assert_eq!(millis(1_500), Duration::milliseconds(1_500));
        assert_eq!(millis(u64::MAX), Duration::days(1));
        assert_eq!(millis(9_223_372_036_854_775_808), Duration::days(1));
        assert_eq!(bounded_ms(0), None);
        assert_eq!(bounded_ms(9_000_000_000_000_000), None);
        assert_eq!(bounded_ms(MAX_TIMER_MS), Some(MAX_TIMER_MS));
    }

    #[test]
    fn timeout_fires_once() {
        let mut timeout = Timeout::start(t0(), Duration::seconds(2));
        assert!(!timeout.poll(t0() + Duration::seconds(1)));
        assert!(timeout.poll(t0() + Duration::seconds(2)));
        assert!(!timeout.is_active());
        assert!(!timeout.poll(t0() + Duration::seconds(3)));
    }
}
