//! Periodic GET of a JSON endpoint.
//!
//! Every due tick issues a new [`PollTicket`]; overlapping fetches are not
//! deduplicated. Responses apply in arrival order, so the last one to arrive
//! wins even when an older request completes after a newer one.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{
    data_parse, impl_any, redirect_on_auth, timer::{self, Interval}, Component, ComponentEvent, Dataset,
    TickContext,
};
use crate::transport::{HttpRequest, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollTicket(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polling {
    pub data: Option<Value>,
    pub error: Option<String>,
    url: String,
    period: Duration,
    interval: Interval,
    fetch_on_next_tick: bool,
    outstanding: BTreeSet<PollTicket>,
    next_ticket: u64,
    last_outcome: PollStatus,
}

impl Polling {
    pub fn new(url: impl Into<String>, period_ms: u64) -> Self {
        Self {
            data: None,
            error: None,
            url: url.into(),
            period: timer::millis(period_ms),
            interval: Interval::idle(),
            fetch_on_next_tick: false,
            outstanding: BTreeSet::new(),
            next_ticket: 0,
            last_outcome: PollStatus::Idle,
        }
    }

    /// `data-poll-url` and `data-poll-interval`; starts when a URL is set.
    /// An interval outside `1..=MAX_TIMER_MS` falls back to the default.
    pub fn from_dataset(dataset: &Dataset, default_period_ms: u64, now: DateTime<Utc>) -> Self {
        let period = data_parse::<u64>(dataset, "poll-interval")
            .and_then(timer::bounded_ms)
            .unwrap_or(default_period_ms);
        let url = dataset.get("poll-url").cloned().unwrap_or_default();
        let mut polling = Self::new(url, period);
        if !polling.url.is_empty() {
            polling.start(now);
        }
        polling
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fetches on the next tick, then once per period.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.fetch_on_next_tick = true;
        self.interval = Interval::start(now, self.period);
    }

    pub fn stop(&mut self) {
        self.interval.cancel();
        self.fetch_on_next_tick = false;
    }

    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.stop();
        self.start(now);
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_active()
    }

    pub fn status(&self) -> PollStatus {
        if self.outstanding.is_empty() {
            self.last_outcome
        } else {
            PollStatus::Loading
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn begin_fetch(&mut self) -> PollTicket {
        let ticket = PollTicket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding.insert(ticket);
        ticket
    }

    /// Applies a response. A ticket that was already settled still applies.
    pub fn complete(
        &mut self,
        ticket: PollTicket,
        result: Result<Value, TransportError>,
    ) -> Option<ComponentEvent> {
        self.outstanding.remove(&ticket);
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.last_outcome = PollStatus::Success;
                None
            }
            Err(err) => {
                tracing::error!(url = %self.url, %err, "polling failed");
                self.error = Some(err.to_string());
                self.last_outcome = PollStatus::Error;
                redirect_on_auth(&err)
            }
        }
    }
}

impl Component for Polling {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        let initial = std::mem::take(&mut self.fetch_on_next_tick);
        let due = self.interval.poll(ctx.now) || initial;
        if !due || self.url.is_empty() {
            return Vec::new();
        }

        let ticket = self.begin_fetch();
        match ctx.transport {
            Some(transport) => {
                let result = transport.send_json::<Value>(HttpRequest::get(self.url.clone()));
                self.complete(ticket, result).into_iter().collect()
            }
            None => vec![ComponentEvent::PollRequested {
                url: self.url.clone(),
                ticket,
            }],
        }
    }

    fn destroy(&mut self) {
        self.stop();
    }

    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    fn dataset() -> Dataset {
        [
            ("poll-url".to_string(), "/api/status".to_string()),
            ("poll-interval".to_string(), "1000".to_string()),
        ]
        .into()
    }

    #[test]
    fn first_tick_fetches_then_every_period() {
        let mut polling = Polling::from_dataset(&dataset(), 30_000, t0());
        let first = polling.tick(&TickContext::offline(t0()));
        assert!(matches!(first.as_slice(), [ComponentEvent::PollRequested { .. }]));
        assert!(polling
            .tick(&TickContext::offline(t0() + Duration::milliseconds(500)))
            .is_empty());
        assert_eq!(
            polling
                .tick(&TickContext::offline(t0() + Duration::seconds(1)))
                .len(),
            1
        );
        assert_eq!(polling.outstanding(), 2);
        assert_eq!(polling.status(), PollStatus::Loading);
    }

    #[test]
    fn last_arrival_wins() {
        let mut polling = Polling::new("/api/status", 1_000);
        let older = polling.begin_fetch();
        let newer = polling.begin_fetch();

        polling.complete(newer, Ok(json!({"status": "new"})));
        assert_eq!(polling.status(), PollStatus::Loading);
        polling.complete(older, Ok(json!({"status": "old"})));

        assert_eq!(polling.status(), PollStatus::Success);
        assert_eq!(polling.data, Some(json!({"status": "old"})));
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut polling = Polling::new("/api/status", 1_000);
        let ticket = polling.begin_fetch();
        polling.complete(ticket, Ok(json!(1)));
        let ticket = polling.begin_fetch();
        let event = polling.complete(ticket, Err(TransportError::Server { status: 502 }));
        assert_eq!(event, None);
        assert_eq!(polling.status(), PollStatus::Error);
        assert_eq!(polling.data, Some(json!(1)));
        assert!(polling.error.is_some());
    }

    #[test]
    fn missing_url_never_starts() {
        let mut polling = Polling::from_dataset(&Dataset::new(), 30_000, t0());
        assert!(!polling.is_running());
        assert!(polling
            .tick(&TickContext::offline(t0() + Duration::minutes(5)))
            .is_empty());
    }

    #[test]
    fn destroy_stops_polling() {
        let mut polling = Polling::from_dataset(&dataset(), 30_000, t0());
        polling.destroy();
        assert!(polling
            .tick(&TickContext::offline(t0() + Duration::seconds(3)))
            .is_empty());
    }
}
