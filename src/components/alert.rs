use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_any, timer::{self, Timeout}, Component, ComponentEvent, TickContext};

pub const DEFAULT_ALERT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Toast that hides itself after a fixed delay. Showing again restarts the
/// delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub visible: bool,
    pub message: String,
    pub kind: AlertKind,
    hide_after: Duration,
    hide_timer: Timeout,
}

impl Alert {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            visible: false,
            message: String::new(),
            kind: AlertKind::Info,
            hide_after: timer::millis(timeout_ms),
            hide_timer: Timeout::idle(),
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: AlertKind, now: DateTime<Utc>) {
        self.message = message.into();
        self.kind = kind;
        self.visible = true;
        self.hide_timer = Timeout::start(now, self.hide_after);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_timer.cancel();
    }

    /// Displays a routed [`ComponentEvent::ShowAlert`]; other events are ignored.
    pub fn receive(&mut self, event: &ComponentEvent, now: DateTime<Utc>) -> bool {
        match event {
            ComponentEvent::ShowAlert { message, kind } => {
                self.show(message.clone(), *kind, now);
                true
            }
            _ => false,
        }
    }
}

impl Default for Alert {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TIMEOUT_MS)
    }
}

impl Component for Alert {
    fn name(&self) -> &'static str {
        "alert"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        if self.hide_timer.poll(ctx.now) {
            self.visible = false;
        }
        Vec::new()
    }

    fn destroy(&mut self) {
        self.hide_timer.cancel();
    }

    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reshowing_restarts_the_hide_delay() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut alert = Alert::default();
        alert.show("Saved", AlertKind::Success, t0);
        alert.show("Saved again", AlertKind::Success, t0 + Duration::seconds(4));

        alert.tick(&TickContext::offline(t0 + Duration::seconds(6)));
        assert!(alert.visible);
        alert.tick(&TickContext::offline(t0 + Duration::seconds(9)));
        assert!(!alert.visible);
        assert_eq!(alert.message, "Saved again");
    }

    #[test]
    fn receives_only_alert_events() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut alert = Alert::default();
        assert!(!alert.receive(&ComponentEvent::RefreshSearch, t0));
        assert!(alert.receive(&ComponentEvent::alert("Oops", AlertKind::Error), t0));
        assert_eq!(alert.kind, AlertKind::Error);
    }
}
