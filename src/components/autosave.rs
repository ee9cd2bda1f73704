use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::{
    data_parse, impl_any, redirect_on_auth, timer::{self, Timeout}, Component, ComponentEvent, Dataset,
    TickContext,
};
use crate::transport::HttpRequest;

const SAVED_TO_IDLE_MS: i64 = 2_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Debounced JSON POST of the latest edit to `data-save-url`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoSave {
    pub status: SaveStatus,
    save_url: String,
    debounce: Duration,
    pending: Option<Value>,
    debounce_timer: Timeout,
    idle_timer: Timeout,
}

impl AutoSave {
    pub fn new(save_url: impl Into<String>, debounce_ms: u64) -> Self {
        Self {
            status: SaveStatus::Idle,
            save_url: save_url.into(),
            debounce: timer::millis(debounce_ms),
            pending: None,
            debounce_timer: Timeout::idle(),
            idle_timer: Timeout::idle(),
        }
    }

    pub fn from_dataset(dataset: &Dataset, default_debounce_ms: u64) -> Self {
        let debounce = data_parse::<u64>(dataset, "debounce-ms")
            .and_then(timer::bounded_ms)
            .unwrap_or(default_debounce_ms);
        Self::new(
            dataset.get("save-url").cloned().unwrap_or_default(),
            debounce,
        )
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Replaces any pending payload and restarts the debounce.
    pub fn trigger_save(&mut self, data: Value, now: DateTime<Utc>) {
        self.pending = Some(data);
        self.status = SaveStatus::Saving;
        self.idle_timer.cancel();
        self.debounce_timer = Timeout::start(now, self.debounce);
    }

    pub fn reset_status(&mut self) {
        self.status = SaveStatus::Idle;
    }

    fn perform_save(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        let Some(payload) = self.pending.take() else {
            return Vec::new();
        };
        let Some(transport) = ctx.transport else {
            tracing::error!(url = %self.save_url, "auto-save skipped: no transport");
            self.status = SaveStatus::Error;
            return Vec::new();
        };

        let outcome = HttpRequest::post_json(self.save_url.clone(), &payload)
            .map_err(|err| crate::transport::TransportError::Decode(err.to_string()))
            .and_then(|request| transport.send(request));
        match outcome {
            Ok(_) => {
                tracing::debug!(url = %self.save_url, "auto-saved");
                self.status = SaveStatus::Saved;
                self.idle_timer = Timeout::start(ctx.now, Duration::milliseconds(SAVED_TO_IDLE_MS));
                Vec::new()
            }
            Err(err) => {
                tracing::error!(url = %self.save_url, %err, "auto-save failed");
                self.status = SaveStatus::Error;
                redirect_on_auth(&err).into_iter().collect()
            }
        }
    }
}

impl Component for AutoSave {
    fn name(&self) -> &'static str {
        "autoSave"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        let mut events = Vec::new();
        if self.debounce_timer.poll(ctx.now) {
            events = self.perform_save(ctx);
        }
        if self.idle_timer.poll(ctx.now) && self.status == SaveStatus::Saved {
            self.status = SaveStatus::Idle;
        }
        events
    }

    fn destroy(&mut self) {
        self.debounce_timer.cancel();
        self.idle_timer.cancel();
    }

    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn dataset_overrides_debounce() {
        let dataset: Dataset = [
            ("save-url".to_string(), "/api/save".to_string()),
            ("debounce-ms".to_string(), "750".to_string()),
        ]
        .into();
        let autosave = AutoSave::from_dataset(&dataset, 3_000);
        assert_eq!(autosave.debounce(), Duration::milliseconds(750));
        let fallback = AutoSave::from_dataset(&Dataset::new(), 3_000);
        assert_eq!(fallback.debounce(), Duration::milliseconds(3_000));
    }

    #[test]
    fn out_of_range_debounce_falls_back() {
        let dataset: Dataset = [("debounce-ms".to_string(), "18446744073709551615".to_string())].into();
        assert_eq!(
            AutoSave::from_dataset(&dataset, 3_000).debounce(),
            Duration::milliseconds(3_000)
        );
        assert_eq!(AutoSave::new("/api/save", u64::MAX).debounce(), Duration::days(1));
    }

    #[test]
    fn offline_save_reports_error_after_debounce() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut autosave = AutoSave::new("/api/save", 1_000);
        autosave.trigger_save(json!({"content": "a"}), t0);
        autosave.trigger_save(json!({"content": "ab"}), t0 + Duration::milliseconds(800));
        assert_eq!(autosave.status, SaveStatus::Saving);

        autosave.tick(&TickContext::offline(t0 + Duration::milliseconds(1_200)));
        assert_eq!(autosave.status, SaveStatus::Saving);
        autosave.tick(&TickContext::offline(t0 + Duration::milliseconds(1_800)));
        assert_eq!(autosave.status, SaveStatus::Error);
    }
}
