mod common;

use chrono::Duration;
use classdesk_core::{
    components::{
        assign::ASSIGN_FAILURE_MESSAGE, AlertKind, AssignModal, AutoSave, Clipboard, Component,
        ComponentEvent, ComponentRegistry, Countdown, Dataset, PollStatus, Polling, SaveStatus,
        TickContext,
    },
    config::ClientConfig,
    transport::Method,
};
use common::{t0, ScriptedBackend, CSRF_HEADER, CSRF_TOKEN};
use serde_json::json;

fn dataset(pairs: &[(&str, &str)]) -> Dataset {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn registry() -> ComponentRegistry {
    ComponentRegistry::with_defaults(&ClientConfig::default())
}

#[test]
fn countdown_expires_exactly_once_through_the_registry() {
    let mut registry = registry();
    let id = registry
        .mount(
            "countdown",
            &dataset(&[("end-time", "2024-09-02T08:00:03Z")]),
            t0(),
        )
        .unwrap();
    assert_eq!(registry.name_of(id), Some("countdown"));
    assert_eq!(registry.get::<Countdown>(id).unwrap().formatted(), "00:00:03");

    let mut expirations = 0;
    for second in 1..=10 {
        let events = registry.tick_all(&TickContext::offline(t0() + Duration::seconds(second)));
        expirations += events
            .iter()
            .filter(|(source, event)| *source == id && *event == ComponentEvent::CountdownExpired)
            .count();
    }
    assert_eq!(expirations, 1);
    let countdown = registry.get::<Countdown>(id).unwrap();
    assert!(countdown.is_expired());
    assert_eq!(countdown.formatted(), "00:00:00");
}

#[test]
fn unknown_component_names_are_rejected() {
    let mut registry = registry();
    assert!(registry.mount("carousel", &Dataset::new(), t0()).is_err());
    assert!(registry.is_empty());
    assert!(registry.is_registered("sessionManagement"));
    assert!(registry.registered_names().any(|name| name == "availabilityMatrix"));
}

#[test]
fn unmount_destroys_timers() {
    let mut registry = registry();
    let polling = registry
        .mount(
            "polling",
            &dataset(&[("poll-url", "/api/status"), ("poll-interval", "1000")]),
            t0(),
        )
        .unwrap();
    let other = registry.mount("dropdown", &Dataset::new(), t0()).unwrap();
    assert_eq!(registry.len(), 2);

    assert!(registry.get::<Polling>(polling).unwrap().is_running());
    assert!(registry.unmount(polling));
    assert!(!registry.unmount(polling));
    assert_eq!(registry.ids(), vec![other]);
    assert!(registry.get::<Polling>(polling).is_none());
    assert!(registry
        .tick_all(&TickContext::offline(t0() + Duration::seconds(5)))
        .is_empty());
}

#[test]
fn oversized_poll_intervals_fall_back_to_the_default() {
    let mut registry = registry();
    for raw in ["9223372036854775808", "9000000000000000", "0"] {
        let id = registry
            .mount(
                "polling",
                &dataset(&[("poll-url", "/api/status"), ("poll-interval", raw)]),
                t0(),
            )
            .unwrap();
        let polling = registry.get::<Polling>(id).unwrap();
        assert_eq!(
            polling.period(),
            Duration::milliseconds(ClientConfig::default().polling_interval_ms as i64)
        );
        assert!(polling.is_running());
    }
}

#[test]
fn clipboard_takes_its_text_from_the_dataset() {
    let mut registry = registry();
    let id = registry
        .mount("clipboard", &dataset(&[("copy-text", "REG-2024-0042")]), t0())
        .unwrap();
    let clipboard = registry.get::<Clipboard>(id).unwrap();
    assert_eq!(clipboard.copy_text, "REG-2024-0042");
    assert!(!clipboard.copied);
}

#[test]
fn downcast_to_the_wrong_type_is_none() {
    let mut registry = registry();
    let id = registry.mount("autoSave", &Dataset::new(), t0()).unwrap();
    assert!(registry.get::<Polling>(id).is_none());
    assert!(registry.get_mut::<AutoSave>(id).is_some());
}

#[test]
fn polling_fetches_through_the_transport() {
    let backend = ScriptedBackend::new();
    backend
        .reply(200, r#"{"active": 3}"#)
        .reply(500, "boom")
        .reply(200, r#"{"active": 4}"#);
    let transport = backend.transport();

    let mut polling = Polling::new("/api/sessions/active", 1_000);
    polling.start(t0());
    assert!(polling.tick(&TickContext::online(t0(), &transport)).is_empty());
    assert_eq!(polling.data, Some(json!({"active": 3})));
    assert_eq!(polling.status(), PollStatus::Success);

    polling.tick(&TickContext::online(t0() + Duration::seconds(1), &transport));
    assert_eq!(polling.status(), PollStatus::Error);
    assert!(polling.error.is_some());
    assert_eq!(polling.data, Some(json!({"active": 3})));

    polling.tick(&TickContext::online(t0() + Duration::seconds(2), &transport));
    assert_eq!(polling.data, Some(json!({"active": 4})));
    assert_eq!(polling.error, None);

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| request.method == Method::Get));
    assert!(requests[0].header(CSRF_HEADER).is_none());
}

#[test]
fn polling_redirects_on_expired_session() {
    let backend = ScriptedBackend::new();
    backend.reply(401, "");
    let transport = backend.transport();

    let mut polling = Polling::new("/api/sessions/active", 1_000);
    polling.start(t0());
    let events = polling.tick(&TickContext::online(t0(), &transport));
    assert_eq!(
        events,
        vec![ComponentEvent::Redirect("/login?expired=true".into())]
    );
}

#[test]
fn late_poll_response_still_overwrites_newer_data() {
    let mut polling = Polling::new("/api/status", 1_000);
    let older = polling.begin_fetch();
    let newer = polling.begin_fetch();
    assert_eq!(polling.status(), PollStatus::Loading);

    polling.complete(newer, Ok(json!({"v": 2})));
    assert_eq!(polling.status(), PollStatus::Loading);
    polling.complete(older, Ok(json!({"v": 1})));
    assert_eq!(polling.outstanding(), 0);
    assert_eq!(polling.data, Some(json!({"v": 1})));
}

#[test]
fn autosave_posts_once_after_debounce_then_returns_to_idle() {
    let backend = ScriptedBackend::new();
    backend.reply(200, "{}");
    let transport = backend.transport();
    let at = |ms: i64| t0() + Duration::milliseconds(ms);

    let mut autosave = AutoSave::new("/api/review/draft", 1_000);
    autosave.trigger_save(json!({"remarks": "first"}), at(0));
    autosave.trigger_save(json!({"remarks": "second"}), at(600));
    assert_eq!(autosave.status, SaveStatus::Saving);

    autosave.tick(&TickContext::online(at(1_200), &transport));
    assert!(backend.requests().is_empty());

    autosave.tick(&TickContext::online(at(1_600), &transport));
    assert_eq!(autosave.status, SaveStatus::Saved);
    let request = backend.last_request();
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.header(CSRF_HEADER), Some(CSRF_TOKEN));

    autosave.tick(&TickContext::online(at(3_000), &transport));
    assert_eq!(autosave.status, SaveStatus::Saved);
    autosave.tick(&TickContext::online(at(3_700), &transport));
    assert_eq!(autosave.status, SaveStatus::Idle);
}

#[test]
fn autosave_failure_sets_error() {
    let backend = ScriptedBackend::new();
    backend.fail("connection reset");
    let transport = backend.transport();

    let mut autosave = AutoSave::new("/api/review/draft", 500);
    autosave.trigger_save(json!({}), t0());
    autosave.tick(&TickContext::online(t0() + Duration::seconds(1), &transport));
    assert_eq!(autosave.status, SaveStatus::Error);
}

#[test]
fn assign_modal_refreshes_search_on_success() {
    let backend = ScriptedBackend::new();
    backend.reply(200, r#"{"status": "success", "message": "Teacher assigned"}"#);
    let transport = backend.transport();

    let mut modal = AssignModal::default();
    assert!(!modal.open_from_button(&Dataset::new()));
    assert!(modal.open_from_button(&dataset(&[("registration-id", "reg-42")])));
    assert!(modal.locks_scroll());

    assert!(modal.validate_and_submit(&transport).is_empty());
    assert!(modal.show_error);
    assert!(backend.requests().is_empty());

    modal.teacher_id = "teacher-7".into();
    modal.notes = "Evening class".into();
    let events = modal.validate_and_submit(&transport);
    assert_eq!(events, vec![ComponentEvent::RefreshSearch]);
    assert!(!modal.open);

    let request = backend.last_request();
    assert_eq!(request.path, "/registrations/reg-42/assign");
    assert_eq!(request.form_value("teacherId"), Some("teacher-7"));
    assert_eq!(request.header(CSRF_HEADER), Some(CSRF_TOKEN));
}

#[test]
fn assign_modal_reports_failures() {
    let backend = ScriptedBackend::new();
    backend
        .reply(200, r#"{"status": "error", "message": "Teacher is fully booked"}"#)
        .reply(500, "")
        .reply(403, "");
    let transport = backend.transport();

    let mut modal = AssignModal::default();
    modal.open_modal("reg-1");
    modal.teacher_id = "teacher-1".into();

    assert_eq!(
        modal.validate_and_submit(&transport),
        vec![ComponentEvent::alert("Teacher is fully booked", AlertKind::Error)]
    );
    assert!(modal.open);

    assert_eq!(
        modal.validate_and_submit(&transport),
        vec![ComponentEvent::alert(ASSIGN_FAILURE_MESSAGE, AlertKind::Error)]
    );

    assert_eq!(
        modal.validate_and_submit(&transport),
        vec![
            ComponentEvent::alert(ASSIGN_FAILURE_MESSAGE, AlertKind::Error),
            ComponentEvent::Redirect("/login?expired=true".into()),
        ]
    );
    assert!(!modal.submitting);
}
