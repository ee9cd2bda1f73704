#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, path::PathBuf, rc::Rc, sync::Mutex};

use chrono::{DateTime, TimeZone, Utc};
use classdesk_core::{
    clock::ManualClock,
    config::ClientConfig,
    storage::JsonFileStore,
    transport::{HttpBackend, HttpRequest, HttpResponse, NetworkError, PageMeta, Transport},
    wizard::RegistrationWizard,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const CSRF_TOKEN: &str = "tok-123";
pub const CSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Creates a unique directory that outlives the calling test.
pub fn test_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap()
}

pub fn manual_clock() -> Rc<ManualClock> {
    Rc::new(ManualClock::new(t0()))
}

/// Wizard over a file-backed store at `path`, reading time from `clock`.
pub fn file_wizard(path: PathBuf, clock: &Rc<ManualClock>) -> RegistrationWizard<JsonFileStore> {
    RegistrationWizard::registration(
        JsonFileStore::new(path),
        Box::new(Rc::clone(clock)),
        &ClientConfig::default(),
    )
}

/// Fills every required personal-data field except `email`.
pub fn fill_personal_except_email<S: classdesk_core::storage::KeyValueStore>(
    wizard: &mut RegistrationWizard<S>,
) {
    for (name, value) in [
        ("fullName", "Aisyah Rahma"),
        ("gender", "FEMALE"),
        ("dateOfBirth", "2001-04-12"),
        ("placeOfBirth", "Bandung"),
        ("phoneNumber", "081234567890"),
        ("address", "Jl. Merdeka 1"),
        ("emergencyContactName", "Rahma"),
        ("emergencyContactPhone", "081298765432"),
        ("emergencyContactRelation", "Mother"),
    ] {
        assert!(wizard.set_value(name, value), "field {} missing", name);
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<HttpResponse, NetworkError>>,
    requests: Vec<HttpRequest>,
}

/// HTTP backend that replays queued replies and records every request.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Rc<RefCell<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.script
            .borrow_mut()
            .replies
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(&self, reason: &str) -> &Self {
        self.script
            .borrow_mut()
            .replies
            .push_back(Err(NetworkError(reason.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("at least one request")
    }

    /// Transport for a page that carries both CSRF meta entries.
    pub fn transport(&self) -> Transport {
        let meta = PageMeta::from_pairs([("_csrf", CSRF_TOKEN), ("_csrf_header", CSRF_HEADER)]);
        Transport::from_page(Box::new(self.clone()), &meta, &ClientConfig::default())
    }
}

impl HttpBackend for ScriptedBackend {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(NetworkError("no scripted reply".into())))
    }
}
