#![doc(test(attr(deny(warnings))))]

//! Classdesk Core is the headless client state behind the class management
//! pages: the multi-step registration wizard with local drafts, the teacher
//! review form, page components, and the CSRF-aware transport to the server.

pub mod clock;
pub mod components;
pub mod config;
pub mod errors;
pub mod review;
pub mod storage;
pub mod transport;
pub mod utils;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Classdesk Core tracing initialized.");
    });
}
