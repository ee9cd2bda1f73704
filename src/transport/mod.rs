//! Outgoing calls: CSRF wiring, response classification and typed endpoints.

pub mod api;
pub mod csrf;
pub mod http;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientConfig;

pub use api::SessionApi;
pub use csrf::{CsrfToken, PageMeta};
pub use http::{HttpBackend, HttpRequest, HttpResponse, Method, NetworkError, ReqwestBackend};

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failure outcomes of a server call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response at all.
    #[error("network failure: {0}")]
    Network(String),
    /// 401/403; the page must hard-redirect to `redirect_to`.
    #[error("authentication required (HTTP {status})")]
    Unauthorized { status: u16, redirect_to: String },
    /// 5xx; logged, never redirected.
    #[error("server error (HTTP {status})")]
    Server { status: u16 },
    /// Any other non-2xx with the server's message.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Text a component may show. Server-supplied messages pass verbatim.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Rejected { message, .. } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            TransportError::Unauthorized { redirect_to, .. } => Some(redirect_to),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized { status, .. }
            | TransportError::Server { status }
            | TransportError::Rejected { status, .. } => Some(*status),
            TransportError::Network(_) | TransportError::Decode(_) => None,
        }
    }
}

/// Performs requests through an [`HttpBackend`], attaching the page's CSRF
/// token to mutating calls.
pub struct Transport {
    backend: Box<dyn HttpBackend>,
    csrf: Option<CsrfToken>,
    login_route: String,
}

impl Transport {
    pub fn new(
        backend: Box<dyn HttpBackend>,
        csrf: Option<CsrfToken>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            csrf,
            login_route: login_route.into(),
        }
    }

    pub fn from_page(backend: Box<dyn HttpBackend>, meta: &PageMeta, config: &ClientConfig) -> Self {
        let csrf = CsrfToken::from_meta(meta, config);
        if csrf.is_none() {
            tracing::warn!("no CSRF token on page; mutating requests will be rejected");
        }
        Self::new(backend, csrf, config.login_redirect.clone())
    }

    pub fn csrf(&self) -> Option<&CsrfToken> {
        self.csrf.as_ref()
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.method.is_mutating() {
            if let Some(csrf) = &self.csrf {
                request.headers.push((csrf.header.clone(), csrf.token.clone()));
            }
        }

        let response = match self.backend.execute(&request) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(method = request.method.as_str(), path = %request.path, %err, "request failed");
                return Err(TransportError::Network(err.0));
            }
        };

        match response.status {
            200..=299 => Ok(response),
            401 | 403 => {
                tracing::warn!(status = response.status, path = %request.path, "session expired, redirecting to login");
                Err(TransportError::Unauthorized {
                    status: response.status,
                    redirect_to: self.login_route.clone(),
                })
            }
            status if status >= 500 => {
                tracing::error!(status, path = %request.path, body = %response.body, "server error");
                Err(TransportError::Server { status })
            }
            status => Err(TransportError::Rejected {
                status,
                message: extract_message(&response.body)
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            }),
        }
    }

    pub fn send_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, TransportError> {
        let response = self.send(request)?;
        response
            .json()
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}

/// Prefers a JSON `message` field, then the raw body text.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return value
            .get("message")
            .and_then(|message| message.as_str())
            .filter(|message| !message.trim().is_empty())
            .map(str::to_string);
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        reply: Result<HttpResponse, NetworkError>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl HttpBackend for std::rc::Rc<Recorder> {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    fn scripted(reply: Result<HttpResponse, NetworkError>) -> (Transport, std::rc::Rc<Recorder>) {
        let recorder = std::rc::Rc::new(Recorder {
            reply,
            seen: RefCell::new(Vec::new()),
        });
        let csrf = CsrfToken {
            header: "X-CSRF-TOKEN".into(),
            token: "tok".into(),
        };
        let transport = Transport::new(
            Box::new(std::rc::Rc::clone(&recorder)),
            Some(csrf),
            "/login?expired=true",
        );
        (transport, recorder)
    }

    #[test]
    fn csrf_header_only_on_mutating_calls() {
        let (transport, recorder) = scripted(Ok(HttpResponse::new(200, "{}")));
        transport.send(HttpRequest::get("/a")).unwrap();
        transport
            .send(HttpRequest::post_form("/b", [("x", "1")]))
            .unwrap();
        let seen = recorder.seen.borrow();
        assert_eq!(seen[0].header("X-CSRF-TOKEN"), None);
        assert_eq!(seen[1].header("X-CSRF-TOKEN"), Some("tok"));
    }

    #[test]
    fn missing_token_omits_header() {
        let recorder = std::rc::Rc::new(Recorder {
            reply: Ok(HttpResponse::new(204, "")),
            seen: RefCell::new(Vec::new()),
        });
        let transport = Transport::from_page(
            Box::new(std::rc::Rc::clone(&recorder)),
            &PageMeta::new(),
            &ClientConfig::default(),
        );
        transport.send(HttpRequest::post_form("/b", [("x", "1")])).unwrap();
        assert_eq!(recorder.seen.borrow()[0].header("X-CSRF-TOKEN"), None);
    }

    #[test]
    fn auth_failures_redirect_to_login() {
        for status in [401, 403] {
            let (transport, _) = scripted(Ok(HttpResponse::new(status, "")));
            let err = transport.send(HttpRequest::get("/a")).unwrap_err();
            assert_eq!(err.redirect(), Some("/login?expired=true"));
        }
    }

    #[test]
    fn server_errors_do_not_redirect() {
        let (transport, _) = scripted(Ok(HttpResponse::new(503, "down")));
        let err = transport.send(HttpRequest::get("/a")).unwrap_err();
        assert_eq!(err, TransportError::Server { status: 503 });
        assert_eq!(err.redirect(), None);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn rejection_surfaces_server_message() {
        let (transport, _) = scripted(Ok(HttpResponse::new(
            400,
            r#"{"success":false,"message":"Session already ended"}"#,
        )));
        let err = transport.send(HttpRequest::get("/a")).unwrap_err();
        assert_eq!(err.user_message(), "Session already ended");

        let (plain, _) = scripted(Ok(HttpResponse::new(422, "Invalid teacher")));
        assert_eq!(
            plain.send(HttpRequest::get("/a")).unwrap_err().user_message(),
            "Invalid teacher"
        );

        let (empty, _) = scripted(Ok(HttpResponse::new(400, "")));
        assert_eq!(
            empty.send(HttpRequest::get("/a")).unwrap_err().user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn network_failure_uses_generic_message() {
        let (transport, _) = scripted(Err(NetworkError("connection refused".into())));
        let err = transport.send(HttpRequest::get("/a")).unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}
