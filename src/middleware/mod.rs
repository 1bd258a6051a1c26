//! Middleware bindings.
//!
//! Both bindings do the same four things around the downstream handler:
//! snapshot the config, capture [`RequestMeta`] before the request is moved,
//! read the final status and [`RequestErrors`] off the response after the
//! handler completes, and hand the lot to [`report`](crate::report).
//!
//! - [`handler`]: wraps a plain `async fn(Request) -> Response`.
//! - [`layer`]: a `tower::Layer` for hyper, axum and anything else that
//!   speaks `tower::Service`.
//!
//! The request is never rejected and the response is never modified.

pub mod handler;
pub mod layer;

use std::net::SocketAddr;

use http::header::USER_AGENT;
use http::{HeaderMap, Request, Response};

/// Socket peer of the connection, inserted into request extensions by the
/// server.
///
/// ```rust,ignore
/// req.extensions_mut().insert(ClientAddr(remote_addr));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientAddr(pub SocketAddr);

/// Error messages a handler recorded while serving a request.
///
/// Attach to the response extensions; they are appended to the log line.
///
/// ```rust
/// use tsu_timing::RequestErrors;
///
/// let mut res = http::Response::new(());
/// *res.status_mut() = http::StatusCode::BAD_GATEWAY;
/// res.extensions_mut().insert(RequestErrors::from("upstream refused connection"));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestErrors(Vec<String>);

impl RequestErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Appends to the list already on `res`, creating it if needed.
    pub fn record<B>(res: &mut Response<B>, message: impl Into<String>) {
        match res.extensions_mut().get_mut::<Self>() {
            Some(errors) => errors.push(message),
            None => {
                res.extensions_mut().insert(Self(vec![message.into()]));
            }
        }
    }
}

impl From<&str> for RequestErrors {
    fn from(message: &str) -> Self {
        Self(vec![message.to_owned()])
    }
}

impl From<Vec<String>> for RequestErrors {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

/// Request-side fields of the log line, captured before the handler runs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub client_addr: String,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_request<B>(req: &Request<B>, trust_proxy_headers: bool) -> Self {
        Self {
            method: req.method().as_str().to_owned(),
            path: req.uri().path().to_owned(),
            client_addr: client_addr(req, trust_proxy_headers),
            user_agent: header_str(req.headers(), USER_AGENT.as_str()).map(str::to_owned),
        }
    }
}

/// Errors recorded on a finished response, if any.
pub(crate) fn response_errors<B>(res: &Response<B>) -> Vec<String> {
    res.extensions()
        .get::<RequestErrors>()
        .map(|errors| errors.0.clone())
        .unwrap_or_default()
}

// Proxy headers first (when trusted), then the socket peer.
fn client_addr<B>(req: &Request<B>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = header_str(req.headers(), "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_owned();
        }
        if let Some(ip) = header_str(req.headers(), "x-real-ip").map(str::trim).filter(|v| !v.is_empty()) {
            return ip.to_owned();
        }
    }
    req.extensions()
        .get::<ClientAddr>()
        .map(|ClientAddr(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
