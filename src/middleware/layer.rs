//! `tower` binding.
//!
//! ```rust,ignore
//! use tsu_timing::{Config, TimingLayer};
//!
//! let app = axum::Router::new()
//!     .route("/ping", get(ping))
//!     .layer(TimingLayer::new(Config::default()));
//! ```
//!
//! The inner service's errors are passed through untouched and are not
//! logged: there is no status code to report for them.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{Request, Response};
use pin_project::pin_project;
use tower::{Layer, Service};

use crate::config::Config;
use crate::middleware::{RequestMeta, response_errors};
use crate::timing::{Stopwatch, Timing};

/// Applies [`TimingService`] to the wrapped service.
#[derive(Clone, Debug, Default)]
pub struct TimingLayer {
    timing: Timing,
}

impl TimingLayer {
    pub fn new(config: Config) -> Self {
        Self { timing: Timing::new(config) }
    }

    /// The handle behind this layer, for live reconfiguration.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }
}

impl From<Timing> for TimingLayer {
    fn from(timing: Timing) -> Self {
        Self { timing }
    }
}

impl Timing {
    /// A `tower` layer sharing this handle's configuration.
    pub fn layer(&self) -> TimingLayer {
        TimingLayer::from(self.clone())
    }
}

impl<S> Layer<S> for TimingLayer {
    type Service = TimingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimingService { inner, timing: self.timing.clone() }
    }
}

/// Times every request through the inner service.
#[derive(Clone, Debug)]
pub struct TimingService<S> {
    inner: S,
    timing: Timing,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TimingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TimingFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let pending = self.timing.start(req.uri().path()).map(|watch| {
            let meta = RequestMeta::from_request(&req, watch.config().trust_proxy_headers);
            (watch, meta)
        });

        TimingFuture { future: self.inner.call(req), pending }
    }
}

/// Response future for [`TimingService`].
#[pin_project]
pub struct TimingFuture<F> {
    #[pin]
    future: F,
    // `None` for skipped requests, and after the line has been logged.
    pending: Option<(Stopwatch, RequestMeta)>,
}

impl<F, ResBody, E> Future for TimingFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ResBody>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = match this.future.poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };

        if let (Ok(res), Some((watch, meta))) = (&result, this.pending.take()) {
            watch.finish(meta, res.status().as_u16(), response_errors(res));
        }
        Poll::Ready(result)
    }
}
