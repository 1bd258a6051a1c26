//! Handler-wrapping hook and type erasure.
//!
//! # How wrapping works
//!
//! A handler is any `async fn` from `http::Request<ReqBody>` to
//! `http::Response<ResBody>`. [`Timing::wrap`] takes one and returns another
//! with the exact same call signature, so a server (or another wrapper) can
//! treat both alike:
//!
//! ```text
//! async fn slow(req: Request<B>) -> Response<R> { … }   ← user writes this
//!        ↓ timing.wrap(slow)
//! slow.into_boxed_handler()                             ← Handler blanket impl
//!        ↓
//! Arc::new(TimedHandler { timing, next })               ← the wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                    ← one vtable dispatch
//!        ↓
//! start clock → next.call(req).await → stop clock → log → response
//! ```
//!
//! The wrapper awaits the inner handler to completion before it logs, so the
//! status code in the line is the one the handler actually returned.
//!
//! ```rust,no_run
//! use http::{Request, Response};
//! use tsu_timing::{Config, Timing};
//!
//! async fn hello(_req: Request<()>) -> Response<String> {
//!     Response::new("hello".to_owned())
//! }
//!
//! # async fn run() {
//! let handler = Timing::new(Config::default()).wrap(hello);
//! let res = handler.call(Request::new(())).await;
//! # let _ = res;
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{Request, Response};

use crate::middleware::{RequestMeta, response_errors};
use crate::timing::Timing;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a response.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Dispatch interface behind [`BoxedHandler`].
pub trait ErasedHandler<ReqBody, ResBody> {
    fn call(&self, req: Request<ReqBody>) -> BoxFuture<Response<ResBody>>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler<ReqBody, ResBody> =
    Arc<dyn ErasedHandler<ReqBody, ResBody> + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every function that can be wrapped.
///
/// Automatically satisfied for any `async fn` (or closure returning a
/// `Send` future) with the signature:
///
/// ```text
/// async fn name(req: http::Request<ReqBody>) -> http::Response<ResBody>
/// ```
///
/// Sealed: only the blanket impl below can satisfy it. To wrap an existing
/// [`BoxedHandler`] again, pass `move |req| inner.call(req)`.
pub trait Handler<ReqBody, ResBody>: private::Sealed<ReqBody, ResBody> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler<ReqBody, ResBody>;
}

mod private {
    pub trait Sealed<ReqBody, ResBody> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, ReqBody, ResBody> private::Sealed<ReqBody, ResBody> for F
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<ResBody>> + Send + 'static,
{
}

impl<F, Fut, ReqBody, ResBody> Handler<ReqBody, ResBody> for F
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<ResBody>> + Send + 'static,
    ReqBody: 'static,
    ResBody: 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler<ReqBody, ResBody> {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

/// Bridges a concrete function to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, ReqBody, ResBody> ErasedHandler<ReqBody, ResBody> for FnHandler<F>
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<ResBody>> + Send + 'static,
{
    fn call(&self, req: Request<ReqBody>) -> BoxFuture<Response<ResBody>> {
        Box::pin((self.0)(req))
    }
}

/// The timing decorator around the next handler in the chain.
struct TimedHandler<ReqBody, ResBody> {
    timing: Timing,
    next: BoxedHandler<ReqBody, ResBody>,
}

impl<ReqBody, ResBody> ErasedHandler<ReqBody, ResBody> for TimedHandler<ReqBody, ResBody>
where
    ReqBody: 'static,
    ResBody: 'static,
{
    fn call(&self, req: Request<ReqBody>) -> BoxFuture<Response<ResBody>> {
        let Some(watch) = self.timing.start(req.uri().path()) else {
            return self.next.call(req);
        };

        let meta = RequestMeta::from_request(&req, watch.config().trust_proxy_headers);
        let fut = self.next.call(req);

        Box::pin(async move {
            let res = fut.await;
            watch.finish(meta, res.status().as_u16(), response_errors(&res));
            res
        })
    }
}

impl Timing {
    /// Wraps `next` so every call through the result is timed and logged.
    ///
    /// The configuration is read per request, so later calls to
    /// [`reconfigure`](Timing::reconfigure) affect handlers wrapped earlier.
    pub fn wrap<ReqBody, ResBody>(&self, next: impl Handler<ReqBody, ResBody>) -> BoxedHandler<ReqBody, ResBody>
    where
        ReqBody: 'static,
        ResBody: 'static,
    {
        Arc::new(TimedHandler { timing: self.clone(), next: next.into_boxed_handler() })
    }
}
