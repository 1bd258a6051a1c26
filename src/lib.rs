//! # tsu-timing
//!
//! Request-duration logging for HTTP handler chains. Slow endpoints show up
//! in the logs. Fast ones stay quiet. No tracing stack required.
//!
//! ## What it does
//!
//! Around every request the middleware:
//!
//! 1. Skips everything if it is disabled or the path is skip-listed.
//! 2. Starts a clock and runs the downstream handler to completion.
//! 3. Classifies the duration: `ERROR` past `error_threshold`, `WARN` past
//!    `warning_threshold`, `INFO` otherwise.
//! 4. Drops `INFO` unless `log_all_requests` is set.
//! 5. Emits one line through the configured [`Logger`]:
//!
//! ```text
//! [WARN] 2025/01/31 - 14:03:59 | 200 |    600.3125ms |        10.0.0.7 | GET     /slow | curl/8.5.0
//! ```
//!
//! The response is returned exactly as the handler produced it.
//!
//! ## Two bindings, one core
//!
//! - [`Timing::wrap`]: wraps a plain `async fn(Request) -> Response`.
//! - [`TimingLayer`]: a `tower::Layer` for hyper, axum and friends.
//!
//! Both reduce the request to a [`Record`] and call [`report`], which is
//! also public for anyone binding a framework of their own.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use http::{Request, Response};
//! use tsu_timing::{Config, Timing};
//!
//! async fn slow(_req: Request<()>) -> Response<&'static str> {
//!     tokio::time::sleep(Duration::from_millis(600)).await;
//!     Response::new("done")
//! }
//!
//! # async fn run() {
//! let mut config = Config::default();
//! config.add_skip_path("/healthz");
//!
//! let timing = Timing::new(config);
//! let handler = timing.wrap(slow);
//!
//! // logs `[WARN] … | 200 | … | GET     /`
//! handler.call(Request::new(())).await;
//!
//! // live reconfiguration swaps the whole config atomically
//! timing.update(|c| c.log_all_requests = true);
//! # }
//! ```

mod config;
mod error;
mod level;
mod record;
mod sink;
mod timing;

pub mod middleware;

pub use config::Config;
pub use error::Error;
pub use level::LogLevel;
pub use middleware::handler::{BoxedHandler, Handler};
pub use middleware::layer::{TimingFuture, TimingLayer, TimingService};
pub use middleware::{ClientAddr, RequestErrors, RequestMeta};
pub use record::{Record, report};
pub use sink::{LogSink, Logger, TracingSink};
pub use timing::{Stopwatch, Timing};
