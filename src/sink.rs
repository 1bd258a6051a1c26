//! Where finished log lines go.
//!
//! The sink is an explicit dependency of [`Config`](crate::Config). The
//! default, [`TracingSink`], forwards every line to the `tracing` macros, so
//! whichever subscriber the application installed decides the output. Tests
//! and custom setups plug in a closure instead:
//!
//! ```rust
//! use tsu_timing::{Config, LogLevel, Logger};
//!
//! let config = Config {
//!     logger: Logger::from_fn(|level: LogLevel, line: &str| {
//!         eprintln!("[custom] {level}: {line}");
//!     }),
//!     ..Config::default()
//! };
//! # let _ = config;
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::level::LogLevel;

/// Receives one formatted line per logged request.
///
/// Sinks are shared by every in-flight request, hence `Send + Sync`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, line: &str) {
        self(level, line)
    }
}

/// Default sink: emits through `tracing` at the level matching the request.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info  => tracing::info!(target: "tsu_timing", "{line}"),
            LogLevel::Warn  => tracing::warn!(target: "tsu_timing", "{line}"),
            LogLevel::Error => tracing::error!(target: "tsu_timing", "{line}"),
        }
    }
}

/// Cheap-to-clone handle to a shared [`LogSink`].
#[derive(Clone)]
pub struct Logger(Arc<dyn LogSink>);

impl Logger {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self(Arc::new(sink))
    }

    /// Wraps a closure as a sink.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(LogLevel, &str) + Send + Sync + 'static,
    {
        Self::new(f)
    }

    /// Hands `line` to the sink.
    ///
    /// A panicking sink is contained here: the panic is reported through
    /// `tracing` and the caller carries on returning its response.
    pub(crate) fn emit(&self, level: LogLevel, line: &str) {
        if catch_unwind(AssertUnwindSafe(|| self.0.log(level, line))).is_err() {
            tracing::error!(target: "tsu_timing", "log sink panicked, line dropped");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger(..)")
    }
}
