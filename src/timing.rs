//! The shared middleware handle.
//!
//! [`Timing`] owns the current [`Config`] behind an [`ArcSwap`]. Every request
//! loads one snapshot when it starts and keeps it until its line is logged,
//! so replacing the configuration while traffic is flowing is safe and never
//! changes a request halfway through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::Instant;
use tracing::debug;

use crate::config::Config;
use crate::level::LogLevel;
use crate::middleware::RequestMeta;
use crate::record::{Record, report};

/// Clone-able handle to a live configuration. Clones share it.
#[derive(Clone)]
pub struct Timing {
    config: Arc<ArcSwap<Config>>,
}

impl Timing {
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(ArcSwap::from_pointee(config)) }
    }

    /// The configuration new requests will see.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Atomically replaces the whole configuration.
    pub fn reconfigure(&self, config: Config) {
        self.config.store(Arc::new(config));
        debug!(target: "tsu_timing", "configuration replaced");
    }

    /// Read-copy-update: applies `f` to a copy of the current configuration
    /// and swaps the copy in. `f` may run more than once under contention.
    pub fn update(&self, mut f: impl FnMut(&mut Config)) {
        self.config.rcu(|current| {
            let mut next = Config::clone(current);
            f(&mut next);
            next
        });
        debug!(target: "tsu_timing", "configuration updated");
    }

    pub fn enable(&self) {
        self.update(Config::enable);
    }

    pub fn disable(&self) {
        self.update(Config::disable);
    }

    pub fn add_skip_path(&self, path: &str) {
        self.update(|config| config.add_skip_path(path));
    }

    /// Starts timing a request for `path`.
    ///
    /// Returns `None` when the middleware is disabled or the path is
    /// skip-listed: the caller should run its handler without measuring.
    pub fn start(&self, path: &str) -> Option<Stopwatch> {
        let config = self.config.load_full();
        if !config.enabled || config.is_skipped(path) {
            return None;
        }
        Some(Stopwatch { config, started: Instant::now() })
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timing").field("config", &self.config.load_full()).finish()
    }
}

/// One in-flight measurement, pinned to the configuration it started with.
#[derive(Debug)]
pub struct Stopwatch {
    config: Arc<Config>,
    started: Instant,
}

impl Stopwatch {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stops the clock and logs the request, if the level warrants it.
    ///
    /// `status` must be the final status the handler produced.
    pub fn finish(self, meta: RequestMeta, status: u16, errors: Vec<String>) -> Option<LogLevel> {
        let record = Record {
            status,
            duration: self.elapsed(),
            client_addr: meta.client_addr,
            method: meta.method,
            path: meta.path,
            user_agent: meta.user_agent,
            errors,
        };
        report(&self.config, &record)
    }
}
