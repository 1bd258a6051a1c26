//! Middleware configuration.
//!
//! [`Config`] is a plain value object. Build it once at startup, either from
//! [`Config::default`] with struct-update syntax or from the environment,
//! then hand it to [`Timing::new`](crate::Timing::new):
//!
//! ```rust
//! use std::time::Duration;
//! use tsu_timing::Config;
//!
//! let mut config = Config {
//!     warning_threshold: Duration::from_millis(200),
//!     error_threshold:   Duration::from_secs(1),
//!     log_all_requests:  true,
//!     ..Config::default()
//! };
//! config.add_skip_path("/healthz");
//! ```
//!
//! # Environment
//!
//! [`Config::from_env`] starts from the defaults and overrides whatever is
//! set:
//!
//! | Variable | Field | Format |
//! |---|---|---|
//! | `TSU_TIMING_ENABLED` | `enabled` | bool |
//! | `TSU_TIMING_WARN_MS` | `warning_threshold` | integer ms, `<= 0` disables |
//! | `TSU_TIMING_ERROR_MS` | `error_threshold` | integer ms, `<= 0` disables |
//! | `TSU_TIMING_LOG_ALL` | `log_all_requests` | bool |
//! | `TSU_TIMING_SKIP_PATHS` | `skip_paths` | comma separated |
//! | `TSU_TIMING_COLOR` | `color` | bool |
//! | `TSU_TIMING_TRUST_PROXY` | `trust_proxy_headers` | bool |
//!
//! A non-empty `NO_COLOR` turns color off unless `TSU_TIMING_COLOR` says
//! otherwise. Booleans accept `1/0`, `true/false`, `yes/no`, `on/off`.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::Error;
use crate::level::LogLevel;
use crate::sink::Logger;

const DEFAULT_WARNING: Duration = Duration::from_millis(500);
const DEFAULT_ERROR: Duration = Duration::from_millis(2000);

/// Timing middleware settings.
#[derive(Clone, Debug)]
pub struct Config {
    /// When `false` the wrapped handler runs untouched: no timing, no log.
    pub enabled: bool,
    /// Requests at least this slow log as `WARN`. Zero disables the tier.
    pub warning_threshold: Duration,
    /// Requests at least this slow log as `ERROR`. Zero disables the tier.
    ///
    /// Expected to be `>= warning_threshold` when both are set.
    pub error_threshold: Duration,
    /// Log `INFO` requests too, not only the slow ones.
    pub log_all_requests: bool,
    /// Exact request paths that are never timed or logged.
    pub skip_paths: HashSet<String>,
    /// Wrap the level tag in ANSI color codes.
    pub color: bool,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`
    /// before falling back to the socket peer.
    pub trust_proxy_headers: bool,
    pub logger: Logger,
}

impl Config {
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn add_skip_path(&mut self, path: impl Into<String>) {
        self.skip_paths.insert(path.into());
    }

    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.contains(path)
    }

    /// Level a request of this duration is reported at.
    pub fn level_for(&self, duration: Duration) -> LogLevel {
        LogLevel::classify(duration, self.warning_threshold, self.error_threshold)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Config::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(v) = lookup("NO_COLOR") {
            if !v.is_empty() {
                config.color = false;
            }
        }
        if let Some(v) = lookup("TSU_TIMING_ENABLED") {
            config.enabled = parse_bool("TSU_TIMING_ENABLED", &v)?;
        }
        if let Some(v) = lookup("TSU_TIMING_WARN_MS") {
            config.warning_threshold = parse_millis("TSU_TIMING_WARN_MS", &v)?;
        }
        if let Some(v) = lookup("TSU_TIMING_ERROR_MS") {
            config.error_threshold = parse_millis("TSU_TIMING_ERROR_MS", &v)?;
        }
        if let Some(v) = lookup("TSU_TIMING_LOG_ALL") {
            config.log_all_requests = parse_bool("TSU_TIMING_LOG_ALL", &v)?;
        }
        if let Some(v) = lookup("TSU_TIMING_SKIP_PATHS") {
            config.skip_paths.extend(
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned),
            );
        }
        if let Some(v) = lookup("TSU_TIMING_COLOR") {
            config.color = parse_bool("TSU_TIMING_COLOR", &v)?;
        }
        if let Some(v) = lookup("TSU_TIMING_TRUST_PROXY") {
            config.trust_proxy_headers = parse_bool("TSU_TIMING_TRUST_PROXY", &v)?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_threshold: DEFAULT_WARNING,
            error_threshold: DEFAULT_ERROR,
            log_all_requests: false,
            skip_paths: HashSet::new(),
            color: true,
            trust_proxy_headers: true,
            logger: Logger::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on"  => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_env(key, value, "expected a boolean")),
    }
}

// Negative values disable the tier, same as zero.
fn parse_millis(key: &str, value: &str) -> Result<Duration, Error> {
    let ms: i64 = value
        .trim()
        .parse()
        .map_err(|e| Error::invalid_env(key, value, e))?;
    Ok(Duration::from_millis(ms.max(0).unsigned_abs()))
}
