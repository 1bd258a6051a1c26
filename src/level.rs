//! Severity levels derived from request duration.
//!
//! A level is never stored. It is computed fresh for every request from the
//! measured duration and the two configured thresholds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";

/// ANSI sequence that ends a colored level tag.
pub(crate) const RESET: &str = "\x1b[0m";

/// Severity of a request, ordered `Info < Warn < Error`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Classifies `duration` against the thresholds.
    ///
    /// A zero threshold disables its tier. The error tier is checked first,
    /// so a duration that meets both thresholds is an `Error`.
    pub fn classify(duration: Duration, warning: Duration, error: Duration) -> Self {
        if !error.is_zero() && duration >= error {
            Self::Error
        } else if !warning.is_zero() && duration >= warning {
            Self::Warn
        } else {
            Self::Info
        }
    }

    /// Returns the uppercase tag used in log lines (e.g. `"WARN"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info  => "INFO",
            Self::Warn  => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// ANSI foreground color for the level tag.
    pub fn ansi_color(self) -> &'static str {
        match self {
            Self::Error => RED,
            Self::Warn  => YELLOW,
            Self::Info  => GREEN,
        }
    }
}

/// Parses a level name, case-insensitively (`"warn"`, `"WARN"`, `"Warning"`).
impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO"             => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR"            => Ok(Self::Error),
            _                  => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
