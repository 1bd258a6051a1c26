//! The formatting core shared by every binding.
//!
//! Bindings reduce a request/response pair to a [`Record`] and call
//! [`report`]. Nothing in here knows about `http`, `tower` or `hyper`.
//!
//! ```text
//! [WARN] 2025/01/31 - 14:03:59 | 200 |    600.3125ms |        10.0.0.7 | GET     /slow | curl/8.5.0
//! ```

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::level::{LogLevel, RESET};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d - %H:%M:%S";

/// Everything the log line says about one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub status: u16,
    pub duration: Duration,
    pub client_addr: String,
    pub method: String,
    pub path: String,
    pub user_agent: Option<String>,
    /// Errors the handler recorded while serving the request.
    pub errors: Vec<String>,
}

impl Record {
    /// Renders the log line for `level` at `timestamp`.
    pub fn render(&self, level: LogLevel, timestamp: DateTime<Local>, color: bool) -> String {
        let (start, reset) = if color { (level.ansi_color(), RESET) } else { ("", "") };
        // Duration's Debug output (`1.5ms`, `2.1s`) is padded as a whole.
        let duration = format!("{:?}", self.duration);

        let mut line = format!(
            "{start}[{level}]{reset} {} | {:>3} | {:>13} | {:>15} | {:<7} {}",
            timestamp.format(TIMESTAMP_FORMAT),
            self.status,
            duration,
            self.client_addr,
            self.method,
            self.path,
        );

        if let Some(ua) = self.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            line.push_str(" | ");
            line.push_str(ua);
        }
        if !self.errors.is_empty() {
            line.push_str(" | ");
            line.push_str(&self.errors.join("; "));
        }
        line
    }
}

/// Classifies `record`, and unless the policy suppresses it, formats and
/// emits it through `config.logger`.
///
/// Returns the level that was logged, or `None` if nothing was emitted.
pub fn report(config: &Config, record: &Record) -> Option<LogLevel> {
    let level = config.level_for(record.duration);
    if !config.log_all_requests && level == LogLevel::Info {
        return None;
    }

    let line = record.render(level, Local::now(), config.color);
    config.logger.emit(level, &line);
    Some(level)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;

    use super::*;
    use crate::sink::Logger;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 31, 14, 3, 59).unwrap()
    }

    fn record() -> Record {
        Record {
            status: 200,
            duration: Duration::from_millis(600),
            client_addr: "10.0.0.7".to_owned(),
            method: "GET".to_owned(),
            path: "/slow".to_owned(),
            user_agent: None,
            errors: Vec::new(),
        }
    }

    fn capture(config: &mut Config) -> Arc<Mutex<Vec<(LogLevel, String)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        config.logger = Logger::from_fn(move |level, line: &str| {
            sink.lock().unwrap().push((level, line.to_owned()));
        });
        seen
    }

    #[test]
    fn render_plain() {
        let line = record().render(LogLevel::Warn, at(), false);
        assert_eq!(
            line,
            "[WARN] 2025/01/31 - 14:03:59 | 200 |         600ms |        10.0.0.7 | GET     /slow"
        );
    }

    #[test]
    fn render_colored_tag_only() {
        let line = record().render(LogLevel::Error, at(), true);
        assert!(line.starts_with("\x1b[31m[ERROR]\x1b[0m 2025/01/31 - 14:03:59 | "));
        assert_eq!(line.matches('\x1b').count(), 2);

        let line = record().render(LogLevel::Info, at(), true);
        assert!(line.starts_with("\x1b[32m[INFO]\x1b[0m "));
    }

    #[test]
    fn render_pads_columns() {
        let rec = Record {
            status: 404,
            duration: Duration::from_micros(1500),
            client_addr: "::1".to_owned(),
            method: "DELETE".to_owned(),
            path: "/users/42".to_owned(),
            ..Record::default()
        };
        let line = rec.render(LogLevel::Info, at(), false);
        assert!(line.ends_with("| 404 |         1.5ms |             ::1 | DELETE  /users/42"));
    }

    #[test]
    fn render_extras() {
        let rec = Record {
            user_agent: Some("curl/8.5.0".to_owned()),
            errors: vec!["db timeout".to_owned(), "retry failed".to_owned()],
            ..record()
        };
        let line = rec.render(LogLevel::Warn, at(), false);
        assert!(line.ends_with("GET     /slow | curl/8.5.0 | db timeout; retry failed"));

        let rec = Record { user_agent: Some(String::new()), ..record() };
        assert!(rec.render(LogLevel::Warn, at(), false).ends_with("GET     /slow"));
    }

    #[test]
    fn report_suppresses_fast_requests() {
        let mut config = Config::default();
        let seen = capture(&mut config);

        let fast = Record { duration: Duration::from_millis(3), ..record() };
        assert_eq!(report(&config, &fast), None);
        assert!(seen.lock().unwrap().is_empty());

        assert_eq!(report(&config, &record()), Some(LogLevel::Warn));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, LogLevel::Warn);
        assert!(seen[0].1.contains("[WARN]"));
    }

    #[test]
    fn report_all_levels_when_log_all() {
        let mut config = Config { log_all_requests: true, color: false, ..Config::default() };
        let seen = capture(&mut config);

        for ms in [0, 700, 2500] {
            let rec = Record { duration: Duration::from_millis(ms), ..record() };
            report(&config, &rec);
        }

        let levels: Vec<LogLevel> = seen.lock().unwrap().iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
        assert!(seen.lock().unwrap()[0].1.starts_with("[INFO] "));
    }
}
