//! Unified error type.

use std::fmt;

/// The error type returned by tsu-timing's fallible operations.
///
/// Nothing on the request path is fallible: the middleware never turns a
/// response into an error. This type only surfaces configuration problems
/// found while loading [`Config`](crate::Config) from the environment.
#[derive(Debug)]
pub enum Error {
    /// An environment variable was set to a value that could not be parsed.
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid_env(key: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidEnv {
            key: key.to_owned(),
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv { key, value, reason } => {
                write!(f, "env: {key}={value:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_variable() {
        let err = Error::invalid_env("TSU_TIMING_WARN_MS", "soon", "expected milliseconds");
        assert_eq!(
            err.to_string(),
            r#"env: TSU_TIMING_WARN_MS="soon": expected milliseconds"#
        );
    }
}
