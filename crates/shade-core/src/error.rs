#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating a [`ShadeConfig`](crate::config::ShadeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ConfigError {
    /// Individual validation messages, empty for parse and I/O failures.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_joins_messages() {
        let err = ConfigError::Validation(vec!["a must be > 0".into(), "b too big".into()]);
        assert_eq!(err.to_string(), "validation errors: a must be > 0; b too big");
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConfigError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
        assert!(err.messages().is_empty());
    }
}
