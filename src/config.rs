use crate::logging::set_log_file;
use crate::shutdown::ShutdownCoordinator;

use serde::Deserialize;
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::time::Duration;

/// Environment variable overriding `timeout_seconds`
pub const TIMEOUT_ENV: &str = "SIGTERM_HANDLER_TIMEOUT";

/// Environment variable overriding `log_file`
pub const LOG_FILE_ENV: &str = "SIGTERM_HANDLER_LOG_FILE";

/// Shutdown settings
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Force-exit deadline after the first signal, 0 or absent disables it (JSON field: timeout_seconds)
    pub timeout_seconds: Option<u64>,
    /// Log destination, stdout when absent (JSON field: log_file)
    pub log_file: Option<String>,
}

impl Config {
    /// Applies `SIGTERM_HANDLER_TIMEOUT` and `SIGTERM_HANDLER_LOG_FILE` on top of `self`
    ///
    /// # Errors
    /// `InvalidInput` if the timeout variable is not a whole number of seconds.
    pub fn with_env_overrides(mut self) -> Result<Self, Error> {
        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            let seconds = raw.trim().parse::<u64>().map_err(|e| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid {} value '{}': {}", TIMEOUT_ENV, raw, e),
                )
            })?;
            self.timeout_seconds = Some(seconds);
        }
        if let Ok(path) = env::var(LOG_FILE_ENV) {
            if !path.is_empty() {
                self.log_file = Some(path);
            }
        }
        Ok(self)
    }

    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    /// Routes logging and sets the coordinator's timeout
    pub fn apply(&self, coordinator: &ShutdownCoordinator) -> Result<(), Error> {
        if let Some(log_file) = &self.log_file {
            set_log_file(log_file)?;
        }
        match self.timeout() {
            Some(timeout) => coordinator.set_timeout(timeout),
            None => coordinator.clear_timeout(),
        }
        Ok(())
    }
}

/// Parses a JSON configuration file
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON or unknown fields
///
/// # File Format
/// ```text
/// {"timeout_seconds": 30, "log_file": "/var/log/app-shutdown.log"}
/// ```
pub fn parse_config(filename: &str) -> Result<Config, Error> {
    let contents = fs::read_to_string(filename)?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("invalid JSON in {}: {}", filename, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shutdown.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let path = path.to_str().unwrap().to_string();
        (dir, path)
    }

    #[test]
    fn test_parse_config() {
        let (_dir, path) = write_config(r#"{"timeout_seconds": 30, "log_file": "/tmp/shutdown.log"}"#);
        let config = parse_config(&path).unwrap();
        assert_eq!(
            config,
            Config {
                timeout_seconds: Some(30),
                log_file: Some("/tmp/shutdown.log".to_string()),
            }
        );
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_config_all_fields_optional() {
        let (_dir, path) = write_config("{}");
        assert_eq!(parse_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_parse_config_rejects_unknown_fields() {
        let (_dir, path) = write_config(r#"{"timeout": 30}"#);
        let err = parse_config(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_config_missing_file() {
        let err = parse_config("/nonexistent/shutdown.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = Config {
            timeout_seconds: Some(0),
            log_file: None,
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        temp_env::with_vars(
            [(TIMEOUT_ENV, Some("7")), (LOG_FILE_ENV, Some("/tmp/env.log"))],
            || {
                let config = Config {
                    timeout_seconds: Some(30),
                    log_file: None,
                }
                .with_env_overrides()
                .unwrap();
                assert_eq!(config.timeout_seconds, Some(7));
                assert_eq!(config.log_file.as_deref(), Some("/tmp/env.log"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_absent_keeps_values() {
        temp_env::with_vars_unset([TIMEOUT_ENV, LOG_FILE_ENV], || {
            let original = Config {
                timeout_seconds: Some(12),
                log_file: Some("/tmp/file.log".to_string()),
            };
            let config = original.clone().with_env_overrides().unwrap();
            assert_eq!(config, original);
        });
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_timeout() {
        temp_env::with_var(TIMEOUT_ENV, Some("soon"), || {
            let err = Config::default().with_env_overrides().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        });
    }

    #[test]
    fn test_apply_sets_timeout() {
        let coordinator = ShutdownCoordinator::with_exit(Arc::new(|_: i32| {})).unwrap();
        Config {
            timeout_seconds: Some(3),
            log_file: None,
        }
        .apply(&coordinator)
        .unwrap();
        assert_eq!(coordinator.timeout(), Some(Duration::from_secs(3)));

        Config::default().apply(&coordinator).unwrap();
        assert_eq!(coordinator.timeout(), None);
    }
}
