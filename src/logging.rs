use chrono::Local;
use once_cell::sync::Lazy;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Global log file path protected by Mutex
///
/// Thread-safe storage for optional log file path.
/// When None, logs go to stdout.
pub static LOG_FILE: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Severity attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Logs a message with timestamp, severity and thread name
///
/// If a log file has been set (using `set_log_file`), the message is
/// appended to that file. Otherwise it is printed to stdout.
///
/// Shutdown paths call this as `let _ = log(...)`: a failed write must
/// never stop a forced exit.
///
/// # Arguments
/// * `level` - Severity of the message
/// * `message` - The message to log
///
/// # Returns
/// * `io::Result<()>` - Ok on success, Err if writing fails
///
/// # Example
/// ```text
/// // log(Level::Info, "Receive signal: SIGTERM").unwrap();
/// ```
pub fn log(level: Level, message: &str) -> io::Result<()> {
    let line = format_line(level, message);

    match &*LOG_FILE.lock().unwrap_or_else(PoisonError::into_inner) {
        Some(log_file) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            file.write_all(line.as_bytes())?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(line.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Shorthand for `log(Level::Info, message)`
pub fn info(message: &str) -> io::Result<()> {
    log(Level::Info, message)
}

fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let current = thread::current();
    match current.name() {
        Some(name) => format!("{} {:<5} [{}] {}\n", timestamp, level, name, message),
        None => format!("{} {:<5} {}\n", timestamp, level, message),
    }
}

/// Sets the path for the log file
///
/// Subsequent calls to `log` append to this file.
///
/// # Errors
/// Returns `InvalidInput` if the path is not valid UTF-8.
pub fn set_log_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path_str = path.as_ref().to_str().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Log file path is not valid UTF-8")
    })?;
    *LOG_FILE.lock().unwrap_or_else(PoisonError::into_inner) = Some(path_str.to_string());
    Ok(())
}

/// Routes log output back to stdout
pub fn clear_log_file() {
    *LOG_FILE.lock().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_log_to_file() {
        clear_log_file();

        let dir = tempdir().unwrap();
        let log_file_path = dir.path().join("test.log");

        set_log_file(&log_file_path).unwrap();
        log(Level::Info, "test message 1").unwrap();
        log(Level::Warn, "test message 2").unwrap();

        let log_contents = fs::read_to_string(&log_file_path).unwrap();
        assert!(log_contents.contains("INFO"));
        assert!(log_contents.contains("test message 1"));
        assert!(log_contents.contains("WARN"));
        assert!(log_contents.contains("test message 2"));

        clear_log_file();
    }

    #[test]
    #[serial]
    fn test_log_includes_thread_name() {
        clear_log_file();

        let dir = tempdir().unwrap();
        let log_file_path = dir.path().join("threads.log");
        set_log_file(&log_file_path).unwrap();

        thread::Builder::new()
            .name("named-worker".to_string())
            .spawn(|| info("from worker").unwrap())
            .unwrap()
            .join()
            .unwrap();

        let log_contents = fs::read_to_string(&log_file_path).unwrap();
        assert!(log_contents.contains("[named-worker] from worker"));

        clear_log_file();
    }

    #[test]
    #[serial]
    fn test_log_to_stdout() {
        clear_log_file();

        // Only checks that writing to stdout does not fail.
        log(Level::Debug, "test stdout message").unwrap();
        info("test stdout message 2").unwrap();
    }

    #[test]
    fn test_level_ordering_and_names() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Error.as_str(), "ERROR");
    }
}
