//! Channel logger with file, daily, stderr and syslog drivers.
//!
//! Line format:
//! ```text
//! [2024-12-28 15:04:05] [ERROR] Payment failed {
//!     "order": 42
//! }
//! ```
//! With no context the message is followed by a single trailing space.

use std::ffi::CString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::alert::AlertSender;
use super::LogLevel;
use crate::core::Result;

const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
const DEFAULT_RETENTION_DAYS: u64 = 30;
const SECS_PER_DAY: u64 = 86_400;

/// Where log lines go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogDriver {
    /// Append to one file.
    Single,
    /// Append to `{channel}-{date}.log`, rotating by size.
    Daily,
    /// Process stderr.
    ErrorLog,
    /// System log via `syslog(3)`.
    Syslog,
}

impl LogDriver {
    /// Parse a driver name; unknown names fall back to `single`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "daily" => LogDriver::Daily,
            "errorlog" => LogDriver::ErrorLog,
            "syslog" => LogDriver::Syslog,
            _ => LogDriver::Single,
        }
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self, LogDriver::Single | LogDriver::Daily)
    }
}

impl<'de> Deserialize<'de> for LogDriver {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(LogDriver::from_name(&name))
    }
}

/// Logger settings, typically the `logging` section of the config repository.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub channel: String,
    pub driver: LogDriver,
    /// Defaults to `{base}/storage/logs/{channel}.log`.
    pub path: Option<PathBuf>,
    /// Minimum level written.
    pub level: LogLevel,
    pub max_file_size: u64,
    pub retention_days: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            channel: "default".to_string(),
            driver: LogDriver::Single,
            path: None,
            level: LogLevel::Debug,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Current file target for file drivers.
#[derive(Debug)]
struct FileTarget {
    /// Configured (undated) path.
    base: PathBuf,
    /// Path lines are appended to.
    active: PathBuf,
    /// Date the daily file belongs to.
    date: Option<String>,
}

/// Application logger for one channel.
#[derive(Debug)]
pub struct Logger {
    channel: String,
    driver: LogDriver,
    min_level: LogLevel,
    max_file_size: u64,
    retention: Duration,
    target: Mutex<FileTarget>,
    alerts: AlertSender,
}

impl Logger {
    /// Create a logger. File drivers get their directory created, the daily
    /// driver rotates, and stale files are removed.
    pub fn new(config: LoggerConfig, base_path: &Path, alerts: AlertSender) -> Result<Self> {
        let base = config.path.clone().unwrap_or_else(|| {
            base_path
                .join("storage")
                .join("logs")
                .join(format!("{}.log", config.channel))
        });

        if config.driver.is_file() {
            if let Some(dir) = base.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
        }

        let logger = Self {
            channel: config.channel,
            driver: config.driver,
            min_level: config.level,
            max_file_size: config.max_file_size,
            retention: Duration::from_secs(config.retention_days.saturating_mul(SECS_PER_DAY)),
            target: Mutex::new(FileTarget {
                active: base.clone(),
                base,
                date: None,
            }),
            alerts,
        };

        if logger.driver.is_file() {
            let mut target = logger.lock_target();
            if logger.driver == LogDriver::Daily {
                logger.rotate(&mut target, &today());
            }
            logger.cleanup(&target.active);
        }

        Ok(logger)
    }

    /// Logger writing to stderr with no alerts.
    pub fn stderr(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            driver: LogDriver::ErrorLog,
            min_level: LogLevel::Debug,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            retention: Duration::from_secs(DEFAULT_RETENTION_DAYS * SECS_PER_DAY),
            target: Mutex::new(FileTarget {
                base: PathBuf::new(),
                active: PathBuf::new(),
                date: None,
            }),
            alerts: AlertSender::disabled(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn driver(&self) -> LogDriver {
        self.driver
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// File currently being appended to (file drivers only).
    pub fn path(&self) -> Option<PathBuf> {
        self.driver
            .is_file()
            .then(|| self.lock_target().active.clone())
    }

    /// Write one entry. Context that is null or an empty container is omitted.
    pub fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        if level < self.min_level {
            return;
        }

        let line = format_line(&timestamp(), level, message, context);

        match self.driver {
            LogDriver::Single | LogDriver::Daily => self.append(&line),
            LogDriver::ErrorLog => eprintln!("{}", line.trim()),
            LogDriver::Syslog => write_syslog(level, line.trim()),
        }

        self.alerts.notify(level, &self.channel, &line);
    }

    pub fn debug(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Debug, message, context);
    }

    pub fn info(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Info, message, context);
    }

    pub fn notice(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Notice, message, context);
    }

    pub fn warning(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Warning, message, context);
    }

    pub fn error(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Error, message, context);
    }

    pub fn critical(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Critical, message, context);
    }

    pub fn alert(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Alert, message, context);
    }

    pub fn emergency(&self, message: &str, context: Option<&Value>) {
        self.log(LogLevel::Emergency, message, context);
    }

    fn lock_target(&self) -> std::sync::MutexGuard<'_, FileTarget> {
        self.target.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn append(&self, line: &str) {
        let mut target = self.lock_target();

        if self.driver == LogDriver::Daily {
            let date = today();
            if target.date.as_deref() != Some(date.as_str()) {
                self.rotate(&mut target, &date);
                self.cleanup(&target.active);
            } else {
                self.rotate_oversized(&target.active);
            }
        }

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target.active)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            warn!(path = %target.active.display(), error = %e, "Failed to write log line");
        }
    }

    /// Point the target at `{dir}/{channel}-{date}.log`, adopting an existing
    /// undated file, then roll it aside if it is too large.
    fn rotate(&self, target: &mut FileTarget, date: &str) {
        let dir = target.base.parent().unwrap_or_else(|| Path::new(""));
        let daily = dir.join(format!("{}-{}.log", self.channel, date));

        if !daily.exists() && target.base.exists() {
            if let Err(e) = fs::rename(&target.base, &daily) {
                warn!(from = %target.base.display(), to = %daily.display(), error = %e, "Failed to rotate log");
            }
        }

        self.rotate_oversized(&daily);
        target.active = daily;
        target.date = Some(date.to_string());
    }

    fn rotate_oversized(&self, path: &Path) {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if size < self.max_file_size {
            return;
        }

        let rotated = next_free_suffix(path);
        if let Err(e) = fs::rename(path, &rotated) {
            warn!(from = %path.display(), to = %rotated.display(), error = %e, "Failed to rotate log");
        }
    }

    /// Remove `{channel}-*.log*` files older than the retention window.
    fn cleanup(&self, active: &Path) {
        let dir = match active.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };

        let pattern = format!(r"^{}-.*\.log", regex::escape(&self.channel));
        let matcher = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(_) => return,
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let now = SystemTime::now();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !matcher.is_match(name) {
                continue;
            }

            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }

            let expired = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .is_some_and(|age| age > self.retention);
            if expired {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

/// Build one log line.
pub fn format_line(timestamp: &str, level: LogLevel, message: &str, context: Option<&Value>) -> String {
    let context = context
        .filter(|c| !is_empty_context(c))
        .map(pretty_json)
        .unwrap_or_default();

    format!(
        "[{}] [{}] {} {}\n",
        timestamp,
        level.as_str().to_uppercase(),
        message,
        context
    )
}

fn is_empty_context(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Pretty JSON with four-space indentation.
fn pretty_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

fn next_free_suffix(path: &Path) -> PathBuf {
    let mut n = 1u32;
    loop {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(format!(".{}", n));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn write_syslog(level: LogLevel, line: &str) {
    let message = match CString::new(line.replace('\0', " ")) {
        Ok(m) => m,
        Err(_) => return,
    };

    // SAFETY: both pointers are valid NUL-terminated strings for the call,
    // and the "%s" format consumes exactly one string argument.
    unsafe {
        libc::syslog(
            level.syslog_priority(),
            b"%s\0".as_ptr() as *const libc::c_char,
            message.as_ptr(),
        );
    }
}
