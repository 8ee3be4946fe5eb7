use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Severity of a feed entry. Front ends colour entries by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Info,
    Warning,
    Error,
}

impl LogType {
    pub fn level(self) -> log::Level {
        match self {
            LogType::Info => log::Level::Info,
            LogType::Warning => log::Level::Warn,
            LogType::Error => log::Level::Error,
        }
    }
}

/// A model for a single line of the log feed.
/// Consists of:
/// 1. RFC 3339 timestamp of the moment the entry was recorded
/// 2. Human readable message
/// 3. Severity, serialised under the `type` key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    #[serde(rename = "type")]
    pub log_type: LogType,
}

impl LogEntry {
    pub fn now(message: impl Into<String>, log_type: LogType) -> Self {
        LogEntry {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message: message.into(),
            log_type,
        }
    }
}
