use crate::records::{ServerId, ServerStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogKind {
    Info,
    Error,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Info => write!(f, "INFO"),
            LogKind::Error => write!(f, "ERROR"),
        }
    }
}

/// One row of a server's audit trail. Entries are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub server_id: ServerId,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub created_at: String,
}

/// A status change (possibly none) plus the log entry that records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: Option<ServerStatus>,
    pub kind: LogKind,
    pub message: String,
}

impl Transition {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            status: None,
            kind: LogKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            kind: LogKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn entry(&self, server_id: &ServerId, now: &str) -> LogEntry {
        LogEntry {
            server_id: server_id.clone(),
            kind: self.kind,
            message: self.message.clone(),
            created_at: now.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_kind_wire_names() {
        assert_eq!(serde_json::to_string(&LogKind::Info).unwrap(), "\"INFO\"");
        assert_eq!(serde_json::to_string(&LogKind::Error).unwrap(), "\"ERROR\"");
        assert_eq!(LogKind::Error.to_string(), "ERROR");
    }

    #[test]
    fn transition_builders() {
        let t = Transition::info("Container stop completed").with_status(ServerStatus::Offline);
        assert_eq!(t.kind, LogKind::Info);
        assert_eq!(t.status, Some(ServerStatus::Offline));

        let e = Transition::error("boom");
        assert_eq!(e.kind, LogKind::Error);
        assert_eq!(e.status, None);
    }

    #[test]
    fn entry_serializes_kind_as_type() {
        let id = ServerId::parse("42").unwrap();
        let entry = Transition::info("hello").entry(&id, "2025-01-01T00:00:00Z");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "INFO");
        assert_eq!(json["server_id"], "42");
    }
}
