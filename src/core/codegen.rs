//! Boundary with the external SQL generation and execution collaborators
//!
//! The core never talks to the network itself. It exposes the compiled
//! [`Schema`](crate::core::compiler::Schema) as a serializable value, the
//! request payload shapes both services expect, and a small tracker that
//! makes the hand-off last-write-wins: a response to a superseded request
//! is ignored when it eventually arrives.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Connection parameters for the SQL execution service, exactly as the
/// connection form collects them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParameters {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Request body for the SQL execution service. The SQL text is opaque to
/// the core; it is whatever the generation service returned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSqlRequest {
    pub sql_code: String,
    pub connection_parameters: ConnectionParameters,
}

/// Severity of a session log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One line of the in-session message list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub text: String,
}

/// Bounded in-session message list shown in the terminal-style panel.
/// Collaborator failures end up here as opaque text; they never touch the
/// domain model.
#[derive(Debug)]
pub struct SessionLog {
    messages: Vec<LogMessage>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::with_capacity(200)
    }
}

impl SessionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            capacity,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(message = %text, "session");
        self.push(LogLevel::Info, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!(message = %text, "session");
        self.push(LogLevel::Error, text);
    }

    fn push(&mut self, level: LogLevel, text: String) {
        if self.messages.len() == self.capacity {
            self.messages.remove(0);
        }
        self.messages.push(LogMessage { level, text });
    }

    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }
}

/// Outcome reported by the generation collaborator.
pub type GenerationResult = Result<String, String>;

/// Last-write-wins tracking for in-flight generation requests.
///
/// Each compile hand-off gets a ticket from [`begin`](Self::begin). When
/// the collaborator eventually calls [`complete`](Self::complete), only the
/// most recent ticket is honored; anything older resolves to nothing. Only
/// the newest schema is ever displayed, so there is no retry or timeout
/// logic here.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    next_ticket: u64,
    latest: Option<u64>,
    sql: Option<String>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new outbound request and supersede any in-flight one.
    pub fn begin(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.latest = Some(ticket);
        ticket
    }

    /// Accept a collaborator response. Returns the SQL text when the ticket
    /// is still current and the generation succeeded; stale responses are
    /// dropped without touching state.
    pub fn complete(
        &mut self,
        ticket: u64,
        result: GenerationResult,
        log: &mut SessionLog,
    ) -> Option<&str> {
        if self.latest != Some(ticket) {
            warn!(ticket, "ignoring response to superseded generation request");
            return None;
        }
        match result {
            Ok(sql) => {
                log.info("SQL generation finished");
                self.sql = Some(sql);
                self.sql.as_deref()
            }
            Err(message) => {
                log.error(format!("SQL generation failed: {}", message));
                self.sql = None;
                None
            }
        }
    }

    /// The SQL text of the most recent successful generation, if any.
    pub fn latest_sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request_wire_shape() {
        let request = ExecuteSqlRequest {
            sql_code: "CREATE TABLE users (id INTEGER);".into(),
            connection_parameters: ConnectionParameters {
                host: "localhost".into(),
                port: 5432,
                username: "admin".into(),
                password: "secret".into(),
                database: "app".into(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("sqlCode").is_some());
        let params = json.get("connectionParameters").unwrap();
        for key in ["host", "port", "username", "password", "database"] {
            assert!(params.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_tracker_accepts_current_ticket() {
        let mut tracker = GenerationTracker::new();
        let mut log = SessionLog::default();

        let ticket = tracker.begin();
        let sql = tracker.complete(ticket, Ok("CREATE TABLE t;".into()), &mut log);
        assert_eq!(sql, Some("CREATE TABLE t;"));
        assert_eq!(tracker.latest_sql(), Some("CREATE TABLE t;"));
        assert_eq!(log.messages().len(), 1);
        assert_eq!(log.messages()[0].level, LogLevel::Info);
    }

    #[test]
    fn test_tracker_drops_stale_ticket() {
        let mut tracker = GenerationTracker::new();
        let mut log = SessionLog::default();

        let stale = tracker.begin();
        let current = tracker.begin();

        assert_eq!(tracker.complete(stale, Ok("OLD".into()), &mut log), None);
        assert_eq!(tracker.latest_sql(), None);
        assert!(log.messages().is_empty());

        assert_eq!(
            tracker.complete(current, Ok("NEW".into()), &mut log),
            Some("NEW")
        );
        assert_eq!(tracker.latest_sql(), Some("NEW"));
    }

    #[test]
    fn test_tracker_logs_failure_as_opaque_message() {
        let mut tracker = GenerationTracker::new();
        let mut log = SessionLog::default();

        let ticket = tracker.begin();
        assert_eq!(
            tracker.complete(ticket, Err("502 Bad Gateway".into()), &mut log),
            None
        );
        assert_eq!(log.messages()[0].level, LogLevel::Error);
        assert!(log.messages()[0].text.contains("502 Bad Gateway"));
    }

    #[test]
    fn test_session_log_is_bounded() {
        let mut log = SessionLog::with_capacity(3);
        for i in 0..5 {
            log.info(format!("message {}", i));
        }
        assert_eq!(log.messages().len(), 3);
        assert_eq!(log.messages()[0].text, "message 2");
        assert_eq!(log.messages()[2].text, "message 4");
    }
}
