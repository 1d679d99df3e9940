//! Test doubles for the forwarder's collaborators.
//!
//! Usable from unit tests, the integration tests under `tests/`, and by host
//! applications testing their own wiring.

use async_trait::async_trait;
use std::sync::Mutex;

use serde_json::Value;

use crate::config::{XML_PATH_ENABLED, XML_PATH_LOGGING};
use crate::context::{ConfigReader, ScopeType};
use crate::forwarder::{EventTransport, OutboundRequest, TransportResponse};
use crate::logging::LogSink;
use crate::{Error, Result};

// =============================================================================
// Config flags
// =============================================================================

/// Fixed values for the two forwarder flags, at every scope
#[derive(Debug, Clone, Copy)]
pub struct FlagMap {
    pub enabled: bool,
    pub logging: bool,
}

impl FlagMap {
    pub fn new(enabled: bool, logging: bool) -> Self {
        Self { enabled, logging }
    }
}

impl ConfigReader for FlagMap {
    fn is_set_flag(&self, path: &str, _scope: ScopeType) -> bool {
        match path {
            XML_PATH_ENABLED => self.enabled,
            XML_PATH_LOGGING => self.logging,
            _ => false,
        }
    }
}

// =============================================================================
// Log sink
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// One captured log call
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
}

/// Log sink that keeps every entry in memory
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn push(&self, level: LogLevel, message: &str, context: Value) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
            context,
        });
    }
}

impl LogSink for RecordingLogSink {
    fn info(&self, message: &str, context: Value) {
        self.push(LogLevel::Info, message, context);
    }

    fn warning(&self, message: &str, context: Value) {
        self.push(LogLevel::Warning, message, context);
    }

    fn error(&self, message: &str, context: Value) {
        self.push(LogLevel::Error, message, context);
    }
}

// =============================================================================
// Transport
// =============================================================================

enum Reply {
    Status(u16, String),
    Fail(String),
}

/// Transport that records requests and answers with a scripted reply.
pub struct MockTransport {
    reply: Reply,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    /// Always answer with `status` and `body`
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            reply: Reply::Status(status, body.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail as if the network call errored
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Reply::Fail(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl EventTransport for MockTransport {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);

        match &self.reply {
            Reply::Status(status, body) => Ok(TransportResponse {
                status: *status,
                body: body.clone(),
            }),
            Reply::Fail(message) => Err(Error::Collector(message.clone())),
        }
    }
}
