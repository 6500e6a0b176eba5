//! Observable events for rowgate
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in rowgate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Connectivity check against the database succeeded
    DatabaseConnected,
    /// Database could not be reached at boot (FATAL)
    DatabaseUnreachable,
    /// Listener bound, ready for requests
    Serving,
    /// Shutdown signal received
    ShutdownStart,
    /// Pool drained, process about to exit
    ShutdownComplete,

    // Requests
    /// Data page served
    QueryExecuted,
    /// Request rejected with a 4xx
    RequestRejected,
    /// Request failed with a 5xx
    RequestFailed,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatabaseConnected => "DATABASE_CONNECTED",
            Event::DatabaseUnreachable => "DATABASE_UNREACHABLE",
            Event::Serving => "SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Fatal events abort the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DatabaseUnreachable)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
