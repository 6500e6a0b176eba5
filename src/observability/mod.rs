//! Observability for rowgate
//!
//! Structured JSON log lines with typed lifecycle and request events.
//!
//! # Usage
//!
//! ```ignore
//! use rowgate::observability::{log_event_with_fields, Event, Logger};
//!
//! log_event_with_fields(Event::Serving, &[("addr", "0.0.0.0:5000")]);
//! Logger::warn("REQUEST_REJECTED", &[("reason", "bad limit")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // This just verifies no panic
        log_event(Event::BootStart);
        log_event(Event::ShutdownComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("port", "5000")]);
    }
}
