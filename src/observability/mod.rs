//! Observability subsystem
//!
//! Structured JSON logging of lifecycle events. Observability is read-only:
//! a logging failure never fails the operation being logged.
//!
//! ```ignore
//! use pageforge::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::CollectionRenamed, &[("from", "a"), ("to", "b")]);
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
    let severity = if event.is_failure() {
        Severity::Error
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
        log_event(Event::BootStart);
        log_event(Event::BootComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::PageCreated, &[("page_name", "Products")]);
    }
}
