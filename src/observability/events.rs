//! Observable lifecycle events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Configuration loaded
    ConfigLoaded,
    /// Leftover rename intents resolved
    ReconcileComplete,
    /// HTTP listener bound
    HttpListening,

    // Page metadata
    PageCreated,
    PageUpdated,
    PageDeleted,

    // Physical collections
    CollectionProvisioned,
    CollectionRenamed,
    CollectionDropped,
    /// Rename failed for a reason other than absence
    RenameFailed,

    // Records
    /// Record write rejected by validation
    RecordRejected,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ReconcileComplete => "RECONCILE_COMPLETE",
            Event::HttpListening => "HTTP_LISTENING",
            Event::PageCreated => "PAGE_CREATED",
            Event::PageUpdated => "PAGE_UPDATED",
            Event::PageDeleted => "PAGE_DELETED",
            Event::CollectionProvisioned => "COLLECTION_PROVISIONED",
            Event::CollectionRenamed => "COLLECTION_RENAMED",
            Event::CollectionDropped => "COLLECTION_DROPPED",
            Event::RenameFailed => "RENAME_FAILED",
            Event::RecordRejected => "RECORD_REJECTED",
        }
    }

    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::RenameFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
