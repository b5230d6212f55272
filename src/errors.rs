//! Engine error types
//!
//! Error codes:
//! - PAGE_NOT_FOUND (NotFound)
//! - TABLE_NOT_FOUND (NotFound)
//! - RECORD_NOT_FOUND (NotFound)
//! - VALIDATION_FAILED (Validation)
//! - CONFLICT (Conflict)
//! - STORAGE_SYNC_FAILED (StorageSync)
//! - INTERNAL (Internal)
//!
//! The caller always receives a single message string. Validation reports
//! only the first violated rule.

use std::fmt;

use crate::storage::StorageError;

/// Broad failure categories, used by the request boundary to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unknown page, table, or record
    NotFound,
    /// Input violates a field rule or page invariant
    Validation,
    /// Duplicate page name, route, or table name, or a stale version
    Conflict,
    /// Physical storage could not follow a schema lifecycle change
    StorageSync,
    /// Anything unexpected
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::NotFound => write!(f, "NOT_FOUND"),
            ErrorCategory::Validation => write!(f, "VALIDATION"),
            ErrorCategory::Conflict => write!(f, "CONFLICT"),
            ErrorCategory::StorageSync => write!(f, "STORAGE_SYNC"),
            ErrorCategory::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Engine error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No page with the given id
    PageNotFound,
    /// No page owns the given table name
    TableNotFound,
    /// No record with the given id in the table
    RecordNotFound,
    /// A field rule or page invariant was violated
    ValidationFailed,
    /// Uniqueness or version conflict
    Conflict,
    /// Provision, rename, or drop failed for a reason other than absence
    StorageSyncFailed,
    /// Unexpected failure
    Internal,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::PageNotFound => "PAGE_NOT_FOUND",
            ErrorCode::TableNotFound => "TABLE_NOT_FOUND",
            ErrorCode::RecordNotFound => "RECORD_NOT_FOUND",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::StorageSyncFailed => "STORAGE_SYNC_FAILED",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Returns the category for this code
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::PageNotFound | ErrorCode::TableNotFound | ErrorCode::RecordNotFound => {
                ErrorCategory::NotFound
            }
            ErrorCode::ValidationFailed => ErrorCategory::Validation,
            ErrorCode::Conflict => ErrorCategory::Conflict,
            ErrorCode::StorageSyncFailed => ErrorCategory::StorageSync,
            ErrorCode::Internal => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with the offending field, when there is one
#[derive(Debug, Clone, PartialEq)]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    field: Option<String>,
}

impl EngineError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Unknown page id
    pub fn page_not_found(id: &str) -> Self {
        let mut err = Self::new(ErrorCode::PageNotFound, "Page not found");
        err.field = Some(id.to_string());
        err
    }

    /// No page configuration owns this table
    pub fn table_not_found(table_name: &str) -> Self {
        Self::new(
            ErrorCode::TableNotFound,
            format!("Configuration for table '{}' not found", table_name),
        )
    }

    /// Unknown record id
    pub fn record_not_found(_id: &str) -> Self {
        Self::new(ErrorCode::RecordNotFound, "Item not found")
    }

    /// First violated rule for a field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Invalid input not tied to a single field
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Duplicate unique attribute or stale version
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Physical storage side effect failed
    pub fn storage_sync(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageSyncFailed, message)
    }

    /// Unexpected failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the category
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the user-facing message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field (or page id) this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Whether this is a not-found error of any kind
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for EngineError {}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DocumentNotFound(id) => EngineError::record_not_found(&id),
            StorageError::InvalidDocument(msg) => EngineError::invalid(msg),
            other => EngineError::internal(other.to_string()),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
