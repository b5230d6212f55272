//! CLI-specific error types
//!
//! Every CLI error ends the process. The code tells an operator which boot
//! stage failed: reading the config, opening the store, replaying the
//! rename journal, or serving.

use std::fmt;
use std::io;

use crate::errors::{EngineError, ErrorCategory};
use crate::storage::StorageError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config file missing, malformed, or inconsistent
    ConfigError,
    /// stdout/stdin or filesystem failure outside the store
    IoError,
    /// `init` ran against an existing data directory
    AlreadyInitialized,
    /// File storage configured but `init` never ran
    NotInitialized,
    /// The store could not be opened or read
    StoreUnavailable,
    /// A journaled table rename could not be completed at boot
    ReconcileFailed,
    /// The engine rejected a command
    EngineFailed,
    /// Runtime or listener failure while serving
    ServerFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "PAGEFORGE_CLI_CONFIG_ERROR",
            Self::IoError => "PAGEFORGE_CLI_IO_ERROR",
            Self::AlreadyInitialized => "PAGEFORGE_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "PAGEFORGE_CLI_NOT_INITIALIZED",
            Self::StoreUnavailable => "PAGEFORGE_CLI_STORE_UNAVAILABLE",
            Self::ReconcileFailed => "PAGEFORGE_CLI_RECONCILE_FAILED",
            Self::EngineFailed => "PAGEFORGE_CLI_ENGINE_FAILED",
            Self::ServerFailed => "PAGEFORGE_CLI_SERVER_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(data_dir: &str) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Data directory '{}' already holds collections", data_dir),
        )
    }

    pub fn not_initialized(data_dir: &str) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "Data directory '{}' has no collections. Run 'pageforge init' first.",
                data_dir
            ),
        )
    }

    /// Boot could not finish an interrupted table rename.
    pub fn reconcile_failed(err: EngineError) -> Self {
        Self::new(
            CliErrorCode::ReconcileFailed,
            format!("Rename journal replay failed: {}", err),
        )
    }

    pub fn server_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServerFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::new(CliErrorCode::StoreUnavailable, e.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        let code = match e.category() {
            ErrorCategory::Internal => CliErrorCode::StoreUnavailable,
            _ => CliErrorCode::EngineFailed,
        };
        Self::new(code, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
