//! CLI command implementations
//!
//! Boot sequence for `serve`:
//! 1. Load and validate the config
//! 2. Open the store
//! 3. Reconcile interrupted renames
//! 4. Start the HTTP server on a tokio runtime

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::data::GenericDataService;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{log_event, log_event_with_fields, Event, Logger, Severity};
use crate::schema::SchemaRegistry;
use crate::storage::{CollectionStore, FileStore, MemoryStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Backing store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    File,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required for file storage)
    #[serde(default)]
    pub data_dir: Option<String>,

    /// "memory" or "file"; defaults to "file" when `data_dir` is set
    #[serde(default)]
    pub storage: Option<StorageKind>,

    /// Minimum log severity (optional, default "info")
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub http: HttpServerConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.storage_kind() == StorageKind::File && self.data_path().is_none() {
            return Err(CliError::config_error(
                "data_dir is required when storage is 'file'",
            ));
        }

        self.http.validate().map_err(CliError::config_error)?;

        self.severity()?;

        Ok(())
    }

    /// Effective storage kind
    pub fn storage_kind(&self) -> StorageKind {
        match (self.storage, &self.data_dir) {
            (Some(kind), _) => kind,
            (None, Some(_)) => StorageKind::File,
            (None, None) => StorageKind::Memory,
        }
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> Option<&Path> {
        self.data_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(Path::new)
    }

    /// Configured minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        match &self.log_level {
            Some(level) => level.parse().map_err(CliError::config_error),
            None => Ok(Severity::Info),
        }
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> CliResult<Arc<dyn CollectionStore>> {
        match (self.storage_kind(), self.data_path()) {
            (StorageKind::Memory, _) => Ok(Arc::new(MemoryStore::new())),
            (StorageKind::File, Some(dir)) => {
                if !is_initialized(dir) {
                    return Err(CliError::not_initialized(&dir.display().to_string()));
                }
                Ok(Arc::new(FileStore::open(dir)?))
            }
            (StorageKind::File, None) => Err(CliError::config_error(
                "data_dir is required when storage is 'file'",
            )),
        }
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Pages { config } => pages(&config),
    }
}

/// Check if a data directory holds a store
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("collections").is_dir()
}

/// Initialize a new data directory
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config
        .data_path()
        .ok_or_else(|| CliError::config_error("init requires data_dir"))?;

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized(
            &data_dir.display().to_string(),
        ));
    }

    let store = FileStore::open(data_dir)?;
    write_response(json!({
        "initialized": store.collections_dir().display().to_string()
    }))
}

/// Boot the engine: open the store and finish interrupted renames.
pub fn boot(config: &Config) -> CliResult<GenericDataService> {
    let store = config.open_store()?;
    let registry = SchemaRegistry::new(store);
    registry.reconcile().map_err(CliError::reconcile_failed)?;
    Ok(GenericDataService::new(registry))
}

/// Start the HTTP server
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    let storage = match config.storage_kind() {
        StorageKind::Memory => "memory",
        StorageKind::File => "file",
    };
    log_event_with_fields(Event::ConfigLoaded, &[("storage", storage)]);

    let service = boot(&config)?;

    let server = HttpServer::new(config.http.clone().override_port(port), service);
    log_event(Event::BootComplete);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::server_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::server_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Print every page definition
pub fn pages(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let service = boot(&config)?;
    let pages = service.registry().list()?;
    write_response(serde_json::to_value(pages)?)
}
