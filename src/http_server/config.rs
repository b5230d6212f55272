//! HTTP listener settings for the page API
//!
//! Lives under the `http` key of the pageforge config file. The admin UI
//! runs on a separate dev server, so its origins are allowed by default.

use serde::{Deserialize, Serialize};

/// Port the page API listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 5001;

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origins allowed to call the API; empty allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors_origins() -> Vec<String> {
    ["http://localhost:5173", "http://localhost:3000", "http://127.0.0.1:5173"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl HttpServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Applies a `--port` flag on top of the file settings.
    pub fn override_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty()
    }

    /// Rejects settings the listener or the CORS layer cannot use.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("http.host must not be empty".into());
        }
        if self.port == 0 {
            return Err("http.port must be > 0".into());
        }
        if let Some(bad) = self
            .cors_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(format!(
                "http.cors_origins entry '{}' must start with http:// or https://",
                bad
            ));
        }
        Ok(())
    }
}
