//! Server configuration
//!
//! Loaded from an HCL or JSON file; every field has a default so an empty
//! file (or none at all) yields a working server. CLI flags override
//! whatever the file sets.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,

    /// Name given to users who register without one
    pub default_display_name: String,

    /// Longest display name kept, in characters
    pub max_name_len: usize,

    /// Directory of client assets served at `/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_display_name: "Anonymous".to_string(),
            max_name_len: 32,
            static_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parse configuration text. JSON is detected by a leading `{`,
    /// anything else is read as HCL.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('{') {
            return serde_json::from_str(content)
                .map_err(|e| ChatError::Config(format!("Failed to parse JSON config: {}", e)));
        }
        hcl::from_str(content)
            .map_err(|e| ChatError::Config(format!("Failed to parse HCL config: {}", e)))
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_display_name.trim().is_empty() {
            return Err(ChatError::Config(
                "default_display_name must not be empty".to_string(),
            ));
        }
        if self.max_name_len == 0 {
            return Err(ChatError::Config(
                "max_name_len must be at least 1".to_string(),
            ));
        }
        self.socket_addr().map(|_| ())
    }

    /// Resolve the listen address. IP literals (v4 or v6) are used as is,
    /// anything else is looked up as a hostname.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let invalid = |reason: String| {
            ChatError::Config(format!(
                "Invalid listen host '{}' (port {}): {}",
                self.host, self.port, reason
            ))
        };
        if self.host.is_empty() || self.host.contains(char::is_whitespace) {
            return Err(invalid("not a hostname".to_string()));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("no addresses found".to_string()))
    }
}
