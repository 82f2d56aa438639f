mod attachments;
mod auth;
mod logging;
mod server;

#[cfg(test)]
mod tests;

pub use attachments::*;
pub use auth::*;
pub use logging::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Vitrine server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct VitrineConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token and identity configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Attachment storage configuration.
    #[serde(default)]
    pub attachments: AttachmentsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VitrineConfig {
    /// Parse a configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load the configuration at `path`, or the defaults when the file does
    /// not exist. Returns whether the file was found.
    pub fn load(path: &Path) -> Result<(Self, bool), ServerError> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok((Self::parse(&contents)?, true))
    }
}
