use std::path::PathBuf;

use serde::Deserialize;

/// Attachment storage configuration.
#[derive(Debug, Deserialize)]
pub struct AttachmentsConfig {
    /// Directory attachment files are written to. Created on startup.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self { dir: default_dir() }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("img")
}
