//! Configuration for the CLI client.

use crate::errors::CliError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Configuration for the CLI client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// The node to connect to
    pub node: String,
    /// Label the default account is derived from
    pub label: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: "http://localhost:8545".to_string(),
            label: None,
        }
    }
}

impl ClientConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("custody-vault");
        dir.push("cli.json");
        dir
    }

    /// Loads configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Saves configuration to a file, creating its directory if needed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
