//! Paddy scan service configuration

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::engine::ClassifierKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Maximum request body size in megabytes
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub model: PathBuf,
    /// OpenVINO device, only used by the CNN classifier
    #[serde(default = "default_device")]
    pub device: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub sqlite_path: PathBuf,
    /// Keys inserted at startup when absent. Existing values are left alone.
    #[serde(default)]
    pub seed_keys: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
}

fn default_device() -> String {
    "CPU".to_string()
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Config file location, overridable with `PADDYSCAN_CONFIG`
    pub fn default_path() -> String {
        std::env::var("PADDYSCAN_CONFIG").unwrap_or_else(|_| "config.toml".to_string())
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.server.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            body_limit_mb: 16,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Pipeline,
            model: PathBuf::from("model/model_normal.json"),
            device: default_device(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/api_key.db"),
            seed_keys: BTreeMap::new(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/uploads"),
        }
    }
}


