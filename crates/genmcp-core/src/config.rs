use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "genmcp.toml";

/// genmcp.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenmcpConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Base image reference (defaults to the UBI minimal image)
    #[serde(default)]
    pub base_image: Option<String>,
    /// Target platform as `os/arch[/variant]` (defaults to linux/amd64)
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Directory holding the prebuilt `genmcp-server-<os>-<arch>` binaries.
    /// When None, the directory next to the running executable is used.
    #[serde(default)]
    pub binaries_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry hosts reached over plain HTTP, port included
    /// (`localhost:5000`).
    #[serde(default)]
    pub insecure_registries: Vec<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Docker `config.json` to read credentials from.
    /// When None, `~/.docker/config.json` is used if present.
    #[serde(default)]
    pub docker_config: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            insecure_registries: Vec::new(),
            timeout_secs: default_timeout_secs(),
            docker_config: None,
        }
    }
}

impl GenmcpConfig {
    /// Load from genmcp.toml in the given directory, or return defaults if not found.
    pub fn load(dir: &Path) -> crate::Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from an explicit path. A missing file is an error.
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn default_timeout_secs() -> u64 {
    300
}
