//! Registry credentials from docker `config.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use genmcp_core::RegistryConfig;
use oci_distribution::Reference;
use oci_distribution::secrets::RegistryAuth;
use serde::Deserialize;

use crate::error::RegistryError;

/// Host Docker Hub references report as their registry.
const DOCKER_HUB: &str = "docker.io";

/// Username and password for one registry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn to_registry_auth(&self) -> RegistryAuth {
        RegistryAuth::Basic(self.username.clone(), self.password.clone())
    }
}

/// Credentials keyed by registry host.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, Credentials>,
}

#[derive(Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Deserialize)]
struct DockerAuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl CredentialStore {
    /// Credentials from the configured docker config, or `~/.docker/config.json`.
    ///
    /// A missing default file yields an empty store; a configured path that
    /// does not exist is an error.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        if let Some(path) = &config.docker_config {
            return Self::load(path);
        }
        match default_docker_config() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse the `auths` section of a docker `config.json`.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RegistryError::DockerConfigRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        let parse_err = |detail: String| RegistryError::DockerConfigParse {
            path: path.to_path_buf(),
            detail,
        };

        let file: DockerConfigFile =
            serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?;

        let mut store = Self::default();
        for (key, entry) in file.auths {
            let credentials = match entry {
                DockerAuthEntry {
                    auth: Some(auth), ..
                } if !auth.is_empty() => {
                    let decoded = STANDARD
                        .decode(auth.trim())
                        .map_err(|e| parse_err(format!("auth for {key}: {e}")))?;
                    let decoded = String::from_utf8(decoded)
                        .map_err(|e| parse_err(format!("auth for {key}: {e}")))?;
                    let (username, password) = decoded
                        .split_once(':')
                        .ok_or_else(|| parse_err(format!("auth for {key} is not user:password")))?;
                    Credentials::new(username, password)
                }
                DockerAuthEntry {
                    username: Some(username),
                    password: Some(password),
                    ..
                } => Credentials::new(username, password),
                _ => continue,
            };
            store.insert(&key, credentials);
        }

        tracing::debug!(path = %path.display(), registries = store.entries.len(), "loaded registry credentials");
        Ok(store)
    }

    /// Add credentials for a registry. `key` may be a bare host or a URL.
    pub fn insert(&mut self, key: &str, credentials: Credentials) {
        self.entries.insert(normalize_host(key), credentials);
    }

    pub fn get(&self, registry: &str) -> Option<&Credentials> {
        self.entries.get(&normalize_host(registry))
    }

    /// Authentication for the registry `reference` lives on; anonymous
    /// when no credentials are stored for it.
    pub fn auth_for(&self, reference: &Reference) -> RegistryAuth {
        self.get(reference.registry())
            .map(Credentials::to_registry_auth)
            .unwrap_or(RegistryAuth::Anonymous)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_docker_config() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

/// Reduce `https://index.docker.io/v1/`, `quay.io/` and friends to the
/// registry host a parsed reference reports.
fn normalize_host(key: &str) -> String {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = host.split('/').next().unwrap_or(host);
    match host {
        "index.docker.io" | "registry-1.docker.io" | "registry.hub.docker.com" => {
            DOCKER_HUB.to_owned()
        }
        other => other.to_owned(),
    }
}
