use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::platform::{self, Platform};

/// Base image used when a build request does not name one.
pub const DEFAULT_BASE_IMAGE: &str = "registry.access.redhat.com/ubi9/ubi-minimal:latest";

/// A single image build request.
///
/// Created per invocation, defaulted once with [`BuildOptions::set_defaults`],
/// then consumed by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Target platform; `None` resolves to linux/amd64.
    pub platform: Option<Platform>,
    /// Reference of the image to build on top of; empty resolves to
    /// [`DEFAULT_BASE_IMAGE`].
    pub base_image: String,
    /// MCP file embedded into the image. Never defaulted.
    pub mcp_file_path: PathBuf,
    /// Reference the result is pushed to. Only required for a push.
    pub image_tag: String,
}

/// Build options after default resolution.
///
/// Platform and base image are always present here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub platform: Platform,
    pub base_image: String,
    pub mcp_file_path: PathBuf,
    pub image_tag: String,
}

impl BuildOptions {
    pub fn new(mcp_file_path: impl Into<PathBuf>) -> Self {
        Self {
            mcp_file_path: mcp_file_path.into(),
            ..Default::default()
        }
    }

    /// Fill unset platform and base image with built-in defaults.
    ///
    /// Idempotent; fields that are already set are left alone.
    pub fn set_defaults(&mut self) {
        if self.platform.is_none() {
            self.platform = Some(Platform::default());
        }
        if self.base_image.is_empty() {
            self.base_image = DEFAULT_BASE_IMAGE.to_owned();
        }
    }

    /// Fill unset fields from the `[build]` section of `genmcp.toml`.
    ///
    /// Call before [`BuildOptions::set_defaults`] so values given on the
    /// command line win over the config file, which wins over defaults.
    pub fn apply_config(&mut self, config: &BuildConfig) {
        if self.platform.is_none() {
            self.platform.clone_from(&config.platform);
        }
        if self.base_image.is_empty() {
            if let Some(base) = &config.base_image {
                self.base_image.clone_from(base);
            }
        }
    }

    /// Apply defaults and convert into [`ResolvedOptions`].
    pub fn resolve(mut self) -> ResolvedOptions {
        self.set_defaults();
        ResolvedOptions {
            platform: platform::resolve(self.platform),
            base_image: self.base_image,
            mcp_file_path: self.mcp_file_path,
            image_tag: self.image_tag,
        }
    }
}
