use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system the builder targets when no platform is requested.
pub const DEFAULT_OS: &str = "linux";
/// Architecture the builder targets when no platform is requested.
pub const DEFAULT_ARCH: &str = "amd64";

/// Target platform of an image build.
///
/// Used both as the request parameter and as the lookup key handed to the
/// image downloader (manifest list selection) and the binary provider.
/// Written as `os/arch` or `os/arch/variant`, e.g. `linux/arm64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    pub variant: Option<String>,
}

impl Platform {
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            architecture: architecture.into(),
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Whether a platform advertised by a registry satisfies this request.
    ///
    /// A request without a variant accepts any variant.
    pub fn matches(&self, candidate: &Platform) -> bool {
        self.os == candidate.os
            && self.architecture == candidate.architecture
            && match &self.variant {
                Some(v) => candidate.variant.as_deref() == Some(v.as_str()),
                None => true,
            }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(DEFAULT_OS, DEFAULT_ARCH)
    }
}

/// Resolve an optional platform request into a concrete platform.
pub fn resolve(requested: Option<Platform>) -> Platform {
    requested.unwrap_or_default()
}

/// Map architecture spellings used by toolchains and `uname` to the names
/// registries advertise.
fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" | "x86-64" => "amd64",
        "aarch64" => "arm64",
        "i386" | "i686" => "386",
        other => other,
    }
}

impl FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| crate::Error::InvalidPlatform {
            value: s.to_owned(),
            reason,
        };

        let lowered = s.trim().to_ascii_lowercase();
        let mut parts = lowered.split('/');
        let os = parts.next().unwrap_or_default();
        let arch = parts
            .next()
            .ok_or_else(|| invalid("expected os/arch"))?;
        let variant = parts.next();

        if parts.next().is_some() {
            return Err(invalid("too many components"));
        }
        if os.is_empty() || arch.is_empty() || variant.is_some_and(str::is_empty) {
            return Err(invalid("empty component"));
        }

        let architecture = normalize_arch(arch);
        let variant = match (architecture, variant) {
            // arm64/v8 is the only arm64 variant; registries omit it
            ("arm64", Some("v8")) => None,
            (_, v) => v.map(str::to_owned),
        };

        Ok(Self {
            os: os.to_owned(),
            architecture: architecture.to_owned(),
            variant,
        })
    }
}

impl TryFrom<String> for Platform {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}
