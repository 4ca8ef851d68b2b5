use std::path::PathBuf;

use genmcp_core::Platform;
use genmcp_image::ImageError;
use oci_distribution::errors::OciDistributionError;

/// Registry failures.
///
/// Distribution errors carry their cause in the message rather than as
/// `source()`, so a report prints the cause once.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("invalid image reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("failed to {operation} {reference}: {cause}")]
    Distribution {
        operation: &'static str,
        reference: String,
        cause: OciDistributionError,
    },

    #[error("{operation} {reference} did not finish within {seconds}s")]
    Timeout {
        operation: &'static str,
        reference: String,
        seconds: u64,
    },

    #[error("malformed {what} from registry")]
    Malformed {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("no manifest for platform {platform} in {reference}")]
    PlatformNotFound { platform: Platform, reference: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("unsupported digest algorithm in {digest}")]
    UnsupportedDigest { digest: String },

    #[error("blob {digest} is not in the target registry and the base image source is unknown")]
    MissingBlobSource { digest: String },

    #[error("failed to read docker config {path}")]
    DockerConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse docker config {path}: {detail}")]
    DockerConfigParse { path: PathBuf, detail: String },
}
