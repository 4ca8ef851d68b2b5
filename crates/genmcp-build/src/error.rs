use std::path::PathBuf;

use genmcp_core::Platform;
use genmcp_image::ImageError;
use genmcp_registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    #[error("no server binary for {platform}: {path} does not exist")]
    NotFound { platform: Platform, path: PathBuf },

    #[error("failed to read server binary {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot locate the binaries directory next to the running executable")]
    NoExecutableDir { source: std::io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum MediaTypeError {
    #[error(transparent)]
    Query(#[from] ImageError),

    /// The manifest schema is neither OCI nor Docker v2. Carries the
    /// media type the base image reported.
    #[error("invalid base image media type")]
    Unsupported(String),
}

/// Failure of one build stage. The message names the stage and embeds the
/// cause; `source()` is empty.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to download base image: {cause}")]
    DownloadBaseImage { cause: RegistryError },

    #[error("failed to extract server binary: {cause}")]
    ExtractServerBinary { cause: BinaryError },

    #[error("failed to stat MCPFile: {cause}")]
    StatMcpFile {
        path: PathBuf,
        cause: std::io::Error,
    },

    #[error("failed to read MCPFile: {cause}")]
    ReadMcpFile {
        path: PathBuf,
        cause: std::io::Error,
    },

    #[error("failed to get media type for layers: {cause}")]
    LayerMediaType { cause: MediaTypeError },

    #[error(transparent)]
    Image(#[from] ImageError),
}
