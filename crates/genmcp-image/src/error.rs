use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to parse image manifest")]
    ManifestParse { source: serde_json::Error },

    #[error("failed to parse image config")]
    ConfigParse { source: serde_json::Error },

    #[error("failed to serialize image {what}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to build image history entry")]
    History { source: oci_spec::OciSpecError },

    #[error("image manifest does not declare a media type")]
    MissingMediaType,

    #[error("failed to write layer archive for {path}")]
    LayerArchive {
        path: PathBuf,
        source: std::io::Error,
    },
}
