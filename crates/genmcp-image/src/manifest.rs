//! Manifest, index, and config documents.
//!
//! The OCI image spec types read Docker v2 schema 2 documents as well; Docker
//! media types deserialize as `MediaType::Other` and are written back
//! unchanged.

use genmcp_core::Platform;

pub use oci_spec::image::{
    Config as ContainerConfig, Descriptor, History, HistoryBuilder, ImageConfiguration,
    ImageIndex, ImageManifest, MediaType, RootFs,
};

/// First manifest in `index` whose platform satisfies `platform`.
///
/// Entries without a platform (attestations, artifacts) never match.
pub fn find_manifest<'a>(index: &'a ImageIndex, platform: &Platform) -> Option<&'a Descriptor> {
    index.manifests().iter().find(|entry| {
        entry
            .platform()
            .as_ref()
            .is_some_and(|p| platform.matches(&to_platform(p)))
    })
}

/// Platform of an index entry.
pub fn to_platform(platform: &oci_spec::image::Platform) -> Platform {
    Platform {
        os: platform.os().to_string(),
        architecture: platform.architecture().to_string(),
        variant: platform.variant().clone(),
    }
}
