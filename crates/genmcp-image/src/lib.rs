//! In-memory container images for genmcp builds.
//!
//! An [`Image`] is a move-only handle around a registry manifest and config.
//! The builder reads its manifest media type, then extends it with
//! [`Layer`]s via [`Image::append_layers`], the only mutation surface.
//!
//! # Schemas
//!
//! ```text
//! manifest media type                                     layer media type
//! application/vnd.oci.image.manifest.v1+json          ->  application/vnd.oci.image.layer.v1.tar+gzip
//! application/vnd.docker.distribution.manifest.v2+json -> application/vnd.docker.image.rootfs.diff.tar.gzip
//! anything else                                       ->  rejected
//! ```

pub mod digest;
pub mod error;
pub mod image;
pub mod layer;
pub mod manifest;
pub mod media_type;
pub mod reference;

pub use error::ImageError;
pub use image::Image;
pub use layer::Layer;
pub use manifest::{
    ContainerConfig, Descriptor, ImageConfiguration, ImageIndex, ImageManifest, find_manifest,
};
pub use media_type::{LayerMediaType, ManifestMediaType};
pub use reference::extract_tag;
