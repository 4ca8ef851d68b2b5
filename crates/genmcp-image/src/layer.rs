use std::io::Write;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::digest::sha256_digest;
use crate::error::ImageError;
use crate::manifest::{Descriptor, MediaType};
use crate::media_type::LayerMediaType;

/// A gzip compressed layer holding a single file.
///
/// Entries carry uid/gid 0 and a zero mtime so identical input always
/// yields the same digest.
#[derive(Debug, Clone)]
pub struct Layer {
    data: Vec<u8>,
    digest: String,
    diff_id: String,
    media_type: LayerMediaType,
    path: PathBuf,
}

impl Layer {
    /// Build a layer that places `contents` at `path` inside the image.
    pub fn from_file(
        path: impl Into<PathBuf>,
        contents: &[u8],
        mode: u32,
        media_type: LayerMediaType,
    ) -> Result<Self, ImageError> {
        let path = path.into();
        let archive_err = |source| ImageError::LayerArchive {
            path: path.clone(),
            source,
        };

        // Archive entries are relative to the image root
        let entry_name: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::RootDir))
            .collect();

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(mode);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(0);

        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append_data(&mut header, &entry_name, contents)
            .map_err(archive_err)?;
        let tarball = builder.into_inner().map_err(archive_err)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tarball).map_err(archive_err)?;
        let data = encoder.finish().map_err(archive_err)?;

        let layer = Self {
            digest: sha256_digest(&data),
            diff_id: sha256_digest(&tarball),
            data,
            media_type,
            path,
        };
        tracing::debug!(
            path = %layer.path.display(),
            digest = %layer.digest,
            size = layer.data.len(),
            "created layer"
        );
        Ok(layer)
    }

    /// Compressed layer bytes, as uploaded to a registry.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Digest of the compressed bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Digest of the uncompressed tar stream.
    pub fn diff_id(&self) -> &str {
        &self.diff_id
    }

    pub fn media_type(&self) -> LayerMediaType {
        self.media_type
    }

    /// Absolute path of the file inside the image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            MediaType::from(self.media_type.as_str()),
            self.data.len() as i64,
            self.digest.clone(),
        )
    }
}
