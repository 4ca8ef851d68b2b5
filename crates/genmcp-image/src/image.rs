use crate::digest::sha256_digest;
use crate::error::ImageError;
use crate::layer::Layer;
use crate::manifest::{HistoryBuilder, ImageConfiguration, ImageManifest};
use crate::media_type::ManifestMediaType;

/// A container image: manifest, config, and the layers appended locally.
///
/// Base image layers are referenced by digest only; their bytes stay in the
/// registry the image was pulled from (see [`Image::source`]). Layers added
/// with [`Image::append_layers`] are held in memory until pushed.
#[derive(Debug)]
pub struct Image {
    raw_manifest: Vec<u8>,
    raw_config: Vec<u8>,
    media_type: Option<String>,
    source: Option<String>,
    layers: Vec<Layer>,
}

impl Image {
    /// Wrap raw manifest and config bytes. Nothing is parsed until queried.
    pub fn from_raw(raw_manifest: Vec<u8>, raw_config: Vec<u8>) -> Self {
        Self {
            raw_manifest,
            raw_config,
            media_type: None,
            source: None,
            layers: Vec::new(),
        }
    }

    /// Record the manifest media type the registry client resolved.
    /// Takes precedence over the manifest's own field.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Record the repository the base layers can be fetched from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Reference the base image was pulled from.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Schema of the manifest.
    pub fn media_type(&self) -> Result<ManifestMediaType, ImageError> {
        if let Some(media_type) = &self.media_type {
            return Ok(ManifestMediaType::parse(media_type));
        }
        let manifest = self.manifest()?;
        manifest
            .media_type()
            .as_ref()
            .map(|m| ManifestMediaType::parse(&m.to_string()))
            .ok_or(ImageError::MissingMediaType)
    }

    pub fn raw_manifest(&self) -> &[u8] {
        &self.raw_manifest
    }

    pub fn raw_config(&self) -> &[u8] {
        &self.raw_config
    }

    pub fn manifest(&self) -> Result<ImageManifest, ImageError> {
        serde_json::from_slice(&self.raw_manifest)
            .map_err(|e| ImageError::ManifestParse { source: e })
    }

    pub fn config(&self) -> Result<ImageConfiguration, ImageError> {
        serde_json::from_slice(&self.raw_config).map_err(|e| ImageError::ConfigParse { source: e })
    }

    /// Digest of the manifest, i.e. the image digest.
    pub fn digest(&self) -> String {
        sha256_digest(&self.raw_manifest)
    }

    pub fn config_digest(&self) -> String {
        sha256_digest(&self.raw_config)
    }

    /// Layers appended since the image was pulled, in order.
    pub fn appended_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Appended layer with the given digest, if any.
    pub fn layer_blob(&self, digest: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.digest() == digest)
    }

    /// Append `layers` on top of the existing ones.
    ///
    /// Updates manifest layer descriptors, config diff ids, and history
    /// (only when the base config records history, so the two stay aligned).
    pub fn append_layers(self, layers: Vec<Layer>) -> Result<Image, ImageError> {
        let mut manifest = self.manifest()?;
        let mut config = self.config()?;

        let mut descriptors = manifest.layers().clone();
        let mut rootfs = config.rootfs().clone();
        let mut diff_ids = rootfs.diff_ids().clone();
        let mut history = config.history().clone();
        let record_history = !history.is_empty();

        for layer in &layers {
            descriptors.push(layer.descriptor());
            diff_ids.push(layer.diff_id().to_owned());
            if record_history {
                let entry = HistoryBuilder::default()
                    .created_by(format!("genmcp: add {}", layer.path().display()))
                    .build()
                    .map_err(|e| ImageError::History { source: e })?;
                history.push(entry);
            }
        }

        manifest.set_layers(descriptors);
        rootfs.set_diff_ids(diff_ids);
        config.set_rootfs(rootfs);
        config.set_history(history);

        let mut image = self.rewrite(manifest, config)?;
        image.layers.extend(layers);
        Ok(image)
    }

    /// Apply `update` to the image config and rewrite the manifest to match.
    pub fn update_config(
        self,
        update: impl FnOnce(&mut ImageConfiguration),
    ) -> Result<Image, ImageError> {
        let manifest = self.manifest()?;
        let mut config = self.config()?;
        update(&mut config);
        self.rewrite(manifest, config)
    }

    fn rewrite(
        mut self,
        mut manifest: ImageManifest,
        config: ImageConfiguration,
    ) -> Result<Image, ImageError> {
        let raw_config = serde_json::to_vec(&config).map_err(|e| ImageError::Serialize {
            what: "config",
            source: e,
        })?;
        let mut descriptor = manifest.config().clone();
        descriptor.set_digest(sha256_digest(&raw_config));
        descriptor.set_size(raw_config.len() as i64);
        manifest.set_config(descriptor);

        self.raw_manifest = serde_json::to_vec(&manifest).map_err(|e| ImageError::Serialize {
            what: "manifest",
            source: e,
        })?;
        self.raw_config = raw_config;
        Ok(self)
    }
}
