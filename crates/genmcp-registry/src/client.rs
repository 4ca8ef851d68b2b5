use std::future::Future;
use std::time::Duration;

use genmcp_core::{Platform, RegistryConfig};
use genmcp_image::digest::sha256_digest;
use genmcp_image::media_type::{OCI_MANIFEST, is_index};
use genmcp_image::{Image, ImageIndex, ImageManifest, find_manifest};
use oci_distribution::errors::OciDistributionError;
use oci_distribution::{Client, Reference, RegistryOperation};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::auth::CredentialStore;
use crate::backend::{RegistryBackend, client_config};
use crate::error::RegistryError;
use crate::reference::{parse_reference, same_registry, same_repository, with_digest};

/// Registry client, parameterized over the backend for testability.
///
/// Holds no per-image state: every [`pull`](Self::pull) and
/// [`push`](Self::push) authenticates on its own.
#[derive(Clone)]
pub struct RegistryClient<B: RegistryBackend = Client> {
    backend: B,
    credentials: CredentialStore,
    timeout: Duration,
}

impl RegistryClient<Client> {
    /// Distribution client with the configured protocol, timeout and
    /// docker credentials.
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let credentials = CredentialStore::from_config(config)?;
        Ok(Self::with_backend(Client::new(client_config(config)))
            .with_credentials(credentials)
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }
}

impl<B: RegistryBackend> RegistryClient<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            credentials: CredentialStore::default(),
            timeout: Duration::from_secs(RegistryConfig::default().timeout_secs),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = credentials;
        self
    }

    /// Limit for each registry call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // ── Pull ──

    /// Fetch the manifest and config of `reference` for `platform`.
    ///
    /// Multi-platform indexes are resolved to the matching manifest. Layer
    /// blobs are not downloaded; the returned image records its source so a
    /// push can mount or copy them later.
    pub async fn pull(&self, reference: &str, platform: &Platform) -> Result<Image, RegistryError> {
        let reference = parse_reference(reference)?;
        let auth = self.credentials.auth_for(&reference);
        self.call(
            "authenticate to",
            &reference,
            self.backend
                .authenticate(&reference, &auth, RegistryOperation::Pull),
        )
        .await?;

        let mut raw_manifest = self
            .call(
                "pull manifest",
                &reference,
                self.backend.pull_manifest(&reference, &auth),
            )
            .await?;
        let mut declared = Declared::parse(&raw_manifest);

        if declared.is_index() {
            let index: ImageIndex =
                serde_json::from_slice(&raw_manifest).map_err(|e| RegistryError::Malformed {
                    what: "image index",
                    source: e,
                })?;
            let digest = find_manifest(&index, platform)
                .map(|entry| entry.digest().clone())
                .ok_or_else(|| RegistryError::PlatformNotFound {
                    platform: platform.clone(),
                    reference: reference.whole(),
                })?;
            tracing::debug!(%digest, %platform, "selected platform manifest from index");

            let pinned = with_digest(&reference, &digest);
            raw_manifest = self
                .call(
                    "pull manifest",
                    &pinned,
                    self.backend.pull_manifest(&pinned, &auth),
                )
                .await?;
            verify_digest(&digest, &raw_manifest)?;
            declared = Declared::parse(&raw_manifest);
        }

        let manifest: ImageManifest =
            serde_json::from_slice(&raw_manifest).map_err(|e| RegistryError::Malformed {
                what: "image manifest",
                source: e,
            })?;
        let config_digest = manifest.config().digest();
        let raw_config = self
            .call(
                "pull config of",
                &reference,
                self.backend.pull_blob(&reference, config_digest),
            )
            .await?;
        verify_digest(config_digest, &raw_config)?;

        // Docker v2 manifests always declare their type; an image manifest
        // without one is OCI.
        let media_type = declared.media_type.unwrap_or_else(|| OCI_MANIFEST.to_owned());
        tracing::info!(
            reference = %reference,
            media_type = %media_type,
            layers = manifest.layers().len(),
            "pulled image"
        );

        Ok(Image::from_raw(raw_manifest, raw_config)
            .with_media_type(media_type)
            .with_source(reference.whole()))
    }

    // ── Push ──

    /// Upload the blobs `image` references and tag its manifest as `reference`.
    ///
    /// Appended layers are uploaded. Base layers are skipped when the target
    /// is the base image's own repository, mounted when it lives on the same
    /// registry, and copied from the source registry otherwise.
    pub async fn push(&self, image: &Image, reference: &str) -> Result<(), RegistryError> {
        let target = parse_reference(reference)?;
        let manifest = image.manifest()?;
        let media_type = image.media_type()?;
        let source = image.source().map(parse_reference).transpose()?;

        self.call(
            "authenticate to",
            &target,
            self.backend.authenticate(
                &target,
                &self.credentials.auth_for(&target),
                RegistryOperation::Push,
            ),
        )
        .await?;
        let mut source_authenticated = false;

        for descriptor in manifest.layers() {
            let digest = descriptor.digest().as_str();

            if let Some(layer) = image.layer_blob(digest) {
                self.upload(&target, layer.data(), digest).await?;
                continue;
            }

            let source = source
                .as_ref()
                .ok_or_else(|| RegistryError::MissingBlobSource {
                    digest: digest.to_owned(),
                })?;
            if same_repository(source, &target) {
                tracing::debug!(digest, "layer already in target repository");
                continue;
            }
            if same_registry(source, &target) && self.mount(&target, source, digest).await {
                continue;
            }

            if !source_authenticated {
                self.call(
                    "authenticate to",
                    source,
                    self.backend.authenticate(
                        source,
                        &self.credentials.auth_for(source),
                        RegistryOperation::Pull,
                    ),
                )
                .await?;
                source_authenticated = true;
            }
            let data = self
                .call("pull layer of", source, self.backend.pull_blob(source, digest))
                .await?;
            verify_digest(digest, &data)?;
            self.upload(&target, &data, digest).await?;
        }

        let config_digest = manifest.config().digest().as_str();
        self.upload(&target, image.raw_config(), config_digest).await?;

        self.call(
            "push manifest to",
            &target,
            self.backend
                .push_manifest(&target, image.raw_manifest(), media_type.as_str()),
        )
        .await?;

        tracing::info!(reference = %target, digest = %image.digest(), "pushed image");
        Ok(())
    }

    async fn upload(&self, target: &Reference, data: &[u8], digest: &str) -> Result<(), RegistryError> {
        self.call(
            "push blob to",
            target,
            self.backend.push_blob(target, data, digest),
        )
        .await
    }

    /// Mount `digest` from `source`. `false` when the registry wants an
    /// upload instead.
    async fn mount(&self, target: &Reference, source: &Reference, digest: &str) -> bool {
        let result = self
            .call(
                "mount blob into",
                target,
                self.backend.mount_blob(target, source, digest),
            )
            .await;
        match result {
            Ok(()) => {
                tracing::debug!(digest, from = %source.repository(), "mounted blob");
                true
            }
            Err(e) => {
                tracing::debug!(digest, error = %e, "mount declined, copying blob");
                false
            }
        }
    }

    /// Run one backend call under the client timeout.
    async fn call<R>(
        &self,
        operation: &'static str,
        reference: &Reference,
        request: impl Future<Output = Result<R, OciDistributionError>>,
    ) -> Result<R, RegistryError> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result.map_err(|e| RegistryError::Distribution {
                operation,
                reference: reference.whole(),
                cause: e,
            }),
            Err(elapsed) => {
                tracing::warn!(operation, reference = %reference, %elapsed, "registry call timed out");
                Err(RegistryError::Timeout {
                    operation,
                    reference: reference.whole(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// What a manifest body says about itself.
#[derive(Deserialize)]
struct Declared {
    #[serde(rename = "mediaType")]
    media_type: Option<String>,
    manifests: Option<IgnoredAny>,
}

impl Declared {
    fn parse(raw: &[u8]) -> Self {
        serde_json::from_slice(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "manifest body is not a JSON object");
            Self {
                media_type: None,
                manifests: None,
            }
        })
    }

    /// Indexes may omit `mediaType`; a `manifests` array identifies them.
    fn is_index(&self) -> bool {
        match &self.media_type {
            Some(media_type) => is_index(media_type),
            None => self.manifests.is_some(),
        }
    }
}

/// Check `data` against `expected`. Only sha256 digests are accepted.
fn verify_digest(expected: &str, data: &[u8]) -> Result<(), RegistryError> {
    if !expected.starts_with("sha256:") {
        return Err(RegistryError::UnsupportedDigest {
            digest: expected.to_owned(),
        });
    }
    let actual = sha256_digest(data);
    if actual == expected {
        Ok(())
    } else {
        Err(RegistryError::DigestMismatch {
            expected: expected.to_owned(),
            actual,
        })
    }
}
