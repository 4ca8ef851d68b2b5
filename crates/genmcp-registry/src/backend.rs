//! The registry operations the client is built from.

use genmcp_core::RegistryConfig;
use genmcp_image::media_type::{DOCKER_MANIFEST, DOCKER_MANIFEST_LIST, OCI_INDEX, OCI_MANIFEST};
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::errors::OciDistributionError;
use oci_distribution::manifest::OciDescriptor;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference, RegistryOperation};

/// Manifest and index types accepted on pull, most specific first.
const MANIFEST_ACCEPT: [&str; 4] = [OCI_MANIFEST, DOCKER_MANIFEST, OCI_INDEX, DOCKER_MANIFEST_LIST];

/// Distribution API calls against one registry.
///
/// Production: [`oci_distribution::Client`]. Tests substitute mocks.
#[allow(async_fn_in_trait)]
pub trait RegistryBackend: Send + Sync {
    /// Obtain the token for `operation` on the repository of `reference`.
    async fn authenticate(
        &self,
        reference: &Reference,
        auth: &RegistryAuth,
        operation: RegistryOperation,
    ) -> Result<(), OciDistributionError>;

    /// Raw manifest or index bytes for `reference`.
    async fn pull_manifest(
        &self,
        reference: &Reference,
        auth: &RegistryAuth,
    ) -> Result<Vec<u8>, OciDistributionError>;

    async fn pull_blob(&self, reference: &Reference, digest: &str) -> Result<Vec<u8>, OciDistributionError>;

    async fn push_blob(
        &self,
        reference: &Reference,
        data: &[u8],
        digest: &str,
    ) -> Result<(), OciDistributionError>;

    /// Cross-repository mount of `digest` from `source` into `target`.
    /// Fails when the registry declines and wants an upload instead.
    async fn mount_blob(
        &self,
        target: &Reference,
        source: &Reference,
        digest: &str,
    ) -> Result<(), OciDistributionError>;

    /// PUT `manifest` as is, with `media_type` as its content type.
    async fn push_manifest(
        &self,
        reference: &Reference,
        manifest: &[u8],
        media_type: &str,
    ) -> Result<(), OciDistributionError>;
}

/// Client settings for `config`: HTTPS except for the listed insecure hosts.
pub fn client_config(config: &RegistryConfig) -> ClientConfig {
    let protocol = if config.insecure_registries.is_empty() {
        ClientProtocol::Https
    } else {
        ClientProtocol::HttpsExcept(config.insecure_registries.clone())
    };
    ClientConfig {
        protocol,
        ..Default::default()
    }
}

impl RegistryBackend for Client {
    async fn authenticate(
        &self,
        reference: &Reference,
        auth: &RegistryAuth,
        operation: RegistryOperation,
    ) -> Result<(), OciDistributionError> {
        self.auth(reference, auth, operation).await?;
        Ok(())
    }

    async fn pull_manifest(
        &self,
        reference: &Reference,
        auth: &RegistryAuth,
    ) -> Result<Vec<u8>, OciDistributionError> {
        let (manifest, digest) = self
            .pull_manifest_raw(reference, auth, &MANIFEST_ACCEPT)
            .await?;
        tracing::debug!(reference = %reference, %digest, size = manifest.len(), "fetched manifest");
        Ok(manifest)
    }

    async fn pull_blob(&self, reference: &Reference, digest: &str) -> Result<Vec<u8>, OciDistributionError> {
        let descriptor = OciDescriptor {
            digest: digest.to_owned(),
            ..Default::default()
        };
        let mut data = Vec::new();
        Client::pull_blob(self, reference, &descriptor, &mut data).await?;
        Ok(data)
    }

    async fn push_blob(
        &self,
        reference: &Reference,
        data: &[u8],
        digest: &str,
    ) -> Result<(), OciDistributionError> {
        let location = Client::push_blob(self, reference, data, digest).await?;
        tracing::debug!(digest, size = data.len(), %location, "uploaded blob");
        Ok(())
    }

    async fn mount_blob(
        &self,
        target: &Reference,
        source: &Reference,
        digest: &str,
    ) -> Result<(), OciDistributionError> {
        Client::mount_blob(self, target, source, digest).await
    }

    async fn push_manifest(
        &self,
        reference: &Reference,
        manifest: &[u8],
        media_type: &str,
    ) -> Result<(), OciDistributionError> {
        let content_type = media_type.parse().map_err(|e| {
            OciDistributionError::GenericError(Some(format!(
                "invalid manifest media type {media_type:?}: {e}"
            )))
        })?;
        let url = self
            .push_manifest_raw(reference, manifest.to_vec(), content_type)
            .await?;
        tracing::debug!(%url, "pushed manifest");
        Ok(())
    }
}
