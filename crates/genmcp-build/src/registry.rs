//! Registry-facing collaborators of the builder.

use genmcp_core::Platform;
use genmcp_image::Image;
use genmcp_registry::{RegistryBackend, RegistryClient, RegistryError};

/// Fetches a base image.
#[allow(async_fn_in_trait)]
pub trait ImageDownloader: Send + Sync {
    async fn download_image(&self, reference: &str, platform: &Platform) -> Result<Image, RegistryError>;
}

/// Writes a finished image to a registry reference.
#[allow(async_fn_in_trait)]
pub trait ImageSaver: Send + Sync {
    async fn save_image(&self, image: &Image, reference: &str) -> Result<(), RegistryError>;
}

impl<B: RegistryBackend> ImageDownloader for RegistryClient<B> {
    async fn download_image(&self, reference: &str, platform: &Platform) -> Result<Image, RegistryError> {
        self.pull(reference, platform).await
    }
}

impl<B: RegistryBackend> ImageSaver for RegistryClient<B> {
    async fn save_image(&self, image: &Image, reference: &str) -> Result<(), RegistryError> {
        self.push(image, reference).await
    }
}
