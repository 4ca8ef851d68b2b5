use std::path::Path;

use genmcp_core::{BuildOptions, FileInfo, Platform, ResolvedOptions};
use genmcp_image::{Image, Layer, LayerMediaType, ManifestMediaType};
use genmcp_registry::{RegistryClient, RegistryError};

use crate::error::{BuildError, MediaTypeError};
use crate::provider::{BinaryProvider, DistBinaryProvider, FileSystem, OsFileSystem};
use crate::registry::{ImageDownloader, ImageSaver};

/// Directory the server binary is placed in.
pub const BINARY_DIR: &str = "/usr/local/bin";
/// Directory the MCP file is placed in.
pub const MCP_FILE_DIR: &str = "/etc/genmcp";
const MCP_FILE_MODE: u32 = 0o644;

/// Builds genmcp server images from a base image, the server binary and an
/// MCP file.
///
/// Holds only its collaborators; concurrent builds share no state.
#[derive(Debug, Clone)]
pub struct ImageBuilder<
    D = RegistryClient,
    S = RegistryClient,
    B = DistBinaryProvider,
    F = OsFileSystem,
> {
    downloader: D,
    saver: S,
    binaries: B,
    fs: F,
}

impl ImageBuilder {
    /// Builder pulling and pushing through `client`, with binaries from
    /// `binaries` and the MCP file from the local filesystem.
    pub fn new(client: RegistryClient, binaries: DistBinaryProvider) -> Self {
        Self {
            downloader: client.clone(),
            saver: client,
            binaries,
            fs: OsFileSystem,
        }
    }
}

impl<D, S, B, F> ImageBuilder<D, S, B, F>
where
    D: ImageDownloader,
    S: ImageSaver,
    B: BinaryProvider,
    F: FileSystem,
{
    pub fn with_parts(downloader: D, saver: S, binaries: B, fs: F) -> Self {
        Self {
            downloader,
            saver,
            binaries,
            fs,
        }
    }

    /// Build an image for `options`.
    ///
    /// Unset options are defaulted first. The steps run in order and the
    /// first failure is returned; no image is produced on error.
    pub async fn build(&self, options: BuildOptions) -> Result<Image, BuildError> {
        let options = options.resolve();
        tracing::info!(
            base_image = %options.base_image,
            platform = %options.platform,
            mcp_file = %options.mcp_file_path.display(),
            "building image"
        );

        let result = self.run(&options).await;
        match &result {
            Ok(image) => tracing::info!(digest = %image.digest(), "built image"),
            Err(e) => tracing::warn!(error = %e, "build failed"),
        }
        result
    }

    /// Push `image` to `reference`. Registry errors are returned as is.
    pub async fn save(&self, image: &Image, reference: &str) -> Result<(), RegistryError> {
        tracing::info!(reference, "saving image");
        self.saver.save_image(image, reference).await
    }

    async fn run(&self, options: &ResolvedOptions) -> Result<Image, BuildError> {
        let base = self.download_base_image(options).await?;
        let (binary, binary_info) = self.extract_server_binary(&options.platform)?;
        let mcp_info = self.stat_mcp_file(&options.mcp_file_path)?;
        let mcp_file = self.read_mcp_file(&options.mcp_file_path)?;
        let media_type =
            layer_media_type(&base).map_err(|e| BuildError::LayerMediaType { cause: e })?;

        assemble(
            base,
            media_type,
            (binary.as_slice(), &binary_info),
            (mcp_file.as_slice(), &mcp_info),
        )
    }

    async fn download_base_image(&self, options: &ResolvedOptions) -> Result<Image, BuildError> {
        tracing::debug!(base_image = %options.base_image, "downloading base image");
        self.downloader
            .download_image(&options.base_image, &options.platform)
            .await
            .map_err(|e| BuildError::DownloadBaseImage { cause: e })
    }

    fn extract_server_binary(&self, platform: &Platform) -> Result<(Vec<u8>, FileInfo), BuildError> {
        tracing::debug!(%platform, "extracting server binary");
        self.binaries
            .extract_server_binary(platform)
            .map_err(|e| BuildError::ExtractServerBinary { cause: e })
    }

    fn stat_mcp_file(&self, path: &Path) -> Result<FileInfo, BuildError> {
        self.fs.stat(path).map_err(|e| BuildError::StatMcpFile {
            path: path.to_path_buf(),
            cause: e,
        })
    }

    fn read_mcp_file(&self, path: &Path) -> Result<Vec<u8>, BuildError> {
        self.fs.read_file(path).map_err(|e| BuildError::ReadMcpFile {
            path: path.to_path_buf(),
            cause: e,
        })
    }
}

/// Layer media type matching the manifest schema of `image`.
///
/// OCI manifests take OCI layers and Docker v2 manifests take Docker layers;
/// any other schema is rejected.
pub fn layer_media_type(image: &Image) -> Result<LayerMediaType, MediaTypeError> {
    match image.media_type()? {
        ManifestMediaType::Oci => Ok(LayerMediaType::Oci),
        ManifestMediaType::Docker => Ok(LayerMediaType::Docker),
        ManifestMediaType::Unsupported(other) => Err(MediaTypeError::Unsupported(other)),
    }
}

/// Append the binary and MCP file layers and point the entrypoint at them.
fn assemble(
    base: Image,
    media_type: LayerMediaType,
    (binary, binary_info): (&[u8], &FileInfo),
    (mcp_file, mcp_info): (&[u8], &FileInfo),
) -> Result<Image, BuildError> {
    let binary_path = format!("{BINARY_DIR}/{}", binary_info.name);
    let mcp_path = format!("{MCP_FILE_DIR}/{}", mcp_info.name);

    let layers = vec![
        Layer::from_file(&binary_path, binary, binary_info.mode, media_type)?,
        Layer::from_file(&mcp_path, mcp_file, MCP_FILE_MODE, media_type)?,
    ];
    tracing::debug!(%media_type, binary = %binary_path, mcp_file = %mcp_path, "appending layers");

    let image = base.append_layers(layers)?.update_config(|config| {
        let mut container = config.config().clone().unwrap_or_default();
        container.set_entrypoint(Some(vec![binary_path, "--file".to_owned(), mcp_path]));
        container.set_cmd(None);
        config.set_config(Some(container));
    })?;
    Ok(image)
}
