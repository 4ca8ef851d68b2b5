use std::io;
use std::path::{Path, PathBuf};

use genmcp_build::{
    BinaryError, BinaryProvider, BuildError, DistBinaryProvider, FileSystem, ImageBuilder,
    ImageDownloader, ImageSaver, MediaTypeError, OsFileSystem, layer_media_type,
};
use genmcp_core::{BuildOptions, DEFAULT_BASE_IMAGE, FileInfo, Platform};
use genmcp_image::media_type::{DOCKER_CONFIG, DOCKER_LAYER, DOCKER_MANIFEST, OCI_LAYER, OCI_MANIFEST};
use genmcp_image::{Image, ImageError, LayerMediaType};
use genmcp_registry::RegistryError;
use mockall::mock;

mock! {
    Fs {}

    impl FileSystem for Fs {
        fn stat(&self, path: &Path) -> io::Result<FileInfo>;
        fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    }
}

mock! {
    Binaries {}

    impl BinaryProvider for Binaries {
        fn extract_server_binary(
            &self,
            platform: &Platform,
        ) -> Result<(Vec<u8>, FileInfo), BinaryError>;
    }
}

mock! {
    Downloader {}

    impl ImageDownloader for Downloader {
        async fn download_image(
            &self,
            reference: &str,
            platform: &Platform,
        ) -> Result<Image, RegistryError>;
    }
}

mock! {
    Saver {}

    impl ImageSaver for Saver {
        async fn save_image(&self, image: &Image, reference: &str) -> Result<(), RegistryError>;
    }
}

fn raw_manifest(media_type: &str) -> Vec<u8> {
    format!(
        r#"{{
            "schemaVersion": 2,
            "mediaType": "{media_type}",
            "config": {{"mediaType": "{DOCKER_CONFIG}", "size": 1469, "digest": "sha256:test"}},
            "layers": []
        }}"#
    )
    .into_bytes()
}

fn raw_config() -> Vec<u8> {
    br#"{
        "architecture": "amd64",
        "os": "linux",
        "config": {
            "Env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],
            "User": "root",
            "Cmd": ["/bin/bash"]
        },
        "rootfs": {"type": "layers", "diff_ids": []}
    }"#
    .to_vec()
}

fn test_image(media_type: &str) -> Image {
    Image::from_raw(raw_manifest(media_type), raw_config())
}

fn linux_amd64() -> Platform {
    Platform::new("linux", "amd64")
}

type Builder = ImageBuilder<MockDownloader, MockSaver, MockBinaries, MockFs>;

fn builder(downloader: MockDownloader, binaries: MockBinaries, fs: MockFs) -> Builder {
    ImageBuilder::with_parts(downloader, MockSaver::new(), binaries, fs)
}

fn expect_mcp_file(fs: &mut MockFs, path: &'static str, data: &'static [u8]) {
    fs.expect_stat()
        .withf(move |p| p == Path::new(path))
        .times(1)
        .returning(move |_| Ok(FileInfo::new("mcpfile.yaml", data.len() as u64, 0o600)));
    fs.expect_read_file()
        .withf(move |p| p == Path::new(path))
        .times(1)
        .returning(move |_| Ok(data.to_vec()));
}

fn expect_binary(binaries: &mut MockBinaries, platform: Platform, name: &'static str) {
    binaries
        .expect_extract_server_binary()
        .withf(move |p| *p == platform)
        .times(1)
        .returning(move |_| {
            let data = b"fake-binary-data".to_vec();
            let info = FileInfo::new(name, data.len() as u64, 0o755);
            Ok((data, info))
        });
}

// ── Build ──

#[tokio::test]
async fn build_with_default_options() {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .withf(|reference, platform| reference == DEFAULT_BASE_IMAGE && *platform == linux_amd64())
        .times(1)
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));

    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, linux_amd64(), "genmcp-server");

    let mut fs = MockFs::new();
    expect_mcp_file(&mut fs, "/test/mcpfile.yaml", b"fake-mcp-file-data");

    let options = BuildOptions {
        image_tag: "test:latest".to_owned(),
        ..BuildOptions::new("/test/mcpfile.yaml")
    };
    let image = builder(downloader, binaries, fs).build(options).await.unwrap();

    let manifest = image.manifest().unwrap();
    assert_eq!(manifest.layers().len(), 2);
    assert!(manifest.layers().iter().all(|l| l.media_type().to_string() == DOCKER_LAYER));
    assert_eq!(image.media_type().unwrap().as_str(), DOCKER_MANIFEST);

    let paths: Vec<_> = image.appended_layers().iter().map(|l| l.path().to_path_buf()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/usr/local/bin/genmcp-server"),
            PathBuf::from("/etc/genmcp/mcpfile.yaml"),
        ]
    );

    let config = image.config().unwrap();
    assert_eq!(config.rootfs().diff_ids().len(), 2);
    let container = config.config().clone().unwrap();
    assert_eq!(
        container.entrypoint().clone(),
        Some(vec![
            "/usr/local/bin/genmcp-server".to_owned(),
            "--file".to_owned(),
            "/etc/genmcp/mcpfile.yaml".to_owned(),
        ])
    );
    assert_eq!(container.cmd(), &None);
    assert_eq!(container.user().as_deref(), Some("root"));
}

#[tokio::test]
async fn build_with_custom_platform() {
    let windows = Platform::new("windows", "amd64");

    let mut downloader = MockDownloader::new();
    let expected = windows.clone();
    downloader
        .expect_download_image()
        .withf(move |reference, platform| reference == "custom:base" && *platform == expected)
        .times(1)
        .returning(|_, _| Ok(test_image(OCI_MANIFEST)));

    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, windows.clone(), "genmcp-server.exe");

    let mut fs = MockFs::new();
    expect_mcp_file(&mut fs, "/custom/mcpfile.yaml", b"custom-mcp-data");

    let options = BuildOptions {
        platform: Some(windows),
        base_image: "custom:base".to_owned(),
        mcp_file_path: PathBuf::from("/custom/mcpfile.yaml"),
        image_tag: "custom:tag".to_owned(),
    };
    let image = builder(downloader, binaries, fs).build(options).await.unwrap();

    let manifest = image.manifest().unwrap();
    assert_eq!(manifest.layers().len(), 2);
    assert!(manifest.layers().iter().all(|l| l.media_type().to_string() == OCI_LAYER));
    assert_eq!(
        image.appended_layers()[0].path(),
        Path::new("/usr/local/bin/genmcp-server.exe")
    );
}

// Later collaborators carry no expectations: reaching them would panic.

#[tokio::test]
async fn download_failure_stops_the_build() {
    let mut downloader = MockDownloader::new();
    downloader.expect_download_image().times(1).returning(|_, _| {
        Err(RegistryError::PlatformNotFound {
            platform: Platform::new("linux", "amd64"),
            reference: "registry.access.redhat.com/ubi9/ubi-minimal:latest".to_owned(),
        })
    });

    let err = builder(downloader, MockBinaries::new(), MockFs::new())
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::DownloadBaseImage { .. }));
    assert_eq!(
        err.to_string(),
        "failed to download base image: no manifest for platform linux/amd64 in registry.access.redhat.com/ubi9/ubi-minimal:latest"
    );
    // The cause is printed once, in the message.
    assert!(std::error::Error::source(&err).is_none());
}

#[tokio::test]
async fn binary_failure_stops_the_build() {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));

    let mut binaries = MockBinaries::new();
    binaries.expect_extract_server_binary().times(1).returning(|platform| {
        Err(BinaryError::NotFound {
            platform: platform.clone(),
            path: PathBuf::from("/dist/genmcp-server-linux-amd64"),
        })
    });

    let err = builder(downloader, binaries, MockFs::new())
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "failed to extract server binary: no server binary for linux/amd64: /dist/genmcp-server-linux-amd64 does not exist"
    );
}

#[tokio::test]
async fn stat_failure_stops_the_build() {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));
    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, linux_amd64(), "genmcp-server");

    let mut fs = MockFs::new();
    fs.expect_stat()
        .times(1)
        .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "file not found")));

    let err = builder(downloader, binaries, fs)
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "failed to stat MCPFile: file not found");
    match err {
        BuildError::StatMcpFile { path, cause } => {
            assert_eq!(path, Path::new("/test/mcpfile.yaml"));
            assert_eq!(cause.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("expected StatMcpFile, got {other:?}"),
    }
}

#[tokio::test]
async fn read_failure_stops_the_build() {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));
    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, linux_amd64(), "genmcp-server");

    let mut fs = MockFs::new();
    fs.expect_stat()
        .returning(|_| Ok(FileInfo::new("mcpfile.yaml", 100, 0o644)));
    fs.expect_read_file()
        .times(1)
        .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied")));

    let err = builder(downloader, binaries, fs)
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::ReadMcpFile { .. }));
    assert_eq!(err.to_string(), "failed to read MCPFile: permission denied");
}

#[tokio::test]
async fn unsupported_media_type_stops_the_build() {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image("application/vnd.unsupported")));
    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, linux_amd64(), "genmcp-server");
    let mut fs = MockFs::new();
    expect_mcp_file(&mut fs, "/test/mcpfile.yaml", b"fake-mcp-file-data");

    let err = builder(downloader, binaries, fs)
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert!(
        err.to_string()
            .contains("failed to get media type for layers: invalid base image media type")
    );
}

#[tokio::test]
async fn media_type_query_failure_is_reported_as_layer_media_type() {
    let manifest =
        br#"{"schemaVersion": 2, "config": {"mediaType": "x", "size": 1, "digest": "sha256:c"}, "layers": []}"#;
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(move |_, _| Ok(Image::from_raw(manifest.to_vec(), raw_config())));
    let mut binaries = MockBinaries::new();
    expect_binary(&mut binaries, linux_amd64(), "genmcp-server");
    let mut fs = MockFs::new();
    expect_mcp_file(&mut fs, "/test/mcpfile.yaml", b"data");

    let err = builder(downloader, binaries, fs)
        .build(BuildOptions::new("/test/mcpfile.yaml"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::LayerMediaType {
            cause: MediaTypeError::Query(ImageError::MissingMediaType)
        }
    ));
}

// ── Layer media type ──

#[test]
fn layer_media_type_follows_manifest_schema() {
    assert_eq!(
        layer_media_type(&test_image(OCI_MANIFEST)).unwrap(),
        LayerMediaType::Oci
    );
    assert_eq!(
        layer_media_type(&test_image(DOCKER_MANIFEST)).unwrap(),
        LayerMediaType::Docker
    );
}

#[test]
fn layer_media_type_rejects_other_schemas() {
    let err = layer_media_type(&test_image("application/vnd.unsupported")).unwrap_err();
    assert_eq!(err.to_string(), "invalid base image media type");
    match err {
        MediaTypeError::Unsupported(media_type) => {
            assert_eq!(media_type, "application/vnd.unsupported");
        }
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[test]
fn layer_media_type_propagates_query_error_unwrapped() {
    let image = Image::from_raw(b"not json".to_vec(), raw_config());
    let expected = image.media_type().unwrap_err().to_string();

    let err = layer_media_type(&image).unwrap_err();
    assert!(matches!(err, MediaTypeError::Query(ImageError::ManifestParse { .. })));
    assert_eq!(err.to_string(), expected);
}

#[test]
fn registry_reported_media_type_wins() {
    let image = test_image("application/vnd.unsupported").with_media_type(OCI_MANIFEST);
    assert_eq!(layer_media_type(&image).unwrap(), LayerMediaType::Oci);
}

// ── Save ──

#[tokio::test]
async fn save_delegates_to_saver() {
    let mut saver = MockSaver::new();
    saver
        .expect_save_image()
        .withf(|_, reference| reference == "registry.example.com/app:v1")
        .times(1)
        .returning(|_, _| Ok(()));

    let builder = ImageBuilder::with_parts(MockDownloader::new(), saver, MockBinaries::new(), MockFs::new());
    let result = builder
        .save(&test_image(DOCKER_MANIFEST), "registry.example.com/app:v1")
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn save_returns_saver_error_unchanged() {
    let mut saver = MockSaver::new();
    saver.expect_save_image().times(1).returning(|_, _| {
        Err(RegistryError::Timeout {
            operation: "push manifest to",
            reference: "registry.example.com/app:v1".to_owned(),
            seconds: 300,
        })
    });

    let builder = ImageBuilder::with_parts(MockDownloader::new(), saver, MockBinaries::new(), MockFs::new());
    let err = builder
        .save(&test_image(DOCKER_MANIFEST), "registry.example.com/app:v1")
        .await
        .unwrap_err();

    match err {
        RegistryError::Timeout {
            operation, seconds, ..
        } => {
            assert_eq!(operation, "push manifest to");
            assert_eq!(seconds, 300);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

// ── Production collaborators ──

#[test]
fn dist_provider_reads_platform_binary() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("genmcp-server-linux-arm64"), b"arm binary").unwrap();
    std::fs::write(dir.path().join("genmcp-server-windows-amd64.exe"), b"windows binary").unwrap();
    let provider = DistBinaryProvider::new(dir.path());

    let (data, info) = provider
        .extract_server_binary(&Platform::new("linux", "arm64"))
        .unwrap();
    assert_eq!(data, b"arm binary");
    assert_eq!(info, FileInfo::new("genmcp-server", 10, 0o755));

    let (data, info) = provider
        .extract_server_binary(&Platform::new("windows", "amd64"))
        .unwrap();
    assert_eq!(data, b"windows binary");
    assert_eq!(info.name, "genmcp-server.exe");
}

#[test]
fn dist_provider_reports_missing_binary() {
    let dir = tempfile::tempdir().unwrap();
    let provider = DistBinaryProvider::new(dir.path());

    let err = provider.extract_server_binary(&linux_amd64()).unwrap_err();
    match err {
        BinaryError::NotFound { platform, path } => {
            assert_eq!(platform, linux_amd64());
            assert_eq!(path, dir.path().join("genmcp-server-linux-amd64"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn os_file_system_stat_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcpfile.yaml");
    std::fs::write(&path, b"tools: []").unwrap();

    let info = OsFileSystem.stat(&path).unwrap();
    assert_eq!(info.name, "mcpfile.yaml");
    assert_eq!(info.size, 9);
    assert_eq!(OsFileSystem.read_file(&path).unwrap(), b"tools: []");
}

#[test]
fn os_file_system_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = OsFileSystem.stat(&dir.path().join("missing.yaml")).unwrap_err();
    assert_eq!(missing.kind(), io::ErrorKind::NotFound);
}

#[test]
fn os_file_system_stats_directories_but_cannot_read_them() {
    let dir = tempfile::tempdir().unwrap();

    let info = OsFileSystem.stat(dir.path()).unwrap();
    assert!(!info.name.is_empty());
    assert!(OsFileSystem.read_file(dir.path()).is_err());
}

#[tokio::test]
async fn mcp_file_directory_fails_on_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("genmcp-server-linux-amd64"), b"server").unwrap();
    let mcp_dir = dir.path().join("mcpfile.yaml");
    std::fs::create_dir(&mcp_dir).unwrap();

    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));

    let builder = ImageBuilder::with_parts(
        downloader,
        MockSaver::new(),
        DistBinaryProvider::new(dir.path()),
        OsFileSystem,
    );
    let err = builder.build(BuildOptions::new(&mcp_dir)).await.unwrap_err();

    assert!(matches!(err, BuildError::ReadMcpFile { .. }));
    assert!(err.to_string().starts_with("failed to read MCPFile: "));
}

#[tokio::test]
async fn build_with_local_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("genmcp-server-linux-amd64"), b"server").unwrap();
    let mcp_file = dir.path().join("mcpfile.yaml");
    std::fs::write(&mcp_file, b"mcpFileVersion: 0.1.0").unwrap();

    let mut downloader = MockDownloader::new();
    downloader
        .expect_download_image()
        .returning(|_, _| Ok(test_image(DOCKER_MANIFEST)));

    let builder = ImageBuilder::with_parts(
        downloader,
        MockSaver::new(),
        DistBinaryProvider::new(dir.path()),
        OsFileSystem,
    );
    let image = builder.build(BuildOptions::new(&mcp_file)).await.unwrap();

    let layers = image.appended_layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1].path(), Path::new("/etc/genmcp/mcpfile.yaml"));
}
