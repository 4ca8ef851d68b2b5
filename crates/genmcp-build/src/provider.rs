//! Local inputs of a build: the MCP file and the prebuilt server binary.

use std::io;
use std::path::{Path, PathBuf};

use genmcp_core::{BuildConfig, FileInfo, Platform};

use crate::error::BinaryError;

/// Name of the server executable inside the image.
pub const SERVER_BINARY_NAME: &str = "genmcp-server";

/// Read access to the local filesystem.
pub trait FileSystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileInfo>;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Source of the platform-specific server executable.
pub trait BinaryProvider: Send + Sync {
    /// Executable bytes for `platform`, with the name and mode it should
    /// have inside the image.
    fn extract_server_binary(&self, platform: &Platform) -> Result<(Vec<u8>, FileInfo), BinaryError>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    /// Metadata of any existing entry, directories included. Reading a
    /// directory fails later in [`read_file`](Self::read_file).
    fn stat(&self, path: &Path) -> io::Result<FileInfo> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FileInfo::new(name, metadata.len(), file_mode(&metadata)))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Server binaries shipped alongside genmcp.
///
/// The distribution directory holds one executable per platform, named
/// `genmcp-server-<os>-<arch>` (`.exe` on Windows):
///
/// ```text
/// dist/
///   genmcp                      the CLI itself
///   genmcp-server-linux-amd64
///   genmcp-server-linux-arm64
///   genmcp-server-windows-amd64.exe
/// ```
#[derive(Debug, Clone)]
pub struct DistBinaryProvider {
    dir: PathBuf,
}

impl DistBinaryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Binaries in the directory of the running executable.
    pub fn next_to_executable() -> Result<Self, BinaryError> {
        let exe = std::env::current_exe().map_err(|e| BinaryError::NoExecutableDir { source: e })?;
        let dir = exe.parent().ok_or_else(|| BinaryError::NoExecutableDir {
            source: io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"),
        })?;
        Ok(Self::new(dir))
    }

    /// `binaries_dir` from `genmcp.toml`, falling back to the executable's directory.
    pub fn from_config(config: &BuildConfig) -> Result<Self, BinaryError> {
        match &config.binaries_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::next_to_executable(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the binary for `platform` in the distribution directory.
    pub fn binary_path(&self, platform: &Platform) -> PathBuf {
        self.dir.join(format!(
            "{SERVER_BINARY_NAME}-{}-{}{}",
            platform.os,
            platform.architecture,
            exe_suffix(platform)
        ))
    }
}

impl BinaryProvider for DistBinaryProvider {
    fn extract_server_binary(&self, platform: &Platform) -> Result<(Vec<u8>, FileInfo), BinaryError> {
        let path = self.binary_path(platform);
        if !path.is_file() {
            return Err(BinaryError::NotFound {
                platform: platform.clone(),
                path,
            });
        }

        let data = std::fs::read(&path).map_err(|e| BinaryError::Read {
            path: path.clone(),
            source: e,
        })?;
        let name = format!("{SERVER_BINARY_NAME}{}", exe_suffix(platform));
        let info = FileInfo::new(name, data.len() as u64, 0o755);

        tracing::debug!(path = %path.display(), size = info.size, %platform, "loaded server binary");
        Ok((data, info))
    }
}

fn exe_suffix(platform: &Platform) -> &'static str {
    if platform.os == "windows" { ".exe" } else { "" }
}
