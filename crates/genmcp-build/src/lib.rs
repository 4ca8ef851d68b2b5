//! Image builder for genmcp servers.
//!
//! # Build pipeline
//!
//! ```text
//! genmcp build
//!   1. Options     ── BuildOptions::resolve() (platform, base image defaults)
//!   2. Base image  ── ImageDownloader::download_image()
//!   3. Binary      ── BinaryProvider::extract_server_binary(platform)
//!   4. MCP file    ── FileSystem::stat() + read_file()
//!   5. Media type  ── layer_media_type(base)  OCI | Docker | rejected
//!   6. Layers      ── /usr/local/bin/<binary>, /etc/genmcp/<mcp file>
//!   7. Push        ── ImageBuilder::save() (only with --push)
//! ```
//!
//! Each step maps its failure into a [`BuildError`] variant naming the
//! stage, and the pipeline stops at the first one.
//!
//! # Collaborators
//!
//! Every I/O boundary is a trait so tests can substitute mocks:
//! - [`FileSystem`]: [`OsFileSystem`]
//! - [`BinaryProvider`]: [`DistBinaryProvider`]
//! - [`ImageDownloader`] / [`ImageSaver`]: `genmcp_registry::RegistryClient`

pub mod builder;
pub mod error;
pub mod provider;
pub mod registry;

pub use builder::{ImageBuilder, layer_media_type};
pub use error::{BinaryError, BuildError, MediaTypeError};
pub use provider::{BinaryProvider, DistBinaryProvider, FileSystem, OsFileSystem};
pub use registry::{ImageDownloader, ImageSaver};
