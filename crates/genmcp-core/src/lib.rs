//! Core types and configuration for genmcp image builds.
//!
//! This crate defines the build request ([`BuildOptions`]) and its default
//! resolution, the target [`Platform`], payload metadata ([`FileInfo`]),
//! the `genmcp.toml` schema ([`GenmcpConfig`]), and shared error types.

pub mod config;
pub mod error;
pub mod file;
pub mod options;
pub mod platform;

pub use config::{BuildConfig, GenmcpConfig, RegistryConfig};
pub use error::{Error, Result};
pub use file::FileInfo;
pub use options::{BuildOptions, DEFAULT_BASE_IMAGE, ResolvedOptions};
pub use platform::{DEFAULT_ARCH, DEFAULT_OS, Platform};
