//! Container registry client for genmcp builds.
//!
//! Pulls base image manifests and configs, and pushes finished images,
//! over the distribution API of `oci-distribution`. Base layer bytes are
//! never downloaded on pull; a push mounts or copies them from the base
//! image repository.

pub mod auth;
pub mod backend;
pub mod client;
pub mod error;
pub mod reference;

pub use auth::{CredentialStore, Credentials};
pub use backend::{RegistryBackend, client_config};
pub use client::RegistryClient;
pub use error::RegistryError;
pub use reference::parse_reference;
