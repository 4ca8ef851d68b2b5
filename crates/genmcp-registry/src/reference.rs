//! Image reference parsing.

use oci_distribution::Reference;

use crate::error::RegistryError;

/// Parse an image reference string.
///
/// Docker Hub shorthands are normalized: `nginx` and `docker.io/nginx`
/// both name `docker.io/library/nginx:latest`.
pub fn parse_reference(reference: &str) -> Result<Reference, RegistryError> {
    reference
        .trim()
        .parse::<Reference>()
        .map_err(|e| RegistryError::InvalidReference {
            reference: reference.to_owned(),
            reason: e.to_string(),
        })
}

/// Whether both references live on the same registry host.
pub fn same_registry(a: &Reference, b: &Reference) -> bool {
    a.resolve_registry() == b.resolve_registry()
}

/// Whether both references name the same repository on the same registry.
pub fn same_repository(a: &Reference, b: &Reference) -> bool {
    same_registry(a, b) && a.repository() == b.repository()
}

/// `reference` pinned to `digest` within the same repository.
pub fn with_digest(reference: &Reference, digest: &str) -> Reference {
    Reference::with_digest(
        reference.registry().to_owned(),
        reference.repository().to_owned(),
        digest.to_owned(),
    )
}
