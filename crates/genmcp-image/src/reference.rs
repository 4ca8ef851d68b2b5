//! Reference display helpers.
//!
//! Parsing into registry, repository and tag lives in `genmcp-registry`;
//! this is only the lightweight tag view used for user-facing output.

/// Tag portion of a reference, for display.
///
/// The tag follows the last `:`, and only counts when that colon comes
/// after the last `/`; otherwise the colon belongs to a `host:port`.
/// Returns `""` when there is no tag.
pub fn extract_tag(reference: &str) -> &str {
    let Some(colon) = reference.rfind(':') else {
        return "";
    };
    match reference.rfind('/') {
        Some(slash) if colon < slash => "",
        _ => &reference[colon + 1..],
    }
}
