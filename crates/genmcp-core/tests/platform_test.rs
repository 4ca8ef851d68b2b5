use genmcp_core::{Error, Platform};

#[test]
fn default_platform_is_linux_amd64() {
    let platform = Platform::default();
    assert_eq!(platform.os, "linux");
    assert_eq!(platform.architecture, "amd64");
    assert!(platform.variant.is_none());
}

#[test]
fn parses_os_and_arch() {
    let platform: Platform = "linux/arm64".parse().unwrap();
    assert_eq!(platform, Platform::new("linux", "arm64"));
}

#[test]
fn parses_variant() {
    let platform: Platform = "linux/arm/v7".parse().unwrap();
    assert_eq!(platform, Platform::new("linux", "arm").with_variant("v7"));
    assert_eq!(platform.to_string(), "linux/arm/v7");
}

#[test]
fn normalizes_architecture_aliases() {
    let amd: Platform = "Linux/x86_64".parse().unwrap();
    assert_eq!(amd, Platform::new("linux", "amd64"));

    let arm: Platform = "linux/aarch64".parse().unwrap();
    assert_eq!(arm, Platform::new("linux", "arm64"));

    let arm_v8: Platform = "linux/arm64/v8".parse().unwrap();
    assert_eq!(arm_v8, Platform::new("linux", "arm64"));
}

#[test]
fn rejects_malformed_platforms() {
    for value in ["linux", "", "linux/", "/amd64", "linux/arm/", "a/b/c/d"] {
        let err = value.parse::<Platform>().unwrap_err();
        assert!(
            matches!(err, Error::InvalidPlatform { .. }),
            "expected InvalidPlatform for {value:?}"
        );
    }
}

#[test]
fn request_without_variant_matches_any_variant() {
    let request = Platform::new("linux", "arm");
    assert!(request.matches(&Platform::new("linux", "arm").with_variant("v7")));
    assert!(!request.matches(&Platform::new("linux", "arm64")));
}

#[test]
fn request_with_variant_requires_same_variant() {
    let request = Platform::new("linux", "arm").with_variant("v7");
    assert!(request.matches(&Platform::new("linux", "arm").with_variant("v7")));
    assert!(!request.matches(&Platform::new("linux", "arm").with_variant("v6")));
    assert!(!request.matches(&Platform::new("linux", "arm")));
}
