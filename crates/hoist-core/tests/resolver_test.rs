use hoist_core::{
    DeploymentKind, Error, JavaVersion, OperatingSystem, Region, RuntimeConfig, RuntimeStack,
    WebContainer, resolve_deployment_kind, resolve_runtime,
};
use proptest::prelude::*;
use secrecy::{ExposeSecret, SecretString};

// ── Deployment type ──

#[test]
fn linux_with_tier_runs_from_zip() {
    let kind = resolve_deployment_kind(None, OperatingSystem::Linux, true).unwrap();
    assert_eq!(kind, DeploymentKind::RunFromZip);
}

#[test]
fn linux_consumption_runs_from_blob() {
    let kind = resolve_deployment_kind(None, OperatingSystem::Linux, false).unwrap();
    assert_eq!(kind, DeploymentKind::RunFromBlob);
}

#[test]
fn windows_runs_from_zip() {
    for tier in [true, false] {
        let kind = resolve_deployment_kind(None, OperatingSystem::Windows, tier).unwrap();
        assert_eq!(kind, DeploymentKind::RunFromZip);
    }
}

#[test]
fn empty_override_is_ignored() {
    let kind = resolve_deployment_kind(Some("  "), OperatingSystem::Docker, false).unwrap();
    assert_eq!(kind, DeploymentKind::Docker);
}

#[test]
fn override_accepts_hyphens_and_case() {
    let kind = resolve_deployment_kind(Some("Run-From-Blob"), OperatingSystem::Windows, true)
        .unwrap();
    assert_eq!(kind, DeploymentKind::RunFromBlob);
}

#[test]
fn bogus_override_fails() {
    let result = resolve_deployment_kind(Some("bogus"), OperatingSystem::Linux, false);
    match result {
        Err(Error::UnknownDeploymentType(raw)) => assert_eq!(raw, "bogus"),
        other => panic!("expected UnknownDeploymentType, got {other:?}"),
    }
}

#[test]
fn unknown_deployment_type_message_lists_choices() {
    let err = resolve_deployment_kind(Some("scp"), OperatingSystem::Linux, false).unwrap_err();
    let msg = err.to_string();
    assert_eq!(
        msg,
        "unknown deployment type 'scp'; expected one of: \
         ftp, zip, msdeploy, run_from_blob, run_from_zip, docker"
    );
}

fn any_os() -> impl Strategy<Value = OperatingSystem> {
    prop::sample::select(OperatingSystem::ALL.to_vec())
}

proptest! {
    #[test]
    fn docker_always_uses_container_image(tier in any::<bool>()) {
        let kind = resolve_deployment_kind(None, OperatingSystem::Docker, tier).unwrap();
        prop_assert_eq!(kind, DeploymentKind::Docker);
    }

    #[test]
    fn ftp_override_wins_for_every_os(os in any_os(), tier in any::<bool>()) {
        let kind = resolve_deployment_kind(Some("ftp"), os, tier).unwrap();
        prop_assert_eq!(kind, DeploymentKind::Ftp);
    }

    #[test]
    fn resolution_without_override_is_total(os in any_os(), tier in any::<bool>()) {
        prop_assert!(resolve_deployment_kind(None, os, tier).is_ok());
    }

    #[test]
    fn every_known_name_round_trips(idx in 0usize..DeploymentKind::ALL.len(), os in any_os()) {
        let expected = DeploymentKind::ALL[idx];
        let kind = resolve_deployment_kind(Some(expected.as_str()), os, false).unwrap();
        prop_assert_eq!(kind, expected);
    }
}

// ── Runtime ──

#[test]
fn runtime_defaults_to_windows_java_17() {
    let runtime = resolve_runtime(&RuntimeConfig::default()).unwrap();

    assert_eq!(runtime.os(), OperatingSystem::Windows);
    assert_eq!(runtime.java_version(), Some(JavaVersion::Java17));
    assert!(runtime.container().is_none());
}

#[test]
fn runtime_parses_legacy_java_8() {
    let config = RuntimeConfig {
        os: Some("Linux".to_owned()),
        java_version: Some("1.8".to_owned()),
        ..Default::default()
    };
    let runtime = resolve_runtime(&config).unwrap();

    assert_eq!(runtime.os(), OperatingSystem::Linux);
    assert_eq!(runtime.java_version(), Some(JavaVersion::Java8));
}

#[test]
fn runtime_rejects_unknown_os() {
    let config = RuntimeConfig {
        os: Some("solaris".to_owned()),
        ..Default::default()
    };
    let err = resolve_runtime(&config).unwrap_err();
    assert!(matches!(err, Error::UnsupportedRuntime { field: "os", .. }));
}

#[test]
fn runtime_rejects_unknown_java_version() {
    let config = RuntimeConfig {
        java_version: Some("13".to_owned()),
        ..Default::default()
    };
    let err = resolve_runtime(&config).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedRuntime {
            field: "java_version",
            ..
        }
    ));
}

#[test]
fn runtime_parses_web_container() {
    let config = RuntimeConfig {
        web_container: Some("Tomcat 10.0".to_owned()),
        ..Default::default()
    };
    let runtime = resolve_runtime(&config).unwrap();
    match runtime.stack() {
        RuntimeStack::Java { web_container, .. } => {
            assert_eq!(web_container, &Some(WebContainer::Tomcat("10.0".to_owned())));
        }
        other => panic!("unexpected stack {other:?}"),
    }
}

#[test]
fn docker_ignores_java_fields() {
    let config = RuntimeConfig {
        os: Some("docker".to_owned()),
        java_version: Some("not-a-version".to_owned()),
        web_container: Some("nonsense".to_owned()),
        image: Some("mcr.microsoft.com/azure-functions/java:4".to_owned()),
        ..Default::default()
    };
    let runtime = resolve_runtime(&config).unwrap();

    assert_eq!(runtime.os(), OperatingSystem::Docker);
    assert!(runtime.java_version().is_none());
    let image = runtime.container().unwrap();
    assert_eq!(image.image, "mcr.microsoft.com/azure-functions/java:4");
    assert!(image.registry.is_none());
}

#[test]
fn docker_requires_image() {
    let config = RuntimeConfig {
        os: Some("docker".to_owned()),
        ..Default::default()
    };
    let err = resolve_runtime(&config).unwrap_err();
    assert!(matches!(err, Error::MissingContainerImage));
}

#[test]
fn private_registry_needs_credentials() {
    let config = RuntimeConfig {
        os: Some("docker".to_owned()),
        image: Some("myregistry.azurecr.io/orders:1".to_owned()),
        registry_url: Some("https://myregistry.azurecr.io".to_owned()),
        registry_username: Some("orders".to_owned()),
        ..Default::default()
    };
    let err = resolve_runtime(&config).unwrap_err();
    assert!(matches!(err, Error::IncompleteRegistryCredentials { .. }));
}

#[test]
fn private_registry_with_credentials() {
    let config = RuntimeConfig {
        os: Some("docker".to_owned()),
        image: Some("myregistry.azurecr.io/orders:1".to_owned()),
        registry_url: Some("https://myregistry.azurecr.io".to_owned()),
        registry_username: Some("orders".to_owned()),
        registry_password: Some(SecretString::from("s3cret")),
        ..Default::default()
    };
    let runtime = resolve_runtime(&config).unwrap();
    let registry = runtime.container().unwrap().registry.as_ref().unwrap();

    assert_eq!(registry.username, "orders");
    assert_eq!(registry.password.expose_secret(), "s3cret");
    assert!(!format!("{runtime:?}").contains("s3cret"));
}

#[test]
fn non_docker_ignores_image_fields() {
    let config = RuntimeConfig {
        os: Some("linux".to_owned()),
        image: Some("ignored:latest".to_owned()),
        registry_url: Some("https://ignored.example".to_owned()),
        ..Default::default()
    };
    let runtime = resolve_runtime(&config).unwrap();
    assert!(runtime.container().is_none());
}

// ── Region ──

#[test]
fn region_display_names_are_canonicalized() {
    for raw in ["West Europe", "westeurope", " WestUS2 ", "South Central US"] {
        let region: Region = raw.parse().unwrap();
        assert!(!region.as_str().contains(' '));
        assert_eq!(region.as_str(), region.as_str().to_ascii_lowercase());
    }
    let region: Region = "West US 3".parse().unwrap();
    assert_eq!(region.as_str(), "westus3");
}

#[test]
fn unknown_regions_are_rejected() {
    for raw in ["mars", "westeurope2", "", "west/europe"] {
        match raw.parse::<Region>() {
            Err(Error::UnresolvableRegion(value)) => assert_eq!(value, raw),
            other => panic!("expected UnresolvableRegion for {raw:?}, got {other:?}"),
        }
    }
}
