use std::fs::File;
use std::path::{Path, PathBuf};

use hoist_core::ProjectDescriptor;
use hoist_stage::archive::zip_staging;
use hoist_stage::extension::ExtensionBundle;
use hoist_stage::staging::stage_web_app;
use hoist_stage::validate::validate_all;
use hoist_stage::{
    Binding, BindingDirection, BindingKind, ConfigurationValidator, DefaultValidator,
    DiscoveryError, EntryPointDiscovery, ExtensionError, ExtensionInstaller,
    FunctionConfiguration, FunctionEntryPoint, FunctionMetadataGenerator, HostManifest,
    ManifestDiscovery, StageError, StageOutcome, is_install_extension_needed,
    prepare_staging_dir,
};
use mockall::mock;
use tempfile::TempDir;

mock! {
    Discovery {}

    impl EntryPointDiscovery for Discovery {
        fn discover(&self, artifact: &Path) -> Result<Vec<FunctionEntryPoint>, DiscoveryError>;
    }
}

mock! {
    Installer {}

    impl ExtensionInstaller for Installer {
        fn install(&self, staging_dir: &Path, base_dir: &Path) -> Result<(), ExtensionError>;
    }
}

const HOST_WITH_BUNDLE: &str = r#"{
  "version": "2.0",
  "extensionBundle": {
    "id": "Microsoft.Azure.Functions.ExtensionBundle",
    "version": "[4.*, 5.0.0)"
  }
}"#;

const HOST_WITHOUT_BUNDLE: &str = r#"{ "version": "2.0" }"#;

/// Lay out a built project: host files, artifact, and dependency jars.
fn write_project(dir: &Path, host_json: &str) -> ProjectDescriptor {
    std::fs::write(dir.join("host.json"), host_json).unwrap();
    std::fs::write(dir.join("local.settings.json"), r#"{ "IsEncrypted": false }"#).unwrap();

    let target = dir.join("target");
    let lib = target.join("lib");
    std::fs::create_dir_all(&lib).unwrap();
    let artifact = target.join("app-1.0.jar");
    std::fs::write(&artifact, b"jar").unwrap();

    let dependencies = vec![
        lib.join("azure-functions-java-library-3.1.0.jar"),
        lib.join("commons-lang3-3.14.0.jar"),
    ];
    for dep in &dependencies {
        std::fs::write(dep, b"dep").unwrap();
    }

    ProjectDescriptor {
        base_dir: dir.to_path_buf(),
        artifact,
        dependencies,
    }
}

fn staging_dir(dir: &Path) -> PathBuf {
    let staging = dir.join(".hoist/staging/demo");
    prepare_staging_dir(&staging).unwrap();
    staging
}

fn timer_function() -> FunctionEntryPoint {
    FunctionEntryPoint {
        name: "Nightly".to_owned(),
        entry_point: "com.example.Jobs.nightly".to_owned(),
        bindings: vec![
            Binding::new(BindingKind::TimerTrigger, BindingDirection::In, "timer")
                .with_attribute("schedule", "0 0 2 * * *"),
        ],
    }
}

fn http_function() -> FunctionEntryPoint {
    FunctionEntryPoint {
        name: "Hello".to_owned(),
        entry_point: "com.example.Api.hello".to_owned(),
        bindings: vec![
            Binding::new(BindingKind::HttpTrigger, BindingDirection::In, "req")
                .with_attribute("authLevel", "anonymous"),
            Binding::new(BindingKind::Http, BindingDirection::Out, "$return"),
        ],
    }
}

fn discovery_returning(entries: Vec<FunctionEntryPoint>) -> MockDiscovery {
    let mut discovery = MockDiscovery::new();
    discovery
        .expect_discover()
        .times(1)
        .returning(move |_| Ok(entries.clone()));
    discovery
}

fn installer_never_called() -> MockInstaller {
    let mut installer = MockInstaller::new();
    installer.expect_install().never();
    installer
}

// ── Extension Decision Tests ──

#[test]
fn bundle_declared_needs_no_install() {
    let host = HostManifest {
        extension_bundle: Some(ExtensionBundle {
            id: "Microsoft.Azure.Functions.ExtensionBundle".to_owned(),
            version: Some("[4.*, 5.0.0)".to_owned()),
        }),
    };
    assert!(!is_install_extension_needed(&host, &[BindingKind::TimerTrigger]));
}

#[test]
fn http_only_needs_no_install() {
    let host = HostManifest::default();
    assert!(!is_install_extension_needed(
        &host,
        &[BindingKind::HttpTrigger, BindingKind::Http]
    ));
}

#[test]
fn non_http_without_bundle_needs_install() {
    let host = HostManifest::default();
    assert!(is_install_extension_needed(
        &host,
        &[BindingKind::HttpTrigger, BindingKind::QueueTrigger]
    ));
}

#[test]
fn third_party_bundle_still_needs_install() {
    let host = HostManifest {
        extension_bundle: Some(ExtensionBundle {
            id: "Contoso.Bundle".to_owned(),
            version: None,
        }),
    };
    assert!(is_install_extension_needed(&host, &[BindingKind::TimerTrigger]));
}

// ── Staging Tests ──

#[test]
fn timer_without_bundle_installs_extensions_once() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    let staging = staging_dir(tmp.path());

    let mut installer = MockInstaller::new();
    let expected_staging = staging.clone();
    let expected_base = tmp.path().to_path_buf();
    installer
        .expect_install()
        .withf(move |s, b| s == expected_staging.as_path() && b == expected_base.as_path())
        .times(1)
        .returning(|_, _| Ok(()));

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function()]),
        DefaultValidator,
        installer,
    );
    let outcome = generator.stage(&project, &staging).unwrap();

    assert_eq!(
        outcome,
        StageOutcome::Staged {
            functions: vec!["Nightly".to_owned()],
            extensions_installed: true,
        }
    );
}

#[test]
fn bundle_declared_skips_installer() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITH_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    let outcome = generator.stage(&project, &staging).unwrap();

    assert!(matches!(
        outcome,
        StageOutcome::Staged {
            extensions_installed: false,
            ..
        }
    ));
}

#[test]
fn http_only_skips_installer() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![http_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    generator.stage(&project, &staging).unwrap();
}

#[test]
fn installer_failure_is_reported() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    let staging = staging_dir(tmp.path());

    let mut installer = MockInstaller::new();
    installer.expect_install().times(1).returning(|_, _| {
        Err(ExtensionError::InstallFailed {
            detail: "restore failed".to_owned(),
        })
    });

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function()]),
        DefaultValidator,
        installer,
    );
    let err = generator.stage(&project, &staging).unwrap_err();
    assert!(matches!(err, StageError::Extension { .. }));
}

#[test]
fn no_functions_stages_nothing() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(Vec::new()),
        DefaultValidator,
        installer_never_called(),
    );
    let outcome = generator.stage(&project, &staging).unwrap();

    assert_eq!(outcome, StageOutcome::NoFunctions);
    assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
}

#[test]
fn one_invalid_function_aborts_all() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    let staging = staging_dir(tmp.path());

    let broken = FunctionEntryPoint {
        name: "Broken".to_owned(),
        entry_point: "com.example.Jobs.broken".to_owned(),
        bindings: vec![Binding::new(BindingKind::Queue, BindingDirection::Out, "msg")],
    };
    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function(), broken]),
        DefaultValidator,
        installer_never_called(),
    );
    let err = generator.stage(&project, &staging).unwrap_err();

    match err {
        StageError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].function, "Broken");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(!staging.join("host.json").exists());
    assert!(!staging.join("Nightly").exists());
}

#[test]
fn missing_host_json_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITHOUT_BUNDLE);
    std::fs::remove_file(tmp.path().join("host.json")).unwrap();
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![http_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    let err = generator.stage(&project, &staging).unwrap_err();
    assert!(matches!(err, StageError::MissingHostJson(_)));
}

#[test]
fn function_json_layout() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITH_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    generator.stage(&project, &staging).unwrap();

    let json = std::fs::read_to_string(staging.join("Nightly/function.json")).unwrap();
    assert!(json.starts_with("{\n  \"scriptFile\": \"../app-1.0.jar\",\n"));
    assert!(json.ends_with("}\n"));
    assert!(!json.contains('\r'));

    let pos = |needle: &str| json.find(needle).unwrap();
    assert!(pos("\"scriptFile\"") < pos("\"entryPoint\""));
    assert!(pos("\"entryPoint\"") < pos("\"bindings\""));
    assert!(pos("\"type\": \"timerTrigger\"") < pos("\"direction\": \"in\""));
    assert!(pos("\"name\": \"timer\"") < pos("\"schedule\""));
    assert!(json.contains("\"entryPoint\": \"com.example.Jobs.nightly\""));
}

#[test]
fn staging_copies_jars_without_functions_library() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITH_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![http_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    generator.stage(&project, &staging).unwrap();

    assert!(staging.join("app-1.0.jar").is_file());
    assert!(staging.join("host.json").is_file());
    assert!(staging.join("local.settings.json").is_file());
    assert!(staging.join("lib/commons-lang3-3.14.0.jar").is_file());
    assert!(
        !staging
            .join("lib/azure-functions-java-library-3.1.0.jar")
            .exists()
    );
}

#[test]
fn archive_leaves_out_local_settings() {
    let tmp = TempDir::new().unwrap();
    let project = write_project(tmp.path(), HOST_WITH_BUNDLE);
    let staging = staging_dir(tmp.path());

    let generator = FunctionMetadataGenerator::new(
        discovery_returning(vec![timer_function()]),
        DefaultValidator,
        installer_never_called(),
    );
    generator.stage(&project, &staging).unwrap();

    let archive_path = zip_staging(&staging).unwrap();
    assert_eq!(archive_path, tmp.path().join(".hoist/staging/demo.zip"));

    let archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"host.json"));
    assert!(names.contains(&"app-1.0.jar"));
    assert!(names.contains(&"Nightly/function.json"));
    assert!(names.contains(&"lib/commons-lang3-3.14.0.jar"));
    assert!(!names.contains(&"local.settings.json"));
}

#[test]
fn prepare_staging_dir_clears_previous_run() {
    let tmp = TempDir::new().unwrap();
    let staging = tmp.path().join("staging");
    std::fs::create_dir_all(staging.join("Old")).unwrap();
    std::fs::write(staging.join("Old/function.json"), "{}").unwrap();

    prepare_staging_dir(&staging).unwrap();

    assert!(staging.is_dir());
    assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
}

#[test]
fn web_app_war_is_staged_as_root() {
    let tmp = TempDir::new().unwrap();
    let artifact = tmp.path().join("shop.war");
    std::fs::write(&artifact, b"war").unwrap();
    let project = ProjectDescriptor {
        base_dir: tmp.path().to_path_buf(),
        artifact,
        dependencies: Vec::new(),
    };
    let staging = staging_dir(tmp.path());

    let staged = stage_web_app(&project, &staging).unwrap();
    assert_eq!(staged, staging.join("ROOT.war"));
    assert!(staged.is_file());
}

// ── Manifest Discovery Tests ──

#[test]
fn manifest_discovery_reads_functions_and_bindings() {
    let tmp = TempDir::new().unwrap();
    let manifest = tmp.path().join("functions.toml");
    std::fs::write(
        &manifest,
        r#"
[[function]]
name = "Nightly"
entry_point = "com.example.Jobs.nightly"

[[function.binding]]
type = "timerTrigger"
direction = "in"
name = "timer"
schedule = "0 0 2 * * *"

[[function]]
name = "Ingest"
entry_point = "com.example.Jobs.ingest"

[[function.binding]]
type = "eventGridTrigger"
direction = "in"
name = "event"
"#,
    )
    .unwrap();

    let entries = ManifestDiscovery::new(&manifest)
        .discover(Path::new("app.jar"))
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], timer_function());
    assert_eq!(
        entries[1].bindings[0].kind,
        BindingKind::Other("eventGridTrigger".to_owned())
    );
    assert!(entries[1].bindings[0].kind.is_trigger());
}

#[test]
fn missing_manifest_yields_no_functions() {
    let tmp = TempDir::new().unwrap();
    let entries = ManifestDiscovery::new(tmp.path().join("functions.toml"))
        .discover(Path::new("app.jar"))
        .unwrap();
    assert!(entries.is_empty());
}

#[test]
fn malformed_manifest_is_a_parse_error() {
    let tmp = TempDir::new().unwrap();
    let manifest = tmp.path().join("functions.toml");
    std::fs::write(&manifest, "[[function]]\nname = 3\n").unwrap();

    let err = ManifestDiscovery::new(&manifest)
        .discover(Path::new("app.jar"))
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Parse { .. }));
}

// ── Validation Tests ──

fn configuration(entry: FunctionEntryPoint) -> FunctionConfiguration {
    FunctionConfiguration::from_entry_point(entry, "../app.jar")
}

#[test]
fn valid_configuration_has_no_problems() {
    assert!(DefaultValidator.validate(&configuration(http_function())).is_empty());
}

#[test]
fn name_must_start_with_letter() {
    let mut entry = timer_function();
    entry.name = "1st-job".to_owned();
    let problems = DefaultValidator.validate(&configuration(entry));
    assert_eq!(problems.len(), 1);
    assert!(problems[0].contains("1st-job"));
}

#[test]
fn entry_point_must_be_qualified() {
    let mut entry = timer_function();
    entry.entry_point = "nightly".to_owned();
    let problems = DefaultValidator.validate(&configuration(entry));
    assert!(problems.iter().any(|p| p.contains("entryPoint")));
}

#[test]
fn exactly_one_inbound_trigger_required() {
    let mut two_triggers = timer_function();
    two_triggers
        .bindings
        .push(Binding::new(BindingKind::QueueTrigger, BindingDirection::In, "msg"));
    let problems = DefaultValidator.validate(&configuration(two_triggers));
    assert!(problems.iter().any(|p| p.contains("2 trigger bindings")));

    let mut outbound = timer_function();
    outbound.bindings[0].direction = BindingDirection::Out;
    let problems = DefaultValidator.validate(&configuration(outbound));
    assert!(problems.iter().any(|p| p.contains("direction 'in'")));
}

#[test]
fn unnamed_binding_is_rejected() {
    let mut entry = http_function();
    entry.bindings[1].name = " ".to_owned();
    let problems = DefaultValidator.validate(&configuration(entry));
    assert_eq!(problems, vec!["http binding has no name".to_owned()]);
}

#[test]
fn duplicate_names_differing_in_case_are_rejected() {
    let mut shadow = timer_function();
    shadow.name = "NIGHTLY".to_owned();
    let configs = vec![configuration(timer_function()), configuration(shadow)];

    let errors = validate_all(&DefaultValidator, &configs);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].function, "NIGHTLY");
    assert_eq!(errors[0].problems, vec!["duplicate function name".to_owned()]);
}
