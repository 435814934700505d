use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn hoist() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hoist");
    cmd.env_remove("HOIST_REGISTRY_PASSWORD");
    cmd
}

const HOIST_TOML: &str = r#"
[app]
name = "orders"
subscription_id = "00000000-0000-0000-0000-000000000001"
resource_group = "rg-orders"
region = "West Europe"

[project]
artifact = "target/orders-1.0.jar"

[app_settings]
FEATURE_FLAGS = "beta"
"#;

const HTTP_FUNCTIONS: &str = r#"
[[function]]
name = "Hello"
entry_point = "com.example.Api.hello"

[[function.binding]]
type = "httpTrigger"
direction = "in"
name = "req"
authLevel = "anonymous"

[[function.binding]]
type = "http"
direction = "out"
name = "$return"
"#;

/// Function app project with one HTTP function and built jars.
fn function_project(dir: &Path, functions: &str) {
    std::fs::write(dir.join("hoist.toml"), HOIST_TOML).unwrap();
    std::fs::write(dir.join("functions.toml"), functions).unwrap();
    std::fs::write(dir.join("host.json"), r#"{"version": "2.0"}"#).unwrap();
    std::fs::write(dir.join("local.settings.json"), r#"{"IsEncrypted": false}"#).unwrap();
    std::fs::create_dir_all(dir.join("target/lib")).unwrap();
    std::fs::write(dir.join("target/orders-1.0.jar"), b"jar").unwrap();
    std::fs::write(dir.join("target/lib/gson-2.10.jar"), b"jar").unwrap();
}

// ── Help / Version ──

#[test]
fn shows_help() {
    hoist()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Azure Functions and App Service"))
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn shows_version() {
    hoist()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hoist"));
}

// ── Plan Command ──

#[test]
fn plan_prints_resolved_target() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("hoist.toml"), HOIST_TOML).unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Region:         westeurope"))
        .stdout(predicate::str::contains("orders-plan in rg-orders (Y1, Dynamic)"))
        .stdout(predicate::str::contains("Deployment:     run_from_zip"))
        .stdout(predicate::str::contains("FUNCTIONS_WORKER_RUNTIME (forced)"))
        .stdout(predicate::str::contains("FEATURE_FLAGS"))
        .stdout(predicate::str::contains("beta").not());
}

#[test]
fn plan_shows_linux_web_container_as_fx_version() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("hoist.toml"),
        r#"
[app]
name = "storefront"
flavor = "web"
subscription_id = "00000000-0000-0000-0000-000000000001"
resource_group = "rg-store"
region = "westeurope"

[runtime]
os = "linux"
web_container = "Tomcat 10.0"
"#,
    )
    .unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("App:            storefront (web app)"))
        .stdout(predicate::str::contains("Runtime:        linux, Java 17, TOMCAT|10.0-java17"))
        .stdout(predicate::str::contains("Deployment:     run_from_zip"));
}

#[test]
fn plan_without_storage_connection_rejects_run_from_blob() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("hoist.toml"),
        r#"
[app]
name = "orders"
subscription_id = "00000000-0000-0000-0000-000000000001"
resource_group = "rg-orders"
region = "westeurope"

[runtime]
os = "linux"
"#,
    )
    .unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AzureWebJobsStorage"));
}

#[test]
fn plan_reports_every_configuration_problem() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("hoist.toml"),
        "[app]\nregion = \"westeurope\"\n\n[deployment]\ntype = \"carrier-pigeon\"\n",
    )
    .unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("app.name"))
        .stderr(predicate::str::contains("app.subscription_id"))
        .stderr(predicate::str::contains("app.resource_group"))
        .stderr(predicate::str::contains("deployment.type"));
}

#[test]
fn plan_fails_on_malformed_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("hoist.toml"), "[app\n").unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ── Package Command ──

#[test]
fn package_stages_functions_and_builds_archive() {
    let tmp = TempDir::new().unwrap();
    function_project(tmp.path(), HTTP_FUNCTIONS);

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::contains("Staged 1 function(s)"))
        .stdout(predicate::str::contains("Archive:"));

    let staging = tmp.path().join(".hoist/staging/orders");
    assert!(staging.join("host.json").is_file());
    assert!(staging.join("Hello/function.json").is_file());
    assert!(staging.join("orders-1.0.jar").is_file());
    assert!(staging.join("lib/gson-2.10.jar").is_file());
    assert!(tmp.path().join(".hoist/staging/orders.zip").is_file());
}

#[test]
fn package_without_functions_stages_nothing() {
    let tmp = TempDir::new().unwrap();
    function_project(tmp.path(), "");

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::contains("No functions found"));

    assert!(!tmp.path().join(".hoist/staging/orders.zip").exists());
}

#[test]
fn package_fails_without_host_json() {
    let tmp = TempDir::new().unwrap();
    function_project(tmp.path(), HTTP_FUNCTIONS);
    std::fs::remove_file(tmp.path().join("host.json")).unwrap();

    hoist()
        .arg("--dir")
        .arg(tmp.path())
        .arg("package")
        .assert()
        .failure()
        .stderr(predicate::str::contains("host.json not found"));
}

// ── Run / Deploy Without Tooling ──

#[test]
fn run_requires_core_tools() {
    let tmp = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();
    function_project(tmp.path(), HTTP_FUNCTIONS);

    hoist()
        .env("PATH", empty_path.path())
        .arg("--dir")
        .arg(tmp.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("func"));
}

#[test]
fn deploy_requires_azure_cli() {
    let tmp = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();
    function_project(tmp.path(), HTTP_FUNCTIONS);

    hoist()
        .env("PATH", empty_path.path())
        .arg("--dir")
        .arg(tmp.path())
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Azure CLI (az) is not installed"));

    // Staging happens before any remote call.
    assert!(tmp.path().join(".hoist/staging/orders/Hello/function.json").is_file());
}
