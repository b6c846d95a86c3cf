//! CLI smoke tests for giftwrap.
//!
//! These tests verify that the commands parse their arguments, validate
//! manifests, and return appropriate exit codes without needing network
//! access or a container daemon.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the giftwrap binary.
fn giftwrap_cmd() -> Command {
  cargo_bin_cmd!("giftwrap")
}

/// Create a temp directory holding `manifest.yml`.
fn temp_manifest(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("manifest.yml"), content).unwrap();
  temp
}

const TWO_PROJECTS: &str = r#"
settings:
  version: "2014.2"
  base_path: /opt/openstack
projects:
  - name: nova
    gitref: stable/juno
  - name: glance
    version: "2014.2.1"
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  giftwrap_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  giftwrap_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("giftwrap"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "plan"] {
    giftwrap_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// plan
// =============================================================================

#[test]
fn plan_lists_resolved_projects() {
  let temp = temp_manifest(TWO_PROJECTS);

  giftwrap_cmd()
    .arg("plan")
    .arg(temp.path().join("manifest.yml"))
    .assert()
    .success()
    .stdout(predicate::str::contains("2 project(s)"))
    .stdout(predicate::str::contains("https://github.com/openstack/nova.git @ stable/juno"))
    .stdout(predicate::str::contains("glance 2014.2.1"))
    .stdout(predicate::str::contains("openstack-glance"));
}

#[test]
fn plan_json_output() {
  let temp = temp_manifest(TWO_PROJECTS);

  let output = giftwrap_cmd()
    .arg("plan")
    .arg(temp.path().join("manifest.yml"))
    .args(["--output", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["projects"][0]["name"], "nova");
  assert_eq!(json["projects"][0]["install_path"], "/opt/openstack/nova");
  assert_eq!(json["projects"][1]["version"], "2014.2.1");
}

#[test]
fn plan_nonexistent_manifest_fails() {
  giftwrap_cmd()
    .arg("plan")
    .arg("/nonexistent/path/manifest.yml")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn plan_rejects_install_command_without_slot() {
  let temp = temp_manifest(
    r#"
settings:
  version: "1.0"
projects:
  - name: nova
    install_command: ".venv/bin/pip install -r requirements.txt"
"#,
  );

  giftwrap_cmd()
    .arg("plan")
    .arg(temp.path().join("manifest.yml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("install_command"));
}

#[test]
fn plan_rejects_unknown_keys() {
  let temp = temp_manifest(
    r#"
settings:
  version: "1.0"
  colour: blue
projects: []
"#,
  );

  giftwrap_cmd()
    .arg("plan")
    .arg(temp.path().join("manifest.yml"))
    .assert()
    .failure();
}

// =============================================================================
// build
// =============================================================================

#[test]
fn build_nonexistent_manifest_fails() {
  giftwrap_cmd()
    .arg("build")
    .arg("/nonexistent/path/manifest.yml")
    .assert()
    .failure();
}

#[test]
fn build_rejects_bad_timeout() {
  let temp = temp_manifest(TWO_PROJECTS);

  giftwrap_cmd()
    .arg("build")
    .arg(temp.path().join("manifest.yml"))
    .args(["--build-timeout", "soon"])
    .assert()
    .failure();
}

#[test]
fn build_stops_at_first_failing_project() {
  let temp = TempDir::new().unwrap();
  let root = temp.path().display();
  let manifest = format!(
    r#"
settings:
  version: "1.0"
  base_path: {root}/opt
  gerrit_dependencies: false
projects:
  - name: nova
    giturl: {root}/missing/nova.git
  - name: glance
    giturl: {root}/missing/glance.git
"#
  );
  std::fs::write(temp.path().join("manifest.yml"), manifest).unwrap();

  giftwrap_cmd()
    .arg("build")
    .arg(temp.path().join("manifest.yml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("nova"));

  assert!(!temp.path().join("opt").join("glance").exists());
}
