//! CLI integration tests for Stowage.
//!
//! These tests verify the full workflow from a workspace on disk through a
//! generated manifest in the output directory.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the stowage binary command.
fn stowage() -> Command {
    Command::cargo_bin("stowage").unwrap()
}

/// Lay out a small workspace: an application importing one library, one
/// registry package pinned in the root manifest, and a yarn.lock.
fn create_workspace(root: &Path) {
    fs::write(
        root.join("workspace.json"),
        r#"{
  "npmScope": "acme",
  "projects": {
    "server": { "root": "apps/server", "sourceRoot": "apps/server/src", "projectType": "application" },
    "shared": { "root": "libs/shared", "sourceRoot": "libs/shared/src", "projectType": "library" }
  }
}"#,
    )
    .unwrap();
    fs::write(
        root.join("package.json"),
        r#"{ "name": "acme", "version": "3.1.0", "license": "MIT",
     "dependencies": { "express": "^4.18.0", "lodash": "^4.17.21" } }"#,
    )
    .unwrap();
    fs::write(root.join("yarn.lock"), "# yarn lockfile v1\n").unwrap();

    let server_src = root.join("apps/server/src");
    fs::create_dir_all(&server_src).unwrap();
    fs::write(
        server_src.join("main.ts"),
        r#"
import express from "express";
import { helper } from "@acme/shared";
"#,
    )
    .unwrap();

    let shared_src = root.join("libs/shared/src");
    fs::create_dir_all(&shared_src).unwrap();
    fs::write(
        shared_src.join("index.ts"),
        r#"import lodash from "lodash"; export const helper = 1;"#,
    )
    .unwrap();
    fs::write(
        root.join("libs/shared/package.json"),
        r#"{ "name": "@acme/shared", "version": "2.0.0" }"#,
    )
    .unwrap();
}

// ============================================================================
// stowage generate
// ============================================================================

#[test]
fn test_generate_inlined_closure() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());

    stowage()
        .args(["generate", "server", "--externalize-packages", "all"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));

    let out = tmp.path().join("dist/apps/server");
    let manifest = fs::read_to_string(out.join("package.json")).unwrap();

    // Direct and transitive registry dependencies are listed; the inlined
    // library is not.
    assert!(manifest.contains("\"express\": \"^4.18.0\""));
    assert!(manifest.contains("\"lodash\": \"^4.17.21\""));
    assert!(!manifest.contains("@acme/shared"));

    // Defaults came from the root manifest.
    assert!(manifest.contains("\"name\": \"@acme/server\""));
    assert!(manifest.contains("\"version\": \"3.1.0\""));
    assert!(manifest.contains("\"license\": \"MIT\""));

    // Lock file copied alongside.
    assert!(out.join("yarn.lock").exists());
}

#[test]
fn test_generate_externalized_library() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());

    stowage()
        .args([
            "generate",
            "server",
            "--externalize-projects",
            "shared",
            "--externalize-packages",
            "all",
        ])
        .current_dir(tmp.path())
        .assert()
        .success();

    let manifest =
        fs::read_to_string(tmp.path().join("dist/apps/server/package.json")).unwrap();

    // The externalized library is listed at its own version, and its
    // externals (lodash) stay out of the closure.
    assert!(manifest.contains("\"@acme/shared\": \"2.0.0\""));
    assert!(!manifest.contains("lodash"));
    assert!(manifest.contains("\"express\": \"^4.18.0\""));
}

#[test]
fn test_generate_skips_existing_manifest() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());

    let out = tmp.path().join("dist/apps/server");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("package.json"), "{ \"name\": \"handwritten\" }").unwrap();

    stowage()
        .args(["generate", "server"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Up to date"));

    assert_eq!(
        fs::read_to_string(out.join("package.json")).unwrap(),
        "{ \"name\": \"handwritten\" }"
    );
    // Skipped writes don't copy lock files either.
    assert!(!out.join("yarn.lock").exists());
}

#[test]
fn test_generate_output_override() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());
    let out = tmp.path().join("custom-out");

    stowage()
        .args(["generate", "server", "--output"])
        .arg(&out)
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(out.join("package.json").exists());
}

#[test]
fn test_generate_unknown_project_fails() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());

    stowage()
        .args(["generate", "ghost"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project named `ghost`"));
}

// ============================================================================
// stowage projects
// ============================================================================

#[test]
fn test_projects_lists_workspace() {
    let tmp = TempDir::new().unwrap();
    create_workspace(tmp.path());

    stowage()
        .args(["projects"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("@acme/server"))
        .stdout(predicate::str::contains("@acme/shared"))
        .stdout(predicate::str::contains("library"));
}
