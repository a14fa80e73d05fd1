//! Runs the dtsweave binary against projects on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("index.d.ts"),
        "import { Shape } from './shape';\nexport declare function area(s: Shape): number;\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("shape.d.ts"),
        "export interface Shape { w: number; h: number; }\nexport interface Unused {}\n",
    )
    .unwrap();
    temp
}

fn dtsweave(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dtsweave"))
        .arg("--project")
        .arg(project)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_bundles_into_out_dir() {
    let temp = project();
    let output = dtsweave(temp.path(), &["-n", "shapes"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let bundle = fs::read_to_string(temp.path().join("dist/shapes/shapes.d.ts")).unwrap();
    assert!(bundle.contains("declare module 'shapes/index' {"));
    assert!(temp.path().join("dist/shapes/index.d.ts").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = project();
    let output = dtsweave(temp.path(), &["-n", "shapes", "--dry-run", "--json"]);
    assert!(output.status.success());
    assert!(!temp.path().join("dist").exists());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["written"], false);
    assert_eq!(summary["module_name"], "shapes");
}

#[test]
fn test_list_json_reports_unused_exports() {
    let temp = project();
    let output = dtsweave(temp.path(), &["-n", "shapes", "--list", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["modules"].as_array().unwrap().len(), 2);
    assert_eq!(report["unused"][0]["exports"][0], "Unused");
}

#[test]
fn test_config_file_supplies_options() {
    let temp = project();
    let init = dtsweave(temp.path(), &["config", "init", "-n", "shapes"]);
    assert!(init.status.success());
    assert!(temp.path().join("dtsweave.toml").exists());

    let output = dtsweave(temp.path(), &["--style", "namespace"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(temp.path().join("dist/shapes.d.ts").exists());
}

#[test]
fn test_missing_module_name_fails() {
    let temp = project();
    let output = dtsweave(temp.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("moduleName"));
}

#[test]
fn test_missing_entry_export_fails() {
    let temp = project();
    let output = dtsweave(temp.path(), &["-n", "shapes", "--export", "nope"]);
    assert!(!output.status.success());
}
