//! End-to-end tests for the `dashview-admin` binary.

use std::process::Command;

mod fixtures;
use fixtures::*;

use tempfile::TempDir;

/// Path to the dashview-admin binary
fn dashview_bin() -> &'static str {
    env!("CARGO_BIN_EXE_dashview-admin")
}

fn run(temp_dir: &TempDir, args: &[&str]) -> std::process::Output {
    let (registry, settings) = (
        temp_dir.path().join("registry.json"),
        temp_dir.path().join("settings.json"),
    );
    let mut full: Vec<&str> = args.to_vec();
    full.extend([
        "--registry",
        registry.to_str().unwrap(),
        "--settings",
        settings.to_str().unwrap(),
    ]);
    Command::new(dashview_bin())
        .args(&full)
        .env("DASHVIEW_CONFIG_DIR", temp_dir.path())
        .env("DASHVIEW_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn stored_settings(temp_dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(temp_dir.path().join("settings.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_show_json() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["show", "--json"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should parse JSON output");
    let floors = result["floors"].as_array().unwrap();
    assert_eq!(floors.len(), 4, "three floors plus unassigned rooms");
    assert_eq!(floors[0]["id"], "ground");
    assert_eq!(floors[0]["rooms"][0]["name"], "Kitchen");
    assert_eq!(floors[3]["rooms"][0]["id"], "garden");
}

#[test]
fn test_room_disable_persists() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["room", "disable", "--area", "kitchen"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Disabled room Kitchen"), "stdout: {stdout}");

    assert_eq!(stored_settings(&temp_dir)["enabledRooms"]["kitchen"], false);
}

#[test]
fn test_floor_move_at_boundary_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["floor", "move", "--floor", "ground", "--step", "-1"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing to change"));

    let output = run(&temp_dir, &["floor", "move", "--floor", "attic", "--step", "-1"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stored_settings(&temp_dir)["floorOrder"],
        serde_json::json!(["ground", "attic", "first"])
    );
}

#[test]
fn test_unknown_area_exits_with_validation_error() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["room", "toggle", "--area", "cellar"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cellar"));
}

#[test]
fn test_missing_registry_exits_with_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(&temp_dir, &["show"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_entity_bulk_disable_with_filter() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(
        &temp_dir,
        &[
            "entity", "disable", "--type", "lights", "--area", "kitchen", "--filter", "co",
        ],
    );
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lights = &stored_settings(&temp_dir)["enabledByType"]["lights"];
    assert_eq!(lights["light.kitchen_counter"], false);
    assert!(lights.get("light.kitchen_spots").is_none());
}

#[test]
fn test_labels_suggest_apply() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["labels", "suggest", "--apply"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stored_settings(&temp_dir)["categoryLabelId"]["tvs"], "tv");
}

#[test]
fn test_validate_strict_reports_stale_ids() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{"enabledRooms": {"kitchen": false, "demolished": false}}"#,
    )
    .unwrap();

    let output = run(&temp_dir, &["validate", "--json"]);
    assert_eq!(output.status.code(), Some(0));
    let stale: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stale[0]["id"], "demolished");

    let output = run(&temp_dir, &["validate", "--strict"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_reset_requires_confirmation() {
    let temp_dir = TempDir::new().unwrap();
    write_home_files(temp_dir.path());

    let output = run(&temp_dir, &["reset"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run(&temp_dir, &["reset", "--yes"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stored_settings(&temp_dir)["floorOrder"], serde_json::json!([]));
}
