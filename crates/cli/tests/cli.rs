use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const CATALOG: &str = r#"[
  {"name": "Earth", "tier": 0},
  {"name": "Fire", "tier": 0},
  {"name": "Water", "tier": 0},
  {"name": "Air", "tier": 0},
  {"name": "Lava", "tier": 1, "recipes": [["Earth", "Fire"], ["Water", "Fire"]]},
  {"name": "Stone", "tier": 2, "recipes": [["Lava", "Air"]]},
  {"name": "Clay", "tier": 2, "recipes": [["Stone", "Water"]]}
]"#;

fn setup() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let path = temp.path().join("recipes.json");
    fs::write(&path, CATALOG).unwrap();
    (temp, path)
}

#[allow(deprecated)]
fn crafting(catalog: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crafting").expect("binary");
    cmd.arg("--quiet").arg("--catalog").arg(catalog);
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn solve_prints_tree_and_stats() {
    let (_temp, catalog) = setup();

    let body = run_json(crafting(&catalog).args(["solve", "Stone", "--quota", "1"]));

    assert_eq!(body["tree"]["name"], "Stone");
    assert_eq!(body["tree"]["attributes"]["Type"], "element");
    let lava = &body["tree"]["children"][0]["children"][0];
    assert_eq!(lava["name"], "Lava");
    assert_eq!(lava["children"].as_array().unwrap().len(), 1);
    assert_eq!(body["outcome"]["mode"], "top_down");
    assert_eq!(body["outcome"]["termination"], "completed");
    assert_eq!(body["stats"]["recipes_chosen"], 2);
}

#[test]
fn solve_bidirectional_reports_both_sides() {
    let (_temp, catalog) = setup();

    let body = run_json(crafting(&catalog).args([
        "solve",
        "Stone",
        "--mode",
        "bidirectional",
        "--bottom-up",
        "dfs",
    ]));

    assert_eq!(body["outcome"]["mode"], "bidirectional");
    assert!(body["outcome"]["winner"].is_string());
    assert_eq!(body["tree"]["name"], "Stone");
}

#[test]
fn unknown_target_fails() {
    let (_temp, catalog) = setup();

    crafting(&catalog)
        .args(["solve", "Obsidian"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown item: Obsidian"));
}

#[test]
fn non_positive_quota_fails() {
    let (_temp, catalog) = setup();

    crafting(&catalog)
        .args(["solve", "Lava", "--quota", "-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid recipe quota -2"));
}

#[test]
fn stream_frames_snapshots_until_final() {
    let (_temp, catalog) = setup();

    let output = crafting(&catalog)
        .args(["stream", "Stone", "--delay-ms", "1"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let frames: Vec<Value> = stdout
        .split("\n\n")
        .filter(|frame| !frame.is_empty())
        .map(|frame| {
            let payload = frame.strip_prefix("data: ").expect("sse frame");
            serde_json::from_str(payload).expect("json payload")
        })
        .collect();

    assert!(frames.len() >= 2);
    let (last, partial) = frames.split_last().unwrap();
    assert_eq!(last["is_final"], true);
    assert_eq!(last["tree"]["name"], "Stone");
    assert!(partial.iter().all(|frame| frame["is_final"] == false));
}

#[test]
fn validate_reports_malformed_recipes() {
    let temp = tempdir().unwrap();
    let catalog = temp.path().join("recipes.json");
    fs::write(
        &catalog,
        r#"[
          {"name": "Earth", "tier": 0},
          {"name": "Mud", "tier": 1, "recipes": [["Earth", "Earth"], ["Mud", "Earth"], ["Earth", "Slime"]]}
        ]"#,
    )
    .unwrap();

    let body = run_json(crafting(&catalog).arg("validate"));
    assert_eq!(body["items"], 2);
    assert_eq!(body["clean"], false);
    assert_eq!(body["report"]["malformed"][0]["defect"]["kind"], "self_referential");
    assert_eq!(body["report"]["missing_ingredients"][0]["result"], "Mud");

    crafting(&catalog)
        .args(["validate", "--strict"])
        .assert()
        .failure();
}

#[test]
fn config_file_sets_defaults_and_flags_override() {
    let (temp, catalog) = setup();
    let config = temp.path().join("search.json");
    fs::write(&config, r#"{"recipe_limit": 1, "traversal": "breadth_first"}"#).unwrap();

    let body = run_json(
        crafting(&catalog)
            .arg("--config")
            .arg(&config)
            .args(["solve", "Lava", "--quota", "3"]),
    );

    assert_eq!(body["tree"]["children"].as_array().unwrap().len(), 2);
}

#[test]
fn config_file_rejects_unknown_keys() {
    let (temp, catalog) = setup();
    let config = temp.path().join("search.json");
    fs::write(&config, r#"{"recipe_limt": 2}"#).unwrap();

    crafting(&catalog)
        .arg("--config")
        .arg(&config)
        .args(["solve", "Lava"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("recipe_limt"));
}

#[test]
fn missing_catalog_is_reported() {
    let temp = tempdir().unwrap();

    crafting(&temp.path().join("absent.json"))
        .args(["solve", "Lava"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catalog"));
}
