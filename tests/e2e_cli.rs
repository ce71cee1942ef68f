//! CLI end-to-end tests
//!
//! Tests for the demoforge command-line interface.

mod common;

use assert_cmd::prelude::*;
use common::{read_json, read_jsonl, TestDataset};
use demoforge_episodes::schema::TIMESTAMPS;
use demoforge_episodes::ArrayData;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Get a command for the demoforge binary, run from `dir`.
#[allow(deprecated)]
fn demoforge_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("demoforge").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn validate_cmd(ds: &TestDataset) -> Command {
    let mut cmd = demoforge_cmd(ds.root());
    cmd.arg("validate")
        .arg("--hdf5")
        .arg(ds.snapshot_path())
        .arg("--video-root")
        .arg(ds.video_root())
        .arg("--manifest-out")
        .arg(ds.path("manifests/episodes.jsonl"))
        .arg("--report-out")
        .arg(ds.path("manifests/report.json"));
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    demoforge_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let dir = tempfile::tempdir().unwrap();
    demoforge_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("demoforge "));
}

#[test]
fn test_cli_check_tools_command() {
    let dir = tempfile::tempdir().unwrap();
    demoforge_cmd(dir.path())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("demoforge.toml");
    fs::write(
        &config,
        r#"
[paths]
video_root = "/mnt/so101/videos"

[validation]
schema_check = "all"
"#,
    )
    .unwrap();

    demoforge_cmd(dir.path())
        .arg("validate-config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("/mnt/so101/videos"))
        .stdout(predicate::str::contains("Schema check: all"));
}

#[test]
fn test_cli_validate_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[transfer]\nprompt_profiles = []\n").unwrap();

    demoforge_cmd(dir.path())
        .args(["validate-config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("prompt_profiles"));
}

#[test]
fn test_cli_validate_passes() {
    let ds = TestDataset::with_episodes(2, 30);
    ds.save();

    validate_cmd(&ds)
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation passed."));

    assert_eq!(read_jsonl(&ds.path("manifests/episodes.jsonl")).len(), 2);
    assert_eq!(read_json(&ds.path("manifests/report.json"))["episodes_total"], 2);
}

#[test]
fn test_cli_validate_fails_after_writing_outputs() {
    let mut ds = TestDataset::with_episodes(2, 4);
    ds.set_array("1", TIMESTAMPS, ArrayData::vector(vec![0.0, 0.1, 0.05, 0.2]));
    ds.save();

    validate_cmd(&ds)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));

    let report = read_json(&ds.path("manifests/report.json"));
    assert_eq!(report["episodes_with_issues"], 1);
    assert_eq!(report["issues"][0]["issues"][0], "timestamps_not_monotonic");
    assert!(ds.path("manifests/episodes.jsonl").exists());
}

#[test]
fn test_cli_validate_missing_dataset() {
    let ds = TestDataset::new();
    validate_cmd(&ds)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing HDF5"));
    assert!(!ds.path("manifests/report.json").exists());
}

#[test]
fn test_cli_validate_zero_episodes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("videos")).unwrap();
    fs::write(dir.path().join("empty.json"), r#"{"episodes": {}}"#).unwrap();

    demoforge_cmd(dir.path())
        .args(["validate", "--hdf5", "empty.json", "--video-root", "videos"])
        .args(["--manifest-out", "m.jsonl", "--report-out", "r.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zero episodes"));
}

#[test]
fn test_cli_promote() {
    let ds = TestDataset::with_episodes(1, 10);
    let incoming = ds.save();
    let canonical = ds.path("canonical/demos.json");
    let meta = ds.path("meta.json");

    let promote = || {
        let mut cmd = demoforge_cmd(ds.root());
        cmd.arg("promote")
            .arg("--incoming-hdf5")
            .arg(&incoming)
            .arg("--canonical-hdf5")
            .arg(&canonical)
            .arg("--meta-out")
            .arg(&meta);
        cmd
    };

    promote()
        .assert()
        .success()
        .stdout(predicate::str::contains("Created canonical HDF5"));
    promote()
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));

    fs::write(&canonical, "stale").unwrap();
    promote()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use --force to overwrite"));
    promote()
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overwrote canonical HDF5"));

    assert_eq!(read_json(&meta)["content_match"], true);
}

fn export_cmd(ds: &TestDataset) -> Command {
    let mut cmd = demoforge_cmd(ds.root());
    cmd.arg("export")
        .arg("--input-hdf5")
        .arg(ds.snapshot_path())
        .arg("--video-root")
        .arg(ds.video_root())
        .arg("--output-dir")
        .arg(ds.path("original"))
        .arg("--manifest-out")
        .arg(ds.path("export.jsonl"))
        .arg("--checksums-out")
        .arg(ds.path("export.sha256"))
        .arg("--report-out")
        .arg(ds.path("export_report.json"));
    cmd
}

#[test]
fn test_cli_export_dry_run() {
    let ds = TestDataset::with_episodes(3, 30);
    ds.save();

    export_cmd(&ds)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported: 3"));

    let rows = read_jsonl(&ds.path("export.jsonl"));
    assert_eq!(rows[2]["output_video_name"], "demo_0002_front.mp4");
    assert!(!ds.path("export.sha256").exists());
}

#[test]
fn test_cli_export_missing_source_fails() {
    let mut ds = TestDataset::with_episodes(1, 30);
    ds.add_episode("1", 30, "stack the cups");
    ds.save();

    export_cmd(&ds)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Export incomplete"));

    let report = read_json(&ds.path("export_report.json"));
    assert_eq!(report["missing_sources"], 1);
    assert_eq!(report["exported_count"], 1);
}

#[test]
fn test_cli_export_without_ffmpeg_records_failures() {
    let ds = TestDataset::with_episodes(2, 30);
    ds.save();

    export_cmd(&ds)
        .args(["--ffmpeg-bin", "/nonexistent/bin/ffmpeg"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed exports: 2"));

    let rows = read_jsonl(&ds.path("export.jsonl"));
    assert!(rows.iter().all(|r| r["status"] == "failed"));
    assert!(rows[0]["error"].as_str().unwrap().contains("not found"));
}

fn ids_by_key(rows: &[serde_json::Value]) -> Vec<(String, u64)> {
    let mut ids: Vec<(String, u64)> = rows
        .iter()
        .map(|r| {
            (
                r["episode_key"].as_str().unwrap().to_string(),
                r["demo_id"].as_u64().unwrap(),
            )
        })
        .collect();
    ids.sort();
    ids
}

#[test]
fn test_cli_export_uses_validate_key_map() {
    let mut ds = TestDataset::new();
    ds.add_episode("zeta", 30, "put the cube in the bowl");
    ds.create_video("zeta");
    ds.save();
    let key_map = ds.path("key_map.json");

    validate_cmd(&ds).arg("--key-map").arg(&key_map).assert().success();

    // A label that sorts first arrives later and must not steal zeta's id.
    ds.add_episode("alpha", 30, "stack the cups");
    ds.create_video("alpha");
    ds.save();
    validate_cmd(&ds).arg("--key-map").arg(&key_map).assert().success();

    export_cmd(&ds)
        .arg("--dry-run")
        .arg("--key-map")
        .arg(&key_map)
        .assert()
        .success();

    let validated = ids_by_key(&read_jsonl(&ds.path("manifests/episodes.jsonl")));
    let exported = ids_by_key(&read_jsonl(&ds.path("export.jsonl")));
    assert_eq!(
        validated,
        vec![("alpha".to_string(), 1), ("zeta".to_string(), 0)]
    );
    assert_eq!(exported, validated);

    let names: Vec<String> = read_jsonl(&ds.path("export.jsonl"))
        .iter()
        .map(|r| r["output_video_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["demo_0000_front.mp4", "demo_0001_front.mp4"]);
}

#[test]
fn test_cli_export_key_map_from_config() {
    let mut ds = TestDataset::new();
    ds.add_episode("zeta", 30, "put the cube in the bowl");
    ds.create_video("zeta");
    ds.save();
    let key_map = ds.path("key_map.json");
    validate_cmd(&ds).arg("--key-map").arg(&key_map).assert().success();

    ds.add_episode("alpha", 30, "stack the cups");
    ds.create_video("alpha");
    ds.save();
    validate_cmd(&ds).arg("--key-map").arg(&key_map).assert().success();

    let config = ds.path("demoforge.toml");
    fs::write(
        &config,
        format!("[validation]\nkey_map = {:?}\n", key_map.display().to_string()),
    )
    .unwrap();

    export_cmd(&ds)
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success();

    assert_eq!(
        ids_by_key(&read_jsonl(&ds.path("export.jsonl"))),
        vec![("alpha".to_string(), 1), ("zeta".to_string(), 0)]
    );
}

#[test]
fn test_cli_transfer_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("original");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("demo_0000_front.mp4"), "a").unwrap();
    fs::write(input.join("demo_0001_front.mp4"), "b").unwrap();

    demoforge_cmd(dir.path())
        .args(["transfer", "--input-videos-dir", "original"])
        .args(["--run-id", "pilot", "--run-root", "runs"])
        .args(["--variants-per-demo", "3", "--prompt-profiles", "fog, night"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jobs: 6"));

    let run_dir = dir.path().join("runs/pilot");
    let jobs = read_jsonl(&run_dir.join("transfer_jobs.jsonl"));
    let profiles: Vec<&str> = jobs
        .iter()
        .map(|j| j["prompt_profile"].as_str().unwrap())
        .collect();
    assert_eq!(profiles, vec!["fog", "night", "fog", "fog", "night", "fog"]);
    assert!(run_dir.join("requests/job_000005.json").exists());
    assert_eq!(read_json(&run_dir.join("run_metadata.json"))["unique_demo_ids"], 2);
}

#[test]
fn test_cli_transfer_no_matching_videos() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("original")).unwrap();

    demoforge_cmd(dir.path())
        .args(["transfer", "--input-videos-dir", "original", "--run-root", "runs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No videos found"));
}

#[test]
fn test_cli_budget() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("manifest.jsonl"),
        "{\"from_timestamp\":0.0,\"to_timestamp\":10.0}\n{\"num_steps\":150,\"fps\":30.0}\n",
    )
    .unwrap();

    demoforge_cmd(dir.path())
        .args(["budget", "--manifest-jsonl", "manifest.jsonl"])
        .args(["--variants-per-demo", "2"])
        .args(["--pilot-output-seconds", "10", "--pilot-wall-seconds", "20"])
        .args(["--gpu-hours-budget", "1", "--output-json", "budget.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total input seconds: 15.00"));

    let estimate = read_json(&dir.path().join("budget.json"));
    assert_eq!(estimate["episodes"], 2);
    assert_eq!(estimate["total_output_seconds"], 30.0);
    // 1 GPU-hour at 0.5 output s per GPU s covers 1800 s, i.e. 120 variants.
    assert_eq!(estimate["max_variants_by_gpu_hours"], 120);
}

#[test]
fn test_cli_budget_rejects_unusable_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("manifest.jsonl"), "{\"demo_id\":0}\n").unwrap();

    demoforge_cmd(dir.path())
        .args(["budget", "--manifest-jsonl", "manifest.jsonl"])
        .args(["--pilot-output-seconds", "10", "--pilot-wall-seconds", "20"])
        .args(["--output-json", "budget.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("num_steps+fps"));
}

#[test]
fn test_cli_budget_rejects_zero_gpu_power() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("manifest.jsonl"),
        "{\"from_timestamp\":0.0,\"to_timestamp\":10.0}\n",
    )
    .unwrap();

    demoforge_cmd(dir.path())
        .args(["budget", "--manifest-jsonl", "manifest.jsonl"])
        .args(["--pilot-output-seconds", "10", "--pilot-wall-seconds", "20"])
        .args(["--avg-gpu-power-watts", "0", "--energy-kwh-budget", "5"])
        .args(["--output-json", "budget.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--avg-gpu-power-watts must be > 0"));

    assert!(!dir.path().join("budget.json").exists());
}

#[test]
fn test_cli_reason_originals_only() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("episodes.jsonl"),
        concat!(
            "{\"demo_id\":0,\"task_text\":\"pick\",\"expected_export_name\":\"demo_0000_front.mp4\"}\n",
            "{\"demo_id\":1,\"task_text\":\"place\",\"video_path_resolved\":\"/raw/ep1.mp4\"}\n",
        ),
    )
    .unwrap();

    demoforge_cmd(dir.path())
        .args(["reason", "--original-manifest-jsonl", "episodes.jsonl"])
        .args(["--keyframes", "start,end"])
        .args(["--output-requests-jsonl", "requests.jsonl"])
        .args(["--output-report-json", "report.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total requests: 2"));

    let requests = read_jsonl(&dir.path().join("requests.jsonl"));
    assert_eq!(requests[0]["video_path"], "data/videos/original/demo_0000_front.mp4");
    assert_eq!(requests[1]["video_path"], "/raw/ep1.mp4");
    assert_eq!(requests[1]["keyframes"], serde_json::json!(["start", "end"]));
    assert_eq!(read_json(&dir.path().join("report.json"))["augmented_total"], 0);
}
