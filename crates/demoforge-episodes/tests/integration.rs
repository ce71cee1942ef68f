//! Integration tests for demoforge-episodes

use assert_matches::assert_matches;
use demoforge_common::DemoId;
use demoforge_episodes::schema::{
    DELTA_EEF, EEF_POSE, FRAME_INDEX, PROPRIO, TASK_TEXT, TIMESTAMPS, VIDEO_FPS,
    VIDEO_FROM_TIMESTAMP, VIDEO_PATH, VIDEO_TO_TIMESTAMP,
};
use demoforge_episodes::{
    assert_required_structure, iter_episode_views, validate_episode_arrays, ArrayData,
    DatasetFile, EpisodeView, Episodes, Error, IssueTag, KeyMap, MemoryDataset, Result,
    SchemaCheck,
};
use std::path::{Path, PathBuf};

/// Insert a conformant episode with `steps` steps under `episodes/<key>`.
fn add_episode(ds: &mut MemoryDataset, key: &str, steps: usize) {
    let at = |path: &str| format!("episodes/{}/{}", key, path);
    let ramp: Vec<f64> = (0..steps).map(|i| i as f64).collect();

    ds.insert(&at(DELTA_EEF), ArrayData::matrix(&vec![[0.01; 6]; steps]))
        .unwrap();
    ds.insert(&at(PROPRIO), ArrayData::matrix(&vec![[0.5; 6]; steps]))
        .unwrap();
    ds.insert(&at(EEF_POSE), ArrayData::matrix(&vec![[0.0; 7]; steps]))
        .unwrap();
    ds.insert(&at(FRAME_INDEX), ArrayData::vector(ramp.clone()))
        .unwrap();
    ds.insert(
        &at(TIMESTAMPS),
        ArrayData::vector(ramp.iter().map(|i| i / 30.0).collect()),
    )
    .unwrap();
    ds.insert(&at(TASK_TEXT), "put the cube in the bowl").unwrap();
    ds.insert(
        &at(VIDEO_PATH),
        format!("so101/videos/chunk-000/episode_{}.mp4", key).as_str(),
    )
    .unwrap();
    ds.insert(&at(VIDEO_FROM_TIMESTAMP), 0.0).unwrap();
    ds.insert(&at(VIDEO_TO_TIMESTAMP), steps as f64 / 30.0)
        .unwrap();
    ds.insert(&at(VIDEO_FPS), 30.0).unwrap();
}

fn collect_views(ds: &MemoryDataset, root: &Path) -> Vec<EpisodeView> {
    iter_episode_views(ds, root)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_two_episode_dataset_end_to_end() {
    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "0", 8);
    add_episode(&mut ds, "1", 8);
    let mut pose = vec![[0.0; 7]; 8];
    pose[3][2] = f64::NAN;
    ds.insert("episodes/1/obs/eef_pose", ArrayData::matrix(&pose))
        .unwrap();

    assert_required_structure(&ds, SchemaCheck::FirstEpisode).unwrap();

    let views = collect_views(&ds, Path::new("/data/raw"));
    let ids: Vec<u64> = views.iter().map(|v| v.demo_id.get()).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(
        views[1].video_path_resolved,
        PathBuf::from("/data/raw/chunk-000/episode_1.mp4")
    );

    let episodes = Episodes::open_fresh(&ds).unwrap();
    let issues: Vec<Vec<IssueTag>> = episodes
        .index()
        .iter()
        .map(|entry| validate_episode_arrays(episodes.episode(entry).unwrap().as_ref()).unwrap())
        .collect();
    assert_eq!(issues[0], Vec::<IssueTag>::new());
    assert_eq!(issues[1], vec![IssueTag::EefPoseNonFinite]);
}

#[test]
fn test_iteration_is_restartable_from_fresh_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.json");

    let mut ds = MemoryDataset::new();
    for key in ["7", "12", "3", "pour", "wipe"] {
        add_episode(&mut ds, key, 4);
    }
    ds.save_snapshot(&path).unwrap();

    let first = {
        let file = DatasetFile::open(&path).unwrap();
        iter_episode_views(file.root(), Path::new("/v"))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    };
    let second = {
        let file = DatasetFile::open(&path).unwrap();
        iter_episode_views(file.root(), Path::new("/v"))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    };

    assert_eq!(first, second);
    let keys: Vec<&str> = first.iter().map(|v| v.episode_key.as_str()).collect();
    assert_eq!(keys, vec!["3", "7", "12", "pour", "wipe"]);
}

#[test]
fn test_numeric_keys_become_demo_ids() {
    let mut ds = MemoryDataset::new();
    for key in ["0", "5", "41"] {
        add_episode(&mut ds, key, 2);
    }
    for view in collect_views(&ds, Path::new("/v")) {
        assert_eq!(
            view.demo_id,
            DemoId::new(view.episode_key.parse().unwrap())
        );
    }
}

#[test]
fn test_label_ids_persist_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let map_path = dir.path().join("key_map.json");

    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "2", 2);
    add_episode(&mut ds, "stack", 2);

    let mut map = KeyMap::load_or_default(&map_path).unwrap();
    let stack_id = {
        let episodes = Episodes::open(&ds, &mut map).unwrap();
        episodes.index().entries()[1].demo_id
    };
    assert_eq!(stack_id, DemoId::new(3));
    map.save(&map_path).unwrap();

    // A later dataset gains a label sorting first and a larger numeric key.
    add_episode(&mut ds, "align", 2);
    add_episode(&mut ds, "9", 2);
    let mut map = KeyMap::load(&map_path).unwrap();
    let episodes = Episodes::open(&ds, &mut map).unwrap();
    let ids: Vec<(&str, u64)> = episodes
        .index()
        .iter()
        .map(|e| (e.key.as_str(), e.demo_id.get()))
        .collect();
    assert_eq!(ids, vec![("2", 2), ("stack", 3), ("9", 9), ("align", 10)]);
}

#[test]
fn test_missing_fps_fails_before_views() {
    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "0", 3);
    add_episode(&mut ds, "1", 3);
    ds.remove("episodes/0/meta/video/fps");

    let err = assert_required_structure(&ds, SchemaCheck::FirstEpisode).unwrap_err();
    assert_matches!(err, Error::MissingPaths { ref episode_key, ref missing } => {
        assert_eq!(episode_key, "0");
        assert_eq!(missing, &vec!["meta/video/fps".to_string()]);
    });
    assert!(err.is_schema_error());
}

#[test]
fn test_all_episode_check_finds_later_gap() {
    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "0", 3);
    add_episode(&mut ds, "1", 3);
    ds.remove("episodes/1/obs/proprio");

    assert!(assert_required_structure(&ds, SchemaCheck::FirstEpisode).is_ok());
    assert_matches!(
        assert_required_structure(&ds, SchemaCheck::AllEpisodes),
        Err(Error::MissingPaths { episode_key, .. }) if episode_key == "1"
    );
}

#[test]
fn test_mismatched_lengths_only_tag() {
    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "0", 6);
    ds.insert(
        "episodes/0/meta/timestamps",
        ArrayData::vector(vec![0.0, 0.1, 0.2, 0.3, 0.4]),
    )
    .unwrap();

    let episodes = Episodes::open_fresh(&ds).unwrap();
    let entry = episodes.index().first().unwrap();
    let issues = validate_episode_arrays(episodes.episode(entry).unwrap().as_ref()).unwrap();
    assert_eq!(issues, vec![IssueTag::LengthMismatch]);
}

#[test]
fn test_frame_index_with_repeats_is_monotonic() {
    let mut ds = MemoryDataset::new();
    add_episode(&mut ds, "0", 6);
    ds.insert(
        "episodes/0/meta/frame_index",
        ArrayData::vector(vec![0.0, 0.0, 1.0, 2.0, 2.0, 3.0]),
    )
    .unwrap();

    let episodes = Episodes::open_fresh(&ds).unwrap();
    let entry = episodes.index().first().unwrap();
    let issues = validate_episode_arrays(episodes.episode(entry).unwrap().as_ref()).unwrap();
    assert!(issues.is_empty());
}

#[test]
fn test_snapshot_strings_and_specials() {
    let snapshot = r#"{
      "episodes": {
        "0": {
          "action": {"delta_eef": {"shape": [2, 6], "data": [0,0,0,0,0,0, 0,0,0,0,0,"NaN"]}},
          "obs": {
            "proprio": {"shape": [2], "data": [0, 1]},
            "eef_pose": {"shape": [2], "data": ["inf", 1]}
          },
          "meta": {
            "frame_index": {"shape": [2], "data": [0, 1]},
            "timestamps": {"shape": [2], "data": [0.0, 0.1]},
            "task_text": "déplacer le bloc",
            "video": {
              "path": "videos/a/videos/b.mp4",
              "from_timestamp": "1.5",
              "to_timestamp": 3,
              "fps": {"shape": [], "data": [15]}
            }
          }
        }
      }
    }"#;
    let ds = MemoryDataset::from_snapshot_str(snapshot).unwrap();
    let views = collect_views(&ds, Path::new("/root"));
    assert_eq!(views[0].task_text, "déplacer le bloc");
    assert_eq!(views[0].video_path_resolved, PathBuf::from("/root/a/videos/b.mp4"));
    assert_eq!(views[0].from_timestamp, 1.5);
    assert_eq!(views[0].fps, 15.0);

    let episodes = Episodes::open_fresh(&ds).unwrap();
    let entry = episodes.index().first().unwrap();
    let issues = validate_episode_arrays(episodes.episode(entry).unwrap().as_ref()).unwrap();
    assert_eq!(
        issues,
        vec![IssueTag::DeltaEefNonFinite, IssueTag::EefPoseNonFinite]
    );
}
