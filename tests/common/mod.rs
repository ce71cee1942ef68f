//! Shared fixtures for integration tests.
//!
//! Provides [`TestDataset`], which lays out a JSON dataset snapshot and its
//! source videos inside a temporary directory.

#![allow(dead_code)]

use demoforge_episodes::schema::{
    DELTA_EEF, EEF_POSE, FRAME_INDEX, PROPRIO, TASK_TEXT, TIMESTAMPS, VIDEO_FPS,
    VIDEO_FROM_TIMESTAMP, VIDEO_PATH, VIDEO_TO_TIMESTAMP,
};
use demoforge_episodes::{ArrayData, MemoryDataset};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FPS: f64 = 30.0;

/// A dataset snapshot plus video root in a scratch directory.
pub struct TestDataset {
    pub dir: TempDir,
    pub dataset: MemoryDataset,
}

impl TestDataset {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("videos")).unwrap();
        Self {
            dir,
            dataset: MemoryDataset::new(),
        }
    }

    /// Dataset with `count` clean episodes keyed "0".."count-1", videos present.
    pub fn with_episodes(count: usize, steps: usize) -> Self {
        let mut ds = Self::new();
        for i in 0..count {
            ds.add_episode(&i.to_string(), steps, "put the cube in the bowl");
            ds.create_video(&i.to_string());
        }
        ds
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn video_root(&self) -> PathBuf {
        self.path("videos")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.path("demos.json")
    }

    /// Stored (unresolved) video path for an episode.
    pub fn stored_video_path(key: &str) -> String {
        format!(
            "so101/videos/chunk-000/observation.images.front/episode_{}.mp4",
            key
        )
    }

    /// Where the stored path resolves under the video root.
    pub fn resolved_video_path(&self, key: &str) -> PathBuf {
        self.video_root()
            .join("chunk-000/observation.images.front")
            .join(format!("episode_{}.mp4", key))
    }

    /// Insert a conformant episode under `episodes/<key>`.
    pub fn add_episode(&mut self, key: &str, steps: usize, task: &str) {
        let at = |path: &str| format!("episodes/{}/{}", key, path);
        let ramp: Vec<f64> = (0..steps).map(|i| i as f64).collect();
        let ds = &mut self.dataset;

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
            ArrayData::vector(ramp.iter().map(|i| i / FPS).collect()),
        )
        .unwrap();
        ds.insert(&at(TASK_TEXT), task).unwrap();
        ds.insert(&at(VIDEO_PATH), Self::stored_video_path(key).as_str())
            .unwrap();
        ds.insert(&at(VIDEO_FROM_TIMESTAMP), 0.0).unwrap();
        ds.insert(&at(VIDEO_TO_TIMESTAMP), steps as f64 / FPS)
            .unwrap();
        ds.insert(&at(VIDEO_FPS), FPS).unwrap();
    }

    /// Replace one node of an episode.
    pub fn set_array(&mut self, key: &str, path: &str, array: ArrayData) {
        self.dataset
            .insert(&format!("episodes/{}/{}", key, path), array)
            .unwrap();
    }

    /// Write a placeholder source video for an episode.
    pub fn create_video(&self, key: &str) -> PathBuf {
        let path = self.resolved_video_path(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("video bytes for {}", key)).unwrap();
        path
    }

    /// Write the snapshot to disk and return its path.
    pub fn save(&self) -> PathBuf {
        let path = self.snapshot_path();
        self.dataset.save_snapshot(&path).unwrap();
        path
    }
}

/// Read a JSONL file into generic JSON values.
pub fn read_jsonl(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Read a JSON file into a generic value.
pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
