//! Path and file-name conventions shared by the pipeline stages.
//!
//! Exported clips are named `demo_<id:04>_<camera>.mp4` and augmented outputs
//! `demo_<id:04>_v<variant:02>_<camera>.mp4`. Downstream stages recover the
//! demo id and camera key from these names, so both directions live here.

use crate::DemoId;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static DEMO_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^demo_(\d+)_(.+)\.mp4$").expect("valid demo name pattern"));

/// File name of the per-episode clip produced by the exporter.
pub fn export_file_name(demo_id: DemoId, camera_key: &str) -> String {
    format!("demo_{}_{}.mp4", demo_id.padded(), camera_key)
}

/// File name of one augmented variant expected back from the transfer service.
pub fn augmented_file_name(demo_id: DemoId, variant_idx: u32, camera_key: &str) -> String {
    format!("demo_{}_v{:02}_{}.mp4", demo_id.padded(), variant_idx, camera_key)
}

/// Extract `(demo_id, camera_key)` from an exported clip name.
///
/// # Examples
///
/// ```
/// use demoforge_common::{paths::parse_demo_filename, DemoId};
///
/// let (demo, camera) = parse_demo_filename("demo_0012_wrist.mp4").unwrap();
/// assert_eq!(demo, DemoId::new(12));
/// assert_eq!(camera, "wrist");
/// assert!(parse_demo_filename("notes.txt").is_none());
/// ```
pub fn parse_demo_filename(name: &str) -> Option<(DemoId, String)> {
    let caps = DEMO_NAME_PATTERN.captures(name)?;
    let demo_id = caps[1].parse::<u64>().ok()?;
    Some((DemoId::new(demo_id), caps[2].to_string()))
}

/// Infer a stable camera key from the raw video path stored in the dataset.
pub fn infer_camera_key(raw_video_path: &str) -> String {
    let lower = raw_video_path.to_lowercase();
    if lower.contains("observation.images.front") {
        return "front".to_string();
    }
    if lower.contains("wrist") {
        return "wrist".to_string();
    }
    Path::new(raw_video_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace('.', "_"))
        .unwrap_or_default()
}
