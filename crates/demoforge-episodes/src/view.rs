//! Flattened per-episode views.

use crate::keys::EpisodeEntry;
use crate::schema::{
    DELTA_EEF, TASK_TEXT, VIDEO_FPS, VIDEO_FROM_TIMESTAMP, VIDEO_PATH, VIDEO_TO_TIMESTAMP,
};
use crate::store::{Group, RawScalar};
use crate::{Error, Result};
use demoforge_common::DemoId;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory marker stripped from stored video paths before resolution.
pub const VIDEO_PATH_MARKER: &str = "videos/";

/// Immutable snapshot of one episode's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeView {
    pub episode_key: String,
    pub demo_id: DemoId,
    pub num_steps: usize,
    pub task_text: String,
    /// Video path exactly as stored in the dataset.
    pub video_path_hdf5: String,
    /// Stored path resolved against the local video root.
    pub video_path_resolved: PathBuf,
    pub from_timestamp: f64,
    pub to_timestamp: f64,
    pub fps: f64,
}

impl EpisodeView {
    /// Clip length in seconds. Not clamped; may be zero or negative.
    pub fn clip_duration(&self) -> f64 {
        self.to_timestamp - self.from_timestamp
    }
}

/// Resolve a stored video path against `video_root`.
///
/// If the path contains `videos/`, only the part after the first occurrence
/// is kept. An absolute path without the marker replaces the root.
pub fn resolve_video_path(video_root: &Path, raw: &str) -> PathBuf {
    let relative = match raw.split_once(VIDEO_PATH_MARKER) {
        Some((_, rest)) => rest,
        None => raw,
    };
    video_root.join(relative)
}

/// Decode a stored string field into an owned `String`.
///
/// Numbers render in float form (`3.0`, `nan`, `inf`) whatever their stored
/// integer or float type, since [`RawScalar::Number`] does not keep it.
pub fn decode_scalar_string(raw: &RawScalar) -> std::result::Result<String, String> {
    match raw {
        RawScalar::Text(text) => Ok(text.clone()),
        RawScalar::Bytes(bytes) => String::from_utf8(bytes.clone()).map_err(|e| e.to_string()),
        RawScalar::FixedChars(bytes) => {
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            std::str::from_utf8(&bytes[..end])
                .map(str::to_string)
                .map_err(|e| e.to_string())
        }
        RawScalar::Number(value) => Ok(render_number(*value)),
        RawScalar::ZeroDim(inner) => decode_scalar_string(inner),
    }
}

/// Decode a stored numeric field.
pub fn decode_scalar_f64(raw: &RawScalar) -> std::result::Result<f64, String> {
    match raw {
        RawScalar::Number(value) => Ok(*value),
        RawScalar::ZeroDim(inner) => decode_scalar_f64(inner),
        other => {
            let text = decode_scalar_string(other)?;
            let trimmed = text.trim();
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", trimmed))
        }
    }
}

fn render_number(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn read_string(episode: &dyn Group, path: &str) -> Result<String> {
    let raw = episode.scalar(path)?;
    decode_scalar_string(&raw).map_err(|message| Error::invalid_string(path, message))
}

fn read_f64(episode: &dyn Group, path: &str) -> Result<f64> {
    let raw = episode.scalar(path)?;
    decode_scalar_f64(&raw).map_err(|message| Error::invalid_scalar(path, message))
}

/// Build the view of one episode group.
///
/// Reads only metadata and the action shape; arrays are not validated here.
pub fn build_episode_view(
    entry: &EpisodeEntry,
    episode: &dyn Group,
    video_root: &Path,
) -> Result<EpisodeView> {
    let num_steps = episode
        .shape(DELTA_EEF)?
        .first()
        .copied()
        .ok_or_else(|| Error::invalid_shape(DELTA_EEF, "zero-dimensional action array"))?;

    let task_text = read_string(episode, TASK_TEXT)?;
    let video_path_hdf5 = read_string(episode, VIDEO_PATH)?;
    let from_timestamp = read_f64(episode, VIDEO_FROM_TIMESTAMP)?;
    let to_timestamp = read_f64(episode, VIDEO_TO_TIMESTAMP)?;
    let fps = read_f64(episode, VIDEO_FPS)?;

    let video_path_resolved = resolve_video_path(video_root, &video_path_hdf5);

    tracing::trace!(
        "Built view for episode {:?} (demo {}, {} steps)",
        entry.key,
        entry.demo_id,
        num_steps
    );

    Ok(EpisodeView {
        episode_key: entry.key.clone(),
        demo_id: entry.demo_id,
        num_steps,
        task_text,
        video_path_hdf5,
        video_path_resolved,
        from_timestamp,
        to_timestamp,
        fps,
    })
}
