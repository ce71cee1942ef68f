//! The fixed episode schema: where things live and which fields must exist.

use crate::keys::EpisodeIndex;
use crate::store::Group;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the top-level container holding one group per episode.
pub const EPISODES_GROUP: &str = "episodes";

pub const DELTA_EEF: &str = "action/delta_eef";
pub const PROPRIO: &str = "obs/proprio";
pub const EEF_POSE: &str = "obs/eef_pose";
pub const FRAME_INDEX: &str = "meta/frame_index";
pub const TIMESTAMPS: &str = "meta/timestamps";
pub const TASK_TEXT: &str = "meta/task_text";
pub const VIDEO_PATH: &str = "meta/video/path";
pub const VIDEO_FROM_TIMESTAMP: &str = "meta/video/from_timestamp";
pub const VIDEO_TO_TIMESTAMP: &str = "meta/video/to_timestamp";
pub const VIDEO_FPS: &str = "meta/video/fps";

/// Every path an episode group must contain, in reporting order.
pub const REQUIRED_EPISODE_PATHS: [&str; 10] = [
    DELTA_EEF,
    PROPRIO,
    EEF_POSE,
    FRAME_INDEX,
    TIMESTAMPS,
    TASK_TEXT,
    VIDEO_PATH,
    VIDEO_FROM_TIMESTAMP,
    VIDEO_TO_TIMESTAMP,
    VIDEO_FPS,
];

/// Open the `episodes` container under `root`.
pub fn episodes_group<'a>(root: &'a dyn Group) -> Result<Box<dyn Group + 'a>> {
    if !root.contains(EPISODES_GROUP) {
        return Err(Error::MissingEpisodesGroup);
    }
    match root.group(EPISODES_GROUP) {
        Ok(group) => Ok(group),
        Err(Error::WrongKind { .. }) => Err(Error::MissingEpisodesGroup),
        Err(e) => Err(e),
    }
}

/// Episode keys as the store lists them. Use [`EpisodeIndex`] for ordering.
pub fn episode_keys(episodes: &dyn Group) -> Result<Vec<String>> {
    episodes.member_names()
}

/// Required paths absent from one episode group, in canonical order.
pub fn missing_paths(episode: &dyn Group) -> Vec<&'static str> {
    REQUIRED_EPISODE_PATHS
        .iter()
        .copied()
        .filter(|path| !episode.contains(path))
        .collect()
}

/// How many episodes the structural check inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaCheck {
    /// Only the first episode in sorted order; the rest are assumed to match.
    #[default]
    #[serde(rename = "first")]
    FirstEpisode,
    /// Every episode.
    #[serde(rename = "all")]
    AllEpisodes,
}

impl SchemaCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaCheck::FirstEpisode => "first",
            SchemaCheck::AllEpisodes => "all",
        }
    }
}

impl fmt::Display for SchemaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaCheck {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(SchemaCheck::FirstEpisode),
            "all" => Ok(SchemaCheck::AllEpisodes),
            other => Err(format!(
                "invalid schema check '{}', expected 'first' or 'all'",
                other
            )),
        }
    }
}

/// Check that the dataset follows the episode schema before any view is built.
///
/// Episodes are visited in [`EpisodeIndex`] order; the first one with missing
/// paths fails with every missing path listed.
pub fn assert_required_structure(root: &dyn Group, check: SchemaCheck) -> Result<()> {
    let episodes = episodes_group(root)?;
    let index = EpisodeIndex::from_keys(episode_keys(episodes.as_ref())?);
    if index.is_empty() {
        return Err(Error::NoEpisodes);
    }

    let to_check = match check {
        SchemaCheck::FirstEpisode => 1,
        SchemaCheck::AllEpisodes => index.len(),
    };

    for entry in index.iter().take(to_check) {
        let episode = episodes.group(&entry.key)?;
        let missing = missing_paths(episode.as_ref());
        if !missing.is_empty() {
            return Err(Error::MissingPaths {
                episode_key: entry.key.clone(),
                missing: missing.into_iter().map(String::from).collect(),
            });
        }
    }

    tracing::debug!(
        "Schema check ({}) passed for {} of {} episodes",
        check,
        to_check,
        index.len()
    );
    Ok(())
}
