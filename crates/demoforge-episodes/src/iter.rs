//! Ordered, lazily built episode views.

use crate::keys::{EpisodeEntry, EpisodeIndex, KeyMap};
use crate::schema::{episode_keys, episodes_group, EPISODES_GROUP};
use crate::store::Group;
use crate::view::{build_episode_view, EpisodeView};
use crate::Result;
use std::path::{Path, PathBuf};

/// The `episodes` container of an open dataset together with its ordering.
pub struct Episodes<'a> {
    root: &'a dyn Group,
    index: EpisodeIndex,
}

impl<'a> Episodes<'a> {
    /// Index the episodes under `root`, assigning label ids through `key_map`.
    pub fn open(root: &'a dyn Group, key_map: &mut KeyMap) -> Result<Self> {
        let keys = episode_keys(episodes_group(root)?.as_ref())?;
        let index = EpisodeIndex::build(keys, key_map);
        tracing::debug!("Indexed {} episodes", index.len());
        Ok(Self { root, index })
    }

    /// Index the episodes with a fresh key map.
    pub fn open_fresh(root: &'a dyn Group) -> Result<Self> {
        Self::open(root, &mut KeyMap::new())
    }

    pub fn index(&self) -> &EpisodeIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keep only the first `n` episodes in order.
    pub fn truncate(&mut self, n: usize) {
        self.index.truncate(n);
    }

    /// Open the group of one episode.
    pub fn episode(&self, entry: &EpisodeEntry) -> Result<Box<dyn Group + 'a>> {
        self.root
            .group(&format!("{}/{}", EPISODES_GROUP, entry.key))
    }

    /// Views of every indexed episode, in order.
    ///
    /// Each call starts a new pass over the same sequence.
    pub fn views(&self, video_root: &Path) -> EpisodeViews<'a> {
        EpisodeViews {
            root: self.root,
            entries: self.index.entries().to_vec().into_iter(),
            video_root: video_root.to_path_buf(),
        }
    }
}

/// Iterator over [`EpisodeView`]s, built one at a time.
pub struct EpisodeViews<'a> {
    root: &'a dyn Group,
    entries: std::vec::IntoIter<EpisodeEntry>,
    video_root: PathBuf,
}

impl Iterator for EpisodeViews<'_> {
    type Item = Result<EpisodeView>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        let result = self
            .root
            .group(&format!("{}/{}", EPISODES_GROUP, entry.key))
            .and_then(|episode| build_episode_view(&entry, episode.as_ref(), &self.video_root));
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for EpisodeViews<'_> {}

/// Views of every episode under `root` in stable order.
///
/// Does not validate; call [`assert_required_structure`](crate::assert_required_structure)
/// first.
pub fn iter_episode_views<'a>(root: &'a dyn Group, video_root: &Path) -> Result<EpisodeViews<'a>> {
    Ok(Episodes::open_fresh(root)?.views(video_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use crate::store::{ArrayData, MemoryDataset};

    fn dataset(keys: &[&str]) -> MemoryDataset {
        let mut ds = MemoryDataset::new();
        for key in keys {
            let base = format!("episodes/{}", key);
            ds.insert(&format!("{}/{}", base, DELTA_EEF), ArrayData::matrix(&[[0.0; 6]; 2]))
                .unwrap();
            ds.insert(&format!("{}/{}", base, TASK_TEXT), "task").unwrap();
            ds.insert(
                &format!("{}/{}", base, VIDEO_PATH),
                format!("videos/{}.mp4", key).as_str(),
            )
            .unwrap();
            ds.insert(&format!("{}/{}", base, VIDEO_FROM_TIMESTAMP), 0.0).unwrap();
            ds.insert(&format!("{}/{}", base, VIDEO_TO_TIMESTAMP), 1.0).unwrap();
            ds.insert(&format!("{}/{}", base, VIDEO_FPS), 30.0).unwrap();
        }
        ds
    }

    #[test]
    fn test_views_in_order() {
        let ds = dataset(&["10", "2", "b", "a"]);
        let keys: Vec<String> = iter_episode_views(&ds, Path::new("/v"))
            .unwrap()
            .map(|v| v.unwrap().episode_key)
            .collect();
        assert_eq!(keys, vec!["2", "10", "a", "b"]);
    }

    #[test]
    fn test_views_restartable() {
        let ds = dataset(&["1", "0", "x"]);
        let episodes = Episodes::open_fresh(&ds).unwrap();
        let first: Vec<EpisodeView> = episodes
            .views(Path::new("/v"))
            .collect::<Result<_>>()
            .unwrap();
        let second: Vec<EpisodeView> = episodes
            .views(Path::new("/v"))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(episodes.views(Path::new("/v")).len(), 3);
    }

    #[test]
    fn test_view_errors_are_per_item() {
        let mut ds = dataset(&["0", "1"]);
        ds.remove("episodes/1/meta/task_text");
        let results: Vec<Result<EpisodeView>> =
            iter_episode_views(&ds, Path::new("/v")).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_episode_access_and_truncate() {
        let ds = dataset(&["3", "1", "2"]);
        let mut episodes = Episodes::open_fresh(&ds).unwrap();
        let first = episodes.index().first().unwrap().clone();
        assert_eq!(first.key, "1");
        assert!(episodes.episode(&first).unwrap().contains(DELTA_EEF));

        episodes.truncate(2);
        assert_eq!(episodes.len(), 2);
    }
}
