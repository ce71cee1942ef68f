//! # demoforge-episodes
//!
//! Episode extraction and validation for robot demonstration datasets.
//!
//! A dataset holds one group per episode under a top-level `episodes`
//! container. Each episode carries per-step action and observation arrays,
//! frame indices and timestamps, a task description, and the location and
//! time range of its video clip. This crate:
//!
//! - checks that the dataset follows the fixed episode schema
//! - orders episodes deterministically and assigns demo ids
//! - flattens each episode into an [`EpisodeView`]
//! - reports numerical problems in the per-step arrays as [`IssueTag`]s
//!
//! ## Backends
//!
//! - JSON snapshots (`.json`), always available
//! - `hdf5` - HDF5 files (`.hdf5` / `.h5`) through libhdf5
//!
//! ## Example
//!
//! ```
//! use demoforge_episodes::{assert_required_structure, iter_episode_views, MemoryDataset, SchemaCheck};
//! use std::path::Path;
//!
//! let snapshot = r#"{
//!   "episodes": {
//!     "0": {
//!       "action": {"delta_eef": {"shape": [2, 6], "data": [0,0,0,0,0,0, 0,0,0,0,0,0]}},
//!       "obs": {
//!         "proprio": {"shape": [2, 1], "data": [0, 0]},
//!         "eef_pose": {"shape": [2, 1], "data": [0, 0]}
//!       },
//!       "meta": {
//!         "frame_index": {"shape": [2], "data": [0, 1]},
//!         "timestamps": {"shape": [2], "data": [0.0, 0.033]},
//!         "task_text": "stack blocks",
//!         "video": {"path": "data/videos/ep0.mp4", "from_timestamp": 0.0, "to_timestamp": 2.0, "fps": 30}
//!       }
//!     }
//!   }
//! }"#;
//!
//! let dataset = MemoryDataset::from_snapshot_str(snapshot)?;
//! assert_required_structure(&dataset, SchemaCheck::FirstEpisode)?;
//! for view in iter_episode_views(&dataset, Path::new("/videos"))? {
//!     let view = view?;
//!     assert_eq!(view.video_path_resolved, Path::new("/videos/ep0.mp4"));
//! }
//! # Ok::<(), demoforge_episodes::Error>(())
//! ```

mod error;
pub mod iter;
pub mod keys;
pub mod schema;
pub mod store;
pub mod validate;
pub mod view;

// Re-exports
pub use error::{Error, Result};
pub use iter::{iter_episode_views, EpisodeViews, Episodes};
pub use keys::{parse_numeric_key, EpisodeEntry, EpisodeIndex, KeyMap};
pub use schema::{
    assert_required_structure, episode_keys, episodes_group, missing_paths, SchemaCheck,
    REQUIRED_EPISODE_PATHS,
};
pub use store::{ArrayData, DatasetFile, Group, MemoryDataset, Node, RawScalar};
pub use validate::{validate_episode_arrays, IssueTag};
pub use view::{
    build_episode_view, decode_scalar_string, decode_scalar_f64, resolve_video_path, EpisodeView,
    VIDEO_PATH_MARKER,
};

#[cfg(feature = "hdf5")]
pub use store::Hdf5Dataset;
