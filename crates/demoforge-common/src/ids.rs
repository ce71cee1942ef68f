//! Typed ID wrappers for type safety across demoforge.
//!
//! Demo ids and job ids are both plain integers on disk; the newtypes keep a
//! job counter from being used where a demo id is expected.

use serde::{Deserialize, Serialize};

/// Integer identifier of one demonstration episode.
///
/// Used as the zero-padded file-name component (`demo_0004_front.mp4`) and
/// as the join key between manifests of different stages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DemoId(u64);

impl DemoId {
    /// Wrap a raw demo id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Four-digit zero padded form used in file names.
    #[must_use]
    pub fn padded(self) -> String {
        format!("{:04}", self.0)
    }
}

impl From<u64> for DemoId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<DemoId> for u64 {
    fn from(id: DemoId) -> Self {
        id.0
    }
}

impl std::fmt::Display for DemoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential identifier of one augmentation job within a run bundle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Wrap a raw job counter.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The next job id in sequence.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job_{:06}", self.0)
    }
}
