//! Read access to hierarchical episode containers.
//!
//! The core never talks to a file format directly. It reads through
//! [`Group`], an object-safe view of one node of a hierarchical container
//! (an HDF5 group, or a group of the in-memory tree). Paths are relative and
//! `/`-separated, e.g. `meta/video/fps`.

mod memory;

#[cfg(feature = "hdf5")]
mod hdf5;

pub use memory::{MemoryDataset, Node};

#[cfg(feature = "hdf5")]
pub use self::hdf5::Hdf5Dataset;

use crate::{Error, Result};
use std::path::Path;

/// One group of a hierarchical dataset.
pub trait Group {
    /// Names of the direct children of this group.
    fn member_names(&self) -> Result<Vec<String>>;

    /// Whether `path` resolves to any node below this group.
    fn contains(&self, path: &str) -> bool;

    /// Open the child group at `path`.
    fn group(&self, path: &str) -> Result<Box<dyn Group + '_>>;

    /// Shape of the array at `path` without reading its elements.
    fn shape(&self, path: &str) -> Result<Vec<usize>>;

    /// Read the array at `path`, converted to `f64`.
    fn array(&self, path: &str) -> Result<ArrayData>;

    /// Read the scalar at `path` in whatever representation the store holds.
    fn scalar(&self, path: &str) -> Result<RawScalar>;
}

/// A dense row-major array read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl ArrayData {
    /// Build an array, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::invalid_shape(
                "array",
                format!(
                    "shape {:?} holds {} elements but {} were given",
                    shape,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array.
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Two-dimensional array from fixed-width rows.
    pub fn matrix<const N: usize>(rows: &[[f64; N]]) -> Self {
        Self {
            shape: vec![rows.len(), N],
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// Zero-dimensional array holding one value.
    pub fn zero_dim(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Length of the first dimension; `None` for zero-dimensional arrays.
    pub fn len(&self) -> Option<usize> {
        self.shape.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when no element is NaN or infinite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// True when every consecutive pair satisfies `next >= prev`.
    ///
    /// Plateaus pass; strict decreases and NaN comparisons fail.
    pub fn is_non_decreasing(&self) -> bool {
        self.data.windows(2).all(|w| w[1] >= w[0])
    }
}

/// A scalar as the underlying store returned it.
///
/// String fields arrive in several physical forms depending on how the
/// dataset was written; [`crate::decode_scalar_string`] normalizes them all.
#[derive(Debug, Clone, PartialEq)]
pub enum RawScalar {
    /// Raw bytes, expected to be UTF-8.
    Bytes(Vec<u8>),
    /// Fixed-size character array, padded with trailing NULs.
    FixedChars(Vec<u8>),
    /// Already-decoded text.
    Text(String),
    /// A numeric value.
    Number(f64),
    /// A zero-dimensional container wrapping another scalar.
    ZeroDim(Box<RawScalar>),
}

impl From<&str> for RawScalar {
    fn from(s: &str) -> Self {
        RawScalar::Text(s.to_string())
    }
}

impl From<String> for RawScalar {
    fn from(s: String) -> Self {
        RawScalar::Text(s)
    }
}

impl From<f64> for RawScalar {
    fn from(v: f64) -> Self {
        RawScalar::Number(v)
    }
}

/// An opened dataset file.
///
/// Owns the backend handle for the duration of one stage; dropping it
/// releases the file, including on early returns through `?`.
pub enum DatasetFile {
    /// JSON snapshot loaded into memory.
    Memory(MemoryDataset),
    /// HDF5 file opened read-only.
    #[cfg(feature = "hdf5")]
    Hdf5(Hdf5Dataset),
}

impl DatasetFile {
    /// Open a dataset, choosing the backend from the file extension.
    ///
    /// `.json` files are read as snapshots; `.hdf5` / `.h5` need the `hdf5`
    /// feature.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        tracing::debug!("Opening dataset {:?} ({})", path, ext);

        match ext.as_str() {
            "json" => Ok(DatasetFile::Memory(MemoryDataset::load_snapshot(path)?)),
            #[cfg(feature = "hdf5")]
            "hdf5" | "h5" => Ok(DatasetFile::Hdf5(Hdf5Dataset::open(path)?)),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Root group of the dataset.
    pub fn root(&self) -> &dyn Group {
        match self {
            DatasetFile::Memory(ds) => ds,
            #[cfg(feature = "hdf5")]
            DatasetFile::Hdf5(ds) => ds,
        }
    }
}

/// Split a relative path into its non-empty components.
pub(crate) fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}
