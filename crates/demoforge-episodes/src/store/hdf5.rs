//! HDF5 backend, enabled with the `hdf5` feature.
//!
//! Files are opened read-only. Datasets are read with HDF5's own type
//! conversion into `f64`; string scalars keep the physical representation
//! they were written with so the view builder can normalize them.

use super::{components, ArrayData, Group, RawScalar};
use crate::{Error, Result};
use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use std::path::Path;

/// Upper bound for fixed-length strings; longer values are truncated by libhdf5.
const FIXED_STRING_CAPACITY: usize = 1024;

/// An HDF5 file opened read-only.
pub struct Hdf5Dataset {
    file: hdf5::File,
}

impl Hdf5Dataset {
    /// Open `path` read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let file = hdf5::File::open(path)?;
        Ok(Self { file })
    }
}

impl Group for Hdf5Dataset {
    fn member_names(&self) -> Result<Vec<String>> {
        Ok(self.file.member_names()?)
    }

    fn contains(&self, path: &str) -> bool {
        path_exists(&self.file, path)
    }

    fn group(&self, path: &str) -> Result<Box<dyn Group + '_>> {
        open_group(&self.file, path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        read_shape(&self.file, path)
    }

    fn array(&self, path: &str) -> Result<ArrayData> {
        read_array(&self.file, path)
    }

    fn scalar(&self, path: &str) -> Result<RawScalar> {
        read_scalar(&self.file, path)
    }
}

struct Hdf5Group(hdf5::Group);

impl Group for Hdf5Group {
    fn member_names(&self) -> Result<Vec<String>> {
        Ok(self.0.member_names()?)
    }

    fn contains(&self, path: &str) -> bool {
        path_exists(&self.0, path)
    }

    fn group(&self, path: &str) -> Result<Box<dyn Group + '_>> {
        open_group(&self.0, path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        read_shape(&self.0, path)
    }

    fn array(&self, path: &str) -> Result<ArrayData> {
        read_array(&self.0, path)
    }

    fn scalar(&self, path: &str) -> Result<RawScalar> {
        read_scalar(&self.0, path)
    }
}

/// Walk `path` one link at a time; `H5Lexists` fails on missing intermediates.
fn path_exists(root: &hdf5::Group, path: &str) -> bool {
    let parts: Vec<&str> = components(path).collect();
    let mut current = root.clone();
    for (i, part) in parts.iter().enumerate() {
        if !current.link_exists(part) {
            return false;
        }
        if i + 1 < parts.len() {
            match current.group(part) {
                Ok(next) => current = next,
                Err(_) => return false,
            }
        }
    }
    !parts.is_empty()
}

fn open_group<'a>(root: &hdf5::Group, path: &str) -> Result<Box<dyn Group + 'a>> {
    if !path_exists(root, path) {
        return Err(Error::MissingPath(path.to_string()));
    }
    let group = root
        .group(path)
        .map_err(|_| Error::wrong_kind(path, "a group"))?;
    Ok(Box::new(Hdf5Group(group)))
}

fn open_dataset(root: &hdf5::Group, path: &str) -> Result<hdf5::Dataset> {
    if !path_exists(root, path) {
        return Err(Error::MissingPath(path.to_string()));
    }
    root.dataset(path)
        .map_err(|_| Error::wrong_kind(path, "a dataset"))
}

fn read_shape(root: &hdf5::Group, path: &str) -> Result<Vec<usize>> {
    Ok(open_dataset(root, path)?.shape())
}

fn read_array(root: &hdf5::Group, path: &str) -> Result<ArrayData> {
    let dataset = open_dataset(root, path)?;
    let shape = dataset.shape();
    let data = dataset.read_raw::<f64>()?;
    ArrayData::new(shape, data).map_err(|e| Error::invalid_shape(path, e.to_string()))
}

fn read_scalar(root: &hdf5::Group, path: &str) -> Result<RawScalar> {
    let dataset = open_dataset(root, path)?;
    let descriptor = dataset.dtype()?.to_descriptor()?;

    let raw = match descriptor {
        TypeDescriptor::VarLenUnicode => {
            RawScalar::Text(single(path, dataset.read_raw::<VarLenUnicode>()?)?.as_str().to_owned())
        }
        TypeDescriptor::VarLenAscii => {
            RawScalar::Bytes(single(path, dataset.read_raw::<VarLenAscii>()?)?.as_bytes().to_vec())
        }
        TypeDescriptor::FixedAscii(_) => RawScalar::FixedChars(
            single(path, dataset.read_raw::<FixedAscii<FIXED_STRING_CAPACITY>>()?)?
                .as_bytes()
                .to_vec(),
        ),
        TypeDescriptor::FixedUnicode(_) => RawScalar::FixedChars(
            single(path, dataset.read_raw::<FixedUnicode<FIXED_STRING_CAPACITY>>()?)?
                .as_bytes()
                .to_vec(),
        ),
        _ => RawScalar::Number(single(path, dataset.read_raw::<f64>()?)?),
    };

    if dataset.ndim() == 0 {
        Ok(RawScalar::ZeroDim(Box::new(raw)))
    } else {
        Ok(raw)
    }
}

fn single<T>(path: &str, values: Vec<T>) -> Result<T> {
    let count = values.len();
    let mut iter = values.into_iter();
    match (iter.next(), count) {
        (Some(value), 1) => Ok(value),
        _ => Err(Error::invalid_scalar(
            path,
            format!("expected one element, found {}", count),
        )),
    }
}
