//! In-memory dataset tree and its JSON snapshot form.
//!
//! A snapshot mirrors the hierarchical layout one-to-one: groups are JSON
//! objects, arrays are `{"shape": [...], "data": [...]}` objects and scalars
//! are bare strings or numbers. JSON has no NaN or infinity, so non-finite
//! array elements are spelled `"NaN"`, `"inf"` and `"-inf"`.

use super::{components, ArrayData, Group, RawScalar};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One node of the in-memory tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(BTreeMap<String, Node>),
    Array(ArrayData),
    Scalar(RawScalar),
}

impl From<ArrayData> for Node {
    fn from(array: ArrayData) -> Self {
        Node::Array(array)
    }
}

impl From<RawScalar> for Node {
    fn from(scalar: RawScalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(RawScalar::from(s))
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Scalar(RawScalar::Number(v))
    }
}

/// A dataset held entirely in memory.
///
/// # Example
///
/// ```
/// use demoforge_episodes::store::{ArrayData, Group, MemoryDataset};
///
/// let mut ds = MemoryDataset::new();
/// ds.insert("episodes/0/meta/video/fps", 30.0).unwrap();
/// ds.insert("episodes/0/meta/frame_index", ArrayData::vector(vec![0.0, 1.0])).unwrap();
///
/// assert!(ds.contains("episodes/0/meta/video/fps"));
/// assert_eq!(ds.shape("episodes/0/meta/frame_index").unwrap(), vec![2]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDataset {
    root: BTreeMap<String, Node>,
}

impl MemoryDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node at `path`, creating intermediate groups.
    ///
    /// Replaces any node already at `path`.
    pub fn insert(&mut self, path: &str, node: impl Into<Node>) -> Result<()> {
        let parts: Vec<&str> = components(path).collect();
        let Some((last, parents)) = parts.split_last() else {
            return Err(Error::MissingPath(path.to_string()));
        };

        let mut current = &mut self.root;
        for part in parents {
            let child = current
                .entry((*part).to_string())
                .or_insert_with(|| Node::Group(BTreeMap::new()));
            current = match child {
                Node::Group(children) => children,
                _ => return Err(Error::wrong_kind(path, "a group")),
            };
        }
        current.insert((*last).to_string(), node.into());
        Ok(())
    }

    /// Remove and return the node at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        let parts: Vec<&str> = components(path).collect();
        let (last, parents) = parts.split_last()?;

        let mut current = &mut self.root;
        for part in parents {
            current = match current.get_mut(*part)? {
                Node::Group(children) => children,
                _ => return None,
            };
        }
        current.remove(*last)
    }

    /// Parse a JSON snapshot.
    pub fn from_snapshot_str(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, SnapshotNode> = serde_json::from_str(text)?;
        let root = raw
            .into_iter()
            .map(|(name, node)| {
                let converted = node.into_node(&name)?;
                Ok((name, converted))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { root })
    }

    /// Load a JSON snapshot from disk.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_snapshot_str(&text)
    }

    /// Render the dataset as an indented JSON snapshot.
    pub fn to_snapshot_string(&self) -> Result<String> {
        let snapshot: BTreeMap<&str, SnapshotNode> = self
            .root
            .iter()
            .map(|(name, node)| (name.as_str(), SnapshotNode::from_node(node)))
            .collect();
        Ok(demoforge_common::json::to_ascii_string_pretty(&snapshot)?)
    }

    /// Write the dataset to disk as a JSON snapshot.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let mut text = self.to_snapshot_string()?;
        text.push('\n');
        std::fs::write(path, text)?;
        Ok(())
    }

    fn as_group(&self) -> NodeGroup<'_> {
        NodeGroup(&self.root)
    }
}

impl Group for MemoryDataset {
    fn member_names(&self) -> Result<Vec<String>> {
        self.as_group().member_names()
    }

    fn contains(&self, path: &str) -> bool {
        self.as_group().contains(path)
    }

    fn group(&self, path: &str) -> Result<Box<dyn Group + '_>> {
        NodeGroup(&self.root).open_group(path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        self.as_group().shape(path)
    }

    fn array(&self, path: &str) -> Result<ArrayData> {
        self.as_group().array(path)
    }

    fn scalar(&self, path: &str) -> Result<RawScalar> {
        self.as_group().scalar(path)
    }
}

/// Borrowed view of one group in the tree.
struct NodeGroup<'a>(&'a BTreeMap<String, Node>);

impl<'a> NodeGroup<'a> {
    fn resolve(&self, path: &str) -> Option<&'a Node> {
        let mut parts = components(path);
        let mut node = self.0.get(parts.next()?)?;
        for part in parts {
            node = match node {
                Node::Group(children) => children.get(part)?,
                _ => return None,
            };
        }
        Some(node)
    }

    fn require(&self, path: &str) -> Result<&'a Node> {
        self.resolve(path)
            .ok_or_else(|| Error::MissingPath(path.to_string()))
    }

    fn open_group(&self, path: &str) -> Result<Box<dyn Group + 'a>> {
        match self.require(path)? {
            Node::Group(children) => Ok(Box::new(NodeGroup(children))),
            _ => Err(Error::wrong_kind(path, "a group")),
        }
    }
}

impl Group for NodeGroup<'_> {
    fn member_names(&self) -> Result<Vec<String>> {
        Ok(self.0.keys().cloned().collect())
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    fn group(&self, path: &str) -> Result<Box<dyn Group + '_>> {
        self.open_group(path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        match self.require(path)? {
            Node::Array(array) => Ok(array.shape().to_vec()),
            Node::Scalar(_) => Ok(Vec::new()),
            Node::Group(_) => Err(Error::wrong_kind(path, "a dataset")),
        }
    }

    fn array(&self, path: &str) -> Result<ArrayData> {
        match self.require(path)? {
            Node::Array(array) => Ok(array.clone()),
            Node::Scalar(RawScalar::Number(v)) => Ok(ArrayData::zero_dim(*v)),
            _ => Err(Error::wrong_kind(path, "a numeric array")),
        }
    }

    fn scalar(&self, path: &str) -> Result<RawScalar> {
        match self.require(path)? {
            Node::Scalar(scalar) => Ok(scalar.clone()),
            Node::Array(array) if array.data().len() == 1 => {
                let value = RawScalar::Number(array.data()[0]);
                if array.ndim() == 0 {
                    Ok(RawScalar::ZeroDim(Box::new(value)))
                } else {
                    Ok(value)
                }
            }
            _ => Err(Error::wrong_kind(path, "a scalar")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SnapshotNode {
    Array(SnapshotArray),
    Number(f64),
    Text(String),
    Group(BTreeMap<String, SnapshotNode>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotArray {
    shape: Vec<usize>,
    data: Vec<SnapshotValue>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SnapshotValue {
    Number(f64),
    Special(String),
}

fn special_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}

impl SnapshotNode {
    fn into_node(self, path: &str) -> Result<Node> {
        Ok(match self {
            SnapshotNode::Array(array) => {
                let data = array
                    .data
                    .into_iter()
                    .map(|value| match value {
                        SnapshotValue::Number(v) => Ok(v),
                        SnapshotValue::Special(s) => s.trim().parse::<f64>().map_err(|_| {
                            Error::invalid_scalar(path, format!("not a number: {:?}", s))
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let array = ArrayData::new(array.shape, data)
                    .map_err(|e| Error::invalid_shape(path, e.to_string()))?;
                Node::Array(array)
            }
            SnapshotNode::Number(v) => Node::Scalar(RawScalar::Number(v)),
            SnapshotNode::Text(s) => Node::Scalar(RawScalar::Text(s)),
            SnapshotNode::Group(children) => Node::Group(
                children
                    .into_iter()
                    .map(|(name, child)| {
                        let child_path = format!("{}/{}", path, name);
                        Ok((name, child.into_node(&child_path)?))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?,
            ),
        })
    }

    fn from_node(node: &Node) -> Self {
        match node {
            Node::Group(children) => SnapshotNode::Group(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), SnapshotNode::from_node(child)))
                    .collect(),
            ),
            Node::Array(array) => SnapshotNode::Array(SnapshotArray {
                shape: array.shape().to_vec(),
                data: array
                    .data()
                    .iter()
                    .map(|&v| {
                        if v.is_finite() {
                            SnapshotValue::Number(v)
                        } else {
                            SnapshotValue::Special(special_float(v))
                        }
                    })
                    .collect(),
            }),
            Node::Scalar(scalar) => SnapshotNode::from_scalar(scalar),
        }
    }

    fn from_scalar(scalar: &RawScalar) -> Self {
        match scalar {
            RawScalar::Text(s) => SnapshotNode::Text(s.clone()),
            RawScalar::Bytes(b) => SnapshotNode::Text(String::from_utf8_lossy(b).into_owned()),
            RawScalar::FixedChars(b) => {
                let end = b.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
                SnapshotNode::Text(String::from_utf8_lossy(&b[..end]).into_owned())
            }
            RawScalar::Number(v) if v.is_finite() => SnapshotNode::Number(*v),
            RawScalar::Number(v) => SnapshotNode::Text(special_float(*v)),
            RawScalar::ZeroDim(inner) => SnapshotNode::from_scalar(inner),
        }
    }
}
