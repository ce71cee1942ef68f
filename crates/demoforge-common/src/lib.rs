//! Demoforge-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across demoforge:
//!
//! - **Typed IDs**: `DemoId` and `JobId` wrappers used for file naming and joins
//! - **Path Utilities**: export/job file naming, camera inference, glob matching
//! - **Checksums**: streaming SHA-256 of files
//! - **JSON**: ASCII-escaped serialization for manifests and reports
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use demoforge_common::{DemoId, Error, Result};
//! use demoforge_common::paths::export_file_name;
//!
//! let demo = DemoId::new(4);
//! assert_eq!(export_file_name(demo, "front"), "demo_0004_front.mp4");
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("variants must be >= 1"))
//! }
//! assert!(example().is_err());
//! ```

pub mod checksum;
pub mod error;
pub mod ids;
pub mod json;
pub mod paths;

pub use error::{Error, Result};
pub use ids::*;
