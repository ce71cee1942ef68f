//! # demoforge-av
//!
//! External video tooling for demoforge.
//!
//! This crate provides:
//! - Detection of the ffmpeg / ffprobe binaries
//! - Per-episode clip extraction through the ffmpeg CLI behind the
//!   [`Encoder`] trait
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use demoforge_av::{ClipRequest, Encoder, FfmpegEncoder};
//!
//! let encoder = FfmpegEncoder::default();
//! encoder.encode(&ClipRequest {
//!     input: "/data/videos/episode_0.mp4".into(),
//!     output: "/data/out/demo_0000_front.mp4".into(),
//!     start_sec: 0.0,
//!     end_sec: 12.4,
//!     fps: 30.0,
//! })?;
//! # Ok::<(), demoforge_av::Error>(())
//! ```

pub mod clip;
mod error;
pub mod tools;

// Re-exports
pub use clip::{ClipRequest, ClipSettings, Encoder, FfmpegEncoder};
pub use error::{Error, Result};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
