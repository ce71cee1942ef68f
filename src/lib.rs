//! Demoforge - robot demonstration episode pipeline
//!
//! This library crate exposes the stage implementations for integration testing.

pub mod config;
pub mod manifest;
pub mod stages;
