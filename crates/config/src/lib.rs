//! Configuration module for the kids timelapse compiler
//!
//! Handles loading configuration from TOML files, environment variable overrides
//! and validation of the timelapse parameters.

pub mod config;
pub mod length;

pub use config::*;
pub use length::parse_length;
