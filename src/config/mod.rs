//! Configuration module
//!
//! Handles screen regions, thresholds, timings and strategy tables.

pub mod settings;

pub use settings::{ConfigError, Settings};
