//! Humanization module
//!
//! Adds random variance to settle delays and click positions so repeated
//! actions do not land on identical pixels at identical intervals.

pub mod humanize;

pub use humanize::Humanizer;

use serde::{Deserialize, Serialize};

/// Configuration for humanized input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Enable humanized timing
    pub humanize_timing: bool,
    /// Delay variance percentage (0-100)
    pub timing_variance_percent: u32,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            humanize_timing: true,
            timing_variance_percent: 20,
        }
    }
}

impl StealthConfig {
    /// Exact timings (for testing)
    pub fn disabled() -> Self {
        Self {
            humanize_timing: false,
            timing_variance_percent: 0,
        }
    }
}
