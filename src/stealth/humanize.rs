//! Human behavior simulation
//!
//! Settle delays get a symmetric random variance and clicks on detected
//! buttons land on a random point away from the edges.

use rand::Rng;

use super::StealthConfig;
use crate::vision::geometry::{safe_random_point, Rect};

/// Shortest delay a humanized wait may shrink to
const MIN_DELAY_MS: u64 = 50;

/// Humanizer for generating realistic timing and positions
pub struct Humanizer {
    config: StealthConfig,
    rng: rand::rngs::ThreadRng,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new(StealthConfig::default())
    }
}

impl Humanizer {
    pub fn new(config: StealthConfig) -> Self {
        Self {
            config,
            rng: rand::thread_rng(),
        }
    }

    /// Settle delay with the configured variance applied
    pub fn settle_delay(&mut self, base_delay_ms: u64) -> u64 {
        if !self.config.humanize_timing {
            return base_delay_ms;
        }
        self.humanize_delay(base_delay_ms, self.config.timing_variance_percent)
    }

    /// Humanize a delay with variance
    pub fn humanize_delay(&mut self, base_delay_ms: u64, variance_percent: u32) -> u64 {
        if variance_percent == 0 {
            return base_delay_ms;
        }

        let variance = (base_delay_ms as f64 * variance_percent as f64 / 100.0) as i64;
        let offset = self.rng.gen_range(-variance..=variance);

        (base_delay_ms as i64 + offset).max(MIN_DELAY_MS as i64) as u64
    }

    /// Random point inside `rect`, keeping `margin` away from its edges
    pub fn random_point(&mut self, rect: Rect, margin: f32) -> (i32, i32) {
        safe_random_point(rect, margin, &mut self.rng)
    }
}
