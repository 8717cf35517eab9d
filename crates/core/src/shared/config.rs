use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_DETECT_INTERVAL, DEFAULT_DETECT_TIMEOUT_MS, DEFAULT_DISPLAY_INTERVAL,
    DEFAULT_DISTANCE_THRESHOLD, DEFAULT_IDLE_WAIT_MS, DEFAULT_TARGET_CLASS, DEFAULT_TICK_MS,
};
use crate::tracking::domain::track_overlay::NoMatchPolicy;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroInterval(&'static str),
    #[error("{0} must be longer than zero")]
    ZeroDuration(&'static str),
    #[error("distance threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f32),
}

/// Tunables of a tracking session. Fixed once the session starts.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub detect_interval: u64,
    pub display_interval: u64,
    pub tick_period: Duration,
    pub idle_wait: Duration,
    pub detect_timeout: Duration,
    pub distance_threshold: f32,
    pub target_class: usize,
    pub no_match_policy: NoMatchPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detect_interval: DEFAULT_DETECT_INTERVAL,
            display_interval: DEFAULT_DISPLAY_INTERVAL,
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
            idle_wait: Duration::from_millis(DEFAULT_IDLE_WAIT_MS),
            detect_timeout: Duration::from_millis(DEFAULT_DETECT_TIMEOUT_MS),
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            target_class: DEFAULT_TARGET_CLASS,
            no_match_policy: NoMatchPolicy::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detect_interval == 0 {
            return Err(ConfigError::ZeroInterval("detect interval"));
        }
        if self.display_interval == 0 {
            return Err(ConfigError::ZeroInterval("display interval"));
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroDuration("tick period"));
        }
        if self.idle_wait.is_zero() {
            return Err(ConfigError::ZeroDuration("idle wait"));
        }
        if self.detect_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("detect timeout"));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.distance_threshold));
        }
        Ok(())
    }
}
