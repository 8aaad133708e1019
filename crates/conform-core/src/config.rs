//! Engine configuration.
//!
//! [`EngineConfig`] holds the values an integration layer chooses once per
//! adapter: block size ceiling, the channel count used when neither the
//! component nor the host defines one, voice count for polyphonic
//! components, the sample-accurate merge policy and the sample rate.
//!
//! # Example
//!
//! ```ignore
//! use conform_core::{EngineConfig, MergePolicy};
//!
//! pub static CONFIG: EngineConfig = EngineConfig::new()
//!     .with_max_frames(1024)
//!     .with_voices(8)
//!     .with_merge_policy(MergePolicy::FillInitial);
//! ```
//!
//! The same values can be loaded from JSON:
//!
//! ```ignore
//! let config = EngineConfig::from_json(r#"{ "max_frames": 256, "voices": 4 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::MergePolicy;
use crate::types::MAX_CHANNELS;

/// Default maximum frames per tick.
pub const DEFAULT_MAX_FRAMES: usize = 512;

/// Default channel count when nobody defines one.
pub const DEFAULT_CHANNELS: usize = 2;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest frame count allocated for up front. Larger ticks trigger a
    /// reallocation.
    pub max_frames: usize,

    /// Channel count used when neither the component nor the host defines one.
    pub default_channels: usize,

    /// Voices for polyphonic components.
    pub voices: usize,

    /// How merged sample-accurate rows treat unknown values.
    pub merge_policy: MergePolicy,

    /// Sample rate handed to components in [`ProcessSetup`](crate::ProcessSetup).
    pub sample_rate: f64,
}

impl EngineConfig {
    pub const fn new() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            default_channels: DEFAULT_CHANNELS,
            voices: 1,
            merge_policy: MergePolicy::SkipUntilKnown,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub const fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub const fn with_default_channels(mut self, channels: usize) -> Self {
        self.default_channels = channels;
        self
    }

    pub const fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub const fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub const fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frames == 0 {
            return Err(ConfigError::Invalid("max_frames must be at least 1".into()));
        }
        if self.voices == 0 {
            return Err(ConfigError::Invalid("voices must be at least 1".into()));
        }
        if self.default_channels > MAX_CHANNELS {
            return Err(ConfigError::Invalid(format!(
                "default_channels is {}, but MAX_CHANNELS is {}",
                self.default_channels, MAX_CHANNELS
            )));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sample_rate {} is not a positive rate",
                self.sample_rate
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        const CONFIG: EngineConfig = EngineConfig::new()
            .with_max_frames(64)
            .with_voices(4)
            .with_default_channels(1)
            .with_merge_policy(MergePolicy::FillInitial)
            .with_sample_rate(44_100.0);
        assert_eq!(CONFIG.max_frames, 64);
        assert_eq!(CONFIG.voices, 4);
        assert_eq!(CONFIG.default_channels, 1);
        assert_eq!(CONFIG.merge_policy, MergePolicy::FillInitial);
        assert!(CONFIG.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "voices": 3, "merge_policy": "fill_initial" }"#)
            .expect("valid config");
        assert_eq!(config.voices, 3);
        assert_eq!(config.merge_policy, MergePolicy::FillInitial);
        assert_eq!(config.max_frames, DEFAULT_MAX_FRAMES);
        assert_eq!(config.default_channels, DEFAULT_CHANNELS);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "voices": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::new().with_max_frames(128);
        let json = config.to_json().expect("serializable");
        assert_eq!(EngineConfig::from_json(&json).expect("parses"), config);
    }
}
