//! Coaching pipeline configuration.

use std::path::Path;

use formcoach_core::{Error, Result};
use formcoach_counting::CounterSettings;
use formcoach_feedback::{FeedbackConfig, PostureThresholds};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierConfig;

/// Prefix of environment overrides, e.g. `FORMCOACH_FEEDBACK__MIN_MESSAGE_INTERVAL`
pub const ENV_PREFIX: &str = "FORMCOACH";

/// Complete coach configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Visibility gate and rep counter thresholds
    pub counting: CounterSettings,

    /// Form rules and quality history length
    pub posture: PostureThresholds,

    /// Message cooldown and history
    pub feedback: FeedbackConfig,

    /// Exercise auto-detection smoothing
    pub classifier: ClassifierConfig,
}

impl CoachConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations the counters cannot work with
    pub fn validate(&self) -> Result<()> {
        let c = &self.counting;
        if !(0.0..=1.0).contains(&c.visibility_threshold) {
            return Err(Error::Config(format!(
                "visibility_threshold must be within [0, 1], got {}",
                c.visibility_threshold
            )));
        }
        if c.squat.min_knee_angle >= c.squat.max_knee_angle {
            return Err(Error::Config(
                "squat.min_knee_angle must be below squat.max_knee_angle".to_string(),
            ));
        }
        if c.push_up.min_elbow_angle >= c.push_up.max_elbow_angle {
            return Err(Error::Config(
                "push_up.min_elbow_angle must be below push_up.max_elbow_angle".to_string(),
            ));
        }
        if c.squat.min_time_between_reps < 0.0 || c.push_up.min_time_between_reps < 0.0 {
            return Err(Error::Config(
                "min_time_between_reps cannot be negative".to_string(),
            ));
        }
        if self.feedback.min_message_interval < 0.0 {
            return Err(Error::Config(
                "feedback.min_message_interval cannot be negative".to_string(),
            ));
        }
        if self.posture.history_size == 0 || self.feedback.history_size == 0 {
            return Err(Error::Config("history sizes must be positive".to_string()));
        }

        let k = &self.classifier;
        if k.window_size == 0 || k.min_frames > k.window_size {
            return Err(Error::Config(
                "classifier.min_frames must fit in classifier.window_size".to_string(),
            ));
        }
        if k.history_size == 0 || k.min_agreement > k.history_size {
            return Err(Error::Config(
                "classifier.min_agreement must fit in classifier.history_size".to_string(),
            ));
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
