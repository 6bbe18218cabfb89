//! Configuration for randomized fault-injection runs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a chaos run
///
/// Each step either originates a local operation, sends between two random
/// replicas, or handles a random pending transmission. Probabilities are
/// in `[0, 1]`; `send_probability + deliver_probability` must not exceed 1,
/// the remainder being local operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of replicas
    pub replica_count: usize,
    /// Number of random steps before the final flush
    pub operations: u64,
    /// Keys are drawn from `K0..K{key_space}`
    pub key_space: usize,
    /// Share of local operations that are increments
    pub increment_probability: f64,
    /// Probability a step sends a transmission
    pub send_probability: f64,
    /// Probability a step handles a pending transmission
    pub deliver_probability: f64,
    /// Probability a handled transmission is lost instead of delivered
    pub drop_probability: f64,
    /// Probability a handled transmission is copied before delivery
    pub duplicate_probability: f64,
    /// RNG seed; a random one is chosen and reported when unset
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            replica_count: 3,
            operations: 200,
            key_space: 4,
            increment_probability: 0.7,
            send_probability: 0.3,
            deliver_probability: 0.5,
            drop_probability: 0.05,
            duplicate_probability: 0.0,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check counts and probabilities are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replica_count == 0 {
            return Err(ConfigError::Invalid(
                "replica_count must be at least 1".to_string(),
            ));
        }
        if self.key_space == 0 {
            return Err(ConfigError::Invalid("key_space must be at least 1".to_string()));
        }

        let probabilities = [
            ("increment_probability", self.increment_probability),
            ("send_probability", self.send_probability),
            ("deliver_probability", self.deliver_probability),
            ("drop_probability", self.drop_probability),
            ("duplicate_probability", self.duplicate_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {p}")));
            }
        }

        if self.send_probability + self.deliver_probability > 1.0 {
            return Err(ConfigError::Invalid(
                "send_probability + deliver_probability must not exceed 1".to_string(),
            ));
        }
        Ok(())
    }
}
