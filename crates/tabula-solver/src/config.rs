//! Solver configuration.
//!
//! Load solver tuning from TOML to control the construction budget, the
//! value selector and the cooling schedule without code changes.
//!
//! # Examples
//!
//! ```
//! use tabula_solver::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     random_seed = 42
//!
//!     [construction]
//!     max_iterations = 50000
//!
//!     [annealing]
//!     initial_temperature = 500.0
//!     steps_per_temperature = 200
//! "#).unwrap();
//!
//! assert_eq!(config.random_seed, Some(42));
//! assert_eq!(config.construction.max_iterations, 50_000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annealing::AnnealingConfig;
use crate::construction::ConstructionConfig;
use crate::selector::SelectorConfig;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete solver configuration: one generation request's parameter set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed for reproducible runs; a fresh OS seed when absent.
    pub random_seed: Option<u64>,
    /// Construction-phase budget.
    pub construction: ConstructionConfig,
    /// Value-selection tuning.
    pub selector: SelectorConfig,
    /// Cooling schedule.
    pub annealing: AnnealingConfig,
}

impl SolverConfig {
    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Range sanity checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.construction.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "construction.max_iterations must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selector.random_walk_probability) {
            return Err(ConfigError::Invalid(
                "selector.random_walk_probability must lie in [0, 1]".into(),
            ));
        }
        let annealing = &self.annealing;
        if annealing.min_temperature <= 0.0
            || annealing.initial_temperature <= annealing.min_temperature
        {
            return Err(ConfigError::Invalid(
                "annealing temperatures must satisfy 0 < min < initial".into(),
            ));
        }
        if annealing.cooling_rate <= 0.0 {
            return Err(ConfigError::Invalid(
                "annealing.cooling_rate must be positive".into(),
            ));
        }
        if annealing.steps_per_temperature == 0 {
            return Err(ConfigError::Invalid(
                "annealing.steps_per_temperature must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.random_seed.is_none());
    }

    #[test]
    fn toml_parsing_overrides_selected_fields() {
        let config = SolverConfig::from_toml_str(
            r#"
            random_seed = 7

            [selector]
            random_walk_probability = 0.05
            tabu_tenure = 50

            [annealing]
            cooling_rate = 0.02
            "#,
        )
        .unwrap();
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.selector.random_walk_probability, 0.05);
        assert_eq!(config.selector.tabu_tenure, 50);
        assert_eq!(config.annealing.cooling_rate, 0.02);
        // untouched fields keep their defaults
        assert_eq!(config.annealing.min_temperature, 1.0);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let err = SolverConfig::from_toml_str(
            r#"
            [annealing]
            initial_temperature = 0.5
            min_temperature = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SolverConfig::from_toml_str(
            r#"
            [selector]
            random_walk_probability = 1.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            SolverConfig::from_toml_str("random_seed = ["),
            Err(ConfigError::Toml(_))
        ));
    }
}
