//! # Engine Configuration
//!
//! Core engine behavior: logging, simulation speed and the collision layer
//! matrix a scene starts with.

use super::{Config, ConfigError};
use crate::physics::MAX_LAYERS;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Layers one layer is tested against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRule {
    /// Layer index the rule configures
    pub layer: usize,
    /// Layer indices it collides with
    pub collides_with: Vec<usize>,
}

impl LayerRule {
    /// Create a rule
    pub fn new(layer: usize, collides_with: impl Into<Vec<usize>>) -> Self {
        Self {
            layer,
            collides_with: collides_with.into(),
        }
    }
}

/// # Engine Configuration
///
/// Missing fields fall back to their defaults when loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Multiplier applied to every step's delta time
    pub time_scale: f32,
    /// Initial collision masks
    pub layers: Vec<LayerRule>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            time_scale: 1.0,
            layers: Vec::new(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set time scale
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Add a layer rule
    pub fn with_layer_rule(mut self, rule: LayerRule) -> Self {
        self.layers.push(rule);
        self
    }

    /// Check values a file could get wrong
    pub fn validate(&self) -> Result<(), ConfigError> {
        if log::LevelFilter::from_str(&self.log_level).is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time scale must be a non-negative number, got {}",
                self.time_scale
            )));
        }
        for rule in &self.layers {
            let out_of_range = std::iter::once(&rule.layer)
                .chain(&rule.collides_with)
                .find(|&&layer| layer >= MAX_LAYERS);
            if let Some(layer) = out_of_range {
                return Err(ConfigError::Invalid(format!(
                    "layer {layer} is out of range, only {MAX_LAYERS} layers exist"
                )));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_layer = EngineConfig::new().with_layer_rule(LayerRule::new(0, [1, 32]));
        let bad_scale = EngineConfig::new().with_time_scale(-1.0);
        let bad_level = EngineConfig::new().with_log_level("loud");

        for config in [bad_layer, bad_scale, bad_level] {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_parses_toml_with_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            time_scale = 0.5

            [[layers]]
            layer = 0
            collides_with = [1, 2]
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "info");
        assert!((config.time_scale - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.layers, vec![LayerRule::new(0, [1, 2])]);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let config = EngineConfig::new()
            .with_log_level("debug")
            .with_layer_rule(LayerRule::new(3, [3, 4]));

        for name in ["trellis_engine_config_test.toml", "trellis_engine_config_test.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).unwrap();
            let loaded = EngineConfig::load_from_file(&path).unwrap();
            std::fs::remove_file(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::new().save_to_file("engine.yaml");

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
