//! Executor configuration.
//!
//! Values come from [`GraphConfig::default`], the environment
//! ([`GraphConfig::from_env`]) or a JSON document
//! ([`GraphConfig::from_json_str`]).

use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::GraphOpsError;

pub const SEED_BATCH_SIZE_ENV: &str = "GRAPHOPS_SEED_BATCH_SIZE";
pub const DEFAULT_SEED_BATCH_SIZE: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of seeds a backend resolves per pull of a lazy lookup.
    pub seed_batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed_batch_size: DEFAULT_SEED_BATCH_SIZE,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed_batch_size(mut self, size: usize) -> Self {
        self.seed_batch_size = size;
        self
    }

    /// Defaults overridden by `GRAPHOPS_SEED_BATCH_SIZE` when set.
    pub fn from_env() -> Result<Self, GraphOpsError> {
        Self::from_batch_size_var(env::var(SEED_BATCH_SIZE_ENV).ok())
    }

    fn from_batch_size_var(raw: Option<String>) -> Result<Self, GraphOpsError> {
        let mut config = Self::default();
        if let Some(raw) = raw {
            config.seed_batch_size = raw.trim().parse().map_err(|_| {
                GraphOpsError::validation(format!(
                    "{SEED_BATCH_SIZE_ENV} must be an integer, got {raw:?}"
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphOpsError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GraphOpsError::validation(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GraphOpsError> {
        if self.seed_batch_size == 0 {
            return Err(GraphOpsError::validation("seed_batch_size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_config_fills_defaults() {
        let config = GraphConfig::from_json_str("{}").expect("config");
        assert_eq!(config, GraphConfig::default());
        let config = GraphConfig::from_json_str(r#"{"seed_batch_size": 3}"#).expect("config");
        assert_eq!(config.seed_batch_size, 3);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = GraphConfig::from_json_str(r#"{"seed_batch_size": 0}"#).unwrap_err();
        assert!(matches!(err, GraphOpsError::Validation(_)));
    }

    #[test]
    fn test_env_value_overrides_default() {
        let config = GraphConfig::from_batch_size_var(Some(" 8 ".into())).expect("config");
        assert_eq!(config.seed_batch_size, 8);
        let config = GraphConfig::from_batch_size_var(None).expect("config");
        assert_eq!(config.seed_batch_size, DEFAULT_SEED_BATCH_SIZE);
        assert!(GraphConfig::from_batch_size_var(Some("many".into())).is_err());
        assert!(GraphConfig::from_batch_size_var(Some("0".into())).is_err());
    }
}
