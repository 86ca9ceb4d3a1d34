//! Generator configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::evolution::EvolutionConfig;
use crate::filter::DEFAULT_THRESHOLD;
use crate::generator::Distribution;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Minimum node-filter score for a chunk to seed a question.
    pub threshold: f64,
    pub evolution: EvolutionConfig,
    pub distribution: Distribution,
    /// Evolutions in flight at once.
    pub concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            evolution: EvolutionConfig::default(),
            distribution: Distribution::default(),
            concurrency: 4,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::Config(format!("threshold must be finite, got {}", self.threshold)));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".into()));
        }
        self.distribution.validate()
    }
}
