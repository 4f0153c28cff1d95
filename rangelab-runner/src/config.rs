//! Serializable simulation configuration, loaded from TOML.
//!
//! ```toml
//! [position]
//! initial_investment = 1000.0
//! width = "10%"            # or "full"
//! tick_spacing = 60
//! decimals0 = 6
//! decimals1 = 8
//! granularity = "hourly"   # or "daily"
//!
//! [rebalance]
//! cooldown_periods = 24
//! gas_cost_usd = 5.0
//!
//! [fees]
//! sentinel_leading_ones = 16
//! ```

use std::path::{Path, PathBuf};

use rangelab_core::domain::{Granularity, TokenPair, WidthSpec};
use rangelab_core::engine::{PositionConfig, SentinelPolicy};
use rangelab_core::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a simulation run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid position parameters: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub position: PositionSection,
    #[serde(default)]
    pub rebalance: RebalanceSection,
    #[serde(default)]
    pub fees: FeeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSection {
    pub initial_investment: f64,
    pub width: WidthSpec,
    pub tick_spacing: i32,
    pub decimals0: u8,
    pub decimals1: u8,
    pub granularity: Granularity,
    #[serde(default)]
    pub use_compounding_apr: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cooldown")]
    pub cooldown_periods: u64,
    /// Gas paid per rebalance, from a separate balance.
    #[serde(default)]
    pub gas_cost_usd: f64,
    /// Gas paid when the position is closed at the end of the series.
    #[serde(default)]
    pub close_gas_cost_usd: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_cooldown() -> u64 {
    1
}

impl Default for RebalanceSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cooldown_periods: default_cooldown(),
            gas_cost_usd: 0.0,
            close_gas_cost_usd: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSection {
    /// Leading one bits that mark an uninitialized fee-growth counter.
    /// Unset means the engine default; 0 disables detection.
    #[serde(default)]
    pub sentinel_leading_ones: Option<u32>,
}

impl FeeSection {
    pub fn sentinel_policy(&self) -> Result<SentinelPolicy, EngineError> {
        match self.sentinel_leading_ones {
            Some(bits) => SentinelPolicy::new(bits),
            None => Ok(SentinelPolicy::default()),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let gas = [
            ("rebalance.gas_cost_usd", self.rebalance.gas_cost_usd),
            ("rebalance.close_gas_cost_usd", self.rebalance.close_gas_cost_usd),
        ];
        for (field, value) in gas {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: format!("must be a non-negative amount, got {value}"),
                });
            }
        }
        self.to_position_config()?;
        Ok(())
    }

    pub fn pair(&self) -> TokenPair {
        TokenPair::new(self.position.decimals0, self.position.decimals1)
    }

    /// Engine parameters for this configuration.
    pub fn to_position_config(&self) -> Result<PositionConfig, ConfigError> {
        let position = &self.position;
        let config = PositionConfig::new(
            position.initial_investment,
            position.width,
            position.tick_spacing,
            self.pair(),
            position.granularity,
        )
        .with_compounding_apr(position.use_compounding_apr)
        .with_cooldown(self.rebalance.cooldown_periods)
        .with_sentinel(self.fees.sentinel_policy()?);
        config.validate()?;
        Ok(config)
    }

    /// Copy with a different width and cooldown, for sweeps.
    pub fn with_strategy(&self, width: WidthSpec, cooldown_periods: u64) -> Self {
        let mut config = self.clone();
        config.position.width = width;
        config.rebalance.cooldown_periods = cooldown_periods;
        config
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[position]
initial_investment = 1000.0
width = "10%"
tick_spacing = 2000
decimals0 = 6
decimals1 = 8
granularity = "daily"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = SimulationConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.position.width, WidthSpec::Percent(10.0));
        assert!(config.rebalance.enabled);
        assert_eq!(config.rebalance.cooldown_periods, 1);
        assert_eq!(config.rebalance.gas_cost_usd, 0.0);
        assert_eq!(config.fees.sentinel_leading_ones, None);
        assert!(!config.position.use_compounding_apr);
    }

    #[test]
    fn position_config_carries_all_sections() {
        let toml = format!(
            "{MINIMAL}\n[rebalance]\ncooldown_periods = 24\ngas_cost_usd = 2.5\n\n[fees]\nsentinel_leading_ones = 0\n"
        );
        let config = SimulationConfig::from_toml(&toml).unwrap();
        let engine = config.to_position_config().unwrap();
        assert_eq!(engine.cooldown_periods, 24);
        assert_eq!(engine.sentinel, SentinelPolicy::disabled());
        assert_eq!(engine.pair, TokenPair::new(6, 8));
    }

    #[test]
    fn full_range_width_parses() {
        let toml = MINIMAL.replace("\"10%\"", "\"full\"");
        let config = SimulationConfig::from_toml(&toml).unwrap();
        assert_eq!(config.position.width, WidthSpec::FullRange);
    }

    #[test]
    fn unsupported_width_is_rejected() {
        let toml = MINIMAL.replace("\"10%\"", "\"wide\"");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_tick_spacing_is_rejected() {
        let toml = MINIMAL.replace("tick_spacing = 2000", "tick_spacing = 0");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Engine(EngineError::InvalidTickSpacing { spacing: 0 }))
        ));
    }

    #[test]
    fn negative_gas_is_rejected() {
        let toml = format!("{MINIMAL}\n[rebalance]\ngas_cost_usd = -1.0\n");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::InvalidField { field: "rebalance.gas_cost_usd", .. })
        ));
    }

    #[test]
    fn oversized_sentinel_is_rejected() {
        let toml = format!("{MINIMAL}\n[fees]\nsentinel_leading_ones = 300\n");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Engine(EngineError::InvalidSentinelBits { bits: 300 }))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let config = SimulationConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.run_id(), config.clone().run_id());
        assert_eq!(config.run_id().len(), 64);
        let other = config.with_strategy(WidthSpec::Percent(5.0), 1);
        assert_ne!(config.run_id(), other.run_id());
    }
}
