//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use tide_types::amount::serde_str;
use tide_types::{Address, Amount, ProtocolParams, ETHER};
use tide_utils::LogFormat;

use crate::error::EngineError;

/// Configuration for a [`Protocol`](crate::Protocol) instance.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Amounts are written as strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// May add or remove committee members and push payloads while bootstrap
    /// mode lasts. Also funds the reward pools.
    #[serde(default)]
    pub guardian: Address,

    /// Initial committee members.
    #[serde(default)]
    pub committee: Vec<Address>,

    /// Receives the treasury share of every reward snapshot.
    #[serde(default)]
    pub treasury: Address,

    /// Receives the fee-recipient share of every reward snapshot.
    #[serde(default)]
    pub fee_recipient: Address,

    /// Receives collateral slashed by scrub votes.
    #[serde(default)]
    pub auction: Address,

    /// Receives validator deposits.
    #[serde(default)]
    pub deposit_contract: Address,

    /// Collateral price before the first oracle update, `ETHER`-scaled.
    #[serde(default = "default_initial_price", with = "serde_str")]
    pub initial_price: Amount,

    /// Start of the first reward interval, in ledger seconds.
    #[serde(default)]
    pub genesis_time: u64,

    #[serde(default)]
    pub params: ProtocolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_initial_price() -> Amount {
    ETHER
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by `log_format` and
    /// `log_level`.
    pub fn init_logging(&self) -> Result<(), EngineError> {
        tide_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Reject settings no ledger could run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let p = &self.params;
        if self.initial_price == 0 {
            return Err(EngineError::Config("initial_price must be non-zero".into()));
        }
        if p.prelaunch_value >= p.launch_balance {
            return Err(EngineError::Config(
                "prelaunch_value must be below launch_balance".into(),
            ));
        }
        if let Some(bad) = p
            .allowed_bonds
            .iter()
            .find(|b| **b < p.prelaunch_value || **b >= p.launch_balance)
        {
            return Err(EngineError::Config(format!(
                "allowed bond {bad} must lie in [prelaunch_value, launch_balance)"
            )));
        }
        if p.minimum_per_unit_stake.is_zero() {
            return Err(EngineError::Config(
                "minimum_per_unit_stake must be non-zero".into(),
            ));
        }
        if p.node_fee_minimum > p.node_fee_target || p.node_fee_target > p.node_fee_maximum {
            return Err(EngineError::Config(
                "node fee bounds must satisfy minimum <= target <= maximum".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            guardian: Address::ZERO,
            committee: Vec::new(),
            treasury: Address::ZERO,
            fee_recipient: Address::ZERO,
            auction: Address::ZERO,
            deposit_contract: Address::ZERO,
            initial_price: default_initial_price(),
            genesis_time: 0,
            params: ProtocolParams::default(),
        }
    }
}
