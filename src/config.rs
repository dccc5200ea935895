// 7.0 config.rs: everything a pool is deployed with. risk params, token specs, addresses.
// 7.1 PoolParams are fixed at initialize and never change afterwards.
// 7.2 loading from TOML and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::token::TokenSpec;
use crate::types::{Address, Fixed};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config read error: {0}")]
    Io(String),
}

/** 7.1: pool risk parameters. ratios are fractions (0.1 = 10%), amounts are collateral units */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    // contract size: one unit of volume is `multiplier` of the underlying
    pub multiplier: Fixed,
    // trading fee on |traded value|
    pub fee_ratio: Fixed,
    // pool dynamic equity / |net notional| floor
    pub min_pool_margin_ratio: Fixed,
    // required when a trade increases a position's risk
    pub min_initial_margin_ratio: Fixed,
    // below this a position can be liquidated, withdrawals must stay above it
    pub min_maintenance_margin_ratio: Fixed,
    pub min_add_liquidity: Fixed,
    // charged on partial redemptions, stays in the pool
    pub redemption_fee_ratio: Fixed,
    pub funding_rate_coefficient: Fixed,
    pub min_liquidation_reward: Fixed,
    pub max_liquidation_reward: Fixed,
    // share of the remaining margin paid to the liquidator, before clamping
    pub liquidation_cut_ratio: Fixed,
    // seconds an oracle price stays valid either side of now
    pub price_delay_allowance: u64,
}

impl PoolParams {
    /// BTCUSD as launched: 0.0001 BTC contracts, 2.5bp fee, 10x initial, 20x maintenance.
    pub fn btcusd() -> Self {
        Self {
            multiplier: Fixed::from_ratio(1, 10_000),
            fee_ratio: Fixed::from_ratio(5, 20_000),
            min_pool_margin_ratio: Fixed::ONE,
            min_initial_margin_ratio: Fixed::from_ratio(1, 10),
            min_maintenance_margin_ratio: Fixed::from_ratio(1, 20),
            min_add_liquidity: Fixed::from_int(100),
            redemption_fee_ratio: Fixed::from_ratio(5, 1_000),
            funding_rate_coefficient: Fixed::from_ratio(1, 100_000),
            min_liquidation_reward: Fixed::from_int(20),
            max_liquidation_reward: Fixed::from_int(100),
            liquidation_cut_ratio: Fixed::from_ratio(1, 4),
            price_delay_allowance: 100,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !self.multiplier.is_positive() {
            return Err(invalid("multiplier", "must be positive"));
        }

        let non_negative = [
            ("fee_ratio", self.fee_ratio),
            ("min_pool_margin_ratio", self.min_pool_margin_ratio),
            ("min_add_liquidity", self.min_add_liquidity),
            ("redemption_fee_ratio", self.redemption_fee_ratio),
            ("funding_rate_coefficient", self.funding_rate_coefficient),
            ("min_liquidation_reward", self.min_liquidation_reward),
            ("liquidation_cut_ratio", self.liquidation_cut_ratio),
        ];
        for (field, value) in non_negative {
            if value.is_negative() {
                return Err(invalid(field, format!("{} is negative", value)));
            }
        }

        if !self.min_maintenance_margin_ratio.is_positive() {
            return Err(invalid("min_maintenance_margin_ratio", "must be positive"));
        }
        if self.min_initial_margin_ratio < self.min_maintenance_margin_ratio {
            return Err(invalid(
                "min_initial_margin_ratio",
                format!(
                    "{} is below the maintenance ratio {}",
                    self.min_initial_margin_ratio, self.min_maintenance_margin_ratio
                ),
            ));
        }
        if self.redemption_fee_ratio >= Fixed::ONE {
            return Err(invalid("redemption_fee_ratio", "must be below 1"));
        }
        if self.liquidation_cut_ratio > Fixed::ONE {
            return Err(invalid("liquidation_cut_ratio", "must not exceed 1"));
        }
        if self.min_liquidation_reward > self.max_liquidation_reward {
            return Err(invalid(
                "max_liquidation_reward",
                format!(
                    "{} is below the minimum reward {}",
                    self.max_liquidation_reward, self.min_liquidation_reward
                ),
            ));
        }
        Ok(())
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self::btcusd()
    }
}

/** 7.0: deployment description for one pool */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub symbol: String,
    // deployer. minter of the collateral and stake tokens
    pub admin: Address,
    // address whose signatures the oracle gate accepts
    pub oracle_signer: Address,
    pub collateral: TokenSpec,
    pub stake: TokenSpec,
    pub liquidity_share: TokenSpec,
    pub params: PoolParams,
}

impl PoolConfig {
    pub fn btcusd(admin: Address, oracle_signer: Address) -> Self {
        Self {
            symbol: "BTCUSD".to_string(),
            admin,
            oracle_signer,
            collateral: TokenSpec::new("Tether USD", "USDT", 6),
            stake: TokenSpec::new("Liquidator stake", "LSTK", 18),
            liquidity_share: TokenSpec::new("Pool liquidity share", "PLS", 18),
            params: PoolParams::btcusd(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::Invalid {
                field: "symbol",
                reason: "must not be empty".to_string(),
            });
        }
        if self.oracle_signer == Address::ZERO {
            return Err(ConfigError::Invalid {
                field: "oracle_signer",
                reason: "must be set".to_string(),
            });
        }
        if self.collateral.decimals > 18 {
            return Err(ConfigError::Invalid {
                field: "collateral.decimals",
                reason: format!("{} exceeds 18", self.collateral.decimals),
            });
        }
        self.params.validate()
    }

    // 7.2: TOML loading. amounts and ratios are strings ("0.00025") so they stay exact
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
