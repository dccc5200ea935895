// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::margin::MarginError;
use crate::oracle::OracleError;
use crate::pool::PoolError;
use crate::position::Position;
use crate::position_ledger::PositionLedgerError;
use crate::qualifier::QualifierError;
use crate::token::TokenError;
use crate::types::{Address, Fixed, Overflow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityResult {
    pub amount: Fixed,
    pub shares: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLiquidityResult {
    pub shares: Fixed,
    pub amount: Fixed,
    pub redemption_fee: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginResult {
    pub amount: Fixed,
    pub funding_paid: Fixed,
    // None once the position was burned
    pub margin: Option<Fixed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub price: Fixed,
    pub cur_cost: Fixed,
    pub fee: Fixed,
    pub realized_cost: Fixed,
    pub funding: Fixed,
    pub paid: Fixed,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationResult {
    pub owner: Address,
    pub liquidator: Address,
    pub price: Fixed,
    pub volume: Fixed,
    pub remaining_margin: Fixed,
    pub reward: Fixed,
    pub shortfall: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Position ledger error: {0}")]
    PositionLedger(#[from] PositionLedgerError),

    #[error("Qualifier error: {0}")]
    Qualifier(#[from] QualifierError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Margin error: {0}")]
    Margin(#[from] MarginError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Overflow> for EngineError {
    fn from(err: Overflow) -> Self {
        EngineError::Pool(PoolError::Overflow(err))
    }
}
