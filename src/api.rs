// 9.4 api.rs: message surface over the engine. every state change is a Command, every read
// a Query, and both answer with an ApiResponse or an ApiError carrying a stable code.
// all of it is serde so a transport (the actor in service.rs, a socket, a log replay) can
// carry it unchanged.

use crate::config::PoolParams;
use crate::engine::{
    AddLiquidityResult, Engine, EngineError, LiquidationResult, MarginResult, RemoveLiquidityResult, TradeResult,
};
use crate::events::Event;
use crate::margin::MarginError;
use crate::oracle::SignedPrice;
use crate::pool::{PoolAddresses, PoolError, StateValues};
use crate::position::Position;
use crate::position_ledger::PositionLedgerError;
use crate::qualifier::QualifierError;
use crate::token::TokenError;
use crate::types::{Address, Fixed, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    AddLiquidity {
        provider: Address,
        amount: Fixed,
        price: SignedPrice,
    },
    RemoveLiquidity {
        provider: Address,
        shares: Fixed,
        price: SignedPrice,
    },
    DepositMargin {
        owner: Address,
        amount: Fixed,
        price: SignedPrice,
    },
    WithdrawMargin {
        owner: Address,
        amount: Fixed,
        price: SignedPrice,
    },
    Trade {
        owner: Address,
        volume: Fixed,
        price: SignedPrice,
    },
    TradeWithMargin {
        owner: Address,
        volume: Fixed,
        margin: Fixed,
        price: SignedPrice,
    },
    Liquidate {
        liquidator: Address,
        owner: Address,
        price: SignedPrice,
    },
    TransferShares {
        from: Address,
        to: Address,
        shares: Fixed,
    },
    ApproveShares {
        owner: Address,
        spender: Address,
        shares: Fixed,
    },
    TransferSharesFrom {
        spender: Address,
        from: Address,
        to: Address,
        shares: Fixed,
    },
    ApprovePosition {
        owner: Address,
        operator: Option<Address>,
    },
    TransferPosition {
        caller: Address,
        from: Address,
        to: Address,
    },
    Stake {
        staker: Address,
        amount: u128,
    },
    Unstake {
        staker: Address,
        amount: u128,
    },
    MintCollateral {
        caller: Address,
        to: Address,
        amount: Fixed,
    },
    ApproveCollateral {
        owner: Address,
        amount: Fixed,
    },
    MintStake {
        caller: Address,
        to: Address,
        amount: u128,
    },
    ApproveStake {
        owner: Address,
        amount: u128,
    },
    SetTime {
        timestamp: Timestamp,
    },
    AdvanceTime {
        secs: u64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddLiquidity { .. } => "add_liquidity",
            Command::RemoveLiquidity { .. } => "remove_liquidity",
            Command::DepositMargin { .. } => "deposit_margin",
            Command::WithdrawMargin { .. } => "withdraw_margin",
            Command::Trade { .. } => "trade",
            Command::TradeWithMargin { .. } => "trade_with_margin",
            Command::Liquidate { .. } => "liquidate",
            Command::TransferShares { .. } => "transfer_shares",
            Command::ApproveShares { .. } => "approve_shares",
            Command::TransferSharesFrom { .. } => "transfer_shares_from",
            Command::ApprovePosition { .. } => "approve_position",
            Command::TransferPosition { .. } => "transfer_position",
            Command::Stake { .. } => "stake",
            Command::Unstake { .. } => "unstake",
            Command::MintCollateral { .. } => "mint_collateral",
            Command::ApproveCollateral { .. } => "approve_collateral",
            Command::MintStake { .. } => "mint_stake",
            Command::ApproveStake { .. } => "approve_stake",
            Command::SetTime { .. } => "set_time",
            Command::AdvanceTime { .. } => "advance_time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    StateValues,
    DynamicEquity { price: Fixed },
    Position { owner: Address },
    ShareBalance { owner: Address },
    TotalShares,
    CollateralBalance { owner: Address },
    StakeOf { staker: Address },
    IsQualified { liquidator: Address },
    TotalStaked,
    TotalStakers,
    TotalPositions,
    TotalValueLocked,
    Addresses,
    Params,
    Time,
    RecentEvents { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiResponse {
    Done,
    LiquidityAdded(AddLiquidityResult),
    LiquidityRemoved(RemoveLiquidityResult),
    Margin(MarginResult),
    Trade(TradeResult),
    Liquidation(LiquidationResult),
    Stake(u128),
    Time(Timestamp),
    StateValues(StateValues),
    Amount(Fixed),
    Position(Option<Position>),
    Flag(bool),
    Count(u64),
    Addresses(PoolAddresses),
    Params(PoolParams),
    Events(Vec<Event>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    OracleRejected,
    Unauthorized,
    InsufficientFunds,
    InvalidAmount,
    MarginRequirement,
    PositionState,
    PoolState,
    NotLiquidatable,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

fn token_code(err: &TokenError) -> ErrorCode {
    match err {
        TokenError::NotMinter { .. } => ErrorCode::Unauthorized,
        TokenError::InsufficientBalance { .. } | TokenError::InsufficientAllowance { .. } => {
            ErrorCode::InsufficientFunds
        }
        TokenError::SupplyOverflow { .. } | TokenError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
    }
}

impl ErrorCode {
    pub fn of(err: &EngineError) -> Self {
        match err {
            EngineError::Oracle(_) => ErrorCode::OracleRejected,
            EngineError::Token(e) => token_code(e),
            EngineError::PositionLedger(e) => match e {
                PositionLedgerError::NotController(_) | PositionLedgerError::NotOwnerOrOperator { .. } => {
                    ErrorCode::Unauthorized
                }
                _ => ErrorCode::PositionState,
            },
            EngineError::Qualifier(e) => match e {
                QualifierError::ZeroAmount | QualifierError::Overflow => ErrorCode::InvalidAmount,
                QualifierError::InsufficientStake { .. } => ErrorCode::InsufficientFunds,
                QualifierError::Token(e) => token_code(e),
            },
            EngineError::Pool(e) => match e {
                PoolError::NotInitialized
                | PoolError::AlreadyInitialized
                | PoolError::NoShares
                | PoolError::InsolventShares(_)
                | PoolError::NegativeLiquidity(_) => ErrorCode::PoolState,
                PoolError::NonPositiveAmount { .. }
                | PoolError::ZeroVolume
                | PoolError::BelowMinAddLiquidity { .. }
                | PoolError::UnrepresentableAmount { .. }
                | PoolError::Overflow(_) => ErrorCode::InvalidAmount,
                PoolError::InsufficientShares { .. } => ErrorCode::InsufficientFunds,
                PoolError::NoPosition(_) => ErrorCode::PositionState,
                PoolError::NotQualified(_) => ErrorCode::Unauthorized,
                PoolError::NotLiquidatable(_) => ErrorCode::NotLiquidatable,
                PoolError::Config(_) => ErrorCode::Config,
            },
            EngineError::Margin(MarginError::Overflow(_)) => ErrorCode::InvalidAmount,
            EngineError::Margin(_) => ErrorCode::MarginRequirement,
            EngineError::Config(_) => ErrorCode::Config,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self {
            code: ErrorCode::of(&err),
            message: err.to_string(),
        }
    }
}

impl Engine {
    pub fn execute(&mut self, command: Command) -> Result<ApiResponse, ApiError> {
        let response = match command {
            Command::AddLiquidity {
                provider,
                amount,
                price,
            } => ApiResponse::LiquidityAdded(self.add_liquidity(provider, amount, &price)?),
            Command::RemoveLiquidity {
                provider,
                shares,
                price,
            } => ApiResponse::LiquidityRemoved(self.remove_liquidity(provider, shares, &price)?),
            Command::DepositMargin { owner, amount, price } => {
                ApiResponse::Margin(self.deposit_margin(owner, amount, &price)?)
            }
            Command::WithdrawMargin { owner, amount, price } => {
                ApiResponse::Margin(self.withdraw_margin(owner, amount, &price)?)
            }
            Command::Trade { owner, volume, price } => ApiResponse::Trade(self.trade(owner, volume, &price)?),
            Command::TradeWithMargin {
                owner,
                volume,
                margin,
                price,
            } => ApiResponse::Trade(self.trade_with_margin(owner, volume, margin, &price)?),
            Command::Liquidate {
                liquidator,
                owner,
                price,
            } => ApiResponse::Liquidation(self.liquidate(liquidator, owner, &price)?),
            Command::TransferShares { from, to, shares } => {
                self.transfer_shares(from, to, shares)?;
                ApiResponse::Done
            }
            Command::ApproveShares { owner, spender, shares } => {
                self.approve_shares(owner, spender, shares)?;
                ApiResponse::Done
            }
            Command::TransferSharesFrom {
                spender,
                from,
                to,
                shares,
            } => {
                self.transfer_shares_from(spender, from, to, shares)?;
                ApiResponse::Done
            }
            Command::ApprovePosition { owner, operator } => {
                self.approve_position(owner, operator)?;
                ApiResponse::Done
            }
            Command::TransferPosition { caller, from, to } => {
                self.transfer_position(caller, from, to)?;
                ApiResponse::Done
            }
            Command::Stake { staker, amount } => ApiResponse::Stake(self.stake(staker, amount)?),
            Command::Unstake { staker, amount } => ApiResponse::Stake(self.unstake(staker, amount)?),
            Command::MintCollateral { caller, to, amount } => {
                self.mint_collateral(caller, to, amount)?;
                ApiResponse::Done
            }
            Command::ApproveCollateral { owner, amount } => {
                self.approve_collateral(owner, amount)?;
                ApiResponse::Done
            }
            Command::MintStake { caller, to, amount } => {
                self.mint_stake(caller, to, amount)?;
                ApiResponse::Done
            }
            Command::ApproveStake { owner, amount } => {
                self.approve_stake(owner, amount)?;
                ApiResponse::Done
            }
            Command::SetTime { timestamp } => {
                self.set_time(timestamp);
                ApiResponse::Time(self.time())
            }
            Command::AdvanceTime { secs } => {
                self.advance_time(secs);
                ApiResponse::Time(self.time())
            }
        };
        Ok(response)
    }

    pub fn query(&self, query: Query) -> Result<ApiResponse, ApiError> {
        let response = match query {
            Query::StateValues => ApiResponse::StateValues(self.state_values()),
            Query::DynamicEquity { price } => ApiResponse::Amount(self.dynamic_equity(price)?),
            Query::Position { owner } => ApiResponse::Position(self.position(owner)),
            Query::ShareBalance { owner } => ApiResponse::Amount(self.share_balance(owner)),
            Query::TotalShares => ApiResponse::Amount(self.total_shares()),
            Query::CollateralBalance { owner } => ApiResponse::Amount(self.collateral_balance(owner)),
            Query::StakeOf { staker } => ApiResponse::Stake(self.qualifier().stake_of(staker)),
            Query::IsQualified { liquidator } => ApiResponse::Flag(self.is_qualified(liquidator)),
            Query::TotalStaked => ApiResponse::Stake(self.qualifier().total_staked()),
            Query::TotalStakers => ApiResponse::Count(self.qualifier().total_stakers() as u64),
            Query::TotalPositions => ApiResponse::Count(self.position_ledger().total_supply() as u64),
            Query::TotalValueLocked => ApiResponse::Amount(self.total_value_locked()),
            Query::Addresses => ApiResponse::Addresses(self.addresses()?),
            Query::Params => ApiResponse::Params(self.params().clone()),
            Query::Time => ApiResponse::Time(self.time()),
            Query::RecentEvents { count } => ApiResponse::Events(self.recent_events(count).to_vec()),
        };
        Ok(response)
    }
}
