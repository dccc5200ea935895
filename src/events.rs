// 11.0: every committed state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists all event types.
// events of a rejected call are dropped along with its state changes.

use crate::pool::PoolAddresses;
use crate::types::{Address, Fixed, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Deployment
    PoolInitialized(PoolInitializedEvent),

    // Liquidity events
    LiquidityAdded(LiquidityAddedEvent),
    LiquidityRemoved(LiquidityRemovedEvent),
    SharesTransferred(SharesTransferredEvent),

    // Margin events
    MarginDeposited(MarginEvent),
    MarginWithdrawn(MarginEvent),

    // Trade events
    Trade(TradeEvent),

    // Funding events
    FundingAccrued(FundingAccruedEvent),
    FundingSettled(FundingSettledEvent),

    // Risk events
    Liquidation(LiquidationEvent),

    // Position ledger events
    PositionMinted(PositionLifecycleEvent),
    PositionBurned(PositionLifecycleEvent),
    PositionTransferred(PositionTransferredEvent),

    // Qualifier events
    Staked(StakeEvent),
    Unstaked(StakeEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInitializedEvent {
    pub pool: Address,
    pub symbol: String,
    pub addresses: PoolAddresses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityAddedEvent {
    pub provider: Address,
    pub amount: Fixed,
    pub shares: Fixed,
    pub liquidity: Fixed,
    pub total_shares: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRemovedEvent {
    pub provider: Address,
    pub shares: Fixed,
    pub amount: Fixed,
    pub redemption_fee: Fixed,
    pub liquidity: Fixed,
    pub total_shares: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesTransferredEvent {
    pub from: Address,
    pub to: Address,
    pub shares: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginEvent {
    pub owner: Address,
    pub amount: Fixed,
    pub margin: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub owner: Address,
    pub delta_volume: Fixed,
    pub price: Fixed,
    pub cur_cost: Fixed,
    pub fee: Fixed,
    pub realized_cost: Fixed,
    pub funding: Fixed,
    pub paid: Fixed,
    pub volume: Fixed,
    pub cost: Fixed,
    pub margin: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingAccruedEvent {
    pub elapsed: u64,
    pub delta: Fixed,
    pub cumulative_funding_rate: Fixed,
    pub net_volume: Fixed,
    pub price: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSettledEvent {
    pub owner: Address,
    // what the position owed, before rounding to collateral units
    pub funding: Fixed,
    pub paid: Fixed,
    pub cumulative_funding_rate: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub owner: Address,
    pub liquidator: Address,
    pub price: Fixed,
    pub volume: Fixed,
    pub cost: Fixed,
    pub margin: Fixed,
    pub remaining_margin: Fixed,
    pub reward: Fixed,
    pub shortfall: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLifecycleEvent {
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTransferredEvent {
    pub from: Address,
    pub to: Address,
    pub operator: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEvent {
    pub staker: Address,
    pub amount: u128,
    pub stake: u128,
    pub qualified: bool,
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::PoolInitialized(_) => "pool_initialized",
            EventPayload::LiquidityAdded(_) => "liquidity_added",
            EventPayload::LiquidityRemoved(_) => "liquidity_removed",
            EventPayload::SharesTransferred(_) => "shares_transferred",
            EventPayload::MarginDeposited(_) => "margin_deposited",
            EventPayload::MarginWithdrawn(_) => "margin_withdrawn",
            EventPayload::Trade(_) => "trade",
            EventPayload::FundingAccrued(_) => "funding_accrued",
            EventPayload::FundingSettled(_) => "funding_settled",
            EventPayload::Liquidation(_) => "liquidation",
            EventPayload::PositionMinted(_) => "position_minted",
            EventPayload::PositionBurned(_) => "position_burned",
            EventPayload::PositionTransferred(_) => "position_transferred",
            EventPayload::Staked(_) => "staked",
            EventPayload::Unstaked(_) => "unstaked",
        }
    }

    /// The account this event is about, if it is about one.
    pub fn subject(&self) -> Option<Address> {
        match self {
            EventPayload::LiquidityAdded(e) => Some(e.provider),
            EventPayload::LiquidityRemoved(e) => Some(e.provider),
            EventPayload::SharesTransferred(e) => Some(e.from),
            EventPayload::MarginDeposited(e) | EventPayload::MarginWithdrawn(e) => Some(e.owner),
            EventPayload::Trade(e) => Some(e.owner),
            EventPayload::FundingSettled(e) => Some(e.owner),
            EventPayload::Liquidation(e) => Some(e.owner),
            EventPayload::PositionMinted(e) | EventPayload::PositionBurned(e) => Some(e.owner),
            EventPayload::PositionTransferred(e) => Some(e.from),
            EventPayload::Staked(e) | EventPayload::Unstaked(e) => Some(e.staker),
            EventPayload::PoolInitialized(_) | EventPayload::FundingAccrued(_) => None,
        }
    }
}
