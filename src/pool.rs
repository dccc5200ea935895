// 8.x pool.rs: the perpetual pool's own state. liquidity, traders' aggregate exposure and the
// funding index. the operations that move it live in engine/.
//
// a pool starts life as an uninitialized template; the factory copies it and the copy is
// initialized exactly once with its symbol, collaborators and params.

use crate::config::{ConfigError, PoolParams};
use crate::funding::{accrue, FundingAccrual, FundingModel, FundingState};
use crate::margin::pool_dynamic_equity;
use crate::types::{Address, Fixed, Overflow, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool is not initialized")]
    NotInitialized,

    #[error("pool is already initialized")]
    AlreadyInitialized,

    #[error("{what} must be positive, got {amount}")]
    NonPositiveAmount { what: &'static str, amount: Fixed },

    #[error("trade volume must be non-zero")]
    ZeroVolume,

    #[error("add liquidity {amount} is below the minimum {minimum}")]
    BelowMinAddLiquidity { amount: Fixed, minimum: Fixed },

    #[error("pool has no liquidity shares outstanding")]
    NoShares,

    #[error("pool has shares outstanding but liquidity {0}")]
    InsolventShares(Fixed),

    #[error("{owner} holds {held} shares, cannot redeem {requested}")]
    InsufficientShares { owner: Address, held: Fixed, requested: Fixed },

    #[error("liquidity would become negative: {0}")]
    NegativeLiquidity(Fixed),

    #[error("{0} holds no position")]
    NoPosition(Address),

    #[error("{0} is not a qualified liquidator")]
    NotQualified(Address),

    #[error("position of {0} is not below maintenance margin")]
    NotLiquidatable(Address),

    #[error("{what} {amount} does not fit collateral units")]
    UnrepresentableAmount { what: &'static str, amount: Fixed },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Overflow(#[from] Overflow),
}

/** collaborators a pool is wired to at initialize */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAddresses {
    pub collateral: Address,
    pub position_ledger: Address,
    pub liquidity_ledger: Address,
    pub oracle_signer: Address,
    pub liquidator_qualifier: Address,
}

/// Snapshot of the pool's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateValues {
    pub cumulative_funding_rate: Fixed,
    pub last_funding_update: Timestamp,
    pub liquidity: Fixed,
    pub traders_net_volume: Fixed,
    pub traders_net_cost: Fixed,
}

#[derive(Debug, Clone)]
struct PoolSetup {
    symbol: String,
    addresses: PoolAddresses,
    params: PoolParams,
}

#[derive(Debug, Clone)]
pub struct PerpetualPool {
    address: Address,
    setup: Option<PoolSetup>,
    pub(crate) funding: FundingState,
    pub(crate) liquidity: Fixed,
    pub(crate) traders_net_volume: Fixed,
    pub(crate) traders_net_cost: Fixed,
}

impl PerpetualPool {
    /// An uninitialized pool. only useful as a clone template.
    pub fn template(address: Address) -> Self {
        Self {
            address,
            setup: None,
            funding: FundingState::default(),
            liquidity: Fixed::ZERO,
            traders_net_volume: Fixed::ZERO,
            traders_net_cost: Fixed::ZERO,
        }
    }

    /// Fresh copy of this pool's code at `address`. state never carries over.
    pub fn clone_to(&self, address: Address) -> Self {
        Self::template(address)
    }

    pub fn initialize(
        &mut self,
        symbol: impl Into<String>,
        addresses: PoolAddresses,
        params: PoolParams,
        now: Timestamp,
    ) -> Result<(), PoolError> {
        if self.setup.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }
        params.validate()?;
        self.setup = Some(PoolSetup {
            symbol: symbol.into(),
            addresses,
            params,
        });
        self.funding = FundingState::new(now);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.setup.is_some()
    }

    fn setup(&self) -> Result<&PoolSetup, PoolError> {
        self.setup.as_ref().ok_or(PoolError::NotInitialized)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn symbol(&self) -> Result<&str, PoolError> {
        Ok(&self.setup()?.symbol)
    }

    pub fn addresses(&self) -> Result<PoolAddresses, PoolError> {
        Ok(self.setup()?.addresses)
    }

    pub fn params(&self) -> Result<&PoolParams, PoolError> {
        Ok(&self.setup()?.params)
    }

    pub fn liquidity(&self) -> Fixed {
        self.liquidity
    }

    pub fn traders_net_volume(&self) -> Fixed {
        self.traders_net_volume
    }

    pub fn traders_net_cost(&self) -> Fixed {
        self.traders_net_cost
    }

    pub fn cumulative_funding_rate(&self) -> Fixed {
        self.funding.cumulative_funding_rate
    }

    pub fn state_values(&self) -> StateValues {
        StateValues {
            cumulative_funding_rate: self.funding.cumulative_funding_rate,
            last_funding_update: self.funding.last_update,
            liquidity: self.liquidity,
            traders_net_volume: self.traders_net_volume,
            traders_net_cost: self.traders_net_cost,
        }
    }

    pub fn dynamic_equity(&self, price: Fixed) -> Result<Fixed, PoolError> {
        let multiplier = self.params()?.multiplier;
        Ok(pool_dynamic_equity(
            self.liquidity,
            self.traders_net_volume,
            self.traders_net_cost,
            price,
            multiplier,
        )?)
    }

    pub fn accrue_funding(
        &mut self,
        model: &dyn FundingModel,
        price: Fixed,
        now: Timestamp,
    ) -> Result<FundingAccrual, PoolError> {
        let setup = self.setup.as_ref().ok_or(PoolError::NotInitialized)?;
        Ok(accrue(
            &mut self.funding,
            model,
            self.traders_net_volume,
            price,
            &setup.params,
            now,
        )?)
    }
}
