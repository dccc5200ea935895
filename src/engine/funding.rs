//! Oracle gate and funding settlement.
//!
//! Every priced call starts with [`Engine::prepare`]: the signed price is checked against the
//! registered signer and the freshness window, then the pool's funding index is brought up to
//! the current time. Positions catch up to the index before anything else touches them.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, FundingAccruedEvent, FundingSettledEvent};
use crate::funding::FundingAccrual;
use crate::oracle::SignedPrice;
use crate::types::{Address, Fixed};
use tracing::info;

/// Funding a position settled on its own, outside a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct FundingSettlement {
    pub(super) funding: Fixed,
    pub(super) paid: Fixed,
}

impl Engine {
    /// Verifies a signed price against the pool's signer at the engine clock.
    pub fn verify_price(&self, signed: &SignedPrice) -> Result<Fixed, EngineError> {
        Ok(self.oracle.verify(signed, self.current_time)?)
    }

    /// Verify then accrue. returns the price the call runs at.
    pub(super) fn prepare(&mut self, signed: &SignedPrice) -> Result<Fixed, EngineError> {
        let price = self.verify_price(signed)?;
        self.accrue_funding(price)?;
        Ok(price)
    }

    fn accrue_funding(&mut self, price: Fixed) -> Result<FundingAccrual, EngineError> {
        let net_volume = self.ledgers.pool.traders_net_volume();
        let step = self
            .ledgers
            .pool
            .accrue_funding(self.funding_model.as_ref(), price, self.current_time)?;

        if !step.delta.is_zero() {
            info!(
                elapsed = step.elapsed,
                delta = %step.delta,
                cumulative = %step.cumulative_funding_rate,
                "funding accrued"
            );
            self.pending.push(EventPayload::FundingAccrued(FundingAccruedEvent {
                elapsed: step.elapsed,
                delta: step.delta,
                cumulative_funding_rate: step.cumulative_funding_rate,
                net_volume,
                price,
            }));
        }
        Ok(step)
    }

    /// Moves what `owner` owes since its checkpoint from margin into liquidity, rounded to
    /// collateral units. a missing position settles nothing.
    pub(super) fn settle_funding(&mut self, owner: Address) -> Result<FundingSettlement, EngineError> {
        let Some(mut position) = self.position(owner) else {
            return Ok(FundingSettlement::default());
        };

        let cumulative = self.ledgers.pool.cumulative_funding_rate();
        let funding = position.funding_owed(cumulative)?;
        let paid = funding.round_to_native(self.collateral_decimals());

        position.margin = position.margin.checked_sub(paid)?;
        position.last_cumulative_funding_rate = cumulative;
        position.last_update = self.current_time;
        self.ledgers.pool.liquidity = self.ledgers.pool.liquidity.checked_add(paid)?;

        let pool = self.pool_address();
        self.ledgers.positions.update(pool, owner, position)?;

        if !funding.is_zero() {
            self.pending.push(EventPayload::FundingSettled(FundingSettledEvent {
                owner,
                funding,
                paid,
                cumulative_funding_rate: cumulative,
            }));
        }
        Ok(FundingSettlement { funding, paid })
    }
}
