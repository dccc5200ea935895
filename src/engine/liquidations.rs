//! Liquidation execution.

use super::core::Engine;
use super::results::{EngineError, LiquidationResult};
use crate::events::{EventPayload, LiquidationEvent};
use crate::liquidation::{evaluate_liquidation, settle_liquidation};
use crate::oracle::SignedPrice;
use crate::pool::PoolError;
use crate::position::Position;
use crate::types::{Address, Fixed};
use tracing::info;

impl Engine {
    /// Closes `owner`'s whole position at `signed`'s price if it is below maintenance margin.
    /// only the qualified liquidator may call this. the liquidator is paid its reward in
    /// collateral, the pool keeps the rest of the margin and absorbs any shortfall.
    pub fn liquidate(
        &mut self,
        liquidator: Address,
        owner: Address,
        signed: &SignedPrice,
    ) -> Result<LiquidationResult, EngineError> {
        self.atomically("liquidate", |engine| {
            let price = engine.prepare(signed)?;

            if !engine.ledgers.qualifier.is_qualified(liquidator) {
                return Err(PoolError::NotQualified(liquidator).into());
            }
            if !engine.ledgers.positions.exists(owner) {
                return Err(PoolError::NoPosition(owner).into());
            }
            engine.settle_funding(owner)?;

            let position = engine.position(owner).ok_or(PoolError::NoPosition(owner))?;
            if !evaluate_liquidation(&position, price, &engine.params)?.is_liquidatable() {
                return Err(PoolError::NotLiquidatable(owner).into());
            }

            let outcome = settle_liquidation(&position, price, &engine.params, engine.collateral_decimals())?;

            let pool = &mut engine.ledgers.pool;
            pool.liquidity = pool.liquidity.checked_add(outcome.pool_credit)?;
            pool.traders_net_volume = pool.traders_net_volume.checked_sub(position.volume)?;
            pool.traders_net_cost = pool.traders_net_cost.checked_sub(position.cost)?;

            if outcome.reward.is_positive() {
                engine.push_collateral(liquidator, outcome.reward)?;
            }

            let closed = Position {
                volume: Fixed::ZERO,
                cost: Fixed::ZERO,
                margin: Fixed::ZERO,
                last_update: engine.current_time,
                ..position
            };
            let pool_address = engine.pool_address();
            engine.ledgers.positions.update(pool_address, owner, closed)?;

            info!(
                owner = %owner,
                liquidator = %liquidator,
                price = %price,
                volume = %position.volume,
                remaining_margin = %outcome.remaining_margin,
                reward = %outcome.reward,
                "position liquidated"
            );
            engine.pending.push(EventPayload::Liquidation(LiquidationEvent {
                owner,
                liquidator,
                price,
                volume: position.volume,
                cost: position.cost,
                margin: position.margin,
                remaining_margin: outcome.remaining_margin,
                reward: outcome.reward,
                shortfall: outcome.shortfall(),
            }));
            engine.burn_if_empty(owner)?;

            Ok(LiquidationResult {
                owner,
                liquidator,
                price,
                volume: position.volume,
                remaining_margin: outcome.remaining_margin,
                reward: outcome.reward,
                shortfall: outcome.shortfall(),
            })
        })
    }
}
