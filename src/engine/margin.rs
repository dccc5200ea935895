//! Margin deposits and withdrawals.

use super::core::Engine;
use super::results::{EngineError, MarginResult};
use crate::events::{EventPayload, MarginEvent, PositionLifecycleEvent};
use crate::margin::check_maintenance;
use crate::oracle::SignedPrice;
use crate::pool::PoolError;
use crate::position::Position;
use crate::types::{Address, Fixed};

impl Engine {
    /// Adds collateral to `owner`'s position, opening an empty one on first use.
    pub fn deposit_margin(
        &mut self,
        owner: Address,
        amount: Fixed,
        signed: &SignedPrice,
    ) -> Result<MarginResult, EngineError> {
        self.atomically("deposit_margin", |engine| {
            engine.prepare(signed)?;
            engine.deposit_at(owner, amount)
        })
    }

    /// Takes collateral out of `owner`'s position. what is left must still meet the
    /// maintenance ratio at `signed`'s price.
    pub fn withdraw_margin(
        &mut self,
        owner: Address,
        amount: Fixed,
        signed: &SignedPrice,
    ) -> Result<MarginResult, EngineError> {
        self.atomically("withdraw_margin", |engine| {
            let price = engine.prepare(signed)?;
            let amount = engine.inbound_amount("margin", amount)?;
            if !engine.ledgers.positions.exists(owner) {
                return Err(PoolError::NoPosition(owner).into());
            }
            let settled = engine.settle_funding(owner)?;

            let mut position = engine.position(owner).ok_or(PoolError::NoPosition(owner))?;
            position.margin = position.margin.checked_sub(amount)?;
            check_maintenance(
                &position,
                price,
                engine.params.multiplier,
                engine.params.min_maintenance_margin_ratio,
            )?;
            position.last_update = engine.current_time;

            let pool = engine.pool_address();
            engine.ledgers.positions.update(pool, owner, position)?;
            engine.push_collateral(owner, amount)?;

            engine.pending.push(EventPayload::MarginWithdrawn(MarginEvent {
                owner,
                amount,
                margin: position.margin,
            }));
            let burned = engine.burn_if_empty(owner)?;

            Ok(MarginResult {
                amount,
                funding_paid: settled.paid,
                margin: (!burned).then_some(position.margin),
            })
        })
    }

    /// Mints `owner` an empty position at the current funding index if it holds none.
    pub(super) fn ensure_position(&mut self, owner: Address) -> Result<(), EngineError> {
        if self.ledgers.positions.exists(owner) {
            return Ok(());
        }
        let pool = self.pool_address();
        let cumulative = self.ledgers.pool.cumulative_funding_rate();
        self.ledgers
            .positions
            .mint(pool, owner, Fixed::ZERO, cumulative, self.current_time)?;
        self.pending
            .push(EventPayload::PositionMinted(PositionLifecycleEvent { owner }));
        Ok(())
    }

    // deposit body shared with trade_with_margin. the price is already verified and accrued
    pub(super) fn deposit_at(&mut self, owner: Address, amount: Fixed) -> Result<MarginResult, EngineError> {
        let amount = self.inbound_amount("margin", amount)?;
        let settled = self.settle_funding(owner)?;
        self.ensure_position(owner)?;

        self.pull_collateral(owner, amount)?;

        let position: Position = {
            let mut position = self.position(owner).ok_or(PoolError::NoPosition(owner))?;
            position.margin = position.margin.checked_add(amount)?;
            position.last_update = self.current_time;
            position
        };
        let pool = self.pool_address();
        self.ledgers.positions.update(pool, owner, position)?;

        self.pending.push(EventPayload::MarginDeposited(MarginEvent {
            owner,
            amount,
            margin: position.margin,
        }));

        Ok(MarginResult {
            amount,
            funding_paid: settled.paid,
            margin: Some(position.margin),
        })
    }
}
