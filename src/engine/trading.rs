//! Trading against the pool.
//!
//! The pool is the counterparty to every trade. A trade settles the position's funding, its fee
//! and any realized cost in one rounded payment from margin to liquidity, then moves the
//! position's volume and cost basis and the pool's aggregate exposure together.

use super::core::Engine;
use super::results::{EngineError, TradeResult};
use crate::events::{EventPayload, TradeEvent};
use crate::margin::{check_initial, check_pool};
use crate::oracle::SignedPrice;
use crate::pool::PoolError;
use crate::position::{increases_exposure, increases_risk, trade_cost};
use crate::types::{Address, Fixed};

impl Engine {
    /// Trades `delta_volume` (positive buys, negative sells) at `signed`'s price.
    pub fn trade(
        &mut self,
        owner: Address,
        delta_volume: Fixed,
        signed: &SignedPrice,
    ) -> Result<TradeResult, EngineError> {
        self.atomically("trade", |engine| {
            let price = engine.prepare(signed)?;
            engine.trade_at(owner, delta_volume, price)
        })
    }

    /// Deposits `margin` then trades, both at the same price. either both happen or neither.
    pub fn trade_with_margin(
        &mut self,
        owner: Address,
        delta_volume: Fixed,
        margin: Fixed,
        signed: &SignedPrice,
    ) -> Result<TradeResult, EngineError> {
        self.atomically("trade_with_margin", |engine| {
            let price = engine.prepare(signed)?;
            engine.deposit_at(owner, margin)?;
            engine.trade_at(owner, delta_volume, price)
        })
    }

    // 8.4: trade body. runs after the oracle gate and funding accrual
    fn trade_at(&mut self, owner: Address, delta: Fixed, price: Fixed) -> Result<TradeResult, EngineError> {
        if delta.is_zero() {
            return Err(PoolError::ZeroVolume.into());
        }
        self.ensure_position(owner)?;

        let params = &self.params;
        let mut position = self.position(owner).ok_or(PoolError::NoPosition(owner))?;
        let cumulative = self.ledgers.pool.cumulative_funding_rate();

        let funding = position.funding_owed(cumulative)?;
        let cost = trade_cost(&position, delta, price, params.multiplier, params.fee_ratio)?;
        let cost_delta = cost.cost_delta()?;
        let paid = funding
            .checked_add(cost.fee)?
            .checked_add(cost.realized_cost)?
            .round_to_native(self.ledgers.collateral.decimals());

        let old_volume = position.volume;
        position.volume = position.volume.checked_add(delta)?;
        position.cost = position.cost.checked_add(cost_delta)?;
        position.margin = position.margin.checked_sub(paid)?;
        position.last_cumulative_funding_rate = cumulative;
        position.last_update = self.current_time;

        // 8.4.1: every aggregate moves or none does. the caller rolls back on error
        let pool = &mut self.ledgers.pool;
        let old_net_volume = pool.traders_net_volume;
        pool.traders_net_volume = pool.traders_net_volume.checked_add(delta)?;
        pool.traders_net_cost = pool.traders_net_cost.checked_add(cost_delta)?;
        pool.liquidity = pool.liquidity.checked_add(paid)?;

        if increases_risk(old_volume, position.volume) {
            check_initial(&position, price, params.multiplier, params.min_initial_margin_ratio)?;
        }
        let pool = &self.ledgers.pool;
        if increases_exposure(old_net_volume, pool.traders_net_volume) {
            check_pool(
                pool.liquidity,
                pool.traders_net_volume,
                pool.traders_net_cost,
                price,
                params.multiplier,
                params.min_pool_margin_ratio,
            )?;
        }

        let pool_address = self.pool_address();
        self.ledgers.positions.update(pool_address, owner, position)?;

        self.pending.push(EventPayload::Trade(TradeEvent {
            owner,
            delta_volume: delta,
            price,
            cur_cost: cost.cur_cost,
            fee: cost.fee,
            realized_cost: cost.realized_cost,
            funding,
            paid,
            volume: position.volume,
            cost: position.cost,
            margin: position.margin,
        }));
        let burned = self.burn_if_empty(owner)?;

        Ok(TradeResult {
            price,
            cur_cost: cost.cur_cost,
            fee: cost.fee,
            realized_cost: cost.realized_cost,
            funding,
            paid,
            position: (!burned).then_some(position),
        })
    }
}
