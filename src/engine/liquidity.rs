//! Liquidity provision and share movements.

use super::core::Engine;
use super::results::{AddLiquidityResult, EngineError, RemoveLiquidityResult};
use crate::events::{EventPayload, LiquidityAddedEvent, LiquidityRemovedEvent, SharesTransferredEvent};
use crate::margin::check_pool;
use crate::oracle::SignedPrice;
use crate::pool::PoolError;
use crate::types::{Address, Fixed};

impl Engine {
    /// Deposits `amount` collateral into the pool in exchange for shares priced at
    /// `liquidity / total_shares` (1:1 for the first provider).
    pub fn add_liquidity(
        &mut self,
        provider: Address,
        amount: Fixed,
        signed: &SignedPrice,
    ) -> Result<AddLiquidityResult, EngineError> {
        self.atomically("add_liquidity", |engine| {
            engine.prepare(signed)?;

            let amount = engine.inbound_amount("liquidity", amount)?;
            let minimum = engine.params.min_add_liquidity;
            if amount < minimum {
                return Err(PoolError::BelowMinAddLiquidity { amount, minimum }.into());
            }

            let liquidity = engine.ledgers.pool.liquidity();
            let total_shares = engine.ledgers.shares.total_supply();
            let shares = if total_shares.is_zero() {
                amount
            } else if !liquidity.is_positive() {
                return Err(PoolError::InsolventShares(liquidity).into());
            } else {
                amount.checked_mul_div(total_shares, liquidity)?
            };

            engine.pull_collateral(provider, amount)?;
            engine.ledgers.pool.liquidity = liquidity.checked_add(amount)?;
            let pool = engine.pool_address();
            engine.ledgers.shares.mint(pool, provider, shares)?;

            engine.pending.push(EventPayload::LiquidityAdded(LiquidityAddedEvent {
                provider,
                amount,
                shares,
                liquidity: engine.ledgers.pool.liquidity(),
                total_shares: engine.ledgers.shares.total_supply(),
            }));

            Ok(AddLiquidityResult { amount, shares })
        })
    }

    /// Redeems `shares` for their slice of liquidity. a partial exit leaves the redemption fee
    /// behind in the pool, the last provider out pays none.
    pub fn remove_liquidity(
        &mut self,
        provider: Address,
        shares: Fixed,
        signed: &SignedPrice,
    ) -> Result<RemoveLiquidityResult, EngineError> {
        self.atomically("remove_liquidity", |engine| {
            let price = engine.prepare(signed)?;

            let total_shares = engine.ledgers.shares.total_supply();
            if total_shares.is_zero() {
                return Err(PoolError::NoShares.into());
            }
            if !shares.is_positive() {
                return Err(PoolError::NonPositiveAmount {
                    what: "shares",
                    amount: shares,
                }
                .into());
            }
            let held = engine.ledgers.shares.balance_of(provider);
            if held < shares {
                return Err(PoolError::InsufficientShares {
                    owner: provider,
                    held,
                    requested: shares,
                }
                .into());
            }

            let liquidity = engine.ledgers.pool.liquidity();
            let value = shares.checked_mul_div(liquidity, total_shares)?;
            let redemption_fee = if shares < total_shares {
                value.checked_mul(engine.params.redemption_fee_ratio)?
            } else {
                Fixed::ZERO
            };
            let amount = value
                .checked_sub(redemption_fee)?
                .round_to_native(engine.collateral_decimals());

            // an underwater pool has nothing to pay out, even to the last provider
            let remaining = liquidity.checked_sub(amount)?;
            if amount.is_negative() || remaining.is_negative() {
                return Err(PoolError::NegativeLiquidity(remaining.min(liquidity)).into());
            }
            engine.ledgers.pool.liquidity = remaining;

            let pool = &engine.ledgers.pool;
            check_pool(
                pool.liquidity(),
                pool.traders_net_volume(),
                pool.traders_net_cost(),
                price,
                engine.params.multiplier,
                engine.params.min_pool_margin_ratio,
            )?;

            let pool_address = engine.pool_address();
            engine.ledgers.shares.burn(pool_address, provider, shares)?;
            if amount.is_positive() {
                engine.push_collateral(provider, amount)?;
            }

            engine.pending.push(EventPayload::LiquidityRemoved(LiquidityRemovedEvent {
                provider,
                shares,
                amount,
                redemption_fee,
                liquidity: engine.ledgers.pool.liquidity(),
                total_shares: engine.ledgers.shares.total_supply(),
            }));

            Ok(RemoveLiquidityResult {
                shares,
                amount,
                redemption_fee,
            })
        })
    }

    pub fn transfer_shares(&mut self, from: Address, to: Address, shares: Fixed) -> Result<(), EngineError> {
        self.atomically("transfer_shares", |engine| {
            engine.ledgers.shares.transfer(from, to, shares)?;
            engine
                .pending
                .push(EventPayload::SharesTransferred(SharesTransferredEvent { from, to, shares }));
            Ok(())
        })
    }

    pub fn approve_shares(&mut self, owner: Address, spender: Address, shares: Fixed) -> Result<(), EngineError> {
        self.atomically("approve_shares", |engine| {
            engine.ledgers.shares.approve(owner, spender, shares)?;
            Ok(())
        })
    }

    pub fn transfer_shares_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        shares: Fixed,
    ) -> Result<(), EngineError> {
        self.atomically("transfer_shares_from", |engine| {
            engine.ledgers.shares.transfer_from(spender, from, to, shares)?;
            engine
                .pending
                .push(EventPayload::SharesTransferred(SharesTransferredEvent { from, to, shares }));
            Ok(())
        })
    }
}
