//! Liquidation math.
//!
//! A position below the maintenance ratio is closed in full at the oracle price. The
//! liquidator is paid a cut of whatever margin survives the close, clamped to the
//! configured reward band. The pool keeps the rest of the margin and absorbs any
//! shortfall through its liquidity.

use crate::config::PoolParams;
use crate::margin::{position_requirement, MarginRequirement};
use crate::position::{realized_cost, Position};
use crate::types::{Fixed, Overflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationStatus {
    Safe { requirement: MarginRequirement },
    Liquidatable { requirement: MarginRequirement },
}

impl LiquidationStatus {
    pub fn is_liquidatable(&self) -> bool {
        matches!(self, LiquidationStatus::Liquidatable { .. })
    }
}

pub fn evaluate_liquidation(
    position: &Position,
    price: Fixed,
    params: &PoolParams,
) -> Result<LiquidationStatus, Overflow> {
    let requirement = position_requirement(
        position,
        price,
        params.multiplier,
        params.min_maintenance_margin_ratio,
    )?;
    if requirement.is_met() {
        Ok(LiquidationStatus::Safe { requirement })
    } else {
        Ok(LiquidationStatus::Liquidatable { requirement })
    }
}

/// What closing a position at `price` settles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationOutcome {
    // value of the closing trade, -volume * price * multiplier
    pub cur_cost: Fixed,
    pub realized_cost: Fixed,
    // margin left after the close, may be negative
    pub remaining_margin: Fixed,
    pub reward: Fixed,
    // credited to pool liquidity: margin - reward
    pub pool_credit: Fixed,
}

impl LiquidationOutcome {
    /// Margin the position could not cover, borne by liquidity.
    pub fn shortfall(&self) -> Fixed {
        (-self.remaining_margin).max(Fixed::ZERO)
    }
}

pub fn liquidation_reward(
    remaining_margin: Fixed,
    params: &PoolParams,
    collateral_decimals: u32,
) -> Result<Fixed, Overflow> {
    Ok(remaining_margin
        .checked_mul(params.liquidation_cut_ratio)?
        .clamp(params.min_liquidation_reward, params.max_liquidation_reward)
        .round_to_native(collateral_decimals))
}

pub fn settle_liquidation(
    position: &Position,
    price: Fixed,
    params: &PoolParams,
    collateral_decimals: u32,
) -> Result<LiquidationOutcome, Overflow> {
    let cur_cost = (-position.volume).checked_mul3(price, params.multiplier)?;
    let realized = realized_cost(position.volume, position.cost, -position.volume, cur_cost)?;
    let remaining_margin = position.margin.checked_sub(realized)?;
    let reward = liquidation_reward(remaining_margin, params, collateral_decimals)?;

    Ok(LiquidationOutcome {
        cur_cost,
        realized_cost: realized,
        remaining_margin,
        reward,
        pool_credit: position.margin.checked_sub(reward)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use rust_decimal_macros::dec;

    fn underwater_long() -> Position {
        // long 500 opened at 10000 with 99.875 margin left after fee
        Position {
            volume: Fixed::from_int(500),
            cost: Fixed::from_int(500),
            margin: Fixed::from_decimal(dec!(99.875)),
            ..Position::new(Fixed::ZERO, Fixed::ZERO, Timestamp::from_secs(0))
        }
    }

    #[test]
    fn status_flips_when_price_falls() {
        let params = PoolParams::btcusd();
        let pos = underwater_long();
        assert!(!evaluate_liquidation(&pos, Fixed::from_int(10_000), &params).unwrap().is_liquidatable());
        assert!(evaluate_liquidation(&pos, Fixed::from_int(5_000), &params).unwrap().is_liquidatable());
    }

    #[test]
    fn negative_remainder_pays_minimum_reward() {
        let params = PoolParams::btcusd();
        let outcome = settle_liquidation(&underwater_long(), Fixed::from_int(5_000), &params, 6).unwrap();
        assert_eq!(outcome.cur_cost, Fixed::from_int(-250));
        assert_eq!(outcome.realized_cost, Fixed::from_int(250));
        assert_eq!(outcome.remaining_margin, Fixed::from_decimal(dec!(-150.125)));
        assert_eq!(outcome.reward, Fixed::from_int(20));
        assert_eq!(outcome.pool_credit, Fixed::from_decimal(dec!(79.875)));
        assert_eq!(outcome.shortfall(), Fixed::from_decimal(dec!(150.125)));
    }

    #[test]
    fn reward_clamped_to_band() {
        let params = PoolParams::btcusd();
        // 25% of 200 = 50 stays inside [20, 100]
        assert_eq!(liquidation_reward(Fixed::from_int(200), &params, 6), Ok(Fixed::from_int(50)));
        assert_eq!(liquidation_reward(Fixed::from_int(1_000), &params, 6), Ok(Fixed::from_int(100)));
        assert_eq!(liquidation_reward(Fixed::from_int(40), &params, 6), Ok(Fixed::from_int(20)));
    }

    #[test]
    fn reward_rounded_to_collateral_precision() {
        let params = PoolParams::btcusd();
        let remaining = Fixed::from_decimal(dec!(200.0000041));
        // 50.000001025 -> 50.000001 at 6 decimals
        assert_eq!(
            liquidation_reward(remaining, &params, 6),
            Ok(Fixed::from_decimal(dec!(50.000001)))
        );
    }
}
