//! Margin checks for positions and for the pool.
//!
//! A position's dynamic margin is its collateral plus unrealized pnl. It must cover a
//! fraction of the position's notional: the initial ratio when a trade adds risk, the
//! maintenance ratio to stay clear of liquidation and to withdraw.
//!
//! The pool's dynamic equity is liquidity plus what traders owe it on their open cost
//! basis. It must cover `min_pool_margin_ratio` of the traders' net notional.

use crate::position::Position;
use crate::types::{Fixed, Overflow};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarginError {
    #[error("initial margin not met: dynamic margin {available}, required {required}")]
    InitialMargin { available: Fixed, required: Fixed },

    #[error("maintenance margin not met: dynamic margin {available}, required {required}")]
    MaintenanceMargin { available: Fixed, required: Fixed },

    #[error("pool margin not met: dynamic equity {available}, required {required}")]
    PoolMargin { available: Fixed, required: Fixed },

    #[error(transparent)]
    Overflow(#[from] Overflow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginRequirement {
    pub dynamic_margin: Fixed,
    pub required: Fixed,
}

impl MarginRequirement {
    pub fn is_met(&self) -> bool {
        self.dynamic_margin >= self.required
    }

    pub fn shortfall(&self) -> Fixed {
        (self.required - self.dynamic_margin).max(Fixed::ZERO)
    }
}

pub fn position_requirement(
    position: &Position,
    price: Fixed,
    multiplier: Fixed,
    ratio: Fixed,
) -> Result<MarginRequirement, Overflow> {
    Ok(MarginRequirement {
        dynamic_margin: position.dynamic_margin(price, multiplier)?,
        required: position.notional(price, multiplier)?.checked_mul(ratio)?,
    })
}

pub fn check_initial(position: &Position, price: Fixed, multiplier: Fixed, ratio: Fixed) -> Result<(), MarginError> {
    let req = position_requirement(position, price, multiplier, ratio)?;
    if !req.is_met() {
        return Err(MarginError::InitialMargin {
            available: req.dynamic_margin,
            required: req.required,
        });
    }
    Ok(())
}

pub fn check_maintenance(position: &Position, price: Fixed, multiplier: Fixed, ratio: Fixed) -> Result<(), MarginError> {
    let req = position_requirement(position, price, multiplier, ratio)?;
    if !req.is_met() {
        return Err(MarginError::MaintenanceMargin {
            available: req.dynamic_margin,
            required: req.required,
        });
    }
    Ok(())
}

/// liquidity + net cost - net volume * price * multiplier.
pub fn pool_dynamic_equity(
    liquidity: Fixed,
    net_volume: Fixed,
    net_cost: Fixed,
    price: Fixed,
    multiplier: Fixed,
) -> Result<Fixed, Overflow> {
    liquidity
        .checked_add(net_cost)?
        .checked_sub(net_volume.checked_mul3(price, multiplier)?)
}

pub fn pool_requirement(
    liquidity: Fixed,
    net_volume: Fixed,
    net_cost: Fixed,
    price: Fixed,
    multiplier: Fixed,
    ratio: Fixed,
) -> Result<MarginRequirement, Overflow> {
    Ok(MarginRequirement {
        dynamic_margin: pool_dynamic_equity(liquidity, net_volume, net_cost, price, multiplier)?,
        required: net_volume.checked_mul3(price, multiplier)?.abs().checked_mul(ratio)?,
    })
}

pub fn check_pool(
    liquidity: Fixed,
    net_volume: Fixed,
    net_cost: Fixed,
    price: Fixed,
    multiplier: Fixed,
    ratio: Fixed,
) -> Result<(), MarginError> {
    let req = pool_requirement(liquidity, net_volume, net_cost, price, multiplier, ratio)?;
    if !req.is_met() {
        return Err(MarginError::PoolMargin {
            available: req.dynamic_margin,
            required: req.required,
        });
    }
    Ok(())
}
