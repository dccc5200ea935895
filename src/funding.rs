// 5.0: funding. a global cumulative index moves with the traders' net exposure; each position
// pays volume * (index now - index at its checkpoint) when it is next touched.
// 5.0 has the state and the model trait. 5.1 has the accrual step.

use crate::config::PoolParams;
use crate::types::{Fixed, Overflow, Timestamp};
use serde::{Deserialize, Serialize};

/// How much the cumulative index moves over `elapsed` seconds.
pub trait FundingModel: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn accrual(&self, net_volume: Fixed, price: Fixed, params: &PoolParams, elapsed: u64) -> Result<Fixed, Overflow>;
}

/// net_volume * price * multiplier * coefficient * elapsed, truncating after each product.
/// traders net long raise the index so longs pay; net short lowers it so shorts pay.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearFunding;

impl FundingModel for LinearFunding {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn accrual(&self, net_volume: Fixed, price: Fixed, params: &PoolParams, elapsed: u64) -> Result<Fixed, Overflow> {
        net_volume
            .checked_mul(price)?
            .checked_mul(params.multiplier)?
            .checked_mul(params.funding_rate_coefficient)?
            .checked_times(elapsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundingState {
    pub cumulative_funding_rate: Fixed,
    pub last_update: Timestamp,
}

impl FundingState {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            cumulative_funding_rate: Fixed::ZERO,
            last_update: timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingAccrual {
    pub elapsed: u64,
    pub delta: Fixed,
    pub cumulative_funding_rate: Fixed,
}

// 5.1: one accrual step. the checkpoint moves to `now` even when nothing accrued,
// and a clock that went backwards accrues nothing. on overflow the state is left as it was.
pub fn accrue(
    state: &mut FundingState,
    model: &dyn FundingModel,
    net_volume: Fixed,
    price: Fixed,
    params: &PoolParams,
    now: Timestamp,
) -> Result<FundingAccrual, Overflow> {
    let elapsed = now.seconds_since(state.last_update);
    let delta = if elapsed == 0 || net_volume.is_zero() {
        Fixed::ZERO
    } else {
        model.accrual(net_volume, price, params, elapsed)?
    };

    state.cumulative_funding_rate = state.cumulative_funding_rate.checked_add(delta)?;
    state.last_update = now;

    Ok(FundingAccrual {
        elapsed,
        delta,
        cumulative_funding_rate: state.cumulative_funding_rate,
    })
}
