// 4.0: one position per trader. volume is signed (long > 0), cost is the signed entry
// value still carried, margin is the collateral parked against it.
// 4.1 has the cost basis algorithm for a trade at the bottom.

use crate::types::{Fixed, Overflow, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub volume: Fixed,
    pub cost: Fixed,
    pub last_cumulative_funding_rate: Fixed,
    pub margin: Fixed,
    pub last_update: Timestamp,
}

impl Position {
    pub fn new(margin: Fixed, cumulative_funding_rate: Fixed, timestamp: Timestamp) -> Self {
        Self {
            volume: Fixed::ZERO,
            cost: Fixed::ZERO,
            last_cumulative_funding_rate: cumulative_funding_rate,
            margin,
            last_update: timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.volume.is_zero() && self.margin.is_zero()
    }

    /// Funding this position owes since its last checkpoint. negative means it is owed.
    pub fn funding_owed(&self, cumulative_funding_rate: Fixed) -> Result<Fixed, Overflow> {
        self.volume
            .checked_mul(cumulative_funding_rate.checked_sub(self.last_cumulative_funding_rate)?)
    }

    // 4.2: signed mark value. volume * price * multiplier
    pub fn value(&self, price: Fixed, multiplier: Fixed) -> Result<Fixed, Overflow> {
        self.volume.checked_mul3(price, multiplier)
    }

    pub fn notional(&self, price: Fixed, multiplier: Fixed) -> Result<Fixed, Overflow> {
        Ok(self.value(price, multiplier)?.abs())
    }

    /// margin + mark value - cost. what the trader would walk away with.
    pub fn dynamic_margin(&self, price: Fixed, multiplier: Fixed) -> Result<Fixed, Overflow> {
        self.margin
            .checked_add(self.value(price, multiplier)?)?
            .checked_sub(self.cost)
    }
}

/// The three amounts a trade produces before funding is folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeCost {
    pub cur_cost: Fixed,
    pub fee: Fixed,
    pub realized_cost: Fixed,
}

impl TradeCost {
    /// Cost added to the carried cost basis.
    pub fn cost_delta(&self) -> Result<Fixed, Overflow> {
        self.cur_cost.checked_sub(self.realized_cost)
    }
}

// 4.3: realized part of the carried cost when a trade reduces or flips the position.
//   same direction or flat: nothing realized.
//   full close or flip: the whole carried cost plus the share of cur_cost that closed it.
//   partial close: the closed share of the carried cost plus all of cur_cost.
pub fn realized_cost(volume: Fixed, cost: Fixed, delta: Fixed, cur_cost: Fixed) -> Result<Fixed, Overflow> {
    let same_direction = (!volume.is_negative() && !delta.is_negative())
        || (!volume.is_positive() && !delta.is_positive());
    if same_direction {
        return Ok(Fixed::ZERO);
    }

    if volume.abs() <= delta.abs() {
        cur_cost.checked_mul_div(volume.abs(), delta.abs())?.checked_add(cost)
    } else {
        cost.checked_mul_div(delta.abs(), volume.abs())?.checked_add(cur_cost)
    }
}

// 4.4: the full cost basis step for `delta` at `price`
pub fn trade_cost(
    position: &Position,
    delta: Fixed,
    price: Fixed,
    multiplier: Fixed,
    fee_ratio: Fixed,
) -> Result<TradeCost, Overflow> {
    let cur_cost = delta.checked_mul3(price, multiplier)?;
    let fee = cur_cost.abs().checked_mul(fee_ratio)?;
    let realized_cost = realized_cost(position.volume, position.cost, delta, cur_cost)?;
    Ok(TradeCost {
        cur_cost,
        fee,
        realized_cost,
    })
}

/// New volume is open and either flipped side or grew.
pub fn increases_risk(old_volume: Fixed, new_volume: Fixed) -> bool {
    !new_volume.is_zero()
        && (new_volume.signum() != old_volume.signum() || new_volume.abs() > old_volume.abs())
}

/// Net exposure the pool carries grew in magnitude.
pub fn increases_exposure(old_net_volume: Fixed, new_net_volume: Fixed) -> bool {
    new_net_volume.abs() > old_net_volume.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiplier() -> Fixed {
        Fixed::from_ratio(1, 10_000)
    }

    fn fee_ratio() -> Fixed {
        Fixed::from_ratio(5, 20_000)
    }

    fn long(volume: i64, cost: i64) -> Position {
        Position {
            volume: Fixed::from_int(volume),
            cost: Fixed::from_int(cost),
            ..Position::new(Fixed::from_int(1_000), Fixed::ZERO, Timestamp::from_secs(0))
        }
    }

    #[test]
    fn opening_realizes_nothing() {
        let flat = Position::new(Fixed::from_int(1_000), Fixed::ZERO, Timestamp::from_secs(0));
        let tc = trade_cost(&flat, Fixed::from_int(111), Fixed::from_int(10_000), multiplier(), fee_ratio()).unwrap();
        assert_eq!(tc.cur_cost, Fixed::from_int(111));
        assert_eq!(tc.fee, Fixed::from_decimal(rust_decimal_macros::dec!(0.02775)));
        assert_eq!(tc.realized_cost, Fixed::ZERO);
        assert_eq!(tc.cost_delta().unwrap(), Fixed::from_int(111));
    }

    #[test]
    fn partial_close_realizes_share_of_cost() {
        // long 111 with cost 111, sell 100 at 12000
        let pos = long(111, 111);
        let tc = trade_cost(&pos, Fixed::from_int(-100), Fixed::from_int(12_000), multiplier(), fee_ratio()).unwrap();
        assert_eq!(tc.cur_cost, Fixed::from_int(-120));
        // 111 * 100 / 111 + (-120)
        assert_eq!(tc.realized_cost, Fixed::from_int(-20));
        // carried cost falls to the remaining 11 lots
        assert_eq!(pos.cost + tc.cost_delta().unwrap(), Fixed::from_int(11));
    }

    #[test]
    fn flip_realizes_whole_cost() {
        let pos = long(11, 11);
        let tc = trade_cost(&pos, Fixed::from_int(-33), Fixed::from_int(12_000), multiplier(), fee_ratio()).unwrap();
        let cur = Fixed::from_decimal(rust_decimal_macros::dec!(-39.6));
        assert_eq!(tc.cur_cost, cur);
        // -39.6 * 11 / 33 + 11
        assert_eq!(tc.realized_cost, Fixed::from_decimal(rust_decimal_macros::dec!(-2.2)));
        // what is left is the opened short of 22
        assert_eq!(pos.cost + tc.cost_delta().unwrap(), Fixed::from_decimal(rust_decimal_macros::dec!(-26.4)));
    }

    #[test]
    fn full_close_realizes_cur_plus_cost() {
        let pos = long(500, 500);
        let cur = Fixed::from_int(-250);
        assert_eq!(
            realized_cost(pos.volume, pos.cost, -pos.volume, cur),
            Ok(Fixed::from_int(250))
        );
    }

    #[test]
    fn funding_owed_follows_volume_sign() {
        let mut pos = long(10, 10);
        pos.last_cumulative_funding_rate = Fixed::from_int(1);
        assert_eq!(pos.funding_owed(Fixed::from_int(3)), Ok(Fixed::from_int(20)));

        pos.volume = Fixed::from_int(-10);
        assert_eq!(pos.funding_owed(Fixed::from_int(3)), Ok(Fixed::from_int(-20)));
    }

    #[test]
    fn dynamic_margin_marks_to_price() {
        let pos = long(500, 500);
        // 1000 + 500 * 5000 * 1e-4 - 500
        assert_eq!(
            pos.dynamic_margin(Fixed::from_int(5_000), multiplier()),
            Ok(Fixed::from_int(750))
        );
    }

    #[test]
    fn oversized_trade_is_an_overflow() {
        let flat = Position::new(Fixed::from_int(1_000), Fixed::ZERO, Timestamp::from_secs(0));
        let lots: Fixed = "70000000000000000000000000000".parse().unwrap();
        assert_eq!(
            trade_cost(&flat, lots, Fixed::from_int(10_000), multiplier(), fee_ratio()),
            Err(Overflow)
        );

        let mut pos = long(10, 10);
        pos.volume = lots;
        assert_eq!(pos.funding_owed(lots), Err(Overflow));
        assert_eq!(pos.dynamic_margin(Fixed::from_int(10_000), multiplier()), Err(Overflow));
    }

    #[test]
    fn risk_and_exposure_increase() {
        let v = Fixed::from_int;
        assert!(increases_risk(v(0), v(5)));
        assert!(increases_risk(v(5), v(6)));
        assert!(increases_risk(v(5), v(-1)));
        assert!(!increases_risk(v(5), v(3)));
        assert!(!increases_risk(v(5), v(0)));
        assert!(!increases_risk(v(-5), v(-5)));

        assert!(increases_exposure(v(-3), v(4)));
        assert!(!increases_exposure(v(-3), v(2)));
    }

    #[test]
    fn empty_means_no_volume_and_no_margin() {
        let mut pos = Position::new(Fixed::ZERO, Fixed::ZERO, Timestamp::from_secs(0));
        assert!(pos.is_empty());
        pos.cost = Fixed::from_int(1);
        assert!(pos.is_empty());
        pos.margin = Fixed::from_int(1);
        assert!(!pos.is_empty());
    }
}
