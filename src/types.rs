// 1.0: all the primitives live here. nothing in the engine works without these types.
// fixed-point amounts, addresses, timestamps. each is a newtype so the compiler catches mixups.

use ethnum::I256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

pub const DECIMALS: u32 = 18;

fn pow10(exp: u32) -> I256 {
    I256::new(10).pow(exp)
}

/// Moves `value` from `from` decimals to `to` decimals, truncating toward zero.
pub fn rescale(value: I256, from: u32, to: u32) -> I256 {
    if to >= from {
        value * pow10(to - from)
    } else {
        value / pow10(from - to)
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// A fixed-point result left the 256-bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("fixed-point overflow")]
pub struct Overflow;

// 1.1: signed 18-decimal fixed point. volume, cost, margin, liquidity, prices and ratios all use this.
// 256 bits wide so volume * price * multiplier stays in range for any realistic input.
// anything that touches caller supplied amounts goes through the checked_* forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(I256);

impl Fixed {
    pub const ZERO: Fixed = Fixed(I256::ZERO);
    pub const ONE: Fixed = Fixed(I256::new(1_000_000_000_000_000_000));

    pub const fn from_raw(raw: I256) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> I256 {
        self.0
    }

    pub fn from_int(value: i64) -> Self {
        Self(I256::from(value) * Self::ONE.0)
    }

    /// `numerator / denominator` as a fixed-point value.
    pub fn from_ratio(numerator: i64, denominator: i64) -> Self {
        Self(I256::from(numerator) * Self::ONE.0 / I256::from(denominator))
    }

    /// Digits beyond the 18th decimal are truncated.
    pub fn from_decimal(value: Decimal) -> Self {
        let mantissa = I256::new(value.mantissa());
        let scale = value.scale();
        if scale <= DECIMALS {
            Self(mantissa * pow10(DECIMALS - scale))
        } else {
            Self(mantissa / pow10(scale - DECIMALS))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == I256::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < I256::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > I256::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn signum(&self) -> i32 {
        if self.is_negative() {
            -1
        } else if self.is_positive() {
            1
        } else {
            0
        }
    }

    /// `self * rhs / 1e18`, truncating toward zero.
    pub fn mul(&self, rhs: Fixed) -> Self {
        Self(self.0 * rhs.0 / Self::ONE.0)
    }

    /// `self * 1e18 / rhs`, truncating toward zero. Panics on zero divisor.
    pub fn div(&self, rhs: Fixed) -> Self {
        Self(self.0 * Self::ONE.0 / rhs.0)
    }

    /// `self * a * b / 1e36` with a single truncation. volume * price * multiplier.
    pub fn mul3(&self, a: Fixed, b: Fixed) -> Self {
        Self(self.0 * a.0 * b.0 / (Self::ONE.0 * Self::ONE.0))
    }

    /// `self * n` for an integer count, e.g. elapsed seconds.
    pub fn times(&self, n: u64) -> Self {
        Self(self.0 * I256::from(n))
    }

    /// `self * numerator / denominator` with a single truncation.
    pub fn mul_div(&self, numerator: Fixed, denominator: Fixed) -> Self {
        Self(self.0 * numerator.0 / denominator.0)
    }

    pub fn checked_add(self, rhs: Fixed) -> Result<Self, Overflow> {
        self.0.checked_add(rhs.0).map(Self).ok_or(Overflow)
    }

    pub fn checked_sub(self, rhs: Fixed) -> Result<Self, Overflow> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(Overflow)
    }

    pub fn checked_mul(self, rhs: Fixed) -> Result<Self, Overflow> {
        self.0
            .checked_mul(rhs.0)
            .map(|product| Self(product / Self::ONE.0))
            .ok_or(Overflow)
    }

    pub fn checked_mul3(self, a: Fixed, b: Fixed) -> Result<Self, Overflow> {
        self.0
            .checked_mul(a.0)
            .and_then(|product| product.checked_mul(b.0))
            .map(|product| Self(product / (Self::ONE.0 * Self::ONE.0)))
            .ok_or(Overflow)
    }

    pub fn checked_times(self, n: u64) -> Result<Self, Overflow> {
        self.0.checked_mul(I256::from(n)).map(Self).ok_or(Overflow)
    }

    /// A zero denominator is reported as overflow too.
    pub fn checked_mul_div(self, numerator: Fixed, denominator: Fixed) -> Result<Self, Overflow> {
        self.0
            .checked_mul(numerator.0)
            .and_then(|product| product.checked_div(denominator.0))
            .map(Self)
            .ok_or(Overflow)
    }

    pub fn min(self, other: Fixed) -> Self {
        if self <= other { self } else { other }
    }

    pub fn max(self, other: Fixed) -> Self {
        if self >= other { self } else { other }
    }

    pub fn clamp(self, low: Fixed, high: Fixed) -> Self {
        self.max(low).min(high)
    }

    // 1.2: collateral boundary. native units of a token with `decimals` decimals.
    pub fn to_native(&self, decimals: u32) -> I256 {
        rescale(self.0, DECIMALS, decimals)
    }

    pub fn from_native(units: I256, decimals: u32) -> Self {
        Self(rescale(units, decimals, DECIMALS))
    }

    /// Down to native precision and back up. sub-unit remainder is lost.
    pub fn round_to_native(&self, decimals: u32) -> Self {
        Self::from_native(self.to_native(decimals), decimals)
    }

    /// Native units as an unsigned token amount. None when negative or wider than u128.
    pub fn to_token_units(&self, decimals: u32) -> Option<u128> {
        let native = self.to_native(decimals);
        if native < I256::ZERO || native > I256::from(u128::MAX) {
            None
        } else {
            Some(native.as_u128())
        }
    }

    pub fn from_token_units(units: u128, decimals: u32) -> Self {
        Self::from_native(I256::from(units), decimals)
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Fixed::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Fixed> for Fixed {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Fixed::ZERO, |acc, x| acc + *x)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::ONE.0;
        let frac = (abs % Self::ONE.0).to_string();
        let frac = format!("{:0>18}", frac);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{}{}", sign, whole)
        } else {
            write!(f, "{}{}.{}", sign, whole, frac)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fixed-point literal: {0}")]
pub struct ParseFixedError(String);

impl FromStr for Fixed {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Fixed::from_decimal)
            .map_err(|_| ParseFixedError(s.to_string()))
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// 1.3: 20-byte account address. owners, ledgers, the pool and the oracle signer are all addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Deterministic address from a label: the last 20 bytes of keccak256(label).
    pub fn derive(label: &str) -> Self {
        Self::from_hash(&keccak256(label.as_bytes()))
    }

    pub fn from_hash(hash: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| ParseAddressError(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// 1.4: unix timestamp in seconds. the host clock and oracle timestamps share this unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `earlier` to `self`, zero if `earlier` is later.
    pub fn seconds_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn distance(&self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Saturates at the end of time instead of wrapping.
    pub fn plus(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
