// 3.0 token.rs: fungible token ledger. backs the collateral token, the stake token and
// the liquidity shares. amounts are native units of the token's own decimals.
// 3.1 allowances: transfer_from spends an approval the owner granted earlier.

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{caller} is not the minter of {symbol}")]
    NotMinter { caller: Address, symbol: String },

    #[error("insufficient {symbol} balance for {owner}: has {available}, needs {requested}")]
    InsufficientBalance {
        symbol: String,
        owner: Address,
        available: u128,
        requested: u128,
    },

    #[error("insufficient {symbol} allowance from {owner} to {spender}: has {available}, needs {requested}")]
    InsufficientAllowance {
        symbol: String,
        owner: Address,
        spender: Address,
        available: u128,
        requested: u128,
    },

    #[error("{symbol} supply overflow")]
    SupplyOverflow { symbol: String },

    #[error("{amount} is not a valid {symbol} amount")]
    InvalidAmount { symbol: String, amount: String },
}

/// Static description of a token, as deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl TokenSpec {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenLedger {
    address: Address,
    spec: TokenSpec,
    minter: Address,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    total_supply: u128,
}

impl TokenLedger {
    pub fn new(address: Address, spec: TokenSpec, minter: Address) -> Self {
        Self {
            address,
            spec,
            minter,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn spec(&self) -> &TokenSpec {
        &self.spec
    }

    pub fn symbol(&self) -> &str {
        &self.spec.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.spec.decimals
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: Address) -> u128 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    /// Holders with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    fn ensure_minter(&self, caller: Address) -> Result<(), TokenError> {
        if caller != self.minter {
            return Err(TokenError::NotMinter {
                caller,
                symbol: self.spec.symbol.clone(),
            });
        }
        Ok(())
    }

    pub fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.ensure_minter(caller)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| TokenError::SupplyOverflow {
                symbol: self.spec.symbol.clone(),
            })?;
        self.credit(to, amount);
        Ok(())
    }

    pub fn burn(&mut self, caller: Address, from: Address, amount: u128) -> Result<(), TokenError> {
        self.ensure_minter(caller)?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    // 3.1: allowance is only spent once the transfer went through
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let available = self.allowance(from, spender);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                symbol: self.spec.symbol.clone(),
                owner: from,
                spender,
                available,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        // unlimited approvals are never decremented
        if available != u128::MAX {
            self.approve(from, spender, available - amount);
        }
        Ok(())
    }

    fn credit(&mut self, to: Address, amount: u128) {
        if amount > 0 {
            *self.balances.entry(to).or_insert(0) += amount;
        }
    }

    fn debit(&mut self, from: Address, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                symbol: self.spec.symbol.clone(),
                owner: from,
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdt() -> TokenLedger {
        TokenLedger::new(
            Address::derive("usdt"),
            TokenSpec::new("Tether USD", "USDT", 6),
            Address::derive("admin"),
        )
    }

    #[test]
    fn only_minter_mints() {
        let mut token = usdt();
        let alice = Address::derive("alice");
        assert!(matches!(
            token.mint(alice, alice, 100),
            Err(TokenError::NotMinter { .. })
        ));
        token.mint(Address::derive("admin"), alice, 100).unwrap();
        assert_eq!(token.balance_of(alice), 100);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn transfer_checks_balance() {
        let mut token = usdt();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        token.mint(Address::derive("admin"), alice, 50).unwrap();

        assert!(token.transfer(alice, bob, 51).is_err());
        token.transfer(alice, bob, 50).unwrap();
        assert_eq!(token.balance_of(alice), 0);
        assert_eq!(token.balance_of(bob), 50);
        assert_eq!(token.holders().count(), 1);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut token = usdt();
        let alice = Address::derive("alice");
        let pool = Address::derive("pool");
        token.mint(Address::derive("admin"), alice, 1_000).unwrap();

        assert!(matches!(
            token.transfer_from(pool, alice, pool, 10),
            Err(TokenError::InsufficientAllowance { .. })
        ));

        token.approve(alice, pool, 300);
        token.transfer_from(pool, alice, pool, 200).unwrap();
        assert_eq!(token.allowance(alice, pool), 100);
        assert_eq!(token.balance_of(pool), 200);
    }

    #[test]
    fn unlimited_allowance_not_decremented() {
        let mut token = usdt();
        let alice = Address::derive("alice");
        let pool = Address::derive("pool");
        token.mint(Address::derive("admin"), alice, 1_000).unwrap();
        token.approve(alice, pool, u128::MAX);
        token.transfer_from(pool, alice, pool, 999).unwrap();
        assert_eq!(token.allowance(alice, pool), u128::MAX);
    }

    #[test]
    fn burn_reduces_supply() {
        let mut token = usdt();
        let admin = Address::derive("admin");
        let alice = Address::derive("alice");
        token.mint(admin, alice, 70).unwrap();
        token.burn(admin, alice, 20).unwrap();
        assert_eq!(token.total_supply(), 50);
        assert!(token.burn(admin, alice, 51).is_err());
    }
}
