// 9.3 liquidity_ledger.rs: LP shares. a plain 18-decimal token whose only minter is the pool.
// holders may transfer and approve freely, the pool mints on add and burns on remove.

use crate::token::{TokenError, TokenLedger, TokenSpec};
use crate::types::{Address, Fixed, DECIMALS};

#[derive(Debug, Clone)]
pub struct LiquidityLedger {
    token: TokenLedger,
}

impl LiquidityLedger {
    pub fn new(address: Address, name: impl Into<String>, symbol: impl Into<String>, controller: Address) -> Self {
        Self {
            token: TokenLedger::new(address, TokenSpec::new(name, symbol, DECIMALS), controller),
        }
    }

    pub fn address(&self) -> Address {
        self.token.address()
    }

    pub fn controller(&self) -> Address {
        self.token.minter()
    }

    pub fn symbol(&self) -> &str {
        self.token.symbol()
    }

    fn units(&self, shares: Fixed) -> Result<u128, TokenError> {
        shares
            .to_token_units(DECIMALS)
            .ok_or_else(|| TokenError::InvalidAmount {
                symbol: self.token.symbol().to_string(),
                amount: shares.to_string(),
            })
    }

    pub fn balance_of(&self, owner: Address) -> Fixed {
        Fixed::from_token_units(self.token.balance_of(owner), DECIMALS)
    }

    pub fn total_supply(&self) -> Fixed {
        Fixed::from_token_units(self.token.total_supply(), DECIMALS)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Fixed {
        Fixed::from_token_units(self.token.allowance(owner, spender), DECIMALS)
    }

    pub fn holders(&self) -> impl Iterator<Item = (Address, Fixed)> + '_ {
        self.token
            .holders()
            .map(|(owner, units)| (*owner, Fixed::from_token_units(*units, DECIMALS)))
    }

    pub fn mint(&mut self, caller: Address, to: Address, shares: Fixed) -> Result<(), TokenError> {
        let units = self.units(shares)?;
        self.token.mint(caller, to, units)
    }

    pub fn burn(&mut self, caller: Address, from: Address, shares: Fixed) -> Result<(), TokenError> {
        let units = self.units(shares)?;
        self.token.burn(caller, from, units)
    }

    pub fn transfer(&mut self, from: Address, to: Address, shares: Fixed) -> Result<(), TokenError> {
        let units = self.units(shares)?;
        self.token.transfer(from, to, units)
    }

    pub fn approve(&mut self, owner: Address, spender: Address, shares: Fixed) -> Result<(), TokenError> {
        let units = self.units(shares)?;
        self.token.approve(owner, spender, units);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        shares: Fixed,
    ) -> Result<(), TokenError> {
        let units = self.units(shares)?;
        self.token.transfer_from(spender, from, to, units)
    }
}
