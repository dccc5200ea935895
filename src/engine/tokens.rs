//! Token plumbing around the pool: minting and allowances for the collateral and stake tokens.
//! the admin is the only minter of both.

use super::core::Engine;
use super::results::EngineError;
use crate::pool::PoolError;
use crate::types::{Address, Fixed};

impl Engine {
    /// Mints `amount` collateral (18-decimal value, truncated to native units) to `to`.
    pub fn mint_collateral(&mut self, caller: Address, to: Address, amount: Fixed) -> Result<(), EngineError> {
        self.atomically("mint_collateral", |engine| {
            let units = amount
                .to_token_units(engine.collateral_decimals())
                .ok_or(PoolError::UnrepresentableAmount { what: "mint", amount })?;
            engine.ledgers.collateral.mint(caller, to, units)?;
            Ok(())
        })
    }

    /// Lets the pool pull up to `amount` collateral from `owner`.
    pub fn approve_collateral(&mut self, owner: Address, amount: Fixed) -> Result<(), EngineError> {
        self.atomically("approve_collateral", |engine| {
            let units = amount
                .to_token_units(engine.collateral_decimals())
                .ok_or(PoolError::UnrepresentableAmount { what: "allowance", amount })?;
            let pool = engine.pool_address();
            engine.ledgers.collateral.approve(owner, pool, units);
            Ok(())
        })
    }

    pub fn mint_stake(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), EngineError> {
        self.atomically("mint_stake", |engine| {
            engine.ledgers.stake.mint(caller, to, amount)?;
            Ok(())
        })
    }

    /// Lets the qualifier pull up to `amount` stake-token units from `owner`.
    pub fn approve_stake(&mut self, owner: Address, amount: u128) -> Result<(), EngineError> {
        self.atomically("approve_stake", |engine| {
            let qualifier = engine.ledgers.qualifier.address();
            engine.ledgers.stake.approve(owner, qualifier, amount);
            Ok(())
        })
    }
}
