//! Liquidator staking.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, StakeEvent};
use crate::types::Address;

impl Engine {
    /// Stakes `amount` native stake-token units from `staker`. needs an allowance to the
    /// qualifier. returns the new stake.
    pub fn stake(&mut self, staker: Address, amount: u128) -> Result<u128, EngineError> {
        self.atomically("stake", |engine| {
            let ledgers = &mut engine.ledgers;
            let stake = ledgers.qualifier.deposit(&mut ledgers.stake, staker, amount)?;
            let qualified = ledgers.qualifier.is_qualified(staker);
            engine.pending.push(EventPayload::Staked(StakeEvent {
                staker,
                amount,
                stake,
                qualified,
            }));
            Ok(stake)
        })
    }

    pub fn unstake(&mut self, staker: Address, amount: u128) -> Result<u128, EngineError> {
        self.atomically("unstake", |engine| {
            let ledgers = &mut engine.ledgers;
            let stake = ledgers.qualifier.withdraw(&mut ledgers.stake, staker, amount)?;
            let qualified = ledgers.qualifier.is_qualified(staker);
            engine.pending.push(EventPayload::Unstaked(StakeEvent {
                staker,
                amount,
                stake,
                qualified,
            }));
            Ok(stake)
        })
    }
}
