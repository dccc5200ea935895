//! Position ownership: approvals and transfers between addresses.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, PositionLifecycleEvent, PositionTransferredEvent};
use crate::types::Address;

impl Engine {
    /// Approves `operator` to move `owner`'s position, or clears the approval with `None`.
    pub fn approve_position(&mut self, owner: Address, operator: Option<Address>) -> Result<(), EngineError> {
        self.atomically("approve_position", |engine| {
            engine.ledgers.positions.approve(owner, operator)?;
            Ok(())
        })
    }

    /// Moves `from`'s position to `to`. the caller is the owner or its approved operator and
    /// `to` must not hold a live position. an empty one there is burned first.
    pub fn transfer_position(&mut self, caller: Address, from: Address, to: Address) -> Result<(), EngineError> {
        self.atomically("transfer_position", |engine| {
            if engine.ledgers.positions.transfer(caller, from, to)?.is_some() {
                engine
                    .pending
                    .push(EventPayload::PositionBurned(PositionLifecycleEvent { owner: to }));
            }
            engine
                .pending
                .push(EventPayload::PositionTransferred(PositionTransferredEvent {
                    from,
                    to,
                    operator: caller,
                }));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::engine::EngineConfig;
    use crate::oracle::OracleSigner;
    use crate::types::{Fixed, Timestamp};

    fn engine_with_margin(owner: Address) -> Engine {
        let signer = OracleSigner::from_secret(&[5u8; 32]).unwrap();
        let admin = Address::derive("admin");
        let mut engine = Engine::new(
            EngineConfig {
                start_time: Timestamp::from_secs(2_000),
                ..EngineConfig::default()
            },
            PoolConfig::btcusd(admin, signer.address()),
        )
        .unwrap();
        engine.mint_collateral(admin, owner, Fixed::from_int(100)).unwrap();
        engine.approve_collateral(owner, Fixed::from_int(100)).unwrap();
        let at = signer.sign("BTCUSD", engine.time(), Fixed::from_int(10_000));
        engine.deposit_margin(owner, Fixed::from_int(100), &at).unwrap();
        engine
    }

    fn last_kinds(engine: &Engine, count: usize) -> Vec<&'static str> {
        engine.recent_events(count).iter().map(|e| e.payload.kind()).collect()
    }

    #[test]
    fn transfer_onto_empty_position_burns_it() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut engine = engine_with_margin(alice);

        let pool = engine.pool_address();
        let cumulative = engine.ledgers.pool.cumulative_funding_rate();
        let now = engine.time();
        engine
            .ledgers
            .positions
            .mint(pool, bob, Fixed::ZERO, cumulative, now)
            .unwrap();

        engine.transfer_position(alice, alice, bob).unwrap();
        assert_eq!(last_kinds(&engine, 2), ["position_burned", "position_transferred"]);
        assert!(matches!(
            &engine.recent_events(2)[0].payload,
            EventPayload::PositionBurned(PositionLifecycleEvent { owner }) if *owner == bob
        ));
        assert_eq!(engine.position(bob).map(|p| p.margin), Some(Fixed::from_int(100)));
        assert_eq!(engine.position_ledger().total_supply(), 1);
    }

    #[test]
    fn transfer_to_fresh_owner_burns_nothing() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut engine = engine_with_margin(alice);

        engine.transfer_position(alice, alice, bob).unwrap();
        assert_eq!(last_kinds(&engine, 2), ["margin_deposited", "position_transferred"]);
        assert!(engine.position(alice).is_none());
    }
}
