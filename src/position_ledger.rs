// 4.5 position_ledger.rs: at most one position per owner. the pool is the only controller
// allowed to mint, update or burn. owners (or an approved operator) may move a position.
//
// storage is an arena: owner -> slot index into a dense Vec, vacated slots are reused.

use crate::position::Position;
use crate::types::{Address, Fixed, Timestamp};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionLedgerError {
    #[error("{0} is not the position ledger controller")]
    NotController(Address),

    #[error("{0} already holds a position")]
    AlreadyExists(Address),

    #[error("{0} holds no position")]
    NotFound(Address),

    #[error("position of {0} is not empty")]
    NotEmpty(Address),

    #[error("{caller} may not move the position of {owner}")]
    NotOwnerOrOperator { caller: Address, owner: Address },

    #[error("{0} already holds a non-empty position")]
    DestinationOccupied(Address),
}

#[derive(Debug, Clone)]
enum PositionSlot {
    Vacant,
    Occupied { owner: Address, position: Position },
}

#[derive(Debug, Clone)]
pub struct PositionLedger {
    address: Address,
    controller: Address,
    index: HashMap<Address, usize>,
    slots: Vec<PositionSlot>,
    free: Vec<usize>,
    approvals: HashMap<Address, Address>,
    total_minted: u64,
}

impl PositionLedger {
    pub fn new(address: Address, controller: Address) -> Self {
        Self {
            address,
            controller,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            approvals: HashMap::new(),
            total_minted: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn controller(&self) -> Address {
        self.controller
    }

    pub fn exists(&self, owner: Address) -> bool {
        self.index.contains_key(&owner)
    }

    pub fn get(&self, owner: Address) -> Option<&Position> {
        let slot = *self.index.get(&owner)?;
        match &self.slots[slot] {
            PositionSlot::Occupied { position, .. } => Some(position),
            PositionSlot::Vacant => None,
        }
    }

    /// Live positions.
    pub fn total_supply(&self) -> usize {
        self.index.len()
    }

    /// Positions ever minted, burned ones included.
    pub fn total_minted(&self) -> u64 {
        self.total_minted
    }

    pub fn iter(&self) -> impl Iterator<Item = (Address, &Position)> {
        self.slots.iter().filter_map(|slot| match slot {
            PositionSlot::Occupied { owner, position } => Some((*owner, position)),
            PositionSlot::Vacant => None,
        })
    }

    pub fn approved(&self, owner: Address) -> Option<Address> {
        self.approvals.get(&owner).copied()
    }

    fn ensure_controller(&self, caller: Address) -> Result<(), PositionLedgerError> {
        if caller != self.controller {
            return Err(PositionLedgerError::NotController(caller));
        }
        Ok(())
    }

    fn occupy(&mut self, owner: Address, position: Position) {
        let slot = PositionSlot::Occupied { owner, position };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.index.insert(owner, idx);
    }

    fn vacate(&mut self, owner: Address) -> Option<Position> {
        let idx = self.index.remove(&owner)?;
        let slot = std::mem::replace(&mut self.slots[idx], PositionSlot::Vacant);
        self.free.push(idx);
        self.approvals.remove(&owner);
        match slot {
            PositionSlot::Occupied { position, .. } => Some(position),
            PositionSlot::Vacant => None,
        }
    }

    pub fn mint(
        &mut self,
        caller: Address,
        owner: Address,
        margin: Fixed,
        cumulative_funding_rate: Fixed,
        now: Timestamp,
    ) -> Result<(), PositionLedgerError> {
        self.ensure_controller(caller)?;
        if self.exists(owner) {
            return Err(PositionLedgerError::AlreadyExists(owner));
        }
        self.occupy(owner, Position::new(margin, cumulative_funding_rate, now));
        self.total_minted += 1;
        Ok(())
    }

    pub fn update(
        &mut self,
        caller: Address,
        owner: Address,
        position: Position,
    ) -> Result<(), PositionLedgerError> {
        self.ensure_controller(caller)?;
        let idx = *self
            .index
            .get(&owner)
            .ok_or(PositionLedgerError::NotFound(owner))?;
        self.slots[idx] = PositionSlot::Occupied { owner, position };
        Ok(())
    }

    pub fn burn(&mut self, caller: Address, owner: Address) -> Result<Position, PositionLedgerError> {
        self.ensure_controller(caller)?;
        let position = self.get(owner).ok_or(PositionLedgerError::NotFound(owner))?;
        if !position.is_empty() {
            return Err(PositionLedgerError::NotEmpty(owner));
        }
        self.vacate(owner).ok_or(PositionLedgerError::NotFound(owner))
    }

    pub fn approve(&mut self, owner: Address, operator: Option<Address>) -> Result<(), PositionLedgerError> {
        if !self.exists(owner) {
            return Err(PositionLedgerError::NotFound(owner));
        }
        match operator {
            Some(operator) => self.approvals.insert(owner, operator),
            None => self.approvals.remove(&owner),
        };
        Ok(())
    }

    // 4.6: moving a position. an empty position at the destination is erased first and
    // handed back, a live one blocks the move. the approval does not travel with the position.
    pub fn transfer(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
    ) -> Result<Option<Position>, PositionLedgerError> {
        if !self.exists(from) {
            return Err(PositionLedgerError::NotFound(from));
        }
        if caller != from && self.approved(from) != Some(caller) {
            return Err(PositionLedgerError::NotOwnerOrOperator { caller, owner: from });
        }
        if from == to {
            self.approvals.remove(&from);
            return Ok(None);
        }

        let erased = match self.get(to) {
            Some(existing) if !existing.is_empty() => {
                return Err(PositionLedgerError::DestinationOccupied(to));
            }
            Some(_) => self.vacate(to),
            None => None,
        };

        let position = self.vacate(from).ok_or(PositionLedgerError::NotFound(from))?;
        self.occupy(to, position);
        Ok(erased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Address {
        Address::derive("pool")
    }

    fn ledger() -> PositionLedger {
        PositionLedger::new(Address::derive("ptoken"), pool())
    }

    fn mint(ledger: &mut PositionLedger, owner: Address, margin: i64) {
        ledger
            .mint(pool(), owner, Fixed::from_int(margin), Fixed::ZERO, Timestamp::from_secs(1))
            .unwrap();
    }

    #[test]
    fn mint_is_controller_only_and_unique() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");

        assert_eq!(
            ledger.mint(alice, alice, Fixed::ONE, Fixed::ZERO, Timestamp::from_secs(1)),
            Err(PositionLedgerError::NotController(alice))
        );

        mint(&mut ledger, alice, 100);
        assert!(ledger.exists(alice));
        assert_eq!(ledger.get(alice).unwrap().margin, Fixed::from_int(100));
        assert_eq!(
            ledger.mint(pool(), alice, Fixed::ONE, Fixed::ZERO, Timestamp::from_secs(1)),
            Err(PositionLedgerError::AlreadyExists(alice))
        );
    }

    #[test]
    fn update_requires_existing() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let pos = Position::new(Fixed::ONE, Fixed::ZERO, Timestamp::from_secs(2));
        assert_eq!(
            ledger.update(pool(), alice, pos),
            Err(PositionLedgerError::NotFound(alice))
        );

        mint(&mut ledger, alice, 1);
        let mut pos = *ledger.get(alice).unwrap();
        pos.volume = Fixed::from_int(5);
        ledger.update(pool(), alice, pos).unwrap();
        assert_eq!(ledger.get(alice).unwrap().volume, Fixed::from_int(5));
    }

    #[test]
    fn burn_only_empty_and_slot_reused() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        mint(&mut ledger, alice, 10);

        assert_eq!(ledger.burn(pool(), alice), Err(PositionLedgerError::NotEmpty(alice)));

        let mut pos = *ledger.get(alice).unwrap();
        pos.margin = Fixed::ZERO;
        ledger.update(pool(), alice, pos).unwrap();
        ledger.burn(pool(), alice).unwrap();
        assert!(!ledger.exists(alice));
        assert_eq!(ledger.total_supply(), 0);

        mint(&mut ledger, bob, 5);
        assert_eq!(ledger.slots.len(), 1);
        assert_eq!(ledger.total_minted(), 2);
    }

    #[test]
    fn transfer_by_owner_or_operator() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let carol = Address::derive("carol");
        mint(&mut ledger, alice, 10);

        assert!(matches!(
            ledger.transfer(carol, alice, bob),
            Err(PositionLedgerError::NotOwnerOrOperator { .. })
        ));

        ledger.approve(alice, Some(carol)).unwrap();
        assert_eq!(ledger.transfer(carol, alice, bob), Ok(None));
        assert!(!ledger.exists(alice));
        assert_eq!(ledger.get(bob).unwrap().margin, Fixed::from_int(10));
        assert_eq!(ledger.approved(bob), None);
    }

    #[test]
    fn transfer_onto_live_position_fails() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        mint(&mut ledger, alice, 10);
        mint(&mut ledger, bob, 1);
        assert_eq!(
            ledger.transfer(alice, alice, bob),
            Err(PositionLedgerError::DestinationOccupied(bob))
        );
    }

    #[test]
    fn transfer_erases_empty_destination() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        mint(&mut ledger, alice, 10);
        mint(&mut ledger, bob, 0);

        let erased = ledger.transfer(alice, alice, bob).unwrap();
        assert_eq!(erased.map(|p| p.margin), Some(Fixed::ZERO));
        assert_eq!(ledger.total_supply(), 1);
        assert_eq!(ledger.get(bob).unwrap().margin, Fixed::from_int(10));
        assert_eq!(ledger.iter().count(), 1);
    }
}
