// 6.1 qualifier.rs: liquidation rights. addresses stake the stake token here and only the
// single largest staker may liquidate. a tie at the top qualifies nobody.
//
// stakes are kept twice: per address, and ranked (amount -> stakers) so the top is a
// last_key_value away.

use crate::token::{TokenError, TokenLedger};
use crate::types::Address;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualifierError {
    #[error("stake amount must be positive")]
    ZeroAmount,

    #[error("{staker} has {staked} staked, cannot withdraw {requested}")]
    InsufficientStake {
        staker: Address,
        staked: u128,
        requested: u128,
    },

    #[error("stake overflow")]
    Overflow,

    #[error("stake token: {0}")]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone)]
pub struct LiquidatorQualifier {
    address: Address,
    controller: Address,
    stake_token: Address,
    stakes: HashMap<Address, u128>,
    ranking: BTreeMap<u128, BTreeSet<Address>>,
    total_staked: u128,
}

impl LiquidatorQualifier {
    pub fn new(address: Address, controller: Address, stake_token: Address) -> Self {
        Self {
            address,
            controller,
            stake_token,
            stakes: HashMap::new(),
            ranking: BTreeMap::new(),
            total_staked: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn controller(&self) -> Address {
        self.controller
    }

    pub fn stake_token(&self) -> Address {
        self.stake_token
    }

    pub fn stake_of(&self, staker: Address) -> u128 {
        self.stakes.get(&staker).copied().unwrap_or(0)
    }

    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn total_stakers(&self) -> usize {
        self.stakes.len()
    }

    /// The unique largest staker, if there is one.
    pub fn top_staker(&self) -> Option<Address> {
        let (_, stakers) = self.ranking.last_key_value()?;
        if stakers.len() == 1 {
            stakers.iter().next().copied()
        } else {
            None
        }
    }

    pub fn is_qualified(&self, staker: Address) -> bool {
        self.top_staker() == Some(staker)
    }

    /// Pulls `amount` stake tokens from `staker` (allowance to this contract required).
    pub fn deposit(
        &mut self,
        stake_token: &mut TokenLedger,
        staker: Address,
        amount: u128,
    ) -> Result<u128, QualifierError> {
        if amount == 0 {
            return Err(QualifierError::ZeroAmount);
        }
        let staked = self.stake_of(staker);
        let new_stake = staked.checked_add(amount).ok_or(QualifierError::Overflow)?;
        let new_total = self.total_staked.checked_add(amount).ok_or(QualifierError::Overflow)?;

        stake_token.transfer_from(self.address, staker, self.address, amount)?;

        self.set_stake(staker, staked, new_stake);
        self.total_staked = new_total;
        Ok(new_stake)
    }

    pub fn withdraw(
        &mut self,
        stake_token: &mut TokenLedger,
        staker: Address,
        amount: u128,
    ) -> Result<u128, QualifierError> {
        if amount == 0 {
            return Err(QualifierError::ZeroAmount);
        }
        let staked = self.stake_of(staker);
        if amount > staked {
            return Err(QualifierError::InsufficientStake {
                staker,
                staked,
                requested: amount,
            });
        }

        stake_token.transfer(self.address, staker, amount)?;

        let new_stake = staked - amount;
        self.set_stake(staker, staked, new_stake);
        self.total_staked -= amount;
        Ok(new_stake)
    }

    fn set_stake(&mut self, staker: Address, old: u128, new: u128) {
        if old > 0 {
            if let Some(stakers) = self.ranking.get_mut(&old) {
                stakers.remove(&staker);
                if stakers.is_empty() {
                    self.ranking.remove(&old);
                }
            }
        }
        if new > 0 {
            self.ranking.entry(new).or_default().insert(staker);
            self.stakes.insert(staker, new);
        } else {
            self.stakes.remove(&staker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenSpec;

    struct Setup {
        token: TokenLedger,
        qualifier: LiquidatorQualifier,
    }

    fn setup(stakers: &[Address]) -> Setup {
        let admin = Address::derive("admin");
        let mut token = TokenLedger::new(Address::derive("stake"), TokenSpec::new("Stake", "STK", 18), admin);
        let qualifier = LiquidatorQualifier::new(Address::derive("qualifier"), admin, token.address());
        for staker in stakers {
            token.mint(admin, *staker, 1_000_000).unwrap();
            token.approve(*staker, qualifier.address(), u128::MAX);
        }
        Setup { token, qualifier }
    }

    #[test]
    fn accessors_after_construction() {
        let s = setup(&[]);
        assert_eq!(s.qualifier.controller(), Address::derive("admin"));
        assert_eq!(s.qualifier.stake_token(), Address::derive("stake"));
        assert_eq!(s.qualifier.total_staked(), 0);
        assert_eq!(s.qualifier.total_stakers(), 0);
    }

    #[test]
    fn top_staker_moves_with_deposits_and_withdrawals() {
        let a1 = Address::derive("account1");
        let a2 = Address::derive("account2");
        let a3 = Address::derive("account3");
        let Setup { mut token, mut qualifier } = setup(&[a1, a2, a3]);

        qualifier.deposit(&mut token, a2, 1_000).unwrap();
        assert!(!qualifier.is_qualified(a1));
        assert!(qualifier.is_qualified(a2));

        qualifier.deposit(&mut token, a3, 2_000).unwrap();
        assert!(!qualifier.is_qualified(a2));
        assert!(qualifier.is_qualified(a3));

        qualifier.withdraw(&mut token, a3, 1_500).unwrap();
        assert!(qualifier.is_qualified(a2));
        assert!(!qualifier.is_qualified(a3));

        assert!(matches!(
            qualifier.withdraw(&mut token, a3, 600),
            Err(QualifierError::InsufficientStake { .. })
        ));
        qualifier.withdraw(&mut token, a3, 500).unwrap();
        assert_eq!(qualifier.total_stakers(), 1);
        assert_eq!(qualifier.total_staked(), 1_000);
        assert_eq!(token.balance_of(a3), 1_000_000);
    }

    #[test]
    fn tie_at_top_qualifies_nobody() {
        let a = Address::derive("a");
        let b = Address::derive("b");
        let Setup { mut token, mut qualifier } = setup(&[a, b]);
        qualifier.deposit(&mut token, a, 500).unwrap();
        qualifier.deposit(&mut token, b, 500).unwrap();
        assert!(!qualifier.is_qualified(a));
        assert!(!qualifier.is_qualified(b));
        assert_eq!(qualifier.top_staker(), None);

        qualifier.deposit(&mut token, b, 1).unwrap();
        assert!(qualifier.is_qualified(b));
    }

    #[test]
    fn zero_and_unapproved_deposits_fail() {
        let a = Address::derive("a");
        let stranger = Address::derive("stranger");
        let Setup { mut token, mut qualifier } = setup(&[a]);
        assert_eq!(qualifier.deposit(&mut token, a, 0), Err(QualifierError::ZeroAmount));
        assert!(matches!(
            qualifier.deposit(&mut token, stranger, 10),
            Err(QualifierError::Token(TokenError::InsufficientAllowance { .. }))
        ));
        assert_eq!(qualifier.total_staked(), 0);
    }
}
