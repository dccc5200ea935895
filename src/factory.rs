// 9.1 factory.rs: clone factory. deploys independent copies of a pool template and remembers
// the most recent one, which is how a deployer finds the pool it just created.

use crate::pool::PerpetualPool;
use crate::types::{keccak256, Address};

#[derive(Debug, Clone)]
pub struct CloneFactory {
    address: Address,
    nonce: u64,
    cloned: Option<Address>,
}

impl CloneFactory {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            nonce: 0,
            cloned: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Copies of templates made so far.
    pub fn clones_made(&self) -> u64 {
        self.nonce
    }

    fn next_address(&mut self) -> Address {
        let mut seed = Vec::with_capacity(28);
        seed.extend_from_slice(&self.address.0);
        seed.extend_from_slice(&self.nonce.to_be_bytes());
        self.nonce += 1;
        Address::from_hash(&keccak256(&seed))
    }

    pub fn clone_template(&mut self, template: &PerpetualPool) -> PerpetualPool {
        let address = self.next_address();
        self.cloned = Some(address);
        tracing::debug!(template = %template.address(), clone = %address, "cloned pool template");
        template.clone_to(address)
    }

    /// Address of the most recent clone.
    pub fn cloned(&self) -> Option<Address> {
        self.cloned
    }
}
