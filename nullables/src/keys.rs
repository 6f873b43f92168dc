//! Seeded key material.

use tcr_crypto::{derive_address, identity_of, keypair_from_seed};
use tcr_types::{Address, IdentityId, KeyPair};

pub fn seeded_keypair(seed: u8) -> KeyPair {
    keypair_from_seed(&[seed; 32])
}

pub fn seeded_address(seed: u8) -> Address {
    derive_address(&seeded_keypair(seed).public)
}

/// A prospective member: the throwaway key that created its identity and
/// the key of the owner it is onboarded to.
pub struct TestActor {
    pub throwaway: KeyPair,
    pub owner: KeyPair,
}

impl TestActor {
    /// Throwaway key from `seed`, owner key from `seed ^ 0x80`.
    pub fn new(seed: u8) -> Self {
        Self {
            throwaway: seeded_keypair(seed),
            owner: seeded_keypair(seed ^ 0x80),
        }
    }

    pub fn identity(&self) -> IdentityId {
        identity_of(&self.throwaway)
    }

    pub fn owner_address(&self) -> Address {
        derive_address(&self.owner.public)
    }
}
