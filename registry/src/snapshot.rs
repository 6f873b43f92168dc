//! Bincode snapshots of a whole engine.

use crate::challenge::Challenge;
use crate::engine::CurationEngine;
use crate::error::RegistryError;
use crate::voting::VoteRecord;
use serde::{Deserialize, Serialize};
use tcr_identity::IdentityDirectory;
use tcr_store::{Member, MemoryMembershipStore, MemoryStakeVault};
use tcr_token::TokenLedger;
use tcr_types::{Address, RegistryConfig, TokenAmount};

/// Everything needed to rebuild an engine, including who owns its stores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub address: Address,
    pub admin: Address,
    pub config: RegistryConfig,
    pub directory: IdentityDirectory,
    pub ledger: TokenLedger,
    pub membership_owner: Address,
    pub members: Vec<Member>,
    pub vault_address: Address,
    pub vault_owner: Address,
    pub vault_balance: TokenAmount,
    pub challenges: Vec<Challenge>,
    pub votes: Vec<VoteRecord>,
    pub next_challenge_id: u64,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        bincode::serialize(self).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        bincode::deserialize(bytes).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }
}

impl CurationEngine {
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            address: self.address.clone(),
            admin: self.admin.clone(),
            config: self.config.clone(),
            directory: self.directory.clone(),
            ledger: self.ledger.clone(),
            membership_owner: self.membership.owner().clone(),
            members: self.membership.members(),
            vault_address: self.vault.address().clone(),
            vault_owner: self.vault.owner().clone(),
            vault_balance: self.vault.balance(),
            challenges: self.challenges.values().cloned().collect(),
            votes: self.votes.values().cloned().collect(),
            next_challenge_id: self.next_challenge_id,
        }
    }

    /// Rebuild an engine on in-memory stores. Store ownership is restored as
    /// recorded, so a snapshot of a handed-over engine restores inert.
    pub fn restore(snapshot: EngineSnapshot) -> Self {
        Self {
            address: snapshot.address,
            admin: snapshot.admin,
            config: snapshot.config,
            directory: snapshot.directory,
            ledger: snapshot.ledger,
            membership: Box::new(MemoryMembershipStore::from_members(
                snapshot.membership_owner,
                snapshot.members,
            )),
            vault: Box::new(MemoryStakeVault::with_balance(
                snapshot.vault_address,
                snapshot.vault_owner,
                snapshot.vault_balance,
            )),
            challenges: snapshot.challenges.into_iter().map(|c| (c.id, c)).collect(),
            votes: snapshot
                .votes
                .into_iter()
                .map(|v| ((v.challenge_id, v.voter), v))
                .collect(),
            next_challenge_id: snapshot.next_challenge_id,
            pending_events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineParts;
    use tcr_crypto::{derive_address, keypair_from_seed};

    fn address(seed: u8) -> Address {
        derive_address(&keypair_from_seed(&[seed; 32]).public)
    }

    #[test]
    fn empty_engine_roundtrip() {
        let parts = EngineParts::fresh(
            IdentityDirectory::new("snap-directory"),
            TokenLedger::new("snap-token"),
            &address(1),
            address(2),
        );
        let mut engine = CurationEngine::new(address(1), address(3), RegistryConfig::default(), parts).unwrap();
        engine.ledger_mut().mint(&address(4), TokenAmount::from_tokens(7)).unwrap();

        let bytes = engine.snapshot().to_bytes().unwrap();
        let restored = CurationEngine::restore(EngineSnapshot::from_bytes(&bytes).unwrap());
        assert_eq!(restored.address(), engine.address());
        assert_eq!(restored.admin(), engine.admin());
        assert_eq!(restored.ledger().balance_of(&address(4)), TokenAmount::from_tokens(7));
        assert_eq!(restored.next_challenge_id(), 1);
        assert_eq!(restored.directory().domain(), engine.directory().domain());
    }

    #[test]
    fn garbage_is_a_snapshot_error() {
        assert!(matches!(
            EngineSnapshot::from_bytes(&[1, 2, 3]),
            Err(RegistryError::Snapshot(_))
        ));
    }
}
