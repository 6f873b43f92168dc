//! Member records and the membership store trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tcr_types::{Address, IdentityId, Timestamp};

/// One admitted member. The record is deleted on exit or removal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub identity: IdentityId,
    /// Owner of the identity at admission time.
    pub controlling_owner: Address,
    pub admission_time: Timestamp,
    /// Unresolved challenge against this member, if any.
    pub active_challenge: Option<u64>,
}

impl Member {
    pub fn new(identity: IdentityId, controlling_owner: Address, admission_time: Timestamp) -> Self {
        Self {
            identity,
            controlling_owner,
            admission_time,
            active_challenge: None,
        }
    }

    pub fn is_challenged(&self) -> bool {
        self.active_challenge.is_some()
    }
}

/// Trait for membership storage. Mutations are owner-only.
pub trait MembershipStore: Send {
    fn owner(&self) -> &Address;

    /// Hand the store to `new_owner`. Only the current owner may do this.
    fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> Result<(), StoreError>;

    fn get(&self, identity: &IdentityId) -> Option<Member>;

    fn contains(&self, identity: &IdentityId) -> bool {
        self.get(identity).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, ordered by identity.
    fn members(&self) -> Vec<Member>;

    /// Fails with `Duplicate` if the identity already has a record.
    fn insert(&mut self, caller: &Address, member: Member) -> Result<(), StoreError>;

    fn remove(&mut self, caller: &Address, identity: &IdentityId) -> Result<Member, StoreError>;

    fn set_active_challenge(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        challenge: Option<u64>,
    ) -> Result<(), StoreError>;
}
