//! In-memory stores.

use crate::member::{Member, MembershipStore};
use crate::vault::StakeVault;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_types::{Address, IdentityId, TokenAmount};

fn require_owner(owner: &Address, caller: &Address) -> Result<(), StoreError> {
    if owner == caller {
        Ok(())
    } else {
        Err(StoreError::NotOwner { caller: caller.clone() })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryMembershipStore {
    owner: Address,
    members: BTreeMap<IdentityId, Member>,
}

impl MemoryMembershipStore {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            members: BTreeMap::new(),
        }
    }

    /// Rebuild a store from exported records.
    pub fn from_members(owner: Address, members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            owner,
            members: members.into_iter().map(|m| (m.identity, m)).collect(),
        }
    }
}

impl MembershipStore for MemoryMembershipStore {
    fn owner(&self) -> &Address {
        &self.owner
    }

    fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        self.owner = new_owner.clone();
        Ok(())
    }

    fn get(&self, identity: &IdentityId) -> Option<Member> {
        self.members.get(identity).cloned()
    }

    fn contains(&self, identity: &IdentityId) -> bool {
        self.members.contains_key(identity)
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn members(&self) -> Vec<Member> {
        self.members.values().cloned().collect()
    }

    fn insert(&mut self, caller: &Address, member: Member) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        if self.members.contains_key(&member.identity) {
            return Err(StoreError::Duplicate(member.identity));
        }
        self.members.insert(member.identity, member);
        Ok(())
    }

    fn remove(&mut self, caller: &Address, identity: &IdentityId) -> Result<Member, StoreError> {
        require_owner(&self.owner, caller)?;
        self.members.remove(identity).ok_or(StoreError::NotFound(*identity))
    }

    fn set_active_challenge(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        challenge: Option<u64>,
    ) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        let member = self
            .members
            .get_mut(identity)
            .ok_or(StoreError::NotFound(*identity))?;
        member.active_challenge = challenge;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryStakeVault {
    address: Address,
    owner: Address,
    balance: TokenAmount,
}

impl MemoryStakeVault {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            balance: TokenAmount::ZERO,
        }
    }

    pub fn with_balance(address: Address, owner: Address, balance: TokenAmount) -> Self {
        Self { address, owner, balance }
    }
}

impl StakeVault for MemoryStakeVault {
    fn address(&self) -> &Address {
        &self.address
    }

    fn balance(&self) -> TokenAmount {
        self.balance
    }

    fn owner(&self) -> &Address {
        &self.owner
    }

    fn transfer_ownership(&mut self, caller: &Address, new_owner: &Address) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        self.owner = new_owner.clone();
        Ok(())
    }

    fn deposit(&mut self, caller: &Address, amount: TokenAmount) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        self.balance = self.balance.checked_add(amount).ok_or(StoreError::Overflow)?;
        Ok(())
    }

    fn withdraw(&mut self, caller: &Address, amount: TokenAmount) -> Result<(), StoreError> {
        require_owner(&self.owner, caller)?;
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(StoreError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            })?;
        Ok(())
    }
}
