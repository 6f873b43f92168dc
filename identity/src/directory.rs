//! The identity directory proper.

use crate::digest::SignedAction;
use crate::error::IdentityError;
use crate::event::DirectoryEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tcr_crypto::{default_controller, domain_separator, verify_address_signature};
use tcr_types::{Address, IdentityId, Signature, Timestamp};

/// Latest published value for an attribute key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub value: Vec<u8>,
    pub valid_until: Timestamp,
}

/// Identity → owner, delegates, attributes and replay nonce.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityDirectory {
    domain: [u8; 32],
    /// Explicit owners. Identities missing here are owned by their default controller.
    owners: HashMap<IdentityId, Address>,
    /// identity → delegate → valid until (exclusive).
    delegates: HashMap<IdentityId, HashMap<Address, Timestamp>>,
    attributes: HashMap<IdentityId, HashMap<String, AttributeRecord>>,
    nonces: HashMap<IdentityId, u64>,
    last_change: HashMap<IdentityId, u64>,
    change_seq: u64,
    #[serde(skip)]
    pending_events: Vec<DirectoryEvent>,
}

impl IdentityDirectory {
    /// A directory whose signed requests are bound to `label`.
    pub fn new(label: &str) -> Self {
        Self::with_domain(domain_separator(label))
    }

    pub fn with_domain(domain: [u8; 32]) -> Self {
        Self {
            domain,
            owners: HashMap::new(),
            delegates: HashMap::new(),
            attributes: HashMap::new(),
            nonces: HashMap::new(),
            last_change: HashMap::new(),
            change_seq: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn domain(&self) -> &[u8; 32] {
        &self.domain
    }

    /// Current controlling owner of `identity`.
    pub fn owner_of(&self, identity: &IdentityId) -> Address {
        self.owners
            .get(identity)
            .cloned()
            .unwrap_or_else(|| default_controller(identity))
    }

    /// Nonce the next signed request for `identity` must commit to.
    pub fn nonce(&self, identity: &IdentityId) -> u64 {
        self.nonces.get(identity).copied().unwrap_or(0)
    }

    /// Whether `delegate` may act for `identity` at `now`.
    pub fn is_delegate(&self, identity: &IdentityId, delegate: &Address, now: Timestamp) -> bool {
        self.delegates
            .get(identity)
            .and_then(|d| d.get(delegate))
            .is_some_and(|until| now < *until)
    }

    /// Delegates valid at `now`, in address order.
    pub fn delegates(&self, identity: &IdentityId, now: Timestamp) -> Vec<Address> {
        let mut valid: Vec<Address> = self
            .delegates
            .get(identity)
            .map(|d| {
                d.iter()
                    .filter(|(_, until)| now < **until)
                    .map(|(a, _)| a.clone())
                    .collect()
            })
            .unwrap_or_default();
        valid.sort();
        valid
    }

    /// The attribute published under `key`, if still valid at `now`.
    pub fn attribute(&self, identity: &IdentityId, key: &str, now: Timestamp) -> Option<&AttributeRecord> {
        self.attributes
            .get(identity)
            .and_then(|a| a.get(key))
            .filter(|r| now < r.valid_until)
    }

    /// Check a signed request against the identity's current owner and nonce
    /// without applying it.
    pub fn verify_signed(
        &self,
        identity: &IdentityId,
        action: SignedAction<'_>,
        signature: &Signature,
    ) -> Result<(), IdentityError> {
        let nonce = self.nonce(identity);
        let digest = action.digest(&self.domain, identity, nonce);
        if verify_address_signature(&digest, signature, &self.owner_of(identity)) {
            Ok(())
        } else {
            Err(IdentityError::BadSignature { identity: *identity, nonce })
        }
    }

    // ── Owner-issued requests ─────────────────────────────────────────────

    pub fn change_owner(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        new_owner: &Address,
    ) -> Result<(), IdentityError> {
        self.require_owner(caller, identity)?;
        self.apply_owner(identity, new_owner);
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        key: &str,
        value: &[u8],
        validity_secs: u64,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.require_owner(caller, identity)?;
        if key.is_empty() {
            return Err(IdentityError::EmptyAttributeKey);
        }
        self.apply_attribute(identity, key, value, now.plus(validity_secs));
        Ok(())
    }

    pub fn revoke_attribute(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        key: &str,
        value: &[u8],
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.require_owner(caller, identity)?;
        self.apply_attribute(identity, key, value, now);
        Ok(())
    }

    pub fn add_delegate(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        delegate: &Address,
        validity_secs: u64,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.require_owner(caller, identity)?;
        self.check_delegate(identity, delegate)?;
        self.apply_delegate(identity, delegate, now.plus(validity_secs));
        Ok(())
    }

    pub fn revoke_delegate(
        &mut self,
        caller: &Address,
        identity: &IdentityId,
        delegate: &Address,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.require_owner(caller, identity)?;
        self.apply_delegate(identity, delegate, now);
        Ok(())
    }

    // ── Signed requests (consume one nonce each) ──────────────────────────

    pub fn change_owner_signed(
        &mut self,
        identity: &IdentityId,
        new_owner: &Address,
        signature: &Signature,
    ) -> Result<(), IdentityError> {
        self.verify_signed(identity, SignedAction::ChangeOwner { new_owner }, signature)?;
        self.bump_nonce(identity);
        self.apply_owner(identity, new_owner);
        Ok(())
    }

    pub fn set_attribute_signed(
        &mut self,
        identity: &IdentityId,
        key: &str,
        value: &[u8],
        validity_secs: u64,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        if key.is_empty() {
            return Err(IdentityError::EmptyAttributeKey);
        }
        let action = SignedAction::SetAttribute { key, value, validity_secs };
        self.verify_signed(identity, action, signature)?;
        self.bump_nonce(identity);
        self.apply_attribute(identity, key, value, now.plus(validity_secs));
        Ok(())
    }

    pub fn revoke_attribute_signed(
        &mut self,
        identity: &IdentityId,
        key: &str,
        value: &[u8],
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.verify_signed(identity, SignedAction::RevokeAttribute { key, value }, signature)?;
        self.bump_nonce(identity);
        self.apply_attribute(identity, key, value, now);
        Ok(())
    }

    pub fn add_delegate_signed(
        &mut self,
        identity: &IdentityId,
        delegate: &Address,
        validity_secs: u64,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.check_delegate(identity, delegate)?;
        let action = SignedAction::AddDelegate { delegate, validity_secs };
        self.verify_signed(identity, action, signature)?;
        self.bump_nonce(identity);
        self.apply_delegate(identity, delegate, now.plus(validity_secs));
        Ok(())
    }

    pub fn revoke_delegate_signed(
        &mut self,
        identity: &IdentityId,
        delegate: &Address,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), IdentityError> {
        self.verify_signed(identity, SignedAction::RevokeDelegate { delegate }, signature)?;
        self.bump_nonce(identity);
        self.apply_delegate(identity, delegate, now);
        Ok(())
    }

    /// Drain change events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<DirectoryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn require_owner(&self, caller: &Address, identity: &IdentityId) -> Result<(), IdentityError> {
        if &self.owner_of(identity) != caller {
            return Err(IdentityError::NotOwner {
                identity: *identity,
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn check_delegate(&self, identity: &IdentityId, delegate: &Address) -> Result<(), IdentityError> {
        if &self.owner_of(identity) == delegate {
            return Err(IdentityError::SelfDelegation(delegate.clone()));
        }
        Ok(())
    }

    fn bump_nonce(&mut self, identity: &IdentityId) {
        *self.nonces.entry(*identity).or_insert(0) += 1;
    }

    /// Advance the change sequence and return the identity's previous marker.
    fn next_change(&mut self, identity: &IdentityId) -> u64 {
        self.change_seq += 1;
        self.last_change.insert(*identity, self.change_seq).unwrap_or(0)
    }

    fn apply_owner(&mut self, identity: &IdentityId, new_owner: &Address) {
        self.owners.insert(*identity, new_owner.clone());
        let previous_change = self.next_change(identity);
        tracing::debug!(%identity, owner = %new_owner, "identity owner changed");
        self.pending_events.push(DirectoryEvent::OwnerChanged {
            identity: *identity,
            owner: new_owner.clone(),
            previous_change,
        });
    }

    fn apply_attribute(&mut self, identity: &IdentityId, key: &str, value: &[u8], valid_until: Timestamp) {
        self.attributes.entry(*identity).or_default().insert(
            key.to_string(),
            AttributeRecord {
                value: value.to_vec(),
                valid_until,
            },
        );
        let previous_change = self.next_change(identity);
        self.pending_events.push(DirectoryEvent::AttributeChanged {
            identity: *identity,
            key: key.to_string(),
            value: value.to_vec(),
            valid_until,
            previous_change,
        });
    }

    fn apply_delegate(&mut self, identity: &IdentityId, delegate: &Address, valid_until: Timestamp) {
        self.delegates
            .entry(*identity)
            .or_default()
            .insert(delegate.clone(), valid_until);
        let previous_change = self.next_change(identity);
        self.pending_events.push(DirectoryEvent::DelegateChanged {
            identity: *identity,
            delegate: delegate.clone(),
            valid_until,
            previous_change,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcr_crypto::{derive_address, identity_of, keypair_from_seed, sign_message};
    use tcr_types::KeyPair;

    fn directory() -> IdentityDirectory {
        IdentityDirectory::new("test-directory")
    }

    fn signed(dir: &IdentityDirectory, identity: &IdentityId, action: SignedAction<'_>, key: &KeyPair) -> Signature {
        let digest = action.digest(dir.domain(), identity, dir.nonce(identity));
        sign_message(&digest, &key.private)
    }

    #[test]
    fn fresh_identity_owned_by_its_key() {
        let throwaway = keypair_from_seed(&[1u8; 32]);
        let dir = directory();
        assert_eq!(dir.owner_of(&identity_of(&throwaway)), derive_address(&throwaway.public));
        assert_eq!(dir.nonce(&identity_of(&throwaway)), 0);
    }

    #[test]
    fn signed_owner_change_consumes_nonce() {
        let throwaway = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        let id = identity_of(&throwaway);
        let mut dir = directory();

        let sig = signed(&dir, &id, SignedAction::ChangeOwner { new_owner: &owner }, &throwaway);
        dir.change_owner_signed(&id, &owner, &sig).unwrap();
        assert_eq!(dir.owner_of(&id), owner);
        assert_eq!(dir.nonce(&id), 1);

        // Replaying the same signature fails: nonce moved and owner changed.
        let replay = dir.change_owner_signed(&id, &owner, &sig);
        assert_eq!(replay, Err(IdentityError::BadSignature { identity: id, nonce: 1 }));
    }

    #[test]
    fn signature_from_wrong_key_rejected() {
        let throwaway = keypair_from_seed(&[1u8; 32]);
        let intruder = keypair_from_seed(&[9u8; 32]);
        let owner = derive_address(&intruder.public);
        let id = identity_of(&throwaway);
        let mut dir = directory();

        let sig = signed(&dir, &id, SignedAction::ChangeOwner { new_owner: &owner }, &intruder);
        assert!(dir.change_owner_signed(&id, &owner, &sig).is_err());
        assert_eq!(dir.nonce(&id), 0);
        assert!(dir.take_events().is_empty());
    }

    #[test]
    fn signature_bound_to_directory_domain() {
        let throwaway = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        let id = identity_of(&throwaway);
        let other = IdentityDirectory::new("another-deployment");
        let sig = signed(&other, &id, SignedAction::ChangeOwner { new_owner: &owner }, &throwaway);

        let mut dir = directory();
        assert!(dir.change_owner_signed(&id, &owner, &sig).is_err());
    }

    #[test]
    fn delegates_expire() {
        let owner_key = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&owner_key.public);
        let delegate = derive_address(&keypair_from_seed(&[5u8; 32]).public);
        let id = identity_of(&owner_key);
        let mut dir = directory();

        dir.add_delegate(&owner, &id, &delegate, 100, Timestamp::new(1_000)).unwrap();
        assert!(dir.is_delegate(&id, &delegate, Timestamp::new(1_099)));
        assert!(!dir.is_delegate(&id, &delegate, Timestamp::new(1_100)));
        assert_eq!(dir.delegates(&id, Timestamp::new(1_050)), vec![delegate.clone()]);
    }

    #[test]
    fn revoked_delegate_loses_authority() {
        let owner_key = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&owner_key.public);
        let delegate = derive_address(&keypair_from_seed(&[5u8; 32]).public);
        let id = identity_of(&owner_key);
        let mut dir = directory();

        let sig = signed(
            &dir,
            &id,
            SignedAction::AddDelegate { delegate: &delegate, validity_secs: 1_000 },
            &owner_key,
        );
        dir.add_delegate_signed(&id, &delegate, 1_000, &sig, Timestamp::new(0)).unwrap();
        assert!(dir.is_delegate(&id, &delegate, Timestamp::new(10)));

        dir.revoke_delegate(&owner, &id, &delegate, Timestamp::new(10)).unwrap();
        assert!(!dir.is_delegate(&id, &delegate, Timestamp::new(10)));
    }

    #[test]
    fn owner_cannot_delegate_to_self() {
        let owner_key = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&owner_key.public);
        let id = identity_of(&owner_key);
        let mut dir = directory();
        let err = dir.add_delegate(&owner, &id, &owner, 10, Timestamp::new(0)).unwrap_err();
        assert_eq!(err, IdentityError::SelfDelegation(owner));
    }

    #[test]
    fn non_owner_requests_rejected() {
        let owner_key = keypair_from_seed(&[1u8; 32]);
        let stranger = derive_address(&keypair_from_seed(&[4u8; 32]).public);
        let id = identity_of(&owner_key);
        let mut dir = directory();
        assert!(matches!(
            dir.change_owner(&stranger, &id, &stranger),
            Err(IdentityError::NotOwner { .. })
        ));
    }

    #[test]
    fn attribute_events_chain_previous_change() {
        let owner_key = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&owner_key.public);
        let id = identity_of(&owner_key);
        let mut dir = directory();

        dir.set_attribute(&owner, &id, "profile", b"v1", 100, Timestamp::new(0)).unwrap();
        dir.set_attribute(&owner, &id, "profile", b"v2", 100, Timestamp::new(5)).unwrap();
        let events = dir.take_events();
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (
                DirectoryEvent::AttributeChanged { previous_change: first, .. },
                DirectoryEvent::AttributeChanged { previous_change: second, .. },
            ) => {
                assert_eq!(*first, 0);
                assert_eq!(*second, 1);
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(dir.attribute(&id, "profile", Timestamp::new(50)).unwrap().value, b"v2");
        assert!(dir.attribute(&id, "profile", Timestamp::new(105)).is_none());
    }

    #[test]
    fn snapshot_roundtrip_keeps_nonces() {
        let throwaway = keypair_from_seed(&[1u8; 32]);
        let owner = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        let id = identity_of(&throwaway);
        let mut dir = directory();
        let sig = signed(&dir, &id, SignedAction::ChangeOwner { new_owner: &owner }, &throwaway);
        dir.change_owner_signed(&id, &owner, &sig).unwrap();

        let bytes = bincode::serialize(&dir).unwrap();
        let restored: IdentityDirectory = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.nonce(&id), 1);
        assert_eq!(restored.owner_of(&id), owner);
    }
}
