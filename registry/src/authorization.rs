//! Signed authorizations and the all-or-nothing bundle verifier.
//!
//! An onboarding carries three authorizations, signed off-line:
//!
//! 1. ownership transfer: the identity's current controller hands it to the
//!    new owner (directory nonce `n`)
//! 2. attribute publication: the *new* owner publishes the attribute
//!    (directory nonce `n + 1`)
//! 3. payment permit: the new owner lets the engine pull the application fee
//!
//! [`SignatureBatchVerifier`] checks them in that order against a projection
//! of the directory and token ledger, so each authorization sees the owner and
//! nonces left behind by the ones before it. Nothing is mutated; the engine
//! applies the bundle only once the whole of it has verified.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tcr_crypto::{sign_message, verify_address_signature};
use tcr_identity::{IdentityDirectory, SignedAction};
use tcr_token::{Permit, TokenLedger};
use tcr_types::{Address, IdentityId, KeyPair, Signature, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationPurpose {
    OwnershipTransfer,
    AttributePublication,
    PaymentPermit,
}

impl std::fmt::Display for AuthorizationPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnershipTransfer => f.write_str("ownership transfer"),
            Self::AttributePublication => f.write_str("attribute publication"),
            Self::PaymentPermit => f.write_str("payment permit"),
        }
    }
}

/// What an authorization commits to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum AuthorizationPayload {
    OwnershipTransfer {
        identity: IdentityId,
        new_owner: Address,
    },
    AttributePublication {
        identity: IdentityId,
        key: String,
        #[serde(with = "hex::serde")]
        value: Vec<u8>,
        validity_secs: u64,
    },
    PaymentPermit(Permit),
}

impl AuthorizationPayload {
    pub fn purpose(&self) -> AuthorizationPurpose {
        match self {
            Self::OwnershipTransfer { .. } => AuthorizationPurpose::OwnershipTransfer,
            Self::AttributePublication { .. } => AuthorizationPurpose::AttributePublication,
            Self::PaymentPermit(_) => AuthorizationPurpose::PaymentPermit,
        }
    }
}

/// A tagged (purpose, signer, payload, signature) tuple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub signer: Address,
    pub payload: AuthorizationPayload,
    pub signature: Signature,
}

impl Authorization {
    pub fn purpose(&self) -> AuthorizationPurpose {
        self.payload.purpose()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Signed by someone other than the party that must sign.
    WrongSigner { expected: Address },
    BadSignature,
    StaleNonce { expected: u64, got: u64 },
    Expired,
    /// Payload does not match the operation it was submitted with.
    Malformed(&'static str),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongSigner { expected } => write!(f, "must be signed by {expected}"),
            Self::BadSignature => f.write_str("bad signature"),
            Self::StaleNonce { expected, got } => write!(f, "nonce {got}, expected {expected}"),
            Self::Expired => f.write_str("expired"),
            Self::Malformed(what) => write!(f, "malformed: {what}"),
        }
    }
}

/// The first authorization in a bundle that did not verify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationFailure {
    pub index: usize,
    pub purpose: AuthorizationPurpose,
    pub reason: FailureReason,
}

impl std::fmt::Display for AuthorizationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({}): {}", self.index, self.purpose, self.reason)
    }
}

/// Validates a bundle of authorizations against directory and ledger state.
pub struct SignatureBatchVerifier<'a> {
    directory: &'a IdentityDirectory,
    ledger: &'a TokenLedger,
}

impl<'a> SignatureBatchVerifier<'a> {
    pub fn new(directory: &'a IdentityDirectory, ledger: &'a TokenLedger) -> Self {
        Self { directory, ledger }
    }

    /// Verify every authorization in order. Returns the first failure.
    pub fn verify(&self, authorizations: &[Authorization], now: Timestamp) -> Result<(), AuthorizationFailure> {
        let mut projection = Projection::default();
        for (index, auth) in authorizations.iter().enumerate() {
            self.verify_one(auth, &mut projection, now)
                .map_err(|reason| AuthorizationFailure {
                    index,
                    purpose: auth.purpose(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn verify_one(&self, auth: &Authorization, projection: &mut Projection, now: Timestamp) -> Result<(), FailureReason> {
        match &auth.payload {
            AuthorizationPayload::OwnershipTransfer { identity, new_owner } => {
                self.verify_directory(auth, projection, identity, SignedAction::ChangeOwner { new_owner })?;
                projection.owners.insert(*identity, new_owner.clone());
            }
            AuthorizationPayload::AttributePublication { identity, key, value, validity_secs } => {
                if key.is_empty() {
                    return Err(FailureReason::Malformed("empty attribute key"));
                }
                let action = SignedAction::SetAttribute { key, value, validity_secs: *validity_secs };
                self.verify_directory(auth, projection, identity, action)?;
            }
            AuthorizationPayload::PaymentPermit(permit) => {
                if auth.signer != permit.holder {
                    return Err(FailureReason::WrongSigner { expected: permit.holder.clone() });
                }
                let expected = projection
                    .permit_nonces
                    .get(&permit.holder)
                    .copied()
                    .unwrap_or_else(|| self.ledger.permit_nonce(&permit.holder));
                if permit.nonce != expected {
                    return Err(FailureReason::StaleNonce { expected, got: permit.nonce });
                }
                if permit.is_expired(now) {
                    return Err(FailureReason::Expired);
                }
                let digest = permit.digest(self.ledger.domain());
                if !verify_address_signature(&digest, &auth.signature, &permit.holder) {
                    return Err(FailureReason::BadSignature);
                }
                projection.permit_nonces.insert(permit.holder.clone(), expected + 1);
            }
        }
        Ok(())
    }

    fn verify_directory(
        &self,
        auth: &Authorization,
        projection: &mut Projection,
        identity: &IdentityId,
        action: SignedAction<'_>,
    ) -> Result<(), FailureReason> {
        let owner = projection
            .owners
            .get(identity)
            .cloned()
            .unwrap_or_else(|| self.directory.owner_of(identity));
        if auth.signer != owner {
            return Err(FailureReason::WrongSigner { expected: owner });
        }
        let nonce = projection
            .nonces
            .get(identity)
            .copied()
            .unwrap_or_else(|| self.directory.nonce(identity));
        let digest = action.digest(self.directory.domain(), identity, nonce);
        if !verify_address_signature(&digest, &auth.signature, &owner) {
            return Err(FailureReason::BadSignature);
        }
        projection.nonces.insert(*identity, nonce + 1);
        Ok(())
    }
}

/// Owners and nonces as they would stand after the authorizations seen so far.
#[derive(Default)]
struct Projection {
    owners: HashMap<IdentityId, Address>,
    nonces: HashMap<IdentityId, u64>,
    permit_nonces: HashMap<Address, u64>,
}

/// Everything one onboarding call needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingBundle {
    pub identity: IdentityId,
    pub owner: Address,
    pub attribute_key: String,
    #[serde(with = "hex::serde")]
    pub attribute_value: Vec<u8>,
    pub ownership: Authorization,
    pub attribute: Authorization,
    pub payment: Authorization,
}

/// Off-line terms the signers agree to.
#[derive(Clone, Debug)]
pub struct OnboardingTerms {
    pub identity: IdentityId,
    pub attribute_key: String,
    pub attribute_value: Vec<u8>,
    pub attribute_validity_secs: u64,
    /// Directory nonce of the identity when the bundle is submitted.
    pub identity_nonce: u64,
    /// Token permit nonce of the new owner when the bundle is submitted.
    pub permit_nonce: u64,
    pub permit_expiry: Timestamp,
}

impl OnboardingBundle {
    /// Sign a bundle. `controller` currently controls the identity (for a
    /// fresh identity, its throwaway key); `owner` becomes its owner and pays
    /// the fee to `engine`.
    pub fn sign(
        terms: &OnboardingTerms,
        controller: &KeyPair,
        owner: &KeyPair,
        engine: &Address,
        directory_domain: &[u8; 32],
        token_domain: &[u8; 32],
    ) -> Self {
        let controller_address = tcr_crypto::derive_address(&controller.public);
        let owner_address = tcr_crypto::derive_address(&owner.public);

        let transfer = SignedAction::ChangeOwner { new_owner: &owner_address };
        let transfer_digest = transfer.digest(directory_domain, &terms.identity, terms.identity_nonce);

        let publish = SignedAction::SetAttribute {
            key: &terms.attribute_key,
            value: &terms.attribute_value,
            validity_secs: terms.attribute_validity_secs,
        };
        let publish_digest = publish.digest(directory_domain, &terms.identity, terms.identity_nonce + 1);

        let permit = Permit {
            holder: owner_address.clone(),
            spender: engine.clone(),
            nonce: terms.permit_nonce,
            expiry: terms.permit_expiry,
            allowed: true,
        };
        let permit_digest = permit.digest(token_domain);

        Self {
            identity: terms.identity,
            owner: owner_address.clone(),
            attribute_key: terms.attribute_key.clone(),
            attribute_value: terms.attribute_value.clone(),
            ownership: Authorization {
                signer: controller_address,
                payload: AuthorizationPayload::OwnershipTransfer {
                    identity: terms.identity,
                    new_owner: owner_address.clone(),
                },
                signature: sign_message(&transfer_digest, &controller.private),
            },
            attribute: Authorization {
                signer: owner_address.clone(),
                payload: AuthorizationPayload::AttributePublication {
                    identity: terms.identity,
                    key: terms.attribute_key.clone(),
                    value: terms.attribute_value.clone(),
                    validity_secs: terms.attribute_validity_secs,
                },
                signature: sign_message(&publish_digest, &owner.private),
            },
            payment: Authorization {
                signer: owner_address,
                payload: AuthorizationPayload::PaymentPermit(permit),
                signature: sign_message(&permit_digest, &owner.private),
            },
        }
    }

    /// The three authorizations in verification order.
    pub fn authorizations(&self) -> [Authorization; 3] {
        [self.ownership.clone(), self.attribute.clone(), self.payment.clone()]
    }

    /// Check that each authorization commits to this bundle's identity, owner
    /// and attribute, and that the permit lets `engine` spend.
    pub fn check_terms(&self, engine: &Address) -> Result<CheckedTerms<'_>, AuthorizationFailure> {
        let fail = |index: usize, purpose: AuthorizationPurpose, what: &'static str| AuthorizationFailure {
            index,
            purpose,
            reason: FailureReason::Malformed(what),
        };

        match &self.ownership.payload {
            AuthorizationPayload::OwnershipTransfer { identity, new_owner } => {
                if *identity != self.identity || *new_owner != self.owner {
                    return Err(fail(0, AuthorizationPurpose::OwnershipTransfer, "transfer does not match identity and owner"));
                }
            }
            other => return Err(fail(0, other.purpose(), "expected an ownership transfer")),
        }

        let attribute_validity_secs = match &self.attribute.payload {
            AuthorizationPayload::AttributePublication { identity, key, value, validity_secs } => {
                if *identity != self.identity || *key != self.attribute_key || *value != self.attribute_value {
                    return Err(fail(1, AuthorizationPurpose::AttributePublication, "attribute does not match"));
                }
                *validity_secs
            }
            other => return Err(fail(1, other.purpose(), "expected an attribute publication")),
        };

        let permit = match &self.payment.payload {
            AuthorizationPayload::PaymentPermit(permit) => {
                if permit.holder != self.owner {
                    return Err(fail(2, AuthorizationPurpose::PaymentPermit, "permit holder is not the owner"));
                }
                if permit.spender != *engine {
                    return Err(fail(2, AuthorizationPurpose::PaymentPermit, "permit spender is not the engine"));
                }
                if !permit.allowed {
                    return Err(fail(2, AuthorizationPurpose::PaymentPermit, "permit revokes instead of granting"));
                }
                permit
            }
            other => return Err(fail(2, other.purpose(), "expected a payment permit")),
        };

        Ok(CheckedTerms {
            attribute_validity_secs,
            permit,
        })
    }
}

/// Fields of a bundle whose shape [`OnboardingBundle::check_terms`] accepted.
#[derive(Clone, Copy, Debug)]
pub struct CheckedTerms<'a> {
    pub attribute_validity_secs: u64,
    pub permit: &'a Permit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcr_crypto::{derive_address, identity_of, keypair_from_seed};

    struct Fixture {
        directory: IdentityDirectory,
        ledger: TokenLedger,
        engine: Address,
        throwaway: KeyPair,
        owner: KeyPair,
    }

    fn fixture() -> Fixture {
        Fixture {
            directory: IdentityDirectory::new("test-directory"),
            ledger: TokenLedger::new("test-token"),
            engine: derive_address(&keypair_from_seed(&[0xEE; 32]).public),
            throwaway: keypair_from_seed(&[1; 32]),
            owner: keypair_from_seed(&[2; 32]),
        }
    }

    fn terms(f: &Fixture) -> OnboardingTerms {
        OnboardingTerms {
            identity: identity_of(&f.throwaway),
            attribute_key: "profile".into(),
            attribute_value: vec![0xAB; 32],
            attribute_validity_secs: 1_000_000,
            identity_nonce: 0,
            permit_nonce: 0,
            permit_expiry: Timestamp::EPOCH,
        }
    }

    fn bundle(f: &Fixture, terms: &OnboardingTerms) -> OnboardingBundle {
        OnboardingBundle::sign(
            terms,
            &f.throwaway,
            &f.owner,
            &f.engine,
            f.directory.domain(),
            f.ledger.domain(),
        )
    }

    #[test]
    fn valid_bundle_verifies() {
        let f = fixture();
        let b = bundle(&f, &terms(&f));
        b.check_terms(&f.engine).unwrap();
        SignatureBatchVerifier::new(&f.directory, &f.ledger)
            .verify(&b.authorizations(), Timestamp::new(10))
            .unwrap();
    }

    #[test]
    fn attribute_must_follow_ownership() {
        let f = fixture();
        let b = bundle(&f, &terms(&f));
        // Out of order the attribute is checked against the old owner.
        let err = SignatureBatchVerifier::new(&f.directory, &f.ledger)
            .verify(&[b.attribute.clone(), b.ownership.clone()], Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.purpose, AuthorizationPurpose::AttributePublication);
        assert!(matches!(err.reason, FailureReason::WrongSigner { .. }));
    }

    #[test]
    fn stale_identity_nonce_is_bad_signature() {
        let f = fixture();
        let mut t = terms(&f);
        t.identity_nonce = 1;
        let b = bundle(&f, &t);
        let err = SignatureBatchVerifier::new(&f.directory, &f.ledger)
            .verify(&b.authorizations(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.reason, FailureReason::BadSignature);
    }

    #[test]
    fn wrong_permit_nonce_reported() {
        let f = fixture();
        let mut t = terms(&f);
        t.permit_nonce = 5;
        let b = bundle(&f, &t);
        let err = SignatureBatchVerifier::new(&f.directory, &f.ledger)
            .verify(&b.authorizations(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.reason, FailureReason::StaleNonce { expected: 0, got: 5 });
    }

    #[test]
    fn expired_permit_rejected() {
        let f = fixture();
        let mut t = terms(&f);
        t.permit_expiry = Timestamp::new(5);
        let b = bundle(&f, &t);
        let err = SignatureBatchVerifier::new(&f.directory, &f.ledger)
            .verify(&b.authorizations(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::Expired);
    }

    #[test]
    fn permit_for_other_spender_fails_terms() {
        let f = fixture();
        let b = bundle(&f, &terms(&f));
        let other = derive_address(&keypair_from_seed(&[0xDD; 32]).public);
        let err = b.check_terms(&other).unwrap_err();
        assert_eq!(err.index, 2);
    }

    #[test]
    fn tampered_attribute_fails_terms() {
        let f = fixture();
        let mut b = bundle(&f, &terms(&f));
        b.attribute_value = vec![0; 4];
        assert_eq!(b.check_terms(&f.engine).unwrap_err().index, 1);
    }

    #[test]
    fn bundle_json_roundtrip() {
        let f = fixture();
        let b = bundle(&f, &terms(&f));
        let json = serde_json::to_string(&b).unwrap();
        let decoded: OnboardingBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, b);
    }
}
