use tcr_types::{Address, IdentityId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{caller} is not the owner of identity {identity}")]
    NotOwner { identity: IdentityId, caller: Address },

    #[error("signature does not match the owner of identity {identity} at nonce {nonce}")]
    BadSignature { identity: IdentityId, nonce: u64 },

    #[error("delegate {0} cannot be the identity owner")]
    SelfDelegation(Address),

    #[error("attribute key must not be empty")]
    EmptyAttributeKey,
}

impl IdentityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotOwner { .. } => "NotOwner",
            Self::BadSignature { .. } => "BadSignature",
            Self::SelfDelegation(_) => "SelfDelegation",
            Self::EmptyAttributeKey => "EmptyAttributeKey",
        }
    }
}
