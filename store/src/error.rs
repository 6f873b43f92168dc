use tcr_types::{Address, IdentityId, TokenAmount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{caller} does not own this store")]
    NotOwner { caller: Address },

    #[error("no member record for {0}")]
    NotFound(IdentityId),

    #[error("member record already exists for {0}")]
    Duplicate(IdentityId),

    #[error("vault holds {available}, cannot release {needed}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("vault balance overflow")]
    Overflow,
}
