//! Token-specific errors.

use tcr_types::{Address, TokenAmount};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: TokenAmount, available: TokenAmount },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: TokenAmount, available: TokenAmount },

    #[error("permit nonce mismatch: expected {expected}, got {got}")]
    InvalidPermitNonce { expected: u64, got: u64 },

    #[error("permit expired")]
    PermitExpired,

    #[error("permit signature does not match holder")]
    BadPermitSignature,

    #[error("account {0} is escrow")]
    EscrowLocked(Address),

    #[error("escrow account must be empty, holds {balance}")]
    EscrowNotEmpty { balance: TokenAmount },

    #[error("{caller} is not the custodian of {account}")]
    NotCustodian { caller: Address, account: Address },

    #[error("arithmetic overflow")]
    Overflow,
}

impl TokenError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::InsufficientAllowance { .. } => "InsufficientAllowance",
            Self::InvalidPermitNonce { .. } => "InvalidPermitNonce",
            Self::PermitExpired => "PermitExpired",
            Self::BadPermitSignature => "BadPermitSignature",
            Self::EscrowLocked(_) => "EscrowLocked",
            Self::EscrowNotEmpty { .. } => "EscrowNotEmpty",
            Self::NotCustodian { .. } => "NotCustodian",
            Self::Overflow => "Overflow",
        }
    }
}
