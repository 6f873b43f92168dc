use crate::authorization::AuthorizationFailure;
use tcr_store::StoreError;
use tcr_token::TokenError;
use tcr_types::{Address, IdentityId, Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("identity {0} is already a member")]
    AlreadyMember(IdentityId),

    #[error("{caller} is not authorized for this operation")]
    NotOwner { caller: Address },

    #[error("identity {0} has an unresolved challenge")]
    ChallengeInProgress(IdentityId),

    #[error("a member cannot challenge itself")]
    CannotChallengeSelf,

    #[error("challenger {0} is not a member controlled by the caller")]
    ChallengerNotMember(IdentityId),

    #[error("target {0} is not a member")]
    TargetNotMember(IdentityId),

    #[error("target {target} is already challenged (challenge {challenge_id})")]
    ChallengeAlreadyOpen { target: IdentityId, challenge_id: u64 },

    #[error("no challenge with id {0}")]
    NoSuchChallenge(u64),

    #[error("voter {0} is not a member the caller may vote for")]
    NotAMember(IdentityId),

    #[error("the challenged member cannot vote on its own challenge")]
    SelfVoteForbidden,

    #[error("{voter} already voted on challenge {challenge_id}")]
    AlreadyVoted { challenge_id: u64, voter: IdentityId },

    #[error("invalid vote choice byte {0}")]
    InvalidChoice(u8),

    #[error("challenge {challenge_id} is open until {end_time}")]
    VotingStillOpen { challenge_id: u64, end_time: Timestamp },

    #[error("voting on challenge {0} has closed")]
    VotingClosed(u64),

    #[error("challenge {0} is already resolved")]
    AlreadyResolved(u64),

    #[error("batch arguments have different lengths")]
    ArrayLengthMismatch,

    #[error("invalid authorization: {0}")]
    InvalidAuthorization(AuthorizationFailure),

    #[error("payment failed: {0}")]
    PaymentFailed(TokenError),

    #[error("vault holds {available}, cannot pay {needed}")]
    InsufficientVaultBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl RegistryError {
    /// Stable name of the error kind, for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyMember(_) => "AlreadyMember",
            Self::NotOwner { .. } => "NotOwner",
            Self::ChallengeInProgress(_) => "ChallengeInProgress",
            Self::CannotChallengeSelf => "CannotChallengeSelf",
            Self::ChallengerNotMember(_) => "ChallengerNotMember",
            Self::TargetNotMember(_) => "TargetNotMember",
            Self::ChallengeAlreadyOpen { .. } => "ChallengeAlreadyOpen",
            Self::NoSuchChallenge(_) => "NoSuchChallenge",
            Self::NotAMember(_) => "NotAMember",
            Self::SelfVoteForbidden => "SelfVoteForbidden",
            Self::AlreadyVoted { .. } => "AlreadyVoted",
            Self::InvalidChoice(_) => "InvalidChoice",
            Self::VotingStillOpen { .. } => "VotingStillOpen",
            Self::VotingClosed(_) => "VotingClosed",
            Self::AlreadyResolved(_) => "AlreadyResolved",
            Self::ArrayLengthMismatch => "ArrayLengthMismatch",
            Self::InvalidAuthorization(_) => "InvalidAuthorization",
            Self::PaymentFailed(_) => "PaymentFailed",
            Self::InsufficientVaultBalance { .. } => "InsufficientVaultBalance",
            Self::Snapshot(_) => "Snapshot",
        }
    }
}

impl From<AuthorizationFailure> for RegistryError {
    fn from(failure: AuthorizationFailure) -> Self {
        Self::InvalidAuthorization(failure)
    }
}

impl From<TokenError> for RegistryError {
    fn from(err: TokenError) -> Self {
        Self::PaymentFailed(err)
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotOwner { caller } => Self::NotOwner { caller },
            StoreError::NotFound(identity) => Self::TargetNotMember(identity),
            StoreError::Duplicate(identity) => Self::AlreadyMember(identity),
            StoreError::InsufficientBalance { needed, available } => {
                Self::InsufficientVaultBalance { needed, available }
            }
            StoreError::Overflow => Self::PaymentFailed(TokenError::Overflow),
        }
    }
}
