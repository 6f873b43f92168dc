//! Token-curated registry engine.
//!
//! A membership list where admission costs a fee, removal is decided by a
//! stake-backed challenge and a tenure-weighted vote, and every payout comes
//! out of a single escrow vault.
//!
//! [`CurationEngine`] holds all state and applies operations one at a time;
//! [`Registry`] wraps it in a single-writer lock, reads time from a
//! [`tcr_types::Clock`] and stamps every committed operation with a sequence
//! number.

pub mod admin;
pub mod authorization;
pub mod challenge;
pub mod engine;
pub mod error;
pub mod events;
pub mod outcomes;
pub mod shared;
pub mod snapshot;
pub mod voting;

pub use admin::ConfigChange;
pub use authorization::{
    Authorization, AuthorizationFailure, AuthorizationPayload, AuthorizationPurpose, FailureReason,
    OnboardingBundle, OnboardingTerms, SignatureBatchVerifier,
};
pub use challenge::{Challenge, ChallengeOutcome, ChallengeState};
pub use engine::{CurationEngine, EngineParts};
pub use error::RegistryError;
pub use events::RegistryEvent;
pub use outcomes::Payout;
pub use shared::{Receipt, Registry};
pub use snapshot::EngineSnapshot;
pub use voting::{isqrt, vote_weight, VoteChoice, VoteRecord};
