//! Events emitted by committed registry operations.

use crate::admin::ConfigChange;
use crate::voting::VoteChoice;
use serde::{Deserialize, Serialize};
use tcr_types::{Address, ContentHash, IdentityId, Timestamp, TokenAmount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    MemberAdmitted {
        identity: IdentityId,
        owner: Address,
        admission_time: Timestamp,
        fee_paid: TokenAmount,
    },
    MemberExited {
        identity: IdentityId,
    },
    ChallengeOpened {
        challenge_id: u64,
        target: IdentityId,
        challenger: IdentityId,
        end_time: Timestamp,
        details: ContentHash,
    },
    VoteCast {
        challenge_id: u64,
        voter: IdentityId,
        choice: VoteChoice,
        weight: u64,
        acting_delegate: Option<Address>,
    },
    ChallengeFailed {
        challenge_id: u64,
        resolver: Address,
        reward: TokenAmount,
    },
    ChallengeSucceeded {
        challenge_id: u64,
        resolver: Address,
        reward: TokenAmount,
        challenger_payout: TokenAmount,
    },
    ConfigUpdated {
        change: ConfigChange,
    },
    FundsWithdrawn {
        to: Address,
        amount: TokenAmount,
    },
    AdminTransferred {
        previous: Address,
        admin: Address,
    },
    HandedOver {
        successor: Address,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberAdmitted { .. } => "member_admitted",
            Self::MemberExited { .. } => "member_exited",
            Self::ChallengeOpened { .. } => "challenge_opened",
            Self::VoteCast { .. } => "vote_cast",
            Self::ChallengeFailed { .. } => "challenge_failed",
            Self::ChallengeSucceeded { .. } => "challenge_succeeded",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::FundsWithdrawn { .. } => "funds_withdrawn",
            Self::AdminTransferred { .. } => "admin_transferred",
            Self::HandedOver { .. } => "handed_over",
        }
    }
}
