//! Challenges: lifecycle and tallies.

use crate::voting::VoteChoice;
use serde::{Deserialize, Serialize};
use tcr_types::{ContentHash, IdentityId, Timestamp};

/// Where a challenge stands at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeState {
    /// `now < end_time`: accepts votes.
    Open,
    /// Window closed, not yet resolved: accepts resolution only.
    Expired,
    /// Terminal.
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeOutcome {
    /// The member was removed.
    Succeeded,
    /// The member stays.
    Failed,
}

/// A stake-backed proposal to remove `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub target: IdentityId,
    pub challenger: IdentityId,
    pub created_at: Timestamp,
    pub end_time: Timestamp,
    /// Weight in favour of removal.
    pub votes_for: u128,
    /// Weight in favour of keeping the member.
    pub votes_against: u128,
    pub resolved: bool,
    pub outcome: Option<ChallengeOutcome>,
    pub details: ContentHash,
}

impl Challenge {
    pub fn new(
        id: u64,
        target: IdentityId,
        challenger: IdentityId,
        details: ContentHash,
        now: Timestamp,
        voting_period_secs: u64,
    ) -> Self {
        Self {
            id,
            target,
            challenger,
            created_at: now,
            end_time: now.plus(voting_period_secs),
            votes_for: 0,
            votes_against: 0,
            resolved: false,
            outcome: None,
            details,
        }
    }

    pub fn state(&self, now: Timestamp) -> ChallengeState {
        if self.resolved {
            ChallengeState::Resolved
        } else if now < self.end_time {
            ChallengeState::Open
        } else {
            ChallengeState::Expired
        }
    }

    pub fn record(&mut self, choice: VoteChoice, weight: u64) {
        match choice {
            VoteChoice::Yes => self.votes_for += weight as u128,
            VoteChoice::No => self.votes_against += weight as u128,
        }
    }

    /// Removal needs strictly more weight for than against.
    pub fn decide(&self) -> ChallengeOutcome {
        if self.votes_for > self.votes_against {
            ChallengeOutcome::Succeeded
        } else {
            ChallengeOutcome::Failed
        }
    }
}
