//! Vote choices, tenure weighting and vote records.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use tcr_types::{Address, IdentityId, Timestamp};

/// A member's position on a challenge.
///
/// On the wire a choice is one byte: `1` is [`VoteChoice::Yes`], `2` is
/// [`VoteChoice::No`]. Zero (unset) and every other value are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    /// Remove the member. Counts toward `votes_for`.
    Yes,
    /// Keep the member. Counts toward `votes_against`.
    No,
}

impl VoteChoice {
    pub const YES: u8 = 1;
    pub const NO: u8 = 2;

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Yes => Self::YES,
            Self::No => Self::NO,
        }
    }
}

impl TryFrom<u8> for VoteChoice {
    type Error = RegistryError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            Self::YES => Ok(Self::Yes),
            Self::NO => Ok(Self::No),
            other => Err(RegistryError::InvalidChoice(other)),
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => f.write_str("yes"),
            Self::No => f.write_str("no"),
        }
    }
}

/// Integer square root, rounded down (Newton iteration).
pub fn isqrt(val: u64) -> u64 {
    if val < 2 {
        return val;
    }
    let mut x = val;
    let mut y = val / 2 + val % 2;
    while y < x {
        x = y;
        y = (x + val / x) / 2;
    }
    x
}

/// Voting power of a member admitted at `admission_time` on a challenge
/// ending at `end_time`: `floor(sqrt(end_time - admission_time))`.
///
/// Members admitted at or after the end time weigh zero.
pub fn vote_weight(end_time: Timestamp, admission_time: Timestamp) -> u64 {
    isqrt(admission_time.elapsed_since(end_time))
}

/// One cast vote. Unique per (challenge, voter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub challenge_id: u64,
    pub voter: IdentityId,
    pub choice: VoteChoice,
    pub weight: u64,
    /// Set when the vote was submitted by a delegate rather than the owner.
    pub acting_delegate: Option<Address>,
    pub cast_at: Timestamp,
}
