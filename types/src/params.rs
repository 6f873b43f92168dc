//! Registry parameters the administrator may tune.
//!
//! Created once when the registry is initialised and changed afterwards only
//! through the engine's explicit admin operations.

use crate::amount::TokenAmount;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};

/// Divisor applied to the challenge deposit to obtain the resolver's reward.
pub const CHALLENGE_REWARD_DIVISOR: u128 = 10;

/// Mutable configuration of one registry instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Length of the voting window in whole seconds. Default: 2 days.
    pub voting_period_secs: u64,

    /// Stake a challenger locks into the vault. Default: 10 tokens.
    pub challenge_deposit: TokenAmount,

    /// One-time admission fee. Default: 10 tokens.
    pub application_fee: TokenAmount,

    /// Pointer to the registry charter document.
    pub charter: ContentHash,

    /// Pointer to the category-set document.
    pub categories: ContentHash,

    /// First id handed out by a freshly deployed engine. A successor engine
    /// sets this above its predecessor's last id so ids are never reused.
    pub starting_challenge_counter: u64,
}

impl RegistryConfig {
    pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 2 * 24 * 3600;

    /// Reward paid to whoever resolves an expired challenge:
    /// `challenge_deposit / 10`, truncating.
    pub fn challenge_reward(&self) -> TokenAmount {
        self.challenge_deposit.div_floor(CHALLENGE_REWARD_DIVISOR)
    }

    /// Total debited from the vault when a challenge succeeds.
    pub fn success_payout(&self) -> Option<TokenAmount> {
        self.challenge_deposit.checked_add(self.application_fee)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            voting_period_secs: Self::DEFAULT_VOTING_PERIOD_SECS,
            challenge_deposit: TokenAmount::from_tokens(10),
            application_fee: TokenAmount::from_tokens(10),
            charter: ContentHash::ZERO,
            categories: ContentHash::ZERO,
            starting_challenge_counter: 1,
        }
    }
}
