//! Resolution payouts.

use crate::challenge::ChallengeOutcome;
use tcr_types::{RegistryConfig, TokenAmount};

/// Who gets paid out of the vault when a challenge is resolved.
///
/// Amounts come from the configuration in force at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub outcome: ChallengeOutcome,
    /// Paid to the challenger's owner. Zero when the challenge failed.
    pub to_challenger: TokenAmount,
    /// Paid to whoever resolved the challenge.
    pub to_resolver: TokenAmount,
}

impl Payout {
    /// `None` if deposit plus fee overflows.
    pub fn compute(outcome: ChallengeOutcome, config: &RegistryConfig) -> Option<Self> {
        let reward = config.challenge_reward();
        let to_challenger = match outcome {
            ChallengeOutcome::Succeeded => config.success_payout()?.checked_sub(reward)?,
            ChallengeOutcome::Failed => TokenAmount::ZERO,
        };
        Some(Self {
            outcome,
            to_challenger,
            to_resolver: reward,
        })
    }

    /// Total debited from the vault.
    pub fn total(&self) -> TokenAmount {
        self.to_challenger + self.to_resolver
    }
}
