//! Administrator operations: configuration, withdrawals and succession.

use crate::engine::{CurationEngine, EngineParts};
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use serde::{Deserialize, Serialize};
use tcr_types::{Address, ContentHash, TokenAmount};

/// One configuration field and its new value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ConfigChange {
    Charter(ContentHash),
    Categories(ContentHash),
    VotingPeriodSecs(u64),
    ChallengeDeposit(TokenAmount),
    ApplicationFee(TokenAmount),
}

impl CurationEngine {
    fn require_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.admin {
            return Err(RegistryError::NotOwner { caller: caller.clone() });
        }
        Ok(())
    }

    /// Apply a configuration change. Values are taken as given.
    pub fn update_config(&mut self, caller: &Address, change: ConfigChange) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        match &change {
            ConfigChange::Charter(hash) => self.config.charter = *hash,
            ConfigChange::Categories(hash) => self.config.categories = *hash,
            ConfigChange::VotingPeriodSecs(secs) => self.config.voting_period_secs = *secs,
            ConfigChange::ChallengeDeposit(amount) => self.config.challenge_deposit = *amount,
            ConfigChange::ApplicationFee(amount) => self.config.application_fee = *amount,
        }
        tracing::info!(change = ?change, "config updated");
        self.pending_events.push(RegistryEvent::ConfigUpdated { change });
        Ok(())
    }

    /// Move `amount` out of the vault to `to`.
    pub fn withdraw(&mut self, caller: &Address, amount: TokenAmount, to: &Address) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        self.ensure_operator()?;
        self.check_vault_covers(amount)?;
        self.release(to, amount)?;
        tracing::info!(to = %to, amount = %amount, "funds withdrawn");
        self.pending_events.push(RegistryEvent::FundsWithdrawn {
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    pub fn transfer_admin(&mut self, caller: &Address, new_admin: &Address) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        let previous = std::mem::replace(&mut self.admin, new_admin.clone());
        tracing::info!(previous = %previous, admin = %new_admin, "admin transferred");
        self.pending_events.push(RegistryEvent::AdminTransferred {
            previous,
            admin: new_admin.clone(),
        });
        Ok(())
    }

    /// Give the membership store, the vault and custody of the vault's token
    /// account to `successor`. Refused while any
    /// challenge is unresolved. Afterwards every store-touching operation on
    /// this engine fails with `NotOwner`; take the state out with
    /// [`CurationEngine::into_parts`].
    pub fn hand_over(&mut self, caller: &Address, successor: &Address) -> Result<(), RegistryError> {
        self.require_admin(caller)?;
        self.ensure_operator()?;
        if let Some(open) = self.challenges.values().find(|c| !c.resolved) {
            return Err(RegistryError::ChallengeInProgress(open.target));
        }
        self.ledger
            .pass_escrow(&self.address, self.vault.address(), successor)?;
        self.membership.transfer_ownership(&self.address, successor)?;
        self.vault.transfer_ownership(&self.address, successor)?;
        tracing::info!(successor = %successor, last_challenge_id = self.next_challenge_id.saturating_sub(1), "stores handed over");
        self.pending_events.push(RegistryEvent::HandedOver {
            successor: successor.clone(),
        });
        Ok(())
    }

    pub fn into_parts(self) -> EngineParts {
        EngineParts {
            directory: self.directory,
            ledger: self.ledger,
            membership: self.membership,
            vault: self.vault,
            next_challenge_id: self.next_challenge_id,
        }
    }
}
