//! Operation log entries.
//!
//! One JSON object per line: a timestamp `at` plus an `op` tag naming the
//! operation and its arguments.
//!
//! ```text
//! {"at":1000,"op":"challenge","caller":"tcr_...","challenger":"ab..","target":"cd.."}
//! {"at":173800,"op":"resolve","caller":"tcr_...","challenge_id":1}
//! ```

use serde::{Deserialize, Serialize};
use tcr_identity::IdentityError;
use tcr_registry::{ChallengeOutcome, ConfigChange, CurationEngine, OnboardingBundle, RegistryError};
use tcr_token::{Permit, TokenError};
use tcr_types::{Address, ContentHash, IdentityId, Signature, Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: Timestamp,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Onboard {
        bundle: OnboardingBundle,
    },
    Exit {
        caller: Address,
        identity: IdentityId,
    },
    Challenge {
        caller: Address,
        challenger: IdentityId,
        target: IdentityId,
        #[serde(default)]
        details: ContentHash,
    },
    Vote {
        caller: Address,
        challenge_id: u64,
        voter: IdentityId,
        choice: u8,
    },
    Votes {
        caller: Address,
        challenge_ids: Vec<u64>,
        voters: Vec<IdentityId>,
        choices: Vec<u8>,
    },
    Resolve {
        caller: Address,
        challenge_id: u64,
    },
    UpdateConfig {
        caller: Address,
        change: ConfigChange,
    },
    Withdraw {
        caller: Address,
        amount: TokenAmount,
        to: Address,
    },
    TransferAdmin {
        caller: Address,
        new_admin: Address,
    },
    Transfer {
        caller: Address,
        to: Address,
        amount: TokenAmount,
    },
    Approve {
        caller: Address,
        spender: Address,
        amount: TokenAmount,
    },
    Permit {
        permit: Permit,
        signature: Signature,
    },
    ChangeOwner {
        caller: Address,
        identity: IdentityId,
        new_owner: Address,
    },
    AddDelegate {
        caller: Address,
        identity: IdentityId,
        delegate: Address,
        validity_secs: u64,
    },
    RevokeDelegate {
        caller: Address,
        identity: IdentityId,
        delegate: Address,
    },
}

/// What a committed operation returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OpOutput {
    None,
    ChallengeId(u64),
    Weight(u64),
    Weights(Vec<u64>),
    Outcome(ChallengeOutcome),
}

/// Why an operation was refused. The registry state is unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Directory(#[from] IdentityError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.kind(),
            Self::Directory(e) => e.kind(),
            Self::Token(e) => e.kind(),
        }
    }
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Onboard { .. } => "onboard",
            Self::Exit { .. } => "exit",
            Self::Challenge { .. } => "challenge",
            Self::Vote { .. } => "vote",
            Self::Votes { .. } => "votes",
            Self::Resolve { .. } => "resolve",
            Self::UpdateConfig { .. } => "update_config",
            Self::Withdraw { .. } => "withdraw",
            Self::TransferAdmin { .. } => "transfer_admin",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::Permit { .. } => "permit",
            Self::ChangeOwner { .. } => "change_owner",
            Self::AddDelegate { .. } => "add_delegate",
            Self::RevokeDelegate { .. } => "revoke_delegate",
        }
    }

    pub fn apply(self, engine: &mut CurationEngine, now: Timestamp) -> Result<OpOutput, Rejection> {
        let output = match self {
            Self::Onboard { bundle } => {
                engine.onboard(&bundle, now)?;
                OpOutput::None
            }
            Self::Exit { caller, identity } => {
                engine.exit(&caller, &identity)?;
                OpOutput::None
            }
            Self::Challenge {
                caller,
                challenger,
                target,
                details,
            } => OpOutput::ChallengeId(engine.challenge(&caller, &challenger, &target, details, now)?),
            Self::Vote {
                caller,
                challenge_id,
                voter,
                choice,
            } => OpOutput::Weight(engine.submit_vote(&caller, challenge_id, &voter, choice, now)?),
            Self::Votes {
                caller,
                challenge_ids,
                voters,
                choices,
            } => OpOutput::Weights(engine.submit_votes(&caller, &challenge_ids, &voters, &choices, now)?),
            Self::Resolve { caller, challenge_id } => {
                OpOutput::Outcome(engine.resolve_challenge(&caller, challenge_id, now)?)
            }
            Self::UpdateConfig { caller, change } => {
                engine.update_config(&caller, change)?;
                OpOutput::None
            }
            Self::Withdraw { caller, amount, to } => {
                engine.withdraw(&caller, amount, &to)?;
                OpOutput::None
            }
            Self::TransferAdmin { caller, new_admin } => {
                engine.transfer_admin(&caller, &new_admin)?;
                OpOutput::None
            }
            Self::Transfer { caller, to, amount } => {
                engine.ledger_mut().transfer(&caller, &to, amount)?;
                OpOutput::None
            }
            Self::Approve { caller, spender, amount } => {
                engine.ledger_mut().approve(&caller, &spender, amount)?;
                OpOutput::None
            }
            Self::Permit { permit, signature } => {
                engine.ledger_mut().permit(&permit, &signature, now)?;
                OpOutput::None
            }
            Self::ChangeOwner {
                caller,
                identity,
                new_owner,
            } => {
                engine.directory_mut().change_owner(&caller, &identity, &new_owner)?;
                OpOutput::None
            }
            Self::AddDelegate {
                caller,
                identity,
                delegate,
                validity_secs,
            } => {
                engine
                    .directory_mut()
                    .add_delegate(&caller, &identity, &delegate, validity_secs, now)?;
                OpOutput::None
            }
            Self::RevokeDelegate {
                caller,
                identity,
                delegate,
            } => {
                engine.directory_mut().revoke_delegate(&caller, &identity, &delegate, now)?;
                OpOutput::None
            }
        };
        Ok(output)
    }
}
