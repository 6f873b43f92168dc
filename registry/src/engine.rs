//! Core curation engine: onboarding, challenges, voting and resolution.
//!
//! Every operation validates all of its preconditions before touching any
//! state, so a failed call leaves the engine exactly as it found it. Time is
//! passed in explicitly; the engine never reads a clock.

use crate::authorization::{
    AuthorizationFailure, AuthorizationPurpose, FailureReason, OnboardingBundle, SignatureBatchVerifier,
};
use crate::challenge::{Challenge, ChallengeOutcome, ChallengeState};
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::outcomes::Payout;
use crate::voting::{vote_weight, VoteChoice, VoteRecord};
use std::collections::BTreeMap;
use tcr_identity::IdentityDirectory;
use tcr_store::{Member, MembershipStore, MemoryMembershipStore, MemoryStakeVault, StakeVault};
use tcr_token::TokenLedger;
use tcr_types::{Address, ContentHash, IdentityId, RegistryConfig, Timestamp, TokenAmount};

/// State an engine operates on. Handed from one engine to its successor.
pub struct EngineParts {
    pub directory: IdentityDirectory,
    pub ledger: TokenLedger,
    pub membership: Box<dyn MembershipStore>,
    pub vault: Box<dyn StakeVault>,
    /// Lowest id the next engine may give a challenge.
    pub next_challenge_id: u64,
}

impl EngineParts {
    /// Empty in-memory stores owned by `engine`, escrowing at `vault_address`.
    pub fn fresh(directory: IdentityDirectory, ledger: TokenLedger, engine: &Address, vault_address: Address) -> Self {
        Self {
            directory,
            ledger,
            membership: Box::new(MemoryMembershipStore::new(engine.clone())),
            vault: Box::new(MemoryStakeVault::new(vault_address, engine.clone())),
            next_challenge_id: 0,
        }
    }
}

pub struct CurationEngine {
    /// Address the engine acts as: store owner and permit spender.
    pub(crate) address: Address,
    pub(crate) admin: Address,
    pub(crate) config: RegistryConfig,
    pub(crate) directory: IdentityDirectory,
    pub(crate) ledger: TokenLedger,
    pub(crate) membership: Box<dyn MembershipStore>,
    pub(crate) vault: Box<dyn StakeVault>,
    pub(crate) challenges: BTreeMap<u64, Challenge>,
    pub(crate) votes: BTreeMap<(u64, IdentityId), VoteRecord>,
    pub(crate) next_challenge_id: u64,
    pub(crate) pending_events: Vec<RegistryEvent>,
}

impl CurationEngine {
    /// Build an engine over `parts`. Both stores must already be owned by
    /// `address`, and the vault's token account must be escrow held by
    /// `address` or not yet escrow (it is locked here). Challenge ids start at
    /// `config.starting_challenge_counter`, or past the predecessor's last id
    /// if that is higher.
    pub fn new(
        address: Address,
        admin: Address,
        config: RegistryConfig,
        mut parts: EngineParts,
    ) -> Result<Self, RegistryError> {
        if parts.membership.owner() != &address || parts.vault.owner() != &address {
            return Err(RegistryError::NotOwner { caller: address });
        }
        match parts.ledger.escrow_custodian(parts.vault.address()).cloned() {
            None => parts.ledger.open_escrow(parts.vault.address(), &address)?,
            Some(custodian) if custodian == address => {}
            Some(_) => return Err(RegistryError::NotOwner { caller: address }),
        }
        let next_challenge_id = config.starting_challenge_counter.max(parts.next_challenge_id);
        tracing::info!(
            engine = %address,
            admin = %admin,
            members = parts.membership.len(),
            next_challenge_id,
            "curation engine started"
        );
        Ok(Self {
            next_challenge_id,
            address,
            admin,
            config,
            directory: parts.directory,
            ledger: parts.ledger,
            membership: parts.membership,
            vault: parts.vault,
            challenges: BTreeMap::new(),
            votes: BTreeMap::new(),
            pending_events: Vec::new(),
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// The directory authenticates its own callers.
    pub fn directory_mut(&mut self) -> &mut IdentityDirectory {
        &mut self.directory
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    /// The ledger authenticates its own callers.
    pub fn ledger_mut(&mut self) -> &mut TokenLedger {
        &mut self.ledger
    }

    pub fn member(&self, identity: &IdentityId) -> Option<Member> {
        self.membership.get(identity)
    }

    pub fn is_member(&self, identity: &IdentityId) -> bool {
        self.membership.contains(identity)
    }

    pub fn member_count(&self) -> usize {
        self.membership.len()
    }

    pub fn members(&self) -> Vec<Member> {
        self.membership.members()
    }

    pub fn challenge_record(&self, challenge_id: u64) -> Option<&Challenge> {
        self.challenges.get(&challenge_id)
    }

    pub fn challenge_state(&self, challenge_id: u64, now: Timestamp) -> Option<ChallengeState> {
        self.challenges.get(&challenge_id).map(|c| c.state(now))
    }

    pub fn vote(&self, challenge_id: u64, voter: &IdentityId) -> Option<&VoteRecord> {
        self.votes.get(&(challenge_id, *voter))
    }

    pub fn votes_on(&self, challenge_id: u64) -> Vec<&VoteRecord> {
        self.votes
            .range((challenge_id, IdentityId::new([0; 32]))..=(challenge_id, IdentityId::new([0xFF; 32])))
            .map(|(_, v)| v)
            .collect()
    }

    pub fn vault_address(&self) -> &Address {
        self.vault.address()
    }

    pub fn vault_balance(&self) -> TokenAmount {
        self.vault.balance()
    }

    /// Id the next challenge will get.
    pub fn next_challenge_id(&self) -> u64 {
        self.next_challenge_id
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Onboarding and exit ───────────────────────────────────────────────

    /// Admit `bundle.identity`, owned by `bundle.owner`, in one step: transfer
    /// ownership, publish the attribute, apply the permit and pull the fee.
    pub fn onboard(&mut self, bundle: &OnboardingBundle, now: Timestamp) -> Result<(), RegistryError> {
        self.ensure_operator()?;
        let identity = bundle.identity;
        if self.membership.contains(&identity) {
            return Err(RegistryError::AlreadyMember(identity));
        }
        let terms = bundle.check_terms(&self.address)?;
        SignatureBatchVerifier::new(&self.directory, &self.ledger).verify(&bundle.authorizations(), now)?;

        let fee = self.config.application_fee;
        self.ledger
            .check_transfer_from(&self.address, &bundle.owner, fee, Some(terms.permit))?;
        self.check_vault_room(fee)?;

        self.directory
            .change_owner_signed(&identity, &bundle.owner, &bundle.ownership.signature)
            .map_err(|_| rejected(0, AuthorizationPurpose::OwnershipTransfer))?;
        self.directory
            .set_attribute_signed(
                &identity,
                &bundle.attribute_key,
                &bundle.attribute_value,
                terms.attribute_validity_secs,
                &bundle.attribute.signature,
                now,
            )
            .map_err(|_| rejected(1, AuthorizationPurpose::AttributePublication))?;
        self.ledger.permit(terms.permit, &bundle.payment.signature, now)?;
        self.collect(&bundle.owner, fee)?;
        self.membership
            .insert(&self.address, Member::new(identity, bundle.owner.clone(), now))?;

        tracing::info!(identity = %identity, owner = %bundle.owner, fee = %fee, "member admitted");
        self.pending_events.push(RegistryEvent::MemberAdmitted {
            identity,
            owner: bundle.owner.clone(),
            admission_time: now,
            fee_paid: fee,
        });
        Ok(())
    }

    /// Leave the registry. The fee is not refunded.
    pub fn exit(&mut self, caller: &Address, identity: &IdentityId) -> Result<(), RegistryError> {
        self.ensure_operator()?;
        let member = self
            .membership
            .get(identity)
            .ok_or(RegistryError::NotAMember(*identity))?;
        if self.directory.owner_of(identity) != *caller {
            return Err(RegistryError::NotOwner { caller: caller.clone() });
        }
        if member.is_challenged() {
            return Err(RegistryError::ChallengeInProgress(*identity));
        }
        self.membership.remove(&self.address, identity)?;

        tracing::info!(identity = %identity, "member exited");
        self.pending_events.push(RegistryEvent::MemberExited { identity: *identity });
        Ok(())
    }

    // ── Challenges ────────────────────────────────────────────────────────

    /// Open a challenge against `target` on behalf of member `challenger`,
    /// locking the challenge deposit from `caller`. Returns the new id.
    pub fn challenge(
        &mut self,
        caller: &Address,
        challenger: &IdentityId,
        target: &IdentityId,
        details: ContentHash,
        now: Timestamp,
    ) -> Result<u64, RegistryError> {
        self.ensure_operator()?;
        if challenger == target {
            return Err(RegistryError::CannotChallengeSelf);
        }
        if !self.membership.contains(challenger) || self.directory.owner_of(challenger) != *caller {
            return Err(RegistryError::ChallengerNotMember(*challenger));
        }
        let target_record = self
            .membership
            .get(target)
            .ok_or(RegistryError::TargetNotMember(*target))?;
        if let Some(open) = target_record.active_challenge {
            return Err(RegistryError::ChallengeAlreadyOpen {
                target: *target,
                challenge_id: open,
            });
        }
        let deposit = self.config.challenge_deposit;
        self.ledger.check_transfer_from(&self.address, caller, deposit, None)?;
        self.check_vault_room(deposit)?;

        let id = self.next_challenge_id;
        self.collect(caller, deposit)?;
        self.membership.set_active_challenge(&self.address, target, Some(id))?;
        let challenge = Challenge::new(id, *target, *challenger, details, now, self.config.voting_period_secs);
        let end_time = challenge.end_time;
        self.challenges.insert(id, challenge);
        self.next_challenge_id += 1;

        tracing::info!(challenge_id = id, target = %target, challenger = %challenger, end_time = %end_time, "challenge opened");
        self.pending_events.push(RegistryEvent::ChallengeOpened {
            challenge_id: id,
            target: *target,
            challenger: *challenger,
            end_time,
            details,
        });
        Ok(id)
    }

    // ── Voting ────────────────────────────────────────────────────────────

    /// Cast one vote for member `voter`. `caller` must own the voter's
    /// identity or be one of its valid delegates. Returns the vote weight.
    pub fn submit_vote(
        &mut self,
        caller: &Address,
        challenge_id: u64,
        voter: &IdentityId,
        choice: u8,
        now: Timestamp,
    ) -> Result<u64, RegistryError> {
        let record = self.check_vote(caller, challenge_id, voter, choice, now, &[])?;
        let weight = record.weight;
        self.apply_vote(record);
        Ok(weight)
    }

    /// Cast several votes at once. Either every vote is recorded or none is.
    pub fn submit_votes(
        &mut self,
        caller: &Address,
        challenge_ids: &[u64],
        voters: &[IdentityId],
        choices: &[u8],
        now: Timestamp,
    ) -> Result<Vec<u64>, RegistryError> {
        if challenge_ids.len() != voters.len() || voters.len() != choices.len() {
            return Err(RegistryError::ArrayLengthMismatch);
        }
        let mut prepared: Vec<VoteRecord> = Vec::with_capacity(voters.len());
        for ((challenge_id, voter), choice) in challenge_ids.iter().zip(voters).zip(choices) {
            let record = self.check_vote(caller, *challenge_id, voter, *choice, now, &prepared)?;
            prepared.push(record);
        }
        let weights = prepared.iter().map(|r| r.weight).collect();
        for record in prepared {
            self.apply_vote(record);
        }
        Ok(weights)
    }

    fn check_vote(
        &self,
        caller: &Address,
        challenge_id: u64,
        voter: &IdentityId,
        choice: u8,
        now: Timestamp,
        batch: &[VoteRecord],
    ) -> Result<VoteRecord, RegistryError> {
        let challenge = self
            .challenges
            .get(&challenge_id)
            .ok_or(RegistryError::NoSuchChallenge(challenge_id))?;
        match challenge.state(now) {
            ChallengeState::Open => {}
            ChallengeState::Expired => return Err(RegistryError::VotingClosed(challenge_id)),
            ChallengeState::Resolved => return Err(RegistryError::AlreadyResolved(challenge_id)),
        }

        let member = self.membership.get(voter).ok_or(RegistryError::NotAMember(*voter))?;
        let acting_delegate = if self.directory.owner_of(voter) == *caller {
            None
        } else if self.directory.is_delegate(voter, caller, now) {
            Some(caller.clone())
        } else {
            return Err(RegistryError::NotAMember(*voter));
        };

        if challenge.target == *voter {
            return Err(RegistryError::SelfVoteForbidden);
        }
        let seen_in_batch = batch
            .iter()
            .any(|r| r.challenge_id == challenge_id && r.voter == *voter);
        if seen_in_batch || self.votes.contains_key(&(challenge_id, *voter)) {
            return Err(RegistryError::AlreadyVoted {
                challenge_id,
                voter: *voter,
            });
        }
        let choice = VoteChoice::try_from(choice)?;

        Ok(VoteRecord {
            challenge_id,
            voter: *voter,
            choice,
            weight: vote_weight(challenge.end_time, member.admission_time),
            acting_delegate,
            cast_at: now,
        })
    }

    fn apply_vote(&mut self, record: VoteRecord) {
        if let Some(challenge) = self.challenges.get_mut(&record.challenge_id) {
            challenge.record(record.choice, record.weight);
        }
        tracing::debug!(
            challenge_id = record.challenge_id,
            voter = %record.voter,
            choice = %record.choice,
            weight = record.weight,
            "vote cast"
        );
        self.pending_events.push(RegistryEvent::VoteCast {
            challenge_id: record.challenge_id,
            voter: record.voter,
            choice: record.choice,
            weight: record.weight,
            acting_delegate: record.acting_delegate.clone(),
        });
        self.votes.insert((record.challenge_id, record.voter), record);
    }

    // ── Resolution ────────────────────────────────────────────────────────

    /// Settle an expired challenge. Anyone may call; `caller` receives the
    /// resolver reward.
    pub fn resolve_challenge(
        &mut self,
        caller: &Address,
        challenge_id: u64,
        now: Timestamp,
    ) -> Result<ChallengeOutcome, RegistryError> {
        self.ensure_operator()?;
        let challenge = self
            .challenges
            .get(&challenge_id)
            .ok_or(RegistryError::NoSuchChallenge(challenge_id))?;
        match challenge.state(now) {
            ChallengeState::Expired => {}
            ChallengeState::Resolved => return Err(RegistryError::AlreadyResolved(challenge_id)),
            ChallengeState::Open => {
                return Err(RegistryError::VotingStillOpen {
                    challenge_id,
                    end_time: challenge.end_time,
                })
            }
        }
        let target = challenge.target;
        let challenger = challenge.challenger;
        let outcome = challenge.decide();

        let available = self.vault.balance();
        let payout = Payout::compute(outcome, &self.config).ok_or(RegistryError::InsufficientVaultBalance {
            needed: TokenAmount::MAX,
            available,
        })?;
        self.check_vault_covers(payout.total())?;

        let challenger_owner = self.directory.owner_of(&challenger);
        match outcome {
            ChallengeOutcome::Succeeded => {
                self.membership.remove(&self.address, &target)?;
            }
            ChallengeOutcome::Failed => {
                self.membership.set_active_challenge(&self.address, &target, None)?;
            }
        }
        self.release(&challenger_owner, payout.to_challenger)?;
        self.release(caller, payout.to_resolver)?;
        if let Some(challenge) = self.challenges.get_mut(&challenge_id) {
            challenge.resolved = true;
            challenge.outcome = Some(outcome);
        }

        tracing::info!(challenge_id, outcome = ?outcome, resolver = %caller, "challenge resolved");
        self.pending_events.push(match outcome {
            ChallengeOutcome::Succeeded => RegistryEvent::ChallengeSucceeded {
                challenge_id,
                resolver: caller.clone(),
                reward: payout.to_resolver,
                challenger_payout: payout.to_challenger,
            },
            ChallengeOutcome::Failed => RegistryEvent::ChallengeFailed {
                challenge_id,
                resolver: caller.clone(),
                reward: payout.to_resolver,
            },
        });
        Ok(outcome)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Fails once the stores have been handed to another engine.
    pub(crate) fn ensure_operator(&self) -> Result<(), RegistryError> {
        if self.membership.owner() != &self.address || self.vault.owner() != &self.address {
            return Err(RegistryError::NotOwner {
                caller: self.address.clone(),
            });
        }
        Ok(())
    }

    fn check_vault_room(&self, amount: TokenAmount) -> Result<(), RegistryError> {
        self.vault
            .balance()
            .checked_add(amount)
            .map(|_| ())
            .ok_or(RegistryError::PaymentFailed(tcr_token::TokenError::Overflow))
    }

    pub(crate) fn check_vault_covers(&self, amount: TokenAmount) -> Result<(), RegistryError> {
        let available = self.vault.balance().min(self.ledger.balance_of(self.vault.address()));
        if available < amount {
            return Err(RegistryError::InsufficientVaultBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Pull `amount` from `payer` into the vault against the engine's allowance.
    fn collect(&mut self, payer: &Address, amount: TokenAmount) -> Result<(), RegistryError> {
        self.ledger
            .transfer_from(&self.address, payer, self.vault.address(), amount)?;
        self.vault.deposit(&self.address, amount)?;
        Ok(())
    }

    /// Pay `amount` out of the vault. Callers check coverage first.
    pub(crate) fn release(&mut self, to: &Address, amount: TokenAmount) -> Result<(), RegistryError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.ledger
            .release_escrow(&self.address, self.vault.address(), to, amount)?;
        self.vault.withdraw(&self.address, amount)?;
        Ok(())
    }
}

fn rejected(index: usize, purpose: AuthorizationPurpose) -> RegistryError {
    RegistryError::InvalidAuthorization(AuthorizationFailure {
        index,
        purpose,
        reason: FailureReason::BadSignature,
    })
}
