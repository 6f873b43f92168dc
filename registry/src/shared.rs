//! Single-writer registry handle.
//!
//! All mutating calls go through one lock, so operations are applied one at
//! a time in a total order. Each committed operation gets the next sequence
//! number and carries the events it emitted; rejected operations consume no
//! sequence number.

use crate::admin::ConfigChange;
use crate::authorization::OnboardingBundle;
use crate::challenge::ChallengeOutcome;
use crate::engine::CurationEngine;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::snapshot::EngineSnapshot;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tcr_identity::DirectoryEvent;
use tcr_types::{Address, Clock, ContentHash, IdentityId, Timestamp, TokenAmount};

/// Result of one committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt<T> {
    pub sequence: u64,
    pub at: Timestamp,
    pub value: T,
    pub events: Vec<RegistryEvent>,
    pub directory_events: Vec<DirectoryEvent>,
}

struct Sequenced {
    engine: CurationEngine,
    sequence: u64,
}

pub struct Registry {
    state: Mutex<Sequenced>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(engine: CurationEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(Sequenced { engine, sequence: 0 }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sequenced> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` at the clock's current time.
    pub fn execute<T, E>(
        &self,
        op: impl FnOnce(&mut CurationEngine, Timestamp) -> Result<T, E>,
    ) -> Result<Receipt<T>, E> {
        self.execute_at(self.clock.now(), op)
    }

    /// Run `op` at an explicit time (log replay). A failed `op` must leave
    /// the engine untouched; it consumes no sequence number.
    pub fn execute_at<T, E>(
        &self,
        now: Timestamp,
        op: impl FnOnce(&mut CurationEngine, Timestamp) -> Result<T, E>,
    ) -> Result<Receipt<T>, E> {
        let mut state = self.lock();
        let value = op(&mut state.engine, now)?;
        state.sequence += 1;
        let sequence = state.sequence;
        let events = state.engine.take_events();
        let directory_events = state.engine.directory_mut().take_events();
        Ok(Receipt {
            sequence,
            at: now,
            value,
            events,
            directory_events,
        })
    }

    /// Read-only access under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&CurationEngine) -> T) -> T {
        f(&self.lock().engine)
    }

    /// Sequence number of the last committed operation.
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.lock().engine.snapshot()
    }

    pub fn into_engine(self) -> CurationEngine {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner).engine
    }

    pub fn onboard(&self, bundle: &OnboardingBundle) -> Result<Receipt<()>, RegistryError> {
        self.execute(|engine, now| engine.onboard(bundle, now))
    }

    pub fn exit(&self, caller: &Address, identity: &IdentityId) -> Result<Receipt<()>, RegistryError> {
        self.execute(|engine, _| engine.exit(caller, identity))
    }

    pub fn challenge(
        &self,
        caller: &Address,
        challenger: &IdentityId,
        target: &IdentityId,
        details: ContentHash,
    ) -> Result<Receipt<u64>, RegistryError> {
        self.execute(|engine, now| engine.challenge(caller, challenger, target, details, now))
    }

    pub fn submit_vote(
        &self,
        caller: &Address,
        challenge_id: u64,
        voter: &IdentityId,
        choice: u8,
    ) -> Result<Receipt<u64>, RegistryError> {
        self.execute(|engine, now| engine.submit_vote(caller, challenge_id, voter, choice, now))
    }

    pub fn submit_votes(
        &self,
        caller: &Address,
        challenge_ids: &[u64],
        voters: &[IdentityId],
        choices: &[u8],
    ) -> Result<Receipt<Vec<u64>>, RegistryError> {
        self.execute(|engine, now| engine.submit_votes(caller, challenge_ids, voters, choices, now))
    }

    pub fn resolve_challenge(&self, caller: &Address, challenge_id: u64) -> Result<Receipt<ChallengeOutcome>, RegistryError> {
        self.execute(|engine, now| engine.resolve_challenge(caller, challenge_id, now))
    }

    pub fn update_config(&self, caller: &Address, change: ConfigChange) -> Result<Receipt<()>, RegistryError> {
        self.execute(|engine, _| engine.update_config(caller, change))
    }

    pub fn withdraw(&self, caller: &Address, amount: TokenAmount, to: &Address) -> Result<Receipt<()>, RegistryError> {
        self.execute(|engine, _| engine.withdraw(caller, amount, to))
    }

    pub fn transfer_admin(&self, caller: &Address, new_admin: &Address) -> Result<Receipt<()>, RegistryError> {
        self.execute(|engine, _| engine.transfer_admin(caller, new_admin))
    }
}
