//! End-to-end scenarios through the locked registry handle:
//! onboarding → challenge → weighted votes → resolution → payouts.

use std::sync::Arc;

use tcr_identity::IdentityDirectory;
use tcr_nullables::{seeded_address, NullClock, TestActor};
use tcr_registry::{
    AuthorizationPurpose, ChallengeOutcome, ChallengeState, CurationEngine, EngineParts, EngineSnapshot,
    FailureReason, OnboardingBundle, OnboardingTerms, Registry, RegistryError, RegistryEvent, VoteChoice,
};
use tcr_token::TokenLedger;
use tcr_types::{Address, ContentHash, IdentityId, RegistryConfig, Timestamp, TokenAmount};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ADMIN: u8 = 0xAD;
const ENGINE: u8 = 0xE0;
const VAULT: u8 = 0xE1;

struct Harness {
    clock: Arc<NullClock>,
    registry: Registry,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    fn with_config(config: RegistryConfig) -> Self {
        let clock = Arc::new(NullClock::new(0));
        let engine_address = seeded_address(ENGINE);
        let parts = EngineParts::fresh(
            IdentityDirectory::new("scenario-directory"),
            TokenLedger::new("scenario-token"),
            &engine_address,
            seeded_address(VAULT),
        );
        let engine = CurationEngine::new(engine_address, seeded_address(ADMIN), config, parts).unwrap();
        Self {
            registry: Registry::new(engine, clock.clone()),
            clock,
        }
    }

    fn at(&self, secs: u64) -> &Self {
        self.clock.set(secs);
        self
    }

    fn fund(&self, to: &Address, tokens: u128) {
        self.registry
            .execute(|engine, _| {
                engine
                    .ledger_mut()
                    .mint(to, TokenAmount::from_tokens(tokens))
                    .map_err(RegistryError::from)
            })
            .unwrap();
    }

    fn bundle(&self, actor: &TestActor, permit_nonce_offset: u64) -> OnboardingBundle {
        self.registry.read(|engine| {
            let identity = actor.identity();
            let terms = OnboardingTerms {
                identity,
                attribute_key: "profile".into(),
                attribute_value: identity.as_bytes().to_vec(),
                attribute_validity_secs: 10 * 365 * 24 * 3600,
                identity_nonce: engine.directory().nonce(&identity),
                permit_nonce: engine.ledger().permit_nonce(&actor.owner_address()) + permit_nonce_offset,
                permit_expiry: Timestamp::EPOCH,
            };
            OnboardingBundle::sign(
                &terms,
                &actor.throwaway,
                &actor.owner,
                engine.address(),
                engine.directory().domain(),
                engine.ledger().domain(),
            )
        })
    }

    /// Fund the actor's owner with 100 tokens and onboard it at the current time.
    fn admit(&self, actor: &TestActor) -> IdentityId {
        self.fund(&actor.owner_address(), 100);
        self.registry.onboard(&self.bundle(actor, 0)).unwrap();
        actor.identity()
    }

    fn open_challenge(&self, challenger: &TestActor, target: &TestActor) -> u64 {
        self.registry
            .challenge(
                &challenger.owner_address(),
                &challenger.identity(),
                &target.identity(),
                ContentHash::new([0x0D; 32]),
            )
            .unwrap()
            .value
    }

    fn vote(&self, voter: &TestActor, challenge_id: u64, choice: VoteChoice) -> Result<u64, RegistryError> {
        self.registry
            .submit_vote(&voter.owner_address(), challenge_id, &voter.identity(), choice.as_byte())
            .map(|r| r.value)
    }

    fn balance(&self, who: &Address) -> TokenAmount {
        self.registry.read(|engine| engine.ledger().balance_of(who))
    }

    fn vault(&self) -> TokenAmount {
        self.registry.read(|engine| engine.vault_balance())
    }

    fn assert_vault_backed(&self) {
        self.registry.read(|engine| {
            assert_eq!(engine.ledger().balance_of(engine.vault_address()), engine.vault_balance());
        });
    }
}

// ---------------------------------------------------------------------------
// Scenario A: tenure-weighted vote
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_weight_from_tenure() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));

    h.at(0).admit(&member);
    h.at(0).admit(&challenger);
    h.at(500).admit(&voter);
    assert_eq!(h.vault(), TokenAmount::from_tokens(30));

    let id = h.at(1000).open_challenge(&challenger, &member);
    let challenge = h.registry.read(|e| e.challenge_record(id).cloned()).unwrap();
    assert_eq!(challenge.end_time, Timestamp::new(173_800));

    let weight = h.at(2000).vote(&voter, id, VoteChoice::Yes).unwrap();
    assert_eq!(weight, 416);
    let tally = h.registry.read(|e| e.challenge_record(id).map(|c| (c.votes_for, c.votes_against)));
    assert_eq!(tally, Some((416, 0)));
}

// ---------------------------------------------------------------------------
// Scenario B: vote exclusivity
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_one_vote_per_member() {
    let h = Harness::new();
    let (member, challenger, v1, v2) = (TestActor::new(1), TestActor::new(2), TestActor::new(3), TestActor::new(4));
    for actor in [&member, &challenger, &v1, &v2] {
        h.at(0).admit(actor);
    }
    let id = h.at(100).open_challenge(&challenger, &member);

    h.at(200).vote(&v1, id, VoteChoice::Yes).unwrap();
    h.at(200).vote(&v2, id, VoteChoice::No).unwrap();
    assert_eq!(
        h.vote(&v1, id, VoteChoice::No),
        Err(RegistryError::AlreadyVoted {
            challenge_id: id,
            voter: v1.identity(),
        })
    );

    let (for_, against) = h.registry.read(|e| {
        let c = e.challenge_record(id).unwrap();
        (c.votes_for, c.votes_against)
    });
    assert_eq!(for_, against);
    assert_eq!(h.registry.read(|e| e.votes_on(id).len()), 2);
}

// ---------------------------------------------------------------------------
// Scenario C: resolution timing and idempotence
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_resolve_once_after_end() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));
    for actor in [&member, &challenger, &voter] {
        h.at(0).admit(actor);
    }
    let id = h.at(1000).open_challenge(&challenger, &member);
    h.at(1500).vote(&voter, id, VoteChoice::Yes).unwrap();

    let resolver = seeded_address(0x50);
    assert_eq!(
        h.at(173_799).registry.resolve_challenge(&resolver, id).unwrap_err(),
        RegistryError::VotingStillOpen {
            challenge_id: id,
            end_time: Timestamp::new(173_800),
        }
    );
    assert_eq!(
        h.registry.read(|e| e.challenge_state(id, Timestamp::new(173_800))),
        Some(ChallengeState::Expired)
    );

    let challenger_before = h.balance(&challenger.owner_address());
    let receipt = h.at(173_800).registry.resolve_challenge(&resolver, id).unwrap();
    assert_eq!(receipt.value, ChallengeOutcome::Succeeded);
    assert!(matches!(receipt.events[0], RegistryEvent::ChallengeSucceeded { .. }));
    assert!(!h.registry.read(|e| e.is_member(&member.identity())));
    assert_eq!(h.balance(&resolver), TokenAmount::from_tokens(1));
    assert_eq!(
        h.balance(&challenger.owner_address()),
        challenger_before + TokenAmount::from_tokens(19)
    );

    assert_eq!(
        h.registry.resolve_challenge(&resolver, id).unwrap_err(),
        RegistryError::AlreadyResolved(id)
    );
    assert_eq!(h.balance(&resolver), TokenAmount::from_tokens(1));
    h.assert_vault_backed();
}

// ---------------------------------------------------------------------------
// Scenario D: failed challenge
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_failed_challenge_pays_only_reward() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));
    for actor in [&member, &challenger, &voter] {
        h.at(0).admit(actor);
    }
    let id = h.at(1000).open_challenge(&challenger, &member);
    h.at(1500).vote(&voter, id, VoteChoice::No).unwrap();
    let vault_before = h.vault();

    let resolver = seeded_address(0x51);
    let receipt = h.at(200_000).registry.resolve_challenge(&resolver, id).unwrap();
    assert_eq!(receipt.value, ChallengeOutcome::Failed);
    assert_eq!(h.balance(&resolver).raw(), 1_000_000_000_000_000_000);
    assert_eq!(h.vault(), vault_before - TokenAmount::from_tokens(1));

    let record = h.registry.read(|e| e.member(&member.identity())).unwrap();
    assert_eq!(record.active_challenge, None);
    // The member can be challenged again.
    h.at(200_001).open_challenge(&challenger, &member);
    h.assert_vault_backed();
}

#[test]
fn no_votes_keeps_the_member() {
    let h = Harness::new();
    let (member, challenger) = (TestActor::new(1), TestActor::new(2));
    h.at(0).admit(&member);
    h.at(0).admit(&challenger);
    let id = h.at(10).open_challenge(&challenger, &member);
    let outcome = h.at(1_000_000).registry.resolve_challenge(&seeded_address(0x52), id).unwrap();
    assert_eq!(outcome.value, ChallengeOutcome::Failed);
    assert!(h.registry.read(|e| e.is_member(&member.identity())));
}

// ---------------------------------------------------------------------------
// Scenario E: bad permit leaves no trace
// ---------------------------------------------------------------------------

#[test]
fn scenario_e_wrong_permit_nonce_changes_nothing() {
    let h = Harness::new();
    let actor = TestActor::new(7);
    h.fund(&actor.owner_address(), 100);
    let before = h.registry.snapshot();
    let sequence = h.registry.sequence();

    let err = h.registry.onboard(&h.bundle(&actor, 1)).unwrap_err();
    match err {
        RegistryError::InvalidAuthorization(failure) => {
            assert_eq!(failure.purpose, AuthorizationPurpose::PaymentPermit);
            assert_eq!(failure.reason, FailureReason::StaleNonce { expected: 0, got: 1 });
        }
        other => panic!("expected InvalidAuthorization, got {other:?}"),
    }

    let identity = actor.identity();
    h.registry.read(|e| {
        assert!(!e.is_member(&identity));
        assert_eq!(e.directory().nonce(&identity), 0);
        assert_eq!(e.directory().owner_of(&identity), before.directory.owner_of(&identity));
        assert_eq!(e.vault_balance(), before.vault_balance);
        assert_eq!(e.ledger().permit_nonce(&actor.owner_address()), 0);
        assert_eq!(e.ledger().balance_of(&actor.owner_address()), TokenAmount::from_tokens(100));
    });
    assert_eq!(h.registry.sequence(), sequence);
}

#[test]
fn onboarding_without_funds_is_payment_failure() {
    let h = Harness::new();
    let actor = TestActor::new(8);
    let err = h.registry.onboard(&h.bundle(&actor, 0)).unwrap_err();
    assert!(matches!(err, RegistryError::PaymentFailed(_)));
    h.registry.read(|e| {
        assert_eq!(e.directory().nonce(&actor.identity()), 0);
        assert!(!e.is_member(&actor.identity()));
    });
}

#[test]
fn already_member_cannot_onboard_twice() {
    let h = Harness::new();
    let actor = TestActor::new(9);
    h.admit(&actor);
    let err = h.registry.onboard(&h.bundle(&actor, 0)).unwrap_err();
    assert_eq!(err, RegistryError::AlreadyMember(actor.identity()));
}

// ---------------------------------------------------------------------------
// Membership rules
// ---------------------------------------------------------------------------

#[test]
fn target_cannot_vote_or_exit_while_challenged() {
    let h = Harness::new();
    let (member, challenger) = (TestActor::new(1), TestActor::new(2));
    h.at(0).admit(&member);
    h.at(0).admit(&challenger);
    let id = h.at(10).open_challenge(&challenger, &member);

    assert_eq!(h.vote(&member, id, VoteChoice::No), Err(RegistryError::SelfVoteForbidden));
    assert_eq!(
        h.registry.exit(&member.owner_address(), &member.identity()).unwrap_err(),
        RegistryError::ChallengeInProgress(member.identity())
    );
    // The challenger itself may vote.
    assert!(h.vote(&challenger, id, VoteChoice::Yes).is_ok());
}

#[test]
fn invalid_choice_byte_rejected() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));
    for actor in [&member, &challenger, &voter] {
        h.at(0).admit(actor);
    }
    let id = h.at(10).open_challenge(&challenger, &member);
    for byte in [0u8, 3, 0xFF] {
        assert_eq!(
            h.registry
                .submit_vote(&voter.owner_address(), id, &voter.identity(), byte)
                .unwrap_err(),
            RegistryError::InvalidChoice(byte)
        );
    }
}

#[test]
fn vote_by_non_owner_rejected() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));
    for actor in [&member, &challenger, &voter] {
        h.at(0).admit(actor);
    }
    let id = h.at(10).open_challenge(&challenger, &member);
    let err = h
        .registry
        .submit_vote(&challenger.owner_address(), id, &voter.identity(), VoteChoice::YES)
        .unwrap_err();
    assert_eq!(err, RegistryError::NotAMember(voter.identity()));
}

#[test]
fn exit_then_rejoin() {
    let h = Harness::new();
    let actor = TestActor::new(4);
    h.at(0).admit(&actor);
    h.registry.exit(&actor.owner_address(), &actor.identity()).unwrap();
    assert_eq!(h.registry.read(|e| e.member_count()), 0);

    // The identity is now controlled by its owner, who signs both directory
    // authorizations for the second onboarding.
    let rejoin = TestActor {
        throwaway: tcr_nullables::seeded_keypair(4 ^ 0x80),
        owner: tcr_nullables::seeded_keypair(4 ^ 0x80),
    };
    let bundle = h.registry.read(|engine| {
        let identity = actor.identity();
        OnboardingBundle::sign(
            &OnboardingTerms {
                identity,
                attribute_key: "profile".into(),
                attribute_value: vec![1, 2, 3],
                attribute_validity_secs: 3600,
                identity_nonce: engine.directory().nonce(&identity),
                permit_nonce: engine.ledger().permit_nonce(&rejoin.owner_address()),
                permit_expiry: Timestamp::EPOCH,
            },
            &rejoin.throwaway,
            &rejoin.owner,
            engine.address(),
            engine.directory().domain(),
            engine.ledger().domain(),
        )
    });
    h.at(50).registry.onboard(&bundle).unwrap();
    let member = h.registry.read(|e| e.member(&actor.identity())).unwrap();
    assert_eq!(member.admission_time, Timestamp::new(50));
    assert_eq!(h.vault(), TokenAmount::from_tokens(20));
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[test]
fn resolution_uses_config_at_resolution_time() {
    let h = Harness::new();
    let (member, challenger) = (TestActor::new(1), TestActor::new(2));
    h.at(0).admit(&member);
    h.at(0).admit(&challenger);
    let id = h.at(10).open_challenge(&challenger, &member);

    let admin = seeded_address(ADMIN);
    h.registry
        .update_config(&admin, tcr_registry::ConfigChange::ChallengeDeposit(TokenAmount::from_tokens(1000)))
        .unwrap();
    // Reward is now 100 tokens but the vault holds 30.
    let err = h
        .at(1_000_000)
        .registry
        .resolve_challenge(&seeded_address(0x53), id)
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::InsufficientVaultBalance {
            needed: TokenAmount::from_tokens(100),
            available: TokenAmount::from_tokens(30),
        }
    );
    assert!(!h.registry.read(|e| e.challenge_record(id).unwrap().resolved));
}

#[test]
fn admin_withdraws_from_vault() {
    let h = Harness::new();
    h.admit(&TestActor::new(1));
    let admin = seeded_address(ADMIN);
    let dest = seeded_address(0x60);
    h.registry.withdraw(&admin, TokenAmount::from_tokens(4), &dest).unwrap();
    assert_eq!(h.balance(&dest), TokenAmount::from_tokens(4));
    assert_eq!(h.vault(), TokenAmount::from_tokens(6));
    assert!(matches!(
        h.registry.withdraw(&admin, TokenAmount::from_tokens(7), &dest),
        Err(RegistryError::InsufficientVaultBalance { .. })
    ));
    assert!(matches!(
        h.registry.withdraw(&dest, TokenAmount::from_tokens(1), &dest),
        Err(RegistryError::NotOwner { .. })
    ));
    h.assert_vault_backed();
}

#[test]
fn hand_over_waits_for_open_challenges() {
    let h = Harness::new();
    let (member, challenger) = (TestActor::new(1), TestActor::new(2));
    h.at(0).admit(&member);
    h.at(0).admit(&challenger);
    let id = h.at(10).open_challenge(&challenger, &member);

    let admin = seeded_address(ADMIN);
    let successor = seeded_address(0xF0);
    assert_eq!(
        h.registry.execute(|e, _| e.hand_over(&admin, &successor)).unwrap_err(),
        RegistryError::ChallengeInProgress(member.identity())
    );
    h.at(1_000_000).registry.resolve_challenge(&admin, id).unwrap();
    h.registry.execute(|e, _| e.hand_over(&admin, &successor)).unwrap();

    let config = RegistryConfig {
        starting_challenge_counter: id + 1,
        ..RegistryConfig::default()
    };
    let vault_before = h.vault();
    let parts = h.registry.into_engine().into_parts();
    let next = CurationEngine::new(successor, admin, config, parts).unwrap();
    assert_eq!(next.vault_balance(), vault_before);
    assert_eq!(next.member_count(), 2);
    assert_eq!(next.next_challenge_id(), id + 1);
}

// ---------------------------------------------------------------------------
// Ordering and snapshots
// ---------------------------------------------------------------------------

#[test]
fn receipts_are_sequenced_across_threads() {
    let h = Arc::new(Harness::new());
    for seed in 1..=4u8 {
        h.admit(&TestActor::new(seed));
    }
    let base = h.registry.sequence();
    let handles: Vec<_> = (1..=4u8)
        .map(|seed| {
            let h = h.clone();
            std::thread::spawn(move || {
                let actor = TestActor::new(seed);
                h.registry
                    .exit(&actor.owner_address(), &actor.identity())
                    .unwrap()
                    .sequence
            })
        })
        .collect();
    let mut sequences: Vec<u64> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![base + 1, base + 2, base + 3, base + 4]);
}

#[test]
fn snapshot_restores_open_challenge() {
    let h = Harness::new();
    let (member, challenger, voter) = (TestActor::new(1), TestActor::new(2), TestActor::new(3));
    for actor in [&member, &challenger, &voter] {
        h.at(0).admit(actor);
    }
    let id = h.at(10).open_challenge(&challenger, &member);
    h.at(20).vote(&voter, id, VoteChoice::Yes).unwrap();

    let bytes = h.registry.snapshot().to_bytes().unwrap();
    let mut restored = CurationEngine::restore(EngineSnapshot::from_bytes(&bytes).unwrap());
    assert_eq!(restored.vault_balance(), h.vault());
    assert!(restored.vote(id, &voter.identity()).is_some());
    assert_eq!(
        restored.submit_vote(&voter.owner_address(), id, &voter.identity(), VoteChoice::YES, Timestamp::new(30)),
        Err(RegistryError::AlreadyVoted {
            challenge_id: id,
            voter: voter.identity(),
        })
    );
    let outcome = restored
        .resolve_challenge(&seeded_address(0x54), id, Timestamp::new(1_000_000))
        .unwrap();
    assert_eq!(outcome, ChallengeOutcome::Succeeded);
}
