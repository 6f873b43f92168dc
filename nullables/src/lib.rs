//! Nullable infrastructure for deterministic testing.
//!
//! External inputs (the clock, key material) are abstracted so tests can
//! control them. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or the OS entropy source
//!
//! Usage: hand a [`NullClock`] to the registry instead of the system clock,
//! and derive every key in a test from a one-byte seed.

pub mod clock;
pub mod keys;

pub use clock::NullClock;
pub use keys::{seeded_address, seeded_keypair, TestActor};
