//! Identity directory.
//!
//! Maps an identity handle to its controlling owner, a set of time-limited
//! delegates and published attributes. Every identity carries a monotonic
//! nonce; signed requests commit to it, so a signature is usable exactly once.
//!
//! An identity that was never transferred is owned by the address derived
//! from its own handle (the throwaway key that created it).

pub mod digest;
pub mod directory;
pub mod error;
pub mod event;

pub use digest::SignedAction;
pub use directory::{AttributeRecord, IdentityDirectory};
pub use error::IdentityError;
pub use event::DirectoryEvent;
