//! Membership store and stake vault.
//!
//! Both stores are owned by exactly one address (the engine that operates
//! them). Every mutation takes the caller and fails with
//! [`StoreError::NotOwner`] unless it is the current owner. Ownership moves
//! only through `transfer_ownership`, which is how a successor engine takes
//! over.
//!
//! The rest of the workspace depends only on the traits; the in-memory
//! implementations are serde-serializable so they can be snapshotted.

pub mod error;
pub mod member;
pub mod memory;
pub mod vault;

pub use error::StoreError;
pub use member::{Member, MembershipStore};
pub use memory::{MemoryMembershipStore, MemoryStakeVault};
pub use vault::StakeVault;
