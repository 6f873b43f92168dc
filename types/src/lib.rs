//! Fundamental types for the token-curated registry.
//!
//! Shared by every other crate in the workspace: addresses, identity handles,
//! content pointers, token amounts, timestamps, keys and registry parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod time;

pub use address::Address;
pub use amount::{TokenAmount, TOKEN_UNIT};
pub use error::TypesError;
pub use hash::{ContentHash, IdentityId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::RegistryConfig;
pub use time::{Clock, SystemClock, Timestamp};
