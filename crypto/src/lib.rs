//! Cryptographic primitives for the registry.
//!
//! - **Ed25519** for signing and signature verification
//! - **Blake2b** for signed-message digests and content pointers
//! - Address derivation with `tcr_` prefix and base32 encoding

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_address, default_controller, derive_address, validate_address};
pub use hash::{blake2b_256, blake2b_256_multi, domain_separator, hash_content};
pub use keys::{generate_keypair, identity_of, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_address_signature, verify_signature};
