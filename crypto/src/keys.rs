//! Ed25519 key material for owners, delegates and throwaway identity keys.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use tcr_types::{IdentityId, KeyPair, PrivateKey, PublicKey};
use zeroize::Zeroize;

/// A fresh key pair from the OS entropy source.
pub fn generate_keypair() -> KeyPair {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let keypair = keypair_from_seed(&seed);
    seed.zeroize();
    keypair
}

/// Deterministic key pair; the seed becomes the private key.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let signing_key = SigningKey::from_bytes(seed);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    PublicKey(SigningKey::from_bytes(&private.0).verifying_key().to_bytes())
}

/// The identity handle a throwaway key pair creates: its public key bytes.
pub fn identity_of(keypair: &KeyPair) -> IdentityId {
    IdentityId::new(keypair.public.0)
}
