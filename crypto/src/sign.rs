//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use tcr_types::{Address, PrivateKey, PublicKey, Signature};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Rejects non-canonical signatures (malleability protection).
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Verify that `signature` over `message` was produced by the key behind
/// `signer`. Malformed addresses and bad checksums fail verification.
pub fn verify_address_signature(message: &[u8], signature: &Signature, signer: &Address) -> bool {
    match crate::address::decode_address(signer.as_str()) {
        Some(public_key) => verify_signature(message, signature, &public_key),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_address;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn sign_and_verify() {
        let kp = generate_keypair();
        let msg = b"registry onboarding";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = generate_keypair();
        let sig = sign_message(b"correct message", &kp.private);
        assert!(!verify_signature(b"wrong message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = generate_keypair();
        let kp2 = generate_keypair();
        let sig = sign_message(b"test", &kp1.private);
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn signature_deterministic() {
        let kp = keypair_from_seed(&[99u8; 32]);
        let sig1 = sign_message(b"same", &kp.private);
        let sig2 = sign_message(b"same", &kp.private);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn address_signature_checks_signer() {
        let alice = keypair_from_seed(&[1u8; 32]);
        let bob = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"permit", &alice.private);
        assert!(verify_address_signature(b"permit", &sig, &derive_address(&alice.public)));
        assert!(!verify_address_signature(b"permit", &sig, &derive_address(&bob.public)));
    }

    #[test]
    fn invalid_public_key() {
        let kp = generate_keypair();
        let sig = sign_message(b"test", &kp.private);
        assert!(!verify_signature(b"test", &sig, &PublicKey([0xFF; 32])));
    }
}
