//! Byte layout of signed directory requests.
//!
//! ```text
//! digest = Blake2b-256(
//!     0x19 0x00            version prefix
//!     domain       [32]    directory deployment separator
//!     nonce        u64 BE  identity nonce the signature commits to
//!     identity     [32]
//!     tag                  ASCII action name
//!     payload              action fields, variable-length ones u32 BE length-prefixed
//! )
//! ```

use tcr_crypto::blake2b_256_multi;
use tcr_types::{Address, IdentityId};

const VERSION_PREFIX: [u8; 2] = [0x19, 0x00];

/// An action an identity owner can authorise off-line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignedAction<'a> {
    ChangeOwner {
        new_owner: &'a Address,
    },
    SetAttribute {
        key: &'a str,
        value: &'a [u8],
        validity_secs: u64,
    },
    RevokeAttribute {
        key: &'a str,
        value: &'a [u8],
    },
    AddDelegate {
        delegate: &'a Address,
        validity_secs: u64,
    },
    RevokeDelegate {
        delegate: &'a Address,
    },
}

impl SignedAction<'_> {
    pub fn tag(&self) -> &'static [u8] {
        match self {
            Self::ChangeOwner { .. } => b"changeOwner",
            Self::SetAttribute { .. } => b"setAttribute",
            Self::RevokeAttribute { .. } => b"revokeAttribute",
            Self::AddDelegate { .. } => b"addDelegate",
            Self::RevokeDelegate { .. } => b"revokeDelegate",
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::ChangeOwner { new_owner } => push_prefixed(&mut out, new_owner.as_str().as_bytes()),
            Self::SetAttribute { key, value, validity_secs } => {
                push_prefixed(&mut out, key.as_bytes());
                push_prefixed(&mut out, value);
                out.extend_from_slice(&validity_secs.to_be_bytes());
            }
            Self::RevokeAttribute { key, value } => {
                push_prefixed(&mut out, key.as_bytes());
                push_prefixed(&mut out, value);
            }
            Self::AddDelegate { delegate, validity_secs } => {
                push_prefixed(&mut out, delegate.as_str().as_bytes());
                out.extend_from_slice(&validity_secs.to_be_bytes());
            }
            Self::RevokeDelegate { delegate } => push_prefixed(&mut out, delegate.as_str().as_bytes()),
        }
        out
    }

    /// The 32-byte digest the identity owner signs.
    pub fn digest(&self, domain: &[u8; 32], identity: &IdentityId, nonce: u64) -> [u8; 32] {
        let payload = self.payload();
        blake2b_256_multi(&[
            &VERSION_PREFIX,
            domain,
            &nonce.to_be_bytes(),
            identity.as_bytes(),
            self.tag(),
            &payload,
        ])
    }
}

fn push_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}
