//! Signed spending permits.
//!
//! ```text
//! digest = Blake2b-256(
//!     0x19 0x01          version prefix
//!     domain     [32]    token deployment separator
//!     "Permit"
//!     holder             u32 BE length-prefixed address
//!     spender            u32 BE length-prefixed address
//!     nonce      u64 BE  holder's permit nonce
//!     expiry     u64 BE  0 = never expires
//!     allowed    u8      1 grants unlimited allowance, 0 revokes
//! )
//! ```

use serde::{Deserialize, Serialize};
use tcr_crypto::blake2b_256_multi;
use tcr_types::{Address, Timestamp};

const VERSION_PREFIX: [u8; 2] = [0x19, 0x01];
const PERMIT_TAG: &[u8] = b"Permit";

/// A holder's authorisation for `spender` to pull funds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub holder: Address,
    pub spender: Address,
    pub nonce: u64,
    /// Latest time the permit may be submitted; `EPOCH` means no expiry.
    pub expiry: Timestamp,
    pub allowed: bool,
}

impl Permit {
    pub fn digest(&self, domain: &[u8; 32]) -> [u8; 32] {
        let holder = self.holder.as_str().as_bytes();
        let spender = self.spender.as_str().as_bytes();
        blake2b_256_multi(&[
            &VERSION_PREFIX,
            domain,
            PERMIT_TAG,
            &(holder.len() as u32).to_be_bytes(),
            holder,
            &(spender.len() as u32).to_be_bytes(),
            spender,
            &self.nonce.to_be_bytes(),
            &self.expiry.as_secs().to_be_bytes(),
            &[self.allowed as u8],
        ])
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry != Timestamp::EPOCH && now > self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permit() -> Permit {
        Permit {
            holder: Address::new("tcr_holder"),
            spender: Address::new("tcr_engine"),
            nonce: 0,
            expiry: Timestamp::EPOCH,
            allowed: true,
        }
    }

    #[test]
    fn every_field_is_committed() {
        let base = permit().digest(&[0; 32]);
        assert_ne!(base, Permit { nonce: 1, ..permit() }.digest(&[0; 32]));
        assert_ne!(base, Permit { allowed: false, ..permit() }.digest(&[0; 32]));
        assert_ne!(base, Permit { expiry: Timestamp::new(5), ..permit() }.digest(&[0; 32]));
        assert_ne!(base, permit().digest(&[1; 32]));
    }

    #[test]
    fn zero_expiry_never_expires() {
        assert!(!permit().is_expired(Timestamp::new(u64::MAX)));
        let p = Permit { expiry: Timestamp::new(10), ..permit() };
        assert!(!p.is_expired(Timestamp::new(10)));
        assert!(p.is_expired(Timestamp::new(11)));
    }
}
