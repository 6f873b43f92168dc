//! Principal addresses.
//!
//! `tcr_` followed by 60 base32 characters encoding the 32-byte public key
//! and a 5-byte Blake2b checksum of it (37 bytes, 296 bits, 4 zero pad bits).

use tcr_types::{Address, IdentityId, PublicKey};

/// Lowercase alphabet without the look-alikes 0/O, 2/Z, l/I and v.
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const CHECKSUM_LEN: usize = 5;
const PAYLOAD_LEN: usize = 32 + CHECKSUM_LEN;
const ENCODED_LEN: usize = (PAYLOAD_LEN * 8).div_ceil(5);

fn symbol_value(c: u8) -> Option<u8> {
    ALPHABET.iter().position(|&a| a == c).map(|i| i as u8)
}

fn checksum(key: &[u8; 32]) -> [u8; CHECKSUM_LEN] {
    let digest = crate::blake2b_256(key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn encode(payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut out = String::with_capacity(ENCODED_LEN);
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for &byte in payload {
        acc = (acc << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[usize::from((acc >> bits) & 0x1F)] as char);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[usize::from((acc << (5 - bits)) & 0x1F)] as char);
    }
    out
}

/// Strict decoding: exact length, known symbols, zero padding.
fn decode(text: &str) -> Option<[u8; PAYLOAD_LEN]> {
    if text.len() != ENCODED_LEN {
        return None;
    }
    let mut payload = [0u8; PAYLOAD_LEN];
    let mut filled = 0;
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for c in text.bytes() {
        acc = (acc << 5) | u16::from(symbol_value(c)?);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            payload[filled] = (acc >> bits) as u8;
            filled += 1;
            acc &= (1 << bits) - 1;
        }
    }
    (acc == 0).then_some(payload)
}

/// Derive the address of a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let mut payload = [0u8; PAYLOAD_LEN];
    payload[..32].copy_from_slice(public_key.as_bytes());
    payload[32..].copy_from_slice(&checksum(public_key.as_bytes()));
    Address::new(format!("{}{}", Address::PREFIX, encode(&payload)))
}

/// The address that controls an identity nobody has transferred yet: the
/// identity handle read as a public key.
pub fn default_controller(identity: &IdentityId) -> Address {
    derive_address(&PublicKey(*identity.as_bytes()))
}

/// Recover the public key behind an address. `None` for a wrong prefix,
/// length or symbol, or a checksum mismatch.
pub fn decode_address(address: &str) -> Option<PublicKey> {
    let payload = decode(address.strip_prefix(Address::PREFIX)?)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&payload[..32]);
    (payload[32..] == checksum(&key)).then_some(PublicKey(key))
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}
