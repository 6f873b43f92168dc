//! Blake2b hashing for signed-message digests and content pointers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use tcr_types::ContentHash;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Content-address a document (charter, category list, challenge details).
pub fn hash_content(document: &[u8]) -> ContentHash {
    ContentHash::new(blake2b_256(document))
}

/// Derive a 32-byte domain separator from a human-readable label, e.g. the
/// name of a directory or token deployment.
pub fn domain_separator(label: &str) -> [u8; 32] {
    blake2b_256_multi(&[b"tcr-domain", label.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello registry"), blake2b_256(b"hello registry"));
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn blake2b_multi_equivalent() {
        assert_eq!(blake2b_256(b"helloworld"), blake2b_256_multi(&[b"hello", b"world"]));
    }

    #[test]
    fn domains_differ_by_label() {
        assert_ne!(domain_separator("directory"), domain_separator("token"));
    }

    #[test]
    fn hash_content_is_nonzero() {
        assert!(!hash_content(b"charter v1").is_zero());
    }
}
