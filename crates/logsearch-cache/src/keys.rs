//! Cache key hashing.

const FNV64A_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64A_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a key into a form that is always safe to hand to the transport.
///
/// Computes FNV-64a over the key's UTF-8 bytes and lower-hex encodes the
/// result. Memcached rejects keys containing spaces or control bytes; the
/// fixed 16-character hex form never does, so arbitrary chunk identifiers
/// can be used as cache keys.
#[must_use]
pub fn hash_key(key: &str) -> String {
    let mut hash = FNV64A_OFFSET_BASIS;
    for byte in key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV64A_PRIME);
    }
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fnv64a_vectors() {
        // Reference values from the FNV-1a 64-bit test suite.
        assert_eq!(hash_key(""), "cbf29ce484222325");
        assert_eq!(hash_key("a"), "af63dc4c8601ec8c");
        assert_eq!(hash_key("foobar"), "85944171f73967e8");
    }

    #[test]
    fn output_is_fixed_width_lower_hex() {
        for key in ["fake/chunk/key", "with spaces and\ncontrol bytes", "日志"] {
            let hashed = hash_key(key);
            assert_eq!(hashed.len(), 16);
            assert!(hashed.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn distinct_keys_hash_differently() {
        assert_ne!(hash_key("chunk/1"), hash_key("chunk/2"));
    }
}
