use sha2::{Digest, Sha256};
use std::fmt::Display;
use thiserror::Error;

/// Raised when a digest contains something other than hex digits.
/// Digests produced by `crypto_hash` never do, so this is an invariant break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("malformed hex character {ch:?} at position {position}")]
    MalformedHex { ch: char, position: usize },
}

/// SHA-256 over the space-joined string form of `fields`, hex encoded.
pub fn crypto_hash(fields: &[&dyn Display]) -> String {
    let preimage = fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// Expand every hex digit into its 4-bit binary form, in order.
/// `"f0"` becomes `"11110000"`.
pub fn binary_representation(hex: &str) -> Result<String, HashError> {
    let mut bits = String::with_capacity(hex.len() * 4);
    for (position, ch) in hex.chars().enumerate() {
        let nibble = ch
            .to_digit(16)
            .ok_or(HashError::MalformedHex { ch, position })?;
        bits.push_str(&format!("{nibble:04b}"));
    }
    Ok(bits)
}

/// Target test: the first `difficulty` bits of `hash` are all zero.
///
/// Only the hex prefix that covers those bits is expanded. A difficulty wider
/// than the hash itself can never be met.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> Result<bool, HashError> {
    let difficulty = difficulty as usize;
    let needed = difficulty.div_ceil(4);
    if needed > hash.len() {
        return Ok(false);
    }
    let prefix = hash.get(..needed).unwrap_or(hash);
    let bits = binary_representation(prefix)?;
    Ok(bits.bytes().take(difficulty).all(|b| b == b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_hex_to_bits() {
        assert_eq!(binary_representation("f0").unwrap(), "11110000");
        assert_eq!(binary_representation("0f").unwrap(), "00001111");
        assert_eq!(binary_representation("aF").unwrap(), "10101111");
        assert_eq!(binary_representation("").unwrap(), "");
    }

    #[test]
    fn rejects_non_hex() {
        let err = binary_representation("0g1").unwrap_err();
        assert_eq!(err, HashError::MalformedHex { ch: 'g', position: 1 });
    }

    #[test]
    fn target_test_on_known_prefixes() {
        assert!(!meets_difficulty("f0", 4).unwrap());
        for d in 1..=4 {
            assert!(meets_difficulty("0f", d).unwrap(), "difficulty {d}");
        }
        assert!(!meets_difficulty("0f", 5).unwrap());
        assert!(meets_difficulty("00", 8).unwrap());
        assert!(!meets_difficulty("00", 9).unwrap());
    }

    #[test]
    fn target_test_agrees_with_bit_prefix() {
        let samples = ["00", "01", "07", "0f", "10", "3c", "7f", "80", "ff", "a5"];
        for h in samples {
            let bits = binary_representation(h).unwrap();
            for d in 1..=8u32 {
                let expected = bits[..d as usize].chars().all(|c| c == '0');
                assert_eq!(meets_difficulty(h, d).unwrap(), expected, "{h} at {d}");
            }
        }
    }

    #[test]
    fn hash_is_deterministic_and_field_sensitive() {
        let a = crypto_hash(&[&1000, &"abc", &"data", &5, &3]);
        let b = crypto_hash(&[&1000, &"abc", &"data", &5, &3]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        let variants = [
            crypto_hash(&[&1001, &"abc", &"data", &5, &3]),
            crypto_hash(&[&1000, &"abd", &"data", &5, &3]),
            crypto_hash(&[&1000, &"abc", &"date", &5, &3]),
            crypto_hash(&[&1000, &"abc", &"data", &6, &3]),
            crypto_hash(&[&1000, &"abc", &"data", &5, &4]),
        ];
        for v in variants {
            assert_ne!(a, v);
        }
    }

    #[test]
    fn hash_joins_fields_with_single_space() {
        // sha256("a b")
        assert_eq!(
            crypto_hash(&[&"a", &"b"]),
            "c8687a08aa5d6ed2044328fa6a697ab8e96dc34291e8c2034ae8c38e6fcc6d65"
        );
    }
}
