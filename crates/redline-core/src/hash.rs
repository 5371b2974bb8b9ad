use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use xxhash_rust::xxh3::xxh3_64;

/// Canonicalize block text for hashing.
///
/// Goals:
/// - Deterministic across platforms (normalize CRLF -> LF)
/// - Composed and decomposed spellings hash the same (Unicode NFC)
/// - Avoid hash churn from trailing whitespace differences
///
/// Notes:
/// - We do NOT change internal whitespace, punctuation, or casing.
/// - We do NOT trim leading whitespace.
pub fn canonicalize_text(input: &str) -> String {
    let normalized: String = input.replace("\r\n", "\n").replace('\r', "\n").nfc().collect();

    let mut out = String::with_capacity(normalized.len());

    // `lines()` would drop the trailing empty line, so keep '\n' exactly.
    for segment in normalized.split_inclusive('\n') {
        if let Some(stripped) = segment.strip_suffix('\n') {
            out.push_str(stripped.trim_end_matches([' ', '\t']));
            out.push('\n');
        } else {
            out.push_str(segment.trim_end_matches([' ', '\t']));
        }
    }

    out
}

/// xxh3-64 over UTF-8 bytes as fixed-width 16-char lowercase hex.
pub fn xxh64_hex(input: &str) -> String {
    format!("{:016x}", xxh3_64(input.as_bytes()))
}

/// Hash of canonicalized block text.
pub fn text_hash(input: &str) -> String {
    xxh64_hex(&canonicalize_text(input))
}

/// Lowercase hex SHA-256 of raw bytes. Used for package fingerprints.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_normalizes_newlines_and_trailing_whitespace() {
        assert_eq!(canonicalize_text("a  \r\nb\t\rc "), "a\nb\nc");
        assert_eq!(canonicalize_text("  lead"), "  lead");
        assert_eq!(canonicalize_text("end\n"), "end\n");
    }

    #[test]
    fn composed_and_decomposed_hash_the_same() {
        assert_eq!(text_hash("Cafe\u{0301}"), text_hash("Café"));
    }

    #[test]
    fn hashes_are_fixed_width_hex() {
        let h = text_hash("Example Page Title");
        assert_eq!(h.len(), 16);
        assert!(h.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));

        let s = sha256_hex(b"abc");
        assert_eq!(s, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
