// file: src/fingerprint/mod.rs
// description: per-line content fingerprints and canonical line splitting
// reference: https://docs.rs/xxhash-rust

mod codec;

pub use codec::HashCodec;

use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Separator between the lines of a document's text.
pub const LINE_SEPARATOR: &str = "\n";

/// Width in bytes of one encoded fingerprint.
pub const FINGERPRINT_SIZE: usize = 8;

/// Truncated 64-bit hash of a single line of text.
///
/// Used for identity when matching lines, never for security: two distinct
/// lines may collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; FINGERPRINT_SIZE] {
        self.0.to_le_bytes()
    }

    pub fn from_bytes(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

pub struct LineHasher;

impl LineHasher {
    /// Hashes the UTF-8 bytes of `line`, which must not carry its separator.
    pub fn hash(line: &str) -> Fingerprint {
        Fingerprint(xxh3_64(line.as_bytes()))
    }
}

/// Splits text into lines exactly on [`LINE_SEPARATOR`].
///
/// The empty string has no lines, a trailing separator yields a trailing
/// empty line, and `\r` is kept as part of the line.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LINE_SEPARATOR).collect()
}

pub fn fingerprint_lines<'a, I>(lines: I) -> Vec<Fingerprint>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().map(LineHasher::hash).collect()
}

/// Character length of a text, as recorded in `length` fields.
pub fn char_length(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = LineHasher::hash("Hello world !");
        let b = LineHasher::hash("Hello world !");
        assert_eq!(a, b);
        assert_ne!(a, LineHasher::hash("Hello world!"));
    }

    #[test]
    fn test_hash_ignores_nothing() {
        assert_ne!(LineHasher::hash("line"), LineHasher::hash("line\r"));
        assert_ne!(LineHasher::hash("line"), LineHasher::hash(" line"));
    }

    #[test]
    fn test_fingerprint_bytes_are_little_endian() {
        let fp = Fingerprint::new(0x0102_0304_0506_0708);
        assert_eq!(fp.to_bytes(), [8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(Fingerprint::from_bytes(fp.to_bytes()), fp);
    }

    #[test]
    fn test_split_lines() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("a"), vec!["a"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines("a\r\nb"), vec!["a\r", "b"]);
    }

    #[test]
    fn test_fingerprint_lines_keeps_duplicates() {
        let hashes = fingerprint_lines(["x", "y", "x"]);
        assert_eq!(hashes.len(), 3);
        assert_eq!(hashes[0], hashes[2]);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_char_length_counts_characters() {
        assert_eq!(char_length("abc"), 3);
        assert_eq!(char_length("事實"), 2);
    }
}
