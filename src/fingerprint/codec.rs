// file: src/fingerprint/codec.rs
// description: compact text-safe encoding of ordered fingerprint sequences
// reference: https://docs.rs/base64

use super::{FINGERPRINT_SIZE, Fingerprint, LineHasher};
use crate::error::{PipelineError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Concatenated little-endian fingerprints, base64 encoded.
///
/// There is no length prefix: the count is the decoded byte length divided
/// by [`FINGERPRINT_SIZE`]. This layout is persisted and must not change.
pub struct HashCodec;

impl HashCodec {
    pub fn encode(fingerprints: &[Fingerprint]) -> String {
        let mut bytes = Vec::with_capacity(fingerprints.len() * FINGERPRINT_SIZE);
        for fingerprint in fingerprints {
            bytes.extend_from_slice(&fingerprint.to_bytes());
        }
        STANDARD.encode(bytes)
    }

    pub fn decode(blob: &str) -> Result<Vec<Fingerprint>> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| PipelineError::Codec(format!("invalid base64: {}", e)))?;

        if bytes.len() % FINGERPRINT_SIZE != 0 {
            return Err(PipelineError::Codec(format!(
                "decoded length {} is not a multiple of {}",
                bytes.len(),
                FINGERPRINT_SIZE
            )));
        }

        Ok(bytes
            .chunks_exact(FINGERPRINT_SIZE)
            .map(|chunk| {
                let mut word = [0u8; FINGERPRINT_SIZE];
                word.copy_from_slice(chunk);
                Fingerprint::from_bytes(word)
            })
            .collect())
    }

    pub fn encode_lines<'a, I>(lines: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fingerprints: Vec<Fingerprint> = lines.into_iter().map(LineHasher::hash).collect();
        Self::encode(&fingerprints)
    }
}
