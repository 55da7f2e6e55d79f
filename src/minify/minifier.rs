// file: src/minify/minifier.rs
// description: replaces a document's recoverable text with line fingerprints
// reference: converts full records into their minified form

use crate::fingerprint::{HashCodec, fingerprint_lines};
use crate::models::{Document, MinifiedDocument};
use tracing::debug;

pub struct Minifier;

impl Minifier {
    pub fn new() -> Self {
        Self
    }

    /// Builds the minified form of `doc`, leaving `doc` untouched.
    ///
    /// Only the identity fields needed to relocate the source segment and
    /// the scores that cannot be recomputed are kept.
    pub fn minify(&self, doc: &Document) -> MinifiedDocument {
        let fingerprints = fingerprint_lines(doc.lines());
        debug!(
            "Minified {} into {} fingerprints",
            doc.url,
            fingerprints.len()
        );

        MinifiedDocument {
            url: doc.url.clone(),
            digest: doc.digest.clone(),
            cc_segment: doc.cc_segment.clone(),
            hashes: HashCodec::encode(&fingerprints),
            language: doc.language.clone(),
            language_score: doc.language_score,
            perplexity: doc.perplexity,
            bucket: doc.bucket.clone(),
        }
    }

    pub fn minify_all<'a, I>(&self, docs: I) -> Vec<MinifiedDocument>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        docs.into_iter().map(|doc| self.minify(doc)).collect()
    }
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new()
    }
}
