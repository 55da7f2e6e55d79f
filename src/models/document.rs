// file: src/models/document.rs
// description: full and minified document records with serde support
// reference: internal data structures

use crate::fingerprint::{LINE_SEPARATOR, char_length, split_lines};
use serde::{Deserialize, Serialize};

/// A document extracted from an archive segment, with its filtered text and
/// the scores assigned by upstream stages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date_download: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub source_domain: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub cc_segment: String,
    #[serde(default)]
    pub nlines: usize,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub original_nlines: usize,
    #[serde(default)]
    pub original_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perplexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

impl Document {
    /// Replaces the filtered text and recomputes `nlines` and `length`.
    pub fn set_raw_content(&mut self, raw_content: String) {
        self.nlines = split_lines(&raw_content).len();
        self.length = char_length(&raw_content);
        self.raw_content = raw_content;
    }

    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.raw_content)
    }

    pub fn join_lines(lines: &[&str]) -> String {
        lines.join(LINE_SEPARATOR)
    }
}

/// A document whose recoverable text was replaced by line fingerprints.
///
/// Shares field names with [`Document`] so both can live in the same
/// record files. Empty identity fields are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MinifiedDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cc_segment: String,
    pub hashes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perplexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_raw_content_updates_counts() {
        let mut doc = Document::default();
        doc.set_raw_content("first\nsecond line".to_string());

        assert_eq!(doc.nlines, 2);
        assert_eq!(doc.length, 17);
        assert_eq!(doc.lines(), vec!["first", "second line"]);
    }

    #[test]
    fn test_empty_content_has_no_lines() {
        let mut doc = Document::default();
        doc.set_raw_content(String::new());
        assert_eq!(doc.nlines, 0);
        assert_eq!(doc.length, 0);
    }

    #[test]
    fn test_join_lines() {
        assert_eq!(Document::join_lines(&["a", "b"]), "a\nb");
        assert_eq!(Document::join_lines(&[]), "");
    }

    #[test]
    fn test_document_reads_partial_record() {
        let doc: Document = serde_json::from_value(json!({
            "raw_content": "Hello",
            "language": "en",
            "perplexity": 120.0
        }))
        .unwrap();

        assert_eq!(doc.raw_content, "Hello");
        assert_eq!(doc.language.as_deref(), Some("en"));
        assert!(doc.url.is_empty());
        assert!(doc.bucket.is_none());
    }

    #[test]
    fn test_minified_omits_empty_fields() {
        let mini = MinifiedDocument {
            hashes: "AAAAAAAAAAA=".to_string(),
            language: Some("en".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&mini).unwrap();
        assert_eq!(value, json!({"hashes": "AAAAAAAAAAA=", "language": "en"}));
    }
}
