// file: src/segment/wet.rs
// description: parses WET archive segments into per-document records
// reference: https://commoncrawl.org/get-started (WET file format)

use crate::error::{PipelineError, Result};
use crate::fingerprint::char_length;
use crate::models::SegmentRecord;
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};
use url::Url;

const RECORD_START: &str = "WARC/1.0";
const CONVERSION: &str = "conversion";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parses a fetched segment, gunzipping it first when it is compressed.
///
/// WET files are concatenated gzip members, so every member is read.
pub fn read_segment(content: &[u8]) -> Result<Vec<SegmentRecord>> {
    if !content.starts_with(&GZIP_MAGIC) {
        return Ok(parse_segment(content));
    }

    let mut decoded = Vec::new();
    MultiGzDecoder::new(content)
        .read_to_end(&mut decoded)
        .map_err(|e| PipelineError::Codec(format!("invalid gzip segment: {}", e)))?;
    debug!(
        "Decompressed segment from {} to {} bytes",
        content.len(),
        decoded.len()
    );
    Ok(parse_segment(&decoded))
}

/// Parses the raw bytes of a WET segment.
///
/// Only `conversion` records are returned; malformed records are skipped.
pub fn parse_segment(content: &[u8]) -> Vec<SegmentRecord> {
    let text = String::from_utf8_lossy(content);
    let mut records = Vec::new();

    let mut headers: Vec<&str> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut reading_headers = true;

    for raw in text.lines() {
        let line = raw.trim();

        if reading_headers {
            if line.is_empty() {
                // Leading blank lines before the first header are skipped.
                reading_headers = headers.is_empty();
            } else {
                headers.push(line);
            }
            continue;
        }

        if line == RECORD_START {
            if let Some(record) = parse_record(&headers, &body) {
                records.push(record);
            }
            headers = vec![line];
            body.clear();
            reading_headers = true;
            continue;
        }

        body.push(line);
    }

    if !body.is_empty()
        && let Some(record) = parse_record(&headers, &body)
    {
        records.push(record);
    }

    debug!("Parsed {} records from segment", records.len());
    records
}

fn parse_record(headers: &[&str], body: &[&str]) -> Option<SegmentRecord> {
    if headers.is_empty() || body.is_empty() {
        return None;
    }

    let fields: HashMap<&str, &str> = headers
        .iter()
        .filter_map(|header| header.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    if fields.get("WARC-Type").copied() != Some(CONVERSION) {
        return None;
    }

    let (Some(url), Some(date), Some(digest)) = (
        fields.get("WARC-Target-URI"),
        fields.get("WARC-Date"),
        fields.get("WARC-Block-Digest"),
    ) else {
        warn!("Skipping record with incomplete headers: {:?}", headers);
        return None;
    };

    // Records are separated by two blank lines.
    let mut end = body.len();
    if end >= 2 && body[end - 1].is_empty() && body[end - 2].is_empty() {
        end -= 2;
    }
    let (title, lines) = body[..end].split_first()?;

    let length = fields
        .get("Content-Length")
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| char_length(&body[..end].join("\n")));

    Some(SegmentRecord {
        url: url.to_string(),
        digest: digest.to_string(),
        date_download: date.to_string(),
        source_domain: source_domain(url),
        title: title.to_string(),
        raw_content: lines.join("\n"),
        length,
    })
}

/// Host of `url`, with its port when one is given explicitly.
pub fn source_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}
