// file: src/records/mod.rs
// description: json-lines reading and writing for document shards
// reference: https://docs.rs/serde_json

use crate::error::{PipelineError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Reads one JSON object per line. Blank lines are skipped.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| PipelineError::FileOperation {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| {
            PipelineError::Serialization(format!("{}:{}: {}", path.display(), i + 1, e))
        })?;
        records.push(record);
    }

    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes `records` as JSON lines, creating parent directories as needed.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PipelineError::FileOperation {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| PipelineError::FileOperation {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("docs.json");

        let mut doc = Document::default();
        doc.url = "http://a.example/".to_string();
        doc.set_raw_content("one\ntwo".to_string());

        write_records(&path, &[doc.clone(), doc]).unwrap();
        let docs: Vec<Document> = read_records(&path).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].url, "http://a.example/");
        assert_eq!(docs[1].raw_content, "one\ntwo");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, "{\"url\":\"u\"}\n\n   \n{\"url\":\"v\"}\n").unwrap();

        let docs: Vec<Document> = read_records(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].url, "v");
    }

    #[test]
    fn test_bad_line_reports_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, "{\"url\":\"u\"}\nnot json\n").unwrap();

        let err = read_records::<Document>(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Serialization(ref m) if m.contains(":2:")));
    }

    #[test]
    fn test_missing_file() {
        let err = read_records::<Document>(Path::new("/nonexistent/docs.json")).unwrap_err();
        assert!(matches!(err, PipelineError::FileOperation { .. }));
    }
}
