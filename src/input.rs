//! Reading JSON documents from files or stdin

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read every JSON document from `reader`.
///
/// With `ndjson` each non-empty line is one document. Otherwise the whole
/// input is parsed with SIMD-accelerated parsing, falling back to a
/// `serde_json` stream for concatenated documents.
pub fn read_documents<R: Read>(reader: R, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    if ndjson {
        return parse_lines(&content);
    }

    // simd-json parses in place, so keep the original bytes for the fallback
    let mut scratch = content.clone();
    if let Ok(value) = simd_json::serde::from_slice::<Value>(&mut scratch) {
        return Ok(vec![value]);
    }

    serde_json::Deserializer::from_slice(&content)
        .into_iter::<Value>()
        .map(|doc| doc.context("Failed to parse JSON"))
        .collect()
}

fn parse_lines(content: &[u8]) -> Result<Vec<Value>> {
    let content_str = String::from_utf8_lossy(content);
    let mut documents = Vec::new();
    for (idx, line) in content_str.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", idx + 1))?;
        documents.push(value);
    }
    Ok(documents)
}

/// Read a single JSON document from a file (prototypes, option files)
pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_document() {
        let docs = read_documents(r#"{"id": 1, "tags": ["a"]}"#.as_bytes(), false).unwrap();
        assert_eq!(docs, vec![json!({"id": 1, "tags": ["a"]})]);
    }

    #[test]
    fn test_concatenated_documents_fall_back_to_stream() {
        let docs = read_documents("{\"id\": 1}\n{\"id\": 2}".as_bytes(), false).unwrap();
        assert_eq!(docs, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn test_ndjson_skips_blank_lines() {
        let docs = read_documents("{\"id\": 1}\n\n{\"id\": 2}\n".as_bytes(), true).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_ndjson_reports_line() {
        let err = read_documents("{\"id\": 1}\n{oops}\n".as_bytes(), true).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
