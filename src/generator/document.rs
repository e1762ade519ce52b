//! Document encoding, writing and drift checking

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Pretty JSON, two-space indent, trailing newline.
pub fn encode<T: Serialize>(document: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_document(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// How a document on disk compares to a fresh encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    UpToDate,
    Drifted,
    Missing,
}

impl DocumentStatus {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, DocumentStatus::UpToDate)
    }
}

/// Byte-compare `path` with `expected`.
pub fn check_document(path: &Path, expected: &[u8]) -> Result<DocumentStatus> {
    match fs::read(path) {
        Ok(actual) if actual == expected => Ok(DocumentStatus::UpToDate),
        Ok(_) => Ok(DocumentStatus::Drifted),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(DocumentStatus::Missing),
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Batch;

    #[test]
    fn test_encode_layout() {
        let batch: Batch<u32> = Batch { tests: vec![1, 2] };
        let bytes = encode(&batch).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n  \"tests\": [\n    1,\n    2\n  ]\n}\n");
    }

    #[test]
    fn test_write_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/doc.json");
        assert_eq!(
            check_document(&path, b"{}\n").unwrap(),
            DocumentStatus::Missing
        );
        write_document(&path, b"{}\n").unwrap();
        assert!(check_document(&path, b"{}\n").unwrap().is_up_to_date());
        assert_eq!(
            check_document(&path, b"{ }\n").unwrap(),
            DocumentStatus::Drifted
        );
    }
}
