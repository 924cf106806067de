//! Local JSON document caches with spot-check sampling

use crate::error::{BisError, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Random document read back from a cache file
#[derive(Debug, Clone, Serialize)]
pub struct CacheSample {
    pub file: PathBuf,
    pub document_count: usize,
    pub document_number: usize,
    pub document: Map<String, Value>,
}

/// Write documents to `path` as a JSON array, replacing any existing file
pub fn write_doc_cache(path: &Path, documents: &[Value]) -> Result<()> {
    if documents.is_empty() {
        return Err(BisError::InvalidInput(
            "cache data needs to be a list with at least one document".to_string(),
        ));
    }
    if !documents.iter().all(Value::is_object) {
        return Err(BisError::InvalidInput(
            "cache data needs to be a list of documents".to_string(),
        ));
    }

    std::fs::write(path, serde_json::to_vec(documents)?)?;
    Ok(())
}

/// Read a cache file back and return one randomly chosen document
pub fn sample_doc_cache(path: &Path) -> Result<CacheSample> {
    if !path.exists() {
        return Err(BisError::InvalidInput(format!(
            "cache file {} does not exist",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(path)?;
    let documents = match serde_json::from_str::<Value>(&contents)? {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(BisError::InvalidInput(
                "file does not contain a non-empty array".to_string(),
            ))
        }
    };

    let document_number = rand::thread_rng().gen_range(0..documents.len());
    let document_count = documents.len();
    match documents.into_iter().nth(document_number) {
        Some(Value::Object(document)) => Ok(CacheSample {
            file: path.to_path_buf(),
            document_count,
            document_number,
            document,
        }),
        _ => Err(BisError::InvalidInput(
            "file does not contain an array of JSON objects".to_string(),
        )),
    }
}

/// Optionally write documents, then optionally return a sample for verification
pub fn doc_cache(
    path: &Path,
    documents: Option<&[Value]>,
    return_sample: bool,
) -> Result<Option<CacheSample>> {
    if let Some(documents) = documents {
        write_doc_cache(path, documents)?;
    }
    if !return_sample {
        return Ok(None);
    }
    sample_doc_cache(path).map(Some)
}
