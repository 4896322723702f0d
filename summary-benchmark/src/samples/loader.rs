//! Dataset loading from JSON files

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::Sample;

/// Keys read by the loader; everything else is carried as metadata
const ID_KEY: &str = "id";
const ARTICLE_KEYS: [&str; 2] = ["article", "text"];
const REFERENCE_KEYS: [&str; 3] = ["reference_summary", "reference", "golden_summary"];
const TITLE_KEY: &str = "title";
const INTRO_KEY: &str = "intro";

/// Error type for dataset loading
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Dataset must be a JSON array of objects")]
    NotAnArray,

    #[error("Dataset item {index} is not an object")]
    NotAnObject { index: usize },

    #[error("Dataset item {index} is missing a string or numeric 'id'")]
    MissingId { index: usize },

    #[error("Dataset item {index} (id {id}) is missing 'article' text")]
    MissingArticle { index: usize, id: String },
}

/// Load samples from a JSON file, keeping at most `limit` of them.
///
/// The limit is applied before validation, so records past it are never
/// inspected.
pub fn load_dataset(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<Sample>, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let samples = load_dataset_from_str(&content, limit)?;
    tracing::info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load samples from a JSON string
pub fn load_dataset_from_str(content: &str, limit: Option<usize>) -> Result<Vec<Sample>, DatasetError> {
    let payload: Value = serde_json::from_str(content)
        .map_err(|e| DatasetError::Parse(format!("JSON parse error: {}", e)))?;

    let Value::Array(mut items) = payload else {
        return Err(DatasetError::NotAnArray);
    };

    if let Some(limit) = limit {
        items.truncate(limit);
    }

    let mut seen = HashSet::new();
    let mut samples = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(DatasetError::NotAnObject { index });
        };

        let sample = parse_sample(obj, index)?;
        if !seen.insert(sample.id.clone()) {
            tracing::warn!("Duplicate sample id {} at index {}", sample.id, index);
        }
        samples.push(sample);
    }

    Ok(samples)
}

/// Parse a single sample object
fn parse_sample(obj: Map<String, Value>, index: usize) -> Result<Sample, DatasetError> {
    let id = match obj.get(ID_KEY) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(DatasetError::MissingId { index }),
    };

    let article = first_text(&obj, &ARTICLE_KEYS).ok_or_else(|| DatasetError::MissingArticle {
        index,
        id: id.clone(),
    })?;

    let reference_summary = first_text(&obj, &REFERENCE_KEYS);
    let title = first_text(&obj, &[TITLE_KEY]);
    let intro = first_text(&obj, &[INTRO_KEY]);

    let metadata: IndexMap<String, Value> = obj
        .into_iter()
        .filter(|(key, _)| !is_consumed(key))
        .collect();

    Ok(Sample {
        id,
        article,
        title,
        intro,
        reference_summary,
        metadata,
    })
}

fn is_consumed(key: &str) -> bool {
    key == ID_KEY
        || key == TITLE_KEY
        || key == INTRO_KEY
        || ARTICLE_KEYS.contains(&key)
        || REFERENCE_KEYS.contains(&key)
}

/// First non-blank string found under `keys`, in key order
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(String::from)
}
