//! Gold test set loading

use crate::ValidationError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Expected payloads, one per surviving document in document order
#[derive(Debug, Clone, PartialEq)]
pub struct GoldSet {
    entries: Vec<Value>,
}

impl GoldSet {
    /// Wrap already decoded entries
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of gold entries
    pub fn from_json_str(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ValidationError::TestSet(format!("not valid JSON: {}", e)))?;
        match value {
            Value::Array(entries) => Ok(Self::new(entries)),
            other => Err(ValidationError::TestSet(format!(
                "expected an array of gold entries, got {}",
                ldo_domain::JsonKind::of(&other)
            ))),
        }
    }

    /// Read a gold set file
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let text = fs::read_to_string(path).map_err(|source| ValidationError::TestSetIo {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_json_str(&text)?;
        info!(path = %path.display(), entries = set.len(), "Gold test set loaded");
        Ok(set)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gold entry for the document at `position` among surviving documents
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.entries.get(position)
    }

    /// Fail when fewer entries than `documents` are available
    pub fn ensure_covers(&self, documents: usize) -> Result<(), ValidationError> {
        if documents > self.entries.len() {
            return Err(ValidationError::TestSet(format!(
                "{} documents to score but only {} gold entries",
                documents,
                self.entries.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.json");
        fs::write(&path, r#"[[{"name": "John"}], [{"name": "Ann"}]]"#).unwrap();

        let set = GoldSet::from_file(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1), Some(&json!([{"name": "Ann"}])));
        assert!(set.get(2).is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = GoldSet::from_file(Path::new("/nonexistent/gold.json"));
        assert!(matches!(result, Err(ValidationError::TestSetIo { .. })));
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            GoldSet::from_json_str(r#"{"name": "John"}"#),
            Err(ValidationError::TestSet(_))
        ));
    }

    #[test]
    fn test_coverage() {
        let set = GoldSet::new(vec![json!([])]);
        assert!(set.ensure_covers(1).is_ok());
        assert!(set.ensure_covers(2).is_err());
    }
}
