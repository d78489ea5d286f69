//! Flatten JSON values into `path=value` entries

use serde_json::Value;
use std::collections::BTreeSet;

/// One flattened leaf
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    /// `[0].address.city`
    pub path: String,
    /// Leaf rendered as text (strings without quotes)
    pub value: String,
}

impl Entry {
    /// `path=value`
    pub fn render(&self) -> String {
        format!("{}={}", self.path, self.value)
    }
}

/// Flatten `value` into a set of entries.
///
/// Null leaves are omitted. A null array element is skipped without
/// advancing the index, so `[null, {"a":1}]` flattens to `[0].a=1`.
pub fn flatten(value: &Value) -> BTreeSet<Entry> {
    let mut entries = BTreeSet::new();
    walk(value, String::new(), &mut entries);
    entries
}

fn walk(value: &Value, path: String, entries: &mut BTreeSet<Entry>) {
    match value {
        Value::Null => {}
        Value::Array(elements) => {
            for (index, element) in elements.iter().filter(|e| !e.is_null()).enumerate() {
                walk(element, format!("{}[{}]", path, index), entries);
            }
        }
        Value::Object(fields) => {
            for (key, field) in fields {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(field, child, entries);
            }
        }
        Value::String(s) => {
            entries.insert(Entry {
                path,
                value: s.clone(),
            });
        }
        leaf => {
            entries.insert(Entry {
                path,
                value: leaf.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(value: &Value) -> Vec<String> {
        flatten(value).iter().map(Entry::render).collect()
    }

    #[test]
    fn test_rows_are_indexed() {
        let value = json!([{"name": "John", "age": 30}, {"name": "Ann"}]);
        assert_eq!(
            rendered(&value),
            vec!["[0].age=30", "[0].name=John", "[1].name=Ann"]
        );
    }

    #[test]
    fn test_nested_paths() {
        let value = json!([{"address": {"city": "Recife"}, "tags": ["a", "b"]}]);
        assert_eq!(
            rendered(&value),
            vec!["[0].address.city=Recife", "[0].tags[0]=a", "[0].tags[1]=b"]
        );
    }

    #[test]
    fn test_nulls_are_skipped_without_advancing() {
        let value = json!([null, {"name": "John", "nick": null}]);
        assert_eq!(rendered(&value), vec!["[0].name=John"]);
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(rendered(&json!(true)), vec!["=true"]);
        assert!(flatten(&json!(null)).is_empty());
    }
}
