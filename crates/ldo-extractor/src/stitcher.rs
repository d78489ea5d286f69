//! Stitch per-segment model answers into one JSON array
//!
//! Answers arrive wrapped in markdown fences, with prose around the array,
//! or not as JSON at all. Each fragment is cleaned on its own; a fragment
//! that still fails to parse is dropped without affecting the others.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Result of stitching a document's fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StitchOutcome {
    /// Row objects in segment order
    pub rows: Vec<Value>,
    /// Fragments that could not be parsed
    pub dropped: usize,
    /// Fragments that carried no array
    pub empty: usize,
}

impl StitchOutcome {
    /// The rows as one JSON array value
    pub fn to_value(&self) -> Value {
        Value::Array(self.rows.clone())
    }

    /// Consume into one JSON array value
    pub fn into_value(self) -> Value {
        Value::Array(self.rows)
    }
}

/// Remove markdown fences and keep the text between the first `[` and
/// the last `]`. `None` when no array opens in the fragment.
pub fn clean_fragment(raw: &str) -> Option<String> {
    let unfenced = raw
        .replace("```json", "")
        .replace("```", "")
        .replace("`[]`", "[]");

    let mut text = unfenced.as_str();
    if let Some(last) = text.rfind(']') {
        text = &text[..=last];
    }
    let first = text.find('[')?;
    Some(text[first..].to_string())
}

/// Merge raw fragments, in order, into one outcome
pub fn merge<S: AsRef<str>>(fragments: &[S]) -> StitchOutcome {
    let mut outcome = StitchOutcome::default();

    for (segment, raw) in fragments.iter().enumerate() {
        let Some(cleaned) = clean_fragment(raw.as_ref()) else {
            debug!(segment, "Fragment has no array, skipping");
            outcome.empty += 1;
            continue;
        };

        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Array(elements)) => {
                for element in elements {
                    match element {
                        // Some models answer [[...],[...]]
                        Value::Array(nested) => outcome.rows.extend(nested),
                        other => outcome.rows.push(other),
                    }
                }
            }
            Ok(other) => {
                warn!(segment, kind = ?other, "Fragment is not an array, dropping");
                outcome.dropped += 1;
            }
            Err(e) => {
                warn!(segment, error = %e, "Fragment is not valid JSON, dropping");
                outcome.dropped += 1;
            }
        }
    }

    outcome
}

/// Merge raw fragments into JSON text
pub fn merge_to_string<S: AsRef<str>>(fragments: &[S]) -> String {
    merge(fragments).into_value().to_string()
}
