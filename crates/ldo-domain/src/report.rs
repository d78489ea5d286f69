//! Per-document validation report

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A mandatory column absent (or null) in one extracted row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MissingField {
    /// Row position in the parsed payload
    pub row: usize,
    /// Column name
    pub column: String,
}

/// Set metrics against a gold (ground-truth) value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoldMetrics {
    /// Candidate entries matched in the gold set
    pub true_positives: usize,
    /// Candidate entries without a match
    pub false_positives: usize,
    /// Gold entries nothing matched
    pub false_negatives: usize,
    /// TP / (TP + FP)
    pub precision: f64,
    /// TP / (TP + FN)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Strict |A ∩ B| / |A ∪ B| over flattened entries
    pub jaccard_similarity: f64,
}

/// Scores of one parsed document; built once, never mutated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Mandatory columns missing per row
    pub missing_mandatory_fields: Vec<MissingField>,

    /// `"[row].column"` -> description of the type mismatch
    pub data_type_errors: BTreeMap<String, String>,

    /// Fields whose kind matches a checked column
    pub conformant_fields: usize,

    /// Fields with an incompatible kind or no checked column
    pub unknown_fields: usize,

    /// All fields examined
    pub total_fields_checked: usize,

    /// conformant / total, 0 when nothing was checked
    pub conformity_rate: f64,

    /// unknown / total, 0 when nothing was checked
    pub unknown_rate: f64,

    /// Present only when a gold value was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gold: Option<GoldMetrics>,
}

impl ValidationReport {
    /// Whether any mandatory field is missing
    pub fn has_missing_fields(&self) -> bool {
        !self.missing_mandatory_fields.is_empty()
    }

    /// Whether any field had an incompatible type
    pub fn has_type_errors(&self) -> bool {
        !self.data_type_errors.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conformity={:.1}% unknown={:.1}% fields={} missing={} type_errors={}",
            self.conformity_rate * 100.0,
            self.unknown_rate * 100.0,
            self.total_fields_checked,
            self.missing_mandatory_fields.len(),
            self.data_type_errors.len(),
        )?;
        if let Some(gold) = &self.gold {
            write!(
                f,
                " precision={:.3} recall={:.3} f1={:.3} jaccard={:.3}",
                gold.precision, gold.recall, gold.f1, gold.jaccard_similarity
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(gold: Option<GoldMetrics>) -> ValidationReport {
        ValidationReport {
            missing_mandatory_fields: vec![MissingField {
                row: 0,
                column: "amount".into(),
            }],
            data_type_errors: BTreeMap::new(),
            conformant_fields: 3,
            unknown_fields: 1,
            total_fields_checked: 4,
            conformity_rate: 0.75,
            unknown_rate: 0.25,
            gold,
        }
    }

    #[test]
    fn test_display() {
        let text = report(None).to_string();
        assert_eq!(
            text,
            "conformity=75.0% unknown=25.0% fields=4 missing=1 type_errors=0"
        );
    }

    #[test]
    fn test_serialize_skips_absent_gold() {
        let json = serde_json::to_value(report(None)).unwrap();
        assert!(json.get("gold").is_none());
        assert_eq!(json["missing_mandatory_fields"][0]["column"], "amount");

        let gold = GoldMetrics {
            true_positives: 2,
            false_positives: 0,
            false_negatives: 0,
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            jaccard_similarity: 0.5,
        };
        let json = serde_json::to_value(report(Some(gold))).unwrap();
        assert_eq!(json["gold"]["true_positives"], 2);
    }
}
