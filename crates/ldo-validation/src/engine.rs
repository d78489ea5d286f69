//! Schema conformity scoring

use crate::similarity::gold_metrics;
use crate::{ValidationConfig, ValidationError};
use ldo_domain::{ColumnSpec, JsonKind, MissingField, TableSchema, ValidationReport};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Scores a parsed payload against the table schema
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create an engine with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Score `rows` (a JSON array of objects), optionally against a gold value
    pub fn score(
        &self,
        schema: &TableSchema,
        rows: &Value,
        gold: Option<&Value>,
    ) -> Result<ValidationReport, ValidationError> {
        let items = rows
            .as_array()
            .ok_or_else(|| ValidationError::NotAnArray(JsonKind::of(rows).to_string()))?;

        let missing_mandatory_fields = missing_mandatory_fields(schema, items);
        let data_type_errors = data_type_errors(schema, items);
        let tally = conformity(schema, items);

        let gold = gold.map(|gold| gold_metrics(rows, gold, self.config.similarity_threshold));

        let report = ValidationReport {
            missing_mandatory_fields,
            data_type_errors,
            conformant_fields: tally.conformant,
            unknown_fields: tally.unknown,
            total_fields_checked: tally.total,
            conformity_rate: tally.rate(tally.conformant),
            unknown_rate: tally.rate(tally.unknown),
            gold,
        };

        debug!(table = %schema.name, rows = items.len(), %report, "Document scored");
        Ok(report)
    }

    /// Score against a schema given as JSON: either the full schema object
    /// or a bare array of columns
    pub fn score_json(
        &self,
        schema_json: &str,
        rows: &Value,
        gold: Option<&Value>,
    ) -> Result<ValidationReport, ValidationError> {
        let value: Value = serde_json::from_str(schema_json)
            .map_err(|e| ldo_domain::SchemaError::Invalid(e.to_string()))?;
        let schema = match &value {
            Value::Object(_) => TableSchema::from_json(&value)?,
            _ => TableSchema::new("", TableSchema::columns_from_json(&value)?),
        };
        self.score(&schema, rows, gold)
    }
}

fn missing_mandatory_fields(schema: &TableSchema, rows: &[Value]) -> Vec<MissingField> {
    let mandatory: Vec<&ColumnSpec> = schema.mandatory_columns().collect();
    let mut missing = Vec::new();
    for (row, item) in rows.iter().enumerate() {
        for column in &mandatory {
            if item.get(&column.name).is_none_or(Value::is_null) {
                missing.push(MissingField {
                    row,
                    column: column.name.clone(),
                });
            }
        }
    }
    missing
}

fn data_type_errors(schema: &TableSchema, rows: &[Value]) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for (row, item) in rows.iter().enumerate() {
        for column in &schema.columns {
            let Some(value) = item.get(&column.name).filter(|v| !v.is_null()) else {
                continue;
            };
            // Unrecognized SQL types are not judged here
            let Some(family) = column.family() else {
                continue;
            };
            let kind = JsonKind::of(value);
            if !family.accepts(kind) {
                errors.insert(
                    format!("[{}].{}", row, column.name),
                    format!("has type {}, expected {}", kind, column.sql_type),
                );
            }
        }
    }
    errors
}

#[derive(Debug, Default)]
struct Tally {
    conformant: usize,
    unknown: usize,
    total: usize,
}

impl Tally {
    fn rate(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }
}

fn conformity(schema: &TableSchema, rows: &[Value]) -> Tally {
    let checked: HashMap<&str, &ColumnSpec> = schema
        .columns
        .iter()
        .filter(|c| c.is_extracted())
        .map(|c| (c.name.as_str(), c))
        .collect();

    let mut tally = Tally::default();
    for fields in rows.iter().filter_map(Value::as_object) {
        for (name, value) in fields {
            tally.total += 1;
            let accepted = checked
                .get(name.as_str())
                .and_then(|column| column.family())
                .is_some_and(|family| family.accepts(JsonKind::of(value)));
            if accepted {
                tally.conformant += 1;
            } else {
                tally.unknown += 1;
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn orders() -> TableSchema {
        TableSchema::new(
            "orders",
            vec![
                ColumnSpec::new("id", "INT").auto_increment(),
                ColumnSpec::new("customer", "VARCHAR(50)").not_null(),
                ColumnSpec::new("amount", "DECIMAL(10,2)").not_null(),
                ColumnSpec::new("paid", "BOOLEAN"),
                ColumnSpec::new("created_at", "TIMESTAMP").with_default("CURRENT_TIMESTAMP"),
            ],
        )
    }

    #[test]
    fn test_fully_conformant_rows() {
        let rows = json!([
            {"customer": "Ann", "amount": 10.5, "paid": true},
            {"customer": "Bob", "amount": 3.25}
        ]);
        let report = ValidationEngine::default().score(&orders(), &rows, None).unwrap();

        assert!(report.missing_mandatory_fields.is_empty());
        assert!(report.data_type_errors.is_empty());
        assert_eq!(report.total_fields_checked, 5);
        assert_eq!(report.conformity_rate, 1.0);
        assert_eq!(report.unknown_rate, 0.0);
        assert!(report.gold.is_none());
    }

    #[test]
    fn test_missing_amount_scenario() {
        let rows = json!([
            {"customer": "Ann", "amount": 10.5},
            {"customer": "Bob"},
            {"customer": "Cid", "amount": null}
        ]);
        let report = ValidationEngine::default().score(&orders(), &rows, None).unwrap();

        assert_eq!(
            report.missing_mandatory_fields,
            vec![
                MissingField { row: 1, column: "amount".to_string() },
                MissingField { row: 2, column: "amount".to_string() },
            ]
        );
        // The null amount is counted as an unknown field
        assert_eq!(report.total_fields_checked, 5);
        assert_eq!(report.unknown_fields, 1);
    }

    #[test]
    fn test_type_errors_and_unknown_fields() {
        let rows = json!([{"customer": 42, "amount": "ten", "id": "x", "color": "red"}]);
        let report = ValidationEngine::default().score(&orders(), &rows, None).unwrap();

        assert_eq!(
            report.data_type_errors.get("[0].customer").map(String::as_str),
            Some("has type integer, expected VARCHAR(50)")
        );
        assert_eq!(
            report.data_type_errors.get("[0].amount").map(String::as_str),
            Some("has type text, expected DECIMAL(10,2)")
        );
        // Declared columns are type-checked even when auto-increment
        assert!(report.data_type_errors.contains_key("[0].id"));
        assert_eq!(report.total_fields_checked, 4);
        assert_eq!(report.conformant_fields, 0);
        assert_eq!(report.unknown_rate, 1.0);
    }

    #[test]
    fn test_integer_is_not_floating() {
        let rows = json!([{"customer": "Ann", "amount": 10}]);
        let report = ValidationEngine::default().score(&orders(), &rows, None).unwrap();
        assert!(report.data_type_errors.contains_key("[0].amount"));
    }

    #[test]
    fn test_empty_payload() {
        let report = ValidationEngine::default().score(&orders(), &json!([]), None).unwrap();
        assert_eq!(report.total_fields_checked, 0);
        assert_eq!(report.conformity_rate, 0.0);
        assert_eq!(report.unknown_rate, 0.0);
    }

    #[test]
    fn test_non_array_payload_is_error() {
        let result = ValidationEngine::default().score(&orders(), &json!({"customer": "Ann"}), None);
        assert!(matches!(result, Err(ValidationError::NotAnArray(kind)) if kind == "object"));
    }

    #[test]
    fn test_score_json_with_bare_columns() {
        let schema = r#"[
            {"name": "id", "type": "INT", "nullable": false, "autoIncrement": "YES"},
            {"name": "name", "type": "VARCHAR", "size": 50, "nullable": false}
        ]"#;
        let rows = json!([{"name": "Jon"}]);
        let gold = json!([{"name": "John"}]);
        let report = ValidationEngine::default()
            .score_json(schema, &rows, Some(&gold))
            .unwrap();

        assert!(report.missing_mandatory_fields.is_empty());
        let metrics = report.gold.unwrap();
        assert_eq!(metrics.f1, 1.0);
        assert!(metrics.jaccard_similarity < 1.0);
    }

    #[test]
    fn test_score_json_rejects_malformed_schema() {
        let engine = ValidationEngine::default();
        assert!(matches!(
            engine.score_json(r#"[{"name": "x"}]"#, &json!([]), None),
            Err(ValidationError::Schema(_))
        ));
        assert!(matches!(
            engine.score_json(r#""columns""#, &json!([]), None),
            Err(ValidationError::Schema(_))
        ));
        assert!(matches!(
            engine.score_json("not json", &json!([]), None),
            Err(ValidationError::Schema(_))
        ));
    }

    fn field_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            (-1000.0f64..1000.0).prop_map(|f| json!(f + 0.5)),
            "[a-z]{0,6}".prop_map(Value::from),
        ]
    }

    fn row() -> impl Strategy<Value = Value> {
        prop::collection::btree_map(
            prop_oneof![
                Just("id".to_string()),
                Just("customer".to_string()),
                Just("amount".to_string()),
                Just("paid".to_string()),
                Just("created_at".to_string()),
                "[a-z]{1,4}",
            ],
            field_value(),
            0..6,
        )
        .prop_map(|fields| Value::Object(fields.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn conformity_bounds_hold(rows in prop::collection::vec(row(), 0..8)) {
            let report = ValidationEngine::default()
                .score(&orders(), &Value::Array(rows), None)
                .unwrap();
            prop_assert_eq!(
                report.conformant_fields + report.unknown_fields,
                report.total_fields_checked
            );
            prop_assert!((0.0..=1.0).contains(&report.conformity_rate));
            prop_assert!((0.0..=1.0).contains(&report.unknown_rate));
            if report.total_fields_checked > 0 {
                prop_assert!((report.conformity_rate + report.unknown_rate - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn mandatory_fields_are_exhaustive(rows in prop::collection::vec(row(), 0..8)) {
            let schema = orders();
            let report = ValidationEngine::default()
                .score(&schema, &Value::Array(rows.clone()), None)
                .unwrap();

            let mut expected = Vec::new();
            for (index, item) in rows.iter().enumerate() {
                for column in ["customer", "amount"] {
                    if item.get(column).map_or(true, Value::is_null) {
                        expected.push(MissingField { row: index, column: column.to_string() });
                    }
                }
            }
            prop_assert_eq!(report.missing_mandatory_fields, expected);
        }
    }
}
