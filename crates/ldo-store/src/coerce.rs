//! JSON value to SQL parameter coercion

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};
use ldo_domain::ColumnSpec;
use rusqlite::types::{ToSql, ToSqlOutput};
use serde_json::{Number, Value};

/// f64 carries 15 significant decimal digits exactly
const F64_EXACT_DIGITS: usize = 15;

/// A JSON field ready to be bound to a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// SQL NULL
    Null,
    /// 64-bit integer
    Integer(i64),
    /// Double precision float
    Real(f64),
    /// Boolean (stored as 0/1)
    Bool(bool),
    /// Text, also used for exact big numbers and nested JSON
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day, whole seconds
    Time(NaiveTime),
    /// Date-time with offset
    Timestamp(DateTime<FixedOffset>),
}

impl ToSql for BoundValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
            Self::Integer(v) => v.to_sql(),
            Self::Real(v) => v.to_sql(),
            Self::Bool(v) => v.to_sql(),
            Self::Text(v) => v.to_sql(),
            Self::Date(v) => v.to_sql(),
            Self::Time(v) => v.to_sql(),
            Self::Timestamp(v) => v.to_sql(),
        }
    }
}

/// Convert a row field for the given column; absent fields bind NULL
pub fn coerce(value: Option<&Value>, column: &ColumnSpec) -> BoundValue {
    match value {
        None | Some(Value::Null) => BoundValue::Null,
        Some(Value::Bool(b)) => BoundValue::Bool(*b),
        Some(Value::Number(n)) => coerce_number(n),
        Some(Value::String(s)) => coerce_text(s, column),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => BoundValue::Text(nested.to_string()),
    }
}

fn coerce_number(n: &Number) -> BoundValue {
    if let Some(v) = n.as_i64() {
        return BoundValue::Integer(v);
    }
    let literal = n.to_string();
    let integral = !literal.contains(['.', 'e', 'E']);
    if integral || significant_digits(&literal) > F64_EXACT_DIGITS {
        // Beyond i64, or more precision than f64 keeps
        return BoundValue::Text(literal);
    }
    match n.as_f64() {
        Some(v) if v.is_finite() => BoundValue::Real(v),
        _ => BoundValue::Text(literal),
    }
}

fn significant_digits(literal: &str) -> usize {
    let mantissa = literal.split(['e', 'E']).next().unwrap_or(literal);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if mantissa.contains('.') {
        trimmed.trim_end_matches('0')
    } else {
        trimmed
    };
    trimmed.len()
}

fn coerce_text(text: &str, column: &ColumnSpec) -> BoundValue {
    let temporal = match column.base_type().as_str() {
        "DATE" => Some(Temporal::Date),
        "TIME" => Some(Temporal::Time),
        "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" => Some(Temporal::Timestamp),
        _ => None,
    };

    let parsed = temporal.and_then(|kind| {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|moment| (kind, moment))
    });

    match parsed {
        Some((Temporal::Date, moment)) => BoundValue::Date(moment.date_naive()),
        Some((Temporal::Time, moment)) => {
            let time = moment.time();
            BoundValue::Time(time.with_nanosecond(0).unwrap_or(time))
        }
        Some((Temporal::Timestamp, moment)) => BoundValue::Timestamp(moment),
        None => BoundValue::Text(text.to_string()),
    }
}

#[derive(Debug, Clone, Copy)]
enum Temporal {
    Date,
    Time,
    Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind(value: Value, sql_type: &str) -> BoundValue {
        coerce(Some(&value), &ColumnSpec::new("c", sql_type))
    }

    #[test]
    fn test_scalars() {
        assert_eq!(bind(json!(42), "INT"), BoundValue::Integer(42));
        assert_eq!(bind(json!(-7), "BIGINT"), BoundValue::Integer(-7));
        assert_eq!(bind(json!(10.5), "DECIMAL"), BoundValue::Real(10.5));
        assert_eq!(bind(json!(true), "BOOLEAN"), BoundValue::Bool(true));
        assert_eq!(bind(json!("Ann"), "VARCHAR"), BoundValue::Text("Ann".into()));
        assert_eq!(coerce(None, &ColumnSpec::new("c", "INT")), BoundValue::Null);
        assert_eq!(bind(Value::Null, "INT"), BoundValue::Null);
    }

    #[test]
    fn test_big_numbers_stay_exact() {
        let big: Value = serde_json::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(
            bind(big, "NUMERIC"),
            BoundValue::Text("123456789012345678901234567890".into())
        );

        let precise: Value = serde_json::from_str("0.12345678901234567890").unwrap();
        assert_eq!(bind(precise, "DECIMAL"), BoundValue::Text("0.12345678901234567890".into()));

        let above_i64: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(bind(above_i64, "BIGINT"), BoundValue::Text("18446744073709551615".into()));
    }

    #[test]
    fn test_nested_values_become_json_text() {
        assert_eq!(
            bind(json!({"a": [1, 2]}), "TEXT"),
            BoundValue::Text(r#"{"a":[1,2]}"#.into())
        );
    }

    #[test]
    fn test_temporal_columns() {
        let moment = "2024-03-05T14:30:15.250+02:00";
        assert_eq!(
            bind(json!(moment), "DATE"),
            BoundValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert_eq!(
            bind(json!(moment), "TIME"),
            BoundValue::Time(NaiveTime::from_hms_opt(14, 30, 15).unwrap())
        );
        assert_eq!(
            bind(json!(moment), "TIMESTAMP"),
            BoundValue::Timestamp(DateTime::parse_from_rfc3339(moment).unwrap())
        );
    }

    #[test]
    fn test_non_rfc3339_or_non_temporal_stays_text() {
        assert_eq!(bind(json!("2024-03-05"), "DATE"), BoundValue::Text("2024-03-05".into()));
        assert_eq!(
            bind(json!("2024-03-05T14:30:15Z"), "VARCHAR"),
            BoundValue::Text("2024-03-05T14:30:15Z".into())
        );
    }

    #[test]
    fn test_significant_digits() {
        assert_eq!(significant_digits("10.50"), 3);
        assert_eq!(significant_digits("0.000123"), 3);
        assert_eq!(significant_digits("1.5e10"), 2);
    }
}
