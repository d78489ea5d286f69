//! Target table description
//!
//! A [`TableSchema`] is retrieved once per run from the database catalog and
//! is read-only afterwards. Column order matters: it is the order of the
//! prompt-facing schema JSON and the positional order of insert parameters.

use crate::error::SchemaError;
use serde_json::{json, Value};
use std::fmt;

/// One column of the target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Declared SQL type name (e.g. INT, VARCHAR, TIMESTAMP)
    pub sql_type: String,

    /// Declared size, 0 when the type carries none
    pub size: i64,

    /// Whether NULL is accepted
    pub nullable: bool,

    /// Whether the database generates the value
    pub auto_increment: bool,

    /// Column default, if declared
    pub default_value: Option<String>,
}

impl ColumnSpec {
    /// Create a nullable, non-generated column without default
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            size: 0,
            nullable: true,
            auto_increment: false,
            default_value: None,
        }
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as generated by the database
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Set the column default
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Set the declared size
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    /// Whether extracted data is expected to supply this column.
    ///
    /// Auto-increment and defaulted columns are filled by the database.
    pub fn is_extracted(&self) -> bool {
        !self.auto_increment && self.default_value.is_none()
    }

    /// Whether a row without this column is incomplete
    pub fn is_mandatory(&self) -> bool {
        self.is_extracted() && !self.nullable
    }

    /// Type family of the declared SQL type, if recognized
    pub fn family(&self) -> Option<TypeFamily> {
        TypeFamily::from_sql_type(&self.sql_type)
    }

    /// Upper-cased SQL type without size suffix (`varchar(20)` -> `VARCHAR`)
    pub fn base_type(&self) -> String {
        base_type(&self.sql_type)
    }

    fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.sql_type,
            "size": self.size,
            "nullable": self.nullable,
            "autoIncrement": if self.auto_increment { "YES" } else { "NO" },
            "defaultValue": self.default_value,
        })
    }

    fn from_json(index: usize, value: &Value) -> Result<Self, SchemaError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingAttribute { index, attribute: "name" })?;
        let sql_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingAttribute { index, attribute: "type" })?;

        let size = value.get("size").and_then(Value::as_i64).unwrap_or(0);
        let nullable = value.get("nullable").map(flag).unwrap_or(true);
        let auto_increment = value.get("autoIncrement").map(flag).unwrap_or(false);
        let default_value = match value.get("defaultValue") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            size,
            nullable,
            auto_increment,
            default_value,
        })
    }
}

/// Read a catalog flag given either as a JSON bool or as "YES"/"NO"
fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("YES") || s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

fn base_type(sql_type: &str) -> String {
    let head = sql_type.split('(').next().unwrap_or(sql_type);
    head.trim().to_ascii_uppercase()
}

/// Ordered description of the target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub name: String,

    /// Columns in catalog order
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Create a schema from its columns
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by exact name
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns the extracted rows must always supply
    pub fn mandatory_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_mandatory())
    }

    /// Schema as JSON: `{"name": ..., "columns": [...]}`
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "columns": self.columns.iter().map(ColumnSpec::to_json).collect::<Vec<_>>(),
        })
    }

    /// Compact JSON text handed to the extraction service
    pub fn to_prompt_json(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse a full schema object
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::Invalid("missing table name".to_string()))?;
        let columns = value
            .get("columns")
            .ok_or_else(|| SchemaError::Invalid("missing columns".to_string()))?;
        Ok(Self::new(name, Self::columns_from_json(columns)?))
    }

    /// Parse a bare columns array
    pub fn columns_from_json(value: &Value) -> Result<Vec<ColumnSpec>, SchemaError> {
        let array = value
            .as_array()
            .ok_or_else(|| SchemaError::NotAnArray(JsonKind::of(value).to_string()))?;
        array
            .iter()
            .enumerate()
            .map(|(index, column)| ColumnSpec::from_json(index, column))
            .collect()
    }

    /// Parse a schema from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::Invalid(e.to_string()))?;
        Self::from_json(&value)
    }
}

/// Family of JSON kinds a SQL type accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// Whole numbers
    Integer,
    /// Fractional numbers
    Floating,
    /// true / false
    Boolean,
    /// Strings, including textual dates and times
    Text,
}

impl TypeFamily {
    /// Classify a declared SQL type name
    pub fn from_sql_type(sql_type: &str) -> Option<Self> {
        let base = base_type(sql_type);
        Self::classify(&base).or_else(|| {
            // "INT UNSIGNED", "DOUBLE PRECISION", "CHARACTER VARYING"...
            base.split_whitespace().next().and_then(Self::classify)
        })
    }

    fn classify(base: &str) -> Option<Self> {
        match base {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" | "SERIAL"
            | "BIGSERIAL" | "SMALLSERIAL" | "INT2" | "INT4" | "INT8" => Some(Self::Integer),
            "FLOAT" | "DOUBLE" | "DECIMAL" | "REAL" | "NUMERIC" | "FLOAT4" | "FLOAT8" => {
                Some(Self::Floating)
            }
            "BOOLEAN" | "BOOL" | "BIT" => Some(Self::Boolean),
            "CHAR" | "CHARACTER" | "VARCHAR" | "NCHAR" | "NVARCHAR" | "TEXT" | "DATE"
            | "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" | "TIME" => Some(Self::Text),
            _ => None,
        }
    }

    /// Whether a JSON value of `kind` is compatible with this family
    pub fn accepts(&self, kind: JsonKind) -> bool {
        matches!(
            (self, kind),
            (Self::Integer, JsonKind::Integer)
                | (Self::Floating, JsonKind::Floating)
                | (Self::Boolean, JsonKind::Boolean)
                | (Self::Text, JsonKind::Text)
        )
    }
}

/// Kind of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// null
    Null,
    /// Number without fraction or exponent
    Integer,
    /// Number with fraction or exponent
    Floating,
    /// true / false
    Boolean,
    /// String
    Text,
    /// Array
    Array,
    /// Object
    Object,
}

impl JsonKind {
    /// Classify a JSON value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) => {
                // Judge by the literal so integers wider than 64 bits stay integers
                if n.to_string().contains(['.', 'e', 'E']) {
                    Self::Floating
                } else {
                    Self::Integer
                }
            }
            Value::String(_) => Self::Text,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Integer => "integer",
            Self::Floating => "floating-point",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}
