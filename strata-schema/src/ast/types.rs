//! Value types shared by columns and relationships.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic type tag of a column (`isa`).
///
/// The tag describes what kind of value the column holds; the physical DDL
/// type is derived from it by each dialect unless the column carries an
/// explicit type override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnType {
    /// Integer.
    #[serde(rename = "int")]
    Int,
    /// 64-bit integer.
    #[serde(rename = "bigint")]
    BigInt,
    /// String (the default when nothing else is declared).
    #[default]
    #[serde(rename = "str")]
    Str,
    /// Boolean.
    #[serde(rename = "bool")]
    Bool,
    /// Double precision float.
    #[serde(rename = "double")]
    Double,
    /// Single precision float.
    #[serde(rename = "float")]
    Float,
    /// Date and time.
    #[serde(rename = "DateTime")]
    DateTime,
    /// Date only.
    #[serde(rename = "date")]
    Date,
    /// JSON document.
    #[serde(rename = "json")]
    Json,
    /// Binary blob.
    #[serde(rename = "binary")]
    Binary,
}

impl ColumnType {
    /// Parse a type tag from its declaration spelling.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "int" | "integer" => Some(Self::Int),
            "bigint" => Some(Self::BigInt),
            "str" | "string" => Some(Self::Str),
            "bool" | "boolean" => Some(Self::Bool),
            "double" => Some(Self::Double),
            "float" => Some(Self::Float),
            "DateTime" | "datetime" => Some(Self::DateTime),
            "date" => Some(Self::Date),
            "json" => Some(Self::Json),
            "binary" | "blob" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Get the tag as it is spelled in declarations and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Float => "float",
            Self::DateTime => "DateTime",
            Self::Date => "date",
            Self::Json => "json",
            Self::Binary => "binary",
        }
    }

    /// Check if this is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A literal value, used for column defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    Text(String),
    /// Timestamp literal (UTC).
    Timestamp(DateTime<Utc>),
    /// Raw SQL expression emitted verbatim, e.g. `CURRENT_TIMESTAMP`.
    Raw(String),
}

impl Value {
    /// Create a raw SQL expression value.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// Zero-argument producer invoked when a row is created.
pub type ValueProducer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default value of a column.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed literal, rendered into DDL.
    Literal(Value),
    /// A deferred producer, invoked at row-creation time and never rendered into DDL.
    Producer(ValueProducer),
}

impl DefaultValue {
    /// Create a producer default.
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(f))
    }

    /// Resolve the default: the literal itself, or the producer's output.
    pub fn evaluate(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Producer(f) => f(),
        }
    }

    /// Get the literal, if this default is one.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Producer(_) => None,
        }
    }

    /// Check if this default is a deferred producer.
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Producer(a), Self::Producer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        Self::Literal(v)
    }
}

/// Index flag of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnIndex {
    /// Index with a synthesized name (`idx_<table>_<column>`).
    Auto(bool),
    /// Index with an explicit name.
    Named(String),
}

impl ColumnIndex {
    /// Whether an index should be created. `Auto(false)` is a disabled flag.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Auto(false))
    }

    /// Resolve the index name for the given table and column.
    pub fn name_for(&self, table: &str, column: &str) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Auto(_) => format!("idx_{}_{}", table, column),
        }
    }
}

/// Referential actions for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// Cascade the operation.
    #[default]
    Cascade,
    /// Restrict the operation (error if references exist).
    Restrict,
    /// No action (deferred check).
    NoAction,
    /// Set to null.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ReferentialAction {
    /// Get the SQL spelling of the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}
