//! Column definitions for the Strata schema model.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{ColumnIndex, ColumnType, DefaultValue, Value};

/// A column of a schema.
///
/// Columns are created by [`SchemaBuilder::column`](crate::SchemaBuilder::column)
/// and configured through chained setters. Nothing is validated here; the
/// builder and the SQL builders enforce constraints later.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within its schema.
    pub name: SmolStr,
    /// Semantic type tag.
    pub isa: ColumnType,
    /// Physical type override, emitted verbatim in DDL.
    pub sql_type: Option<String>,
    /// Reject NULL values.
    pub not_null: bool,
    /// Primary key flag.
    pub primary: bool,
    /// Auto-increment flag.
    pub auto_increment: bool,
    /// Unique constraint flag.
    pub unique: bool,
    /// Computed column, never persisted.
    pub is_virtual: bool,
    /// Column gets per-locale copies from the localize mixin.
    pub localize: bool,
    /// Index flag (synthesized or explicit name).
    pub index: Option<ColumnIndex>,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Name of the schema this column refers to.
    pub refer: Option<SmolStr>,
    /// Human readable label.
    pub label: Option<String>,
}

impl Column {
    /// Create a new string column with no flags set.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            isa: ColumnType::Str,
            sql_type: None,
            not_null: false,
            primary: false,
            auto_increment: false,
            unique: false,
            is_virtual: false,
            localize: false,
            index: None,
            default: None,
            refer: None,
            label: None,
        }
    }

    /// Get the column name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Set the semantic type tag.
    pub fn isa(&mut self, isa: ColumnType) -> &mut Self {
        self.isa = isa;
        self
    }

    /// Override the physical DDL type.
    pub fn sql_type(&mut self, sql_type: impl Into<String>) -> &mut Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    /// Integer column.
    pub fn integer(&mut self) -> &mut Self {
        self.isa = ColumnType::Int;
        self.sql_type = Some("integer".to_string());
        self
    }

    /// 64-bit integer column.
    pub fn big_integer(&mut self) -> &mut Self {
        self.isa = ColumnType::BigInt;
        self.sql_type = Some("bigint".to_string());
        self
    }

    /// Variable length string column.
    pub fn varchar(&mut self, length: u32) -> &mut Self {
        self.isa = ColumnType::Str;
        self.sql_type = Some(format!("varchar({})", length));
        self
    }

    /// Unbounded text column.
    pub fn text(&mut self) -> &mut Self {
        self.isa = ColumnType::Str;
        self.sql_type = Some("text".to_string());
        self
    }

    /// Boolean column.
    pub fn boolean(&mut self) -> &mut Self {
        self.isa = ColumnType::Bool;
        self.sql_type = Some("boolean".to_string());
        self
    }

    /// Double column with the given precision and scale.
    pub fn double(&mut self, precision: u32, scale: u32) -> &mut Self {
        self.isa = ColumnType::Double;
        self.sql_type = Some(format!("double({},{})", precision, scale));
        self
    }

    /// Single precision float column.
    pub fn float(&mut self) -> &mut Self {
        self.isa = ColumnType::Float;
        self.sql_type = Some("float".to_string());
        self
    }

    /// Timestamp column. The semantic type is left untouched so callers can
    /// pair it with `isa(ColumnType::DateTime)`.
    pub fn timestamp(&mut self) -> &mut Self {
        self.sql_type = Some("timestamp".to_string());
        self
    }

    /// Date-time column.
    pub fn datetime(&mut self) -> &mut Self {
        self.isa = ColumnType::DateTime;
        self.sql_type = Some("datetime".to_string());
        self
    }

    /// Date column.
    pub fn date(&mut self) -> &mut Self {
        self.isa = ColumnType::Date;
        self.sql_type = Some("date".to_string());
        self
    }

    /// JSON column. The physical type is left to the dialect.
    pub fn json(&mut self) -> &mut Self {
        self.isa = ColumnType::Json;
        self.sql_type = None;
        self
    }

    /// Binary column. The physical type is left to the dialect.
    pub fn binary(&mut self) -> &mut Self {
        self.isa = ColumnType::Binary;
        self.sql_type = None;
        self
    }

    /// Mark the column NOT NULL.
    pub fn not_null(&mut self) -> &mut Self {
        self.not_null = true;
        self
    }

    /// Allow NULL values.
    pub fn null(&mut self) -> &mut Self {
        self.not_null = false;
        self
    }

    /// Mark the column as primary key.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    /// Mark the column auto-increment.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Add a unique constraint.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Mark the column virtual (computed, not persisted).
    pub fn virtual_column(&mut self) -> &mut Self {
        self.is_virtual = true;
        self
    }

    /// Ask the localize mixin to add per-locale copies of this column.
    pub fn localize(&mut self) -> &mut Self {
        self.localize = true;
        self
    }

    /// Index the column with a synthesized name.
    pub fn index(&mut self) -> &mut Self {
        self.index = Some(ColumnIndex::Auto(true));
        self
    }

    /// Index the column with an explicit index name.
    pub fn index_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.index = Some(ColumnIndex::Named(name.into()));
        self
    }

    /// Set a literal default value.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Set a producer default, invoked at row-creation time.
    pub fn default_with<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::producer(f));
        self
    }

    /// Hint that this column refers to another schema.
    pub fn refer(&mut self, schema: impl Into<SmolStr>) -> &mut Self {
        self.refer = Some(schema.into());
        self
    }

    /// Set the human readable label.
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Check if the column is persisted.
    pub fn is_persisted(&self) -> bool {
        !self.is_virtual
    }

    /// Convert to the serializable export form.
    pub fn export(&self) -> ColumnExport {
        ColumnExport {
            name: self.name.clone(),
            isa: self.isa,
            sql_type: self.sql_type.clone(),
            not_null: self.not_null,
            primary: self.primary,
            auto_increment: self.auto_increment,
            unique: self.unique,
            is_virtual: self.is_virtual,
            localize: self.localize,
            index: self.index.clone(),
            default: self
                .default
                .as_ref()
                .and_then(|d| d.as_literal().cloned()),
            has_default_producer: self.default.as_ref().is_some_and(|d| d.is_producer()),
            refer: self.refer.clone(),
            label: self.label.clone(),
        }
    }
}

/// Serializable form of a [`Column`].
///
/// Producer defaults cannot be serialized; they are recorded as
/// `has_default_producer` and come back as no default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExport {
    pub name: SmolStr,
    pub isa: ColumnType,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub localize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<ColumnIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub has_default_producer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&ColumnExport> for Column {
    fn from(export: &ColumnExport) -> Self {
        Self {
            name: export.name.clone(),
            isa: export.isa,
            sql_type: export.sql_type.clone(),
            not_null: export.not_null,
            primary: export.primary,
            auto_increment: export.auto_increment,
            unique: export.unique,
            is_virtual: export.is_virtual,
            localize: export.localize,
            index: export.index.clone().filter(ColumnIndex::is_enabled),
            default: export.default.clone().map(DefaultValue::Literal),
            refer: export.refer.clone(),
            label: export.label.clone(),
        }
    }
}
