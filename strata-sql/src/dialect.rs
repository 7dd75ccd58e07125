//! SQL dialect descriptors: identifier quoting, type mapping and literals.

use serde::{Deserialize, Serialize};
use strata_schema::{Column, ColumnType, DatabaseProvider, Value};

use crate::error::{SqlError, SqlResult};

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    /// MySQL / MariaDB.
    MySql,
}

impl Dialect {
    /// Look up a dialect by driver name.
    pub fn from_name(name: &str) -> SqlResult<Self> {
        DatabaseProvider::from_driver(name)
            .map(Self::from)
            .ok_or_else(|| SqlError::UnknownDialect(name.to_string()))
    }

    /// Get the dialect name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "pgsql",
            Self::MySql => "mysql",
        }
    }

    /// Identifier quote character.
    pub fn quote_char(&self) -> char {
        match self {
            Self::MySql => '`',
            Self::Sqlite | Self::Postgres => '"',
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Whether foreign keys are declared inline as column `REFERENCES` clauses
    /// instead of separate statements.
    pub fn inline_references(&self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Whether separate `CREATE INDEX` statements are emitted.
    pub fn separate_indexes(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Whether separate foreign key constraints are emitted.
    pub fn separate_foreign_keys(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Physical type for a column: the declared type, or the mapping of its
    /// semantic type.
    pub fn column_type(&self, column: &Column) -> String {
        match &column.sql_type {
            Some(t) if *self == Self::Postgres => postgres_type(t),
            Some(t) => t.clone(),
            None => self.map_type(column.isa).to_string(),
        }
    }

    /// Map a semantic type to this dialect's type.
    pub fn map_type(&self, isa: ColumnType) -> &'static str {
        match self {
            Self::Sqlite => match isa {
                ColumnType::Int | ColumnType::BigInt => "INTEGER",
                ColumnType::Str | ColumnType::Json => "TEXT",
                ColumnType::Bool => "BOOLEAN",
                ColumnType::Double | ColumnType::Float => "REAL",
                ColumnType::DateTime => "DATETIME",
                ColumnType::Date => "DATE",
                ColumnType::Binary => "BLOB",
            },
            Self::Postgres => match isa {
                ColumnType::Int => "INTEGER",
                ColumnType::BigInt => "BIGINT",
                ColumnType::Str => "TEXT",
                ColumnType::Bool => "BOOLEAN",
                ColumnType::Double => "DOUBLE PRECISION",
                ColumnType::Float => "REAL",
                ColumnType::DateTime => "TIMESTAMP",
                ColumnType::Date => "DATE",
                ColumnType::Json => "JSONB",
                ColumnType::Binary => "BYTEA",
            },
            Self::MySql => match isa {
                ColumnType::Int => "INT",
                ColumnType::BigInt => "BIGINT",
                ColumnType::Str => "TEXT",
                ColumnType::Bool => "TINYINT(1)",
                ColumnType::Double => "DOUBLE",
                ColumnType::Float => "FLOAT",
                ColumnType::DateTime => "DATETIME",
                ColumnType::Date => "DATE",
                ColumnType::Json => "JSON",
                ColumnType::Binary => "BLOB",
            },
        }
    }

    /// Render a literal default value. Returns `None` for values the
    /// dialect cannot express, such as non-finite floats.
    pub fn literal(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => Some("NULL".to_string()),
            Value::Bool(b) => Some(match (self, b) {
                (Self::Postgres, true) => "TRUE".to_string(),
                (Self::Postgres, false) => "FALSE".to_string(),
                (_, true) => "1".to_string(),
                (_, false) => "0".to_string(),
            }),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) if f.is_finite() => Some(f.to_string()),
            Value::Float(_) => None,
            Value::Text(s) => Some(quote_string(s)),
            Value::Timestamp(ts) => Some(quote_string(&ts.format("%Y-%m-%d %H:%M:%S").to_string())),
            Value::Raw(expr) => Some(expr.clone()),
        }
    }
}

impl From<DatabaseProvider> for Dialect {
    fn from(provider: DatabaseProvider) -> Self {
        match provider {
            DatabaseProvider::Sqlite => Self::Sqlite,
            DatabaseProvider::PostgreSql => Self::Postgres,
            DatabaseProvider::MySql => Self::MySql,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rewrite declared types PostgreSQL does not accept.
fn postgres_type(declared: &str) -> String {
    let lower = declared.to_ascii_lowercase();
    match lower.as_str() {
        "datetime" => "TIMESTAMP".to_string(),
        "double" => "DOUBLE PRECISION".to_string(),
        "blob" => "BYTEA".to_string(),
        _ => match lower.strip_prefix("double(") {
            Some(args) => format!("NUMERIC({}", args),
            None => declared.to_string(),
        },
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
