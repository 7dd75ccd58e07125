//! Error types for SQL generation.

use strata_schema::SchemaError;
use thiserror::Error;

/// Result type alias for SQL generation.
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors that can occur while compiling schemas to SQL.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Schema resolution failed while compiling.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A column cannot be expressed in the target dialect.
    #[error("cannot render column `{table}.{column}`: {message}")]
    UnrenderableColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// A relationship names a column its schema does not have.
    #[error("relation `{relation}` of table `{table}` uses missing column `{column}`")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Relation accessor.
        relation: String,
        /// Column name.
        column: String,
    },

    /// Dialect name not recognized.
    #[error("unknown dialect '{0}'")]
    UnknownDialect(String),

    /// Data source id not present in the configuration.
    #[error("unknown data source '{0}'")]
    UnknownDataSource(String),
}

impl SqlError {
    /// Create an unrenderable column error.
    pub fn unrenderable(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnrenderableColumn {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrenderable_display() {
        let err = SqlError::unrenderable("authors", "name", "AUTOINCREMENT requires an integer column");
        assert_eq!(
            err.to_string(),
            "cannot render column `authors.name`: AUTOINCREMENT requires an integer column"
        );
    }

    #[test]
    fn test_schema_error_is_transparent() {
        let err: SqlError = SchemaError::unknown_schema("Publisher").into();
        assert_eq!(err.to_string(), "unknown schema `Publisher`");
        assert!(matches!(err, SqlError::Schema(_)));
    }

    #[test]
    fn test_lookup_errors_display() {
        assert_eq!(SqlError::UnknownDialect("oracle".into()).to_string(), "unknown dialect 'oracle'");
        assert_eq!(
            SqlError::UnknownDataSource("slave".into()).to_string(),
            "unknown data source 'slave'"
        );
    }
}
