//! Error types for schema declaration, resolution and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while declaring, finalizing or resolving schemas.
///
/// Declaration errors (duplicate columns, unknown mixins, many-to-many
/// relations without a junction) are raised while the declaration closure
/// runs. Resolution errors (unknown foreign schemas, unresolvable `refer`
/// hints) are deferred until export or DDL build time.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(strata::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A column with the same name was declared twice.
    #[error("column `{column}` of `{schema}` is already defined")]
    #[diagnostic(code(strata::schema::duplicate_column))]
    DuplicateColumn { schema: String, column: String },

    /// A relation accessor was explicitly added twice.
    #[error("relation `{relation}` of `{schema}` is already defined")]
    #[diagnostic(code(strata::schema::duplicate_relation))]
    DuplicateRelation { schema: String, relation: String },

    /// A mixin name could not be resolved.
    #[error("mixin `{mixin}` used by `{schema}` not found")]
    #[diagnostic(
        code(strata::schema::mixin_not_found),
        help("register the mixin on the MixinRegistry before building")
    )]
    MixinNotFound { schema: String, mixin: String },

    /// A many-to-many relation referenced a junction relation that does not exist yet.
    #[error("relation `{relation}` is not defined on `{schema}` (required by `{accessor}`)")]
    #[diagnostic(
        code(strata::schema::relation_not_defined),
        help("declare the junction relation before the many-to-many relation")
    )]
    RelationNotDefined {
        schema: String,
        relation: String,
        accessor: String,
    },

    /// A schema name is not present in the registry.
    #[error("unknown schema `{name}`")]
    #[diagnostic(code(strata::schema::unknown_schema))]
    UnknownSchema { name: String },

    /// A column `refer` hint points at a schema that is not registered.
    #[error("refer schema `{refer}` of `{schema}.{column}` not found")]
    #[diagnostic(code(strata::schema::referenced_schema_not_found))]
    ReferencedSchemaNotFound {
        schema: String,
        column: String,
        refer: String,
    },

    /// A relation names a foreign schema that is not registered.
    #[error("foreign schema `{foreign}` of relation `{schema}.{relation}` not found")]
    #[diagnostic(code(strata::schema::foreign_schema_not_found))]
    ForeignSchemaNotFound {
        schema: String,
        relation: String,
        foreign: String,
    },

    /// More than one column is flagged as primary key.
    #[error("schema `{schema}` declares more than one primary key: {}", columns.join(", "))]
    #[diagnostic(
        code(strata::schema::multiple_primary_keys),
        help("composite primary keys are not supported; flag exactly one column")
    )]
    MultiplePrimaryKeys { schema: String, columns: Vec<String> },

    /// A schema has no primary key where one is required.
    #[error("schema `{schema}` has no primary key")]
    #[diagnostic(code(strata::schema::missing_primary_key))]
    MissingPrimaryKey { schema: String },

    /// Building a schema required building itself again.
    #[error("circular schema declaration: {}", chain.join(" -> "))]
    #[diagnostic(
        code(strata::schema::circular_declaration),
        help("pass the foreign column explicitly to break the cycle")
    )]
    CircularDeclaration { chain: Vec<String> },

    /// Invalid relation definition.
    #[error("invalid relation `{schema}.{relation}`: {message}")]
    #[diagnostic(code(strata::schema::invalid_relation))]
    InvalidRelation {
        schema: String,
        relation: String,
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(strata::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(strata::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create a duplicate column error.
    pub fn duplicate_column(schema: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DuplicateColumn {
            schema: schema.into(),
            column: column.into(),
        }
    }

    /// Create a mixin-not-found error.
    pub fn mixin_not_found(schema: impl Into<String>, mixin: impl Into<String>) -> Self {
        Self::MixinNotFound {
            schema: schema.into(),
            mixin: mixin.into(),
        }
    }

    /// Create a relation-not-defined error.
    pub fn relation_not_defined(
        schema: impl Into<String>,
        relation: impl Into<String>,
        accessor: impl Into<String>,
    ) -> Self {
        Self::RelationNotDefined {
            schema: schema.into(),
            relation: relation.into(),
            accessor: accessor.into(),
        }
    }

    /// Create an unknown schema error.
    pub fn unknown_schema(name: impl Into<String>) -> Self {
        Self::UnknownSchema { name: name.into() }
    }

    /// Create a foreign-schema-not-found error.
    pub fn foreign_schema_not_found(
        schema: impl Into<String>,
        relation: impl Into<String>,
        foreign: impl Into<String>,
    ) -> Self {
        Self::ForeignSchemaNotFound {
            schema: schema.into(),
            relation: relation.into(),
            foreign: foreign.into(),
        }
    }

    /// Create an invalid relation error.
    pub fn invalid_relation(
        schema: impl Into<String>,
        relation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRelation {
            schema: schema.into(),
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Check whether this error was raised while running a declaration.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateColumn { .. }
                | Self::DuplicateRelation { .. }
                | Self::MixinNotFound { .. }
                | Self::RelationNotDefined { .. }
                | Self::MultiplePrimaryKeys { .. }
        )
    }
}
