//! Finalized schema definition.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::{Column, ColumnIndex, Relationship};
use crate::error::{SchemaError, SchemaResult};
use crate::naming;

/// Data source used when a schema does not route elsewhere.
pub const DEFAULT_DATA_SOURCE: &str = "default";

/// A finalized schema: one storage entity's columns, relationships and
/// metadata.
///
/// Schemas are produced by [`SchemaBuilder::build`](crate::SchemaBuilder::build)
/// and are structurally immutable afterwards. Fields stay public for
/// introspection; mutating them after the build is not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Declaration name (`AuthorSchema`, `app::model::Book`).
    pub name: SmolStr,
    /// Table name.
    pub table: String,
    /// Human readable label.
    pub label: String,
    /// Columns in declaration order. An auto-id column, when synthesized, comes first.
    pub columns: IndexMap<SmolStr, Column>,
    /// Relationships keyed by accessor.
    pub relations: IndexMap<SmolStr, Relationship>,
    /// Primary key column name.
    pub primary_key: Option<SmolStr>,
    /// Data source used for reads.
    pub read_source: SmolStr,
    /// Data source used for writes.
    pub write_source: SmolStr,
    /// Names of the mixins applied, in order.
    pub mixins: Vec<SmolStr>,
    /// Seed names used to populate base data.
    pub seeds: Vec<SmolStr>,
    /// Traits mixed into the generated model.
    pub model_traits: Vec<String>,
    /// Traits mixed into the generated collection.
    pub collection_traits: Vec<String>,
    /// Whether generated models get per-column accessors.
    pub column_accessors: bool,
    /// File the declaration lives in, for staleness checks.
    pub source_file: Option<PathBuf>,
}

impl Schema {
    /// Get the declaration name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Get the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Model class: the declaration name without its `Schema` suffix.
    pub fn model_class(&self) -> &str {
        naming::model_class(&self.name)
    }

    /// Model name: the last path segment of the model class.
    pub fn model_name(&self) -> &str {
        naming::short_name(self.model_class())
    }

    /// Namespace of the model class.
    pub fn namespace(&self) -> &str {
        naming::namespace(self.model_class())
    }

    /// Lower-cased model name, used for routing and front-end identifiers.
    pub fn resource_id(&self) -> String {
        self.model_name().to_lowercase()
    }

    pub fn collection_class(&self) -> String {
        format!("{}Collection", self.model_class())
    }

    pub fn base_model_class(&self) -> String {
        format!("{}Base", self.model_class())
    }

    pub fn base_collection_class(&self) -> String {
        format!("{}CollectionBase", self.model_class())
    }

    pub fn schema_proxy_class(&self) -> String {
        format!("{}SchemaProxy", self.model_class())
    }

    /// Get columns in order, optionally including virtual ones.
    pub fn columns(&self, include_virtual: bool) -> Vec<&Column> {
        self.columns
            .values()
            .filter(|c| include_virtual || !c.is_virtual)
            .collect()
    }

    /// Get column names in order, optionally including virtual ones.
    pub fn column_names(&self, include_virtual: bool) -> Vec<&str> {
        self.columns(include_virtual)
            .into_iter()
            .map(|c| c.name())
            .collect()
    }

    /// Get the labels of columns that have one.
    pub fn column_labels(&self, include_virtual: bool) -> Vec<&str> {
        self.columns(include_virtual)
            .into_iter()
            .filter_map(|c| c.label.as_deref())
            .collect()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a relationship by accessor.
    pub fn relation(&self, accessor: &str) -> Option<&Relationship> {
        self.relations.get(accessor)
    }

    /// Get the primary key column name.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Get the primary key column.
    pub fn primary_key_column(&self) -> Option<&Column> {
        self.primary_key().and_then(|pk| self.column(pk))
    }

    /// Persisted columns carrying an index flag.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .values()
            .filter(|c| {
                c.is_persisted() && c.index.as_ref().is_some_and(ColumnIndex::is_enabled)
            })
    }

    /// Message identifiers for translation catalogs: the schema label
    /// followed by every column label.
    pub fn msg_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.label()];
        ids.extend(self.column_labels(false));
        ids
    }

    /// Modification time of the declaration file, if one was recorded.
    pub fn modification_time(&self) -> SchemaResult<Option<SystemTime>> {
        match &self.source_file {
            Some(path) => mtime(path).map(Some),
            None => Ok(None),
        }
    }

    /// Check whether the declaration is newer than a generated file.
    ///
    /// A missing target, or a schema without a recorded source file, counts
    /// as newer so the caller regenerates.
    pub fn is_newer_than_file(&self, path: impl AsRef<Path>) -> SchemaResult<bool> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(true);
        }
        match self.modification_time()? {
            Some(source) => Ok(source > mtime(path)?),
            None => Ok(true),
        }
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn mtime(path: &Path) -> SchemaResult<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })
}
