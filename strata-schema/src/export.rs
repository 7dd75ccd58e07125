//! Serializable schema export consumed by code generators.
//!
//! Exporting also folds `refer` hints into relationships: a column
//! `author_id` referring to `Author` becomes an `author` belongs-to unless
//! the schema already declares that accessor.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::ast::{ColumnExport, Relationship, Schema};
use crate::context::BuildContext;
use crate::error::{SchemaError, SchemaResult};

/// Flat, serializable description of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaExport {
    pub label: String,
    pub table: String,
    /// Column descriptions keyed by name, in column order.
    pub column_data: IndexMap<SmolStr, ColumnExport>,
    /// Column names, virtual ones included.
    pub column_names: Vec<SmolStr>,
    pub primary_key: Option<SmolStr>,
    pub model_class: String,
    pub collection_class: String,
    /// Relationships keyed by accessor, `refer` hints included.
    pub relations: IndexMap<SmolStr, Relationship>,
    pub read_data_source: SmolStr,
    pub write_data_source: SmolStr,
}

impl Schema {
    /// Relationships with a belongs-to synthesized for every `refer` hint.
    ///
    /// The accessor is the column name without a trailing `_id`. An
    /// explicitly declared relationship with that accessor wins. The foreign
    /// column is the referenced schema's primary key, or `id` when it has none.
    pub fn effective_relations(
        &self,
        ctx: &BuildContext,
    ) -> SchemaResult<IndexMap<SmolStr, Relationship>> {
        let mut relations = self.relations.clone();

        for column in self.columns.values() {
            let Some(refer) = &column.refer else {
                continue;
            };

            let foreign = ctx.registry().resolve_name(refer).ok_or_else(|| {
                SchemaError::ReferencedSchemaNotFound {
                    schema: self.name.to_string(),
                    column: column.name.to_string(),
                    refer: refer.to_string(),
                }
            })?;

            let accessor = SmolStr::from(column.name.strip_suffix("_id").unwrap_or(column.name.as_str()));
            if relations.contains_key(&accessor) {
                debug!(schema = %self.name, accessor = %accessor, "refer skipped, relation already declared");
                continue;
            }

            let foreign_schema = ctx.schema(foreign)?;
            let foreign_column = foreign_schema.primary_key().unwrap_or("id");

            debug!(schema = %self.name, column = %column.name, foreign = foreign, "foreign key from refer");
            relations.insert(
                accessor.clone(),
                Relationship::belongs_to(
                    accessor,
                    self.name.clone(),
                    column.name.clone(),
                    foreign,
                    foreign_column,
                ),
            );
        }

        Ok(relations)
    }

    /// Export the schema for code generation.
    pub fn export(&self, ctx: &BuildContext) -> SchemaResult<SchemaExport> {
        Ok(SchemaExport {
            label: self.label.clone(),
            table: self.table.clone(),
            column_data: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.export()))
                .collect(),
            column_names: self.columns.keys().cloned().collect(),
            primary_key: self.primary_key.clone(),
            model_class: self.model_class().to_string(),
            collection_class: self.collection_class(),
            relations: self.effective_relations(ctx)?,
            read_data_source: self.read_source.clone(),
            write_data_source: self.write_source.clone(),
        })
    }
}
