//! The declaration surface used inside schema declaration routines.
//!
//! A [`SchemaBuilder`] collects columns, relationships, mixins and options;
//! [`SchemaBuilder::build`] finalizes them into an immutable [`Schema`].
//! Finalization runs mixin `post_schema` hooks, locates the primary key and
//! synthesizes an `id` column when the configuration asks for one.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::ast::{Column, Relationship, Schema};
use crate::context::BuildContext;
use crate::error::{SchemaError, SchemaResult};
use crate::mixin::Mixin;
use crate::naming;

/// Name of the synthesized primary key column.
pub const AUTO_ID_COLUMN: &str = "id";

/// Mutable schema under declaration.
pub struct SchemaBuilder<'a> {
    ctx: &'a BuildContext,
    name: SmolStr,
    table: Option<String>,
    label: Option<String>,
    columns: IndexMap<SmolStr, Column>,
    relations: IndexMap<SmolStr, Relationship>,
    read_source: Option<SmolStr>,
    write_source: Option<SmolStr>,
    mixins: Vec<Arc<dyn Mixin>>,
    seeds: Vec<SmolStr>,
    model_traits: Vec<String>,
    collection_traits: Vec<String>,
    column_accessors: bool,
    source_file: Option<PathBuf>,
}

impl<'a> SchemaBuilder<'a> {
    /// Create an empty builder for a declaration name.
    pub fn new(ctx: &'a BuildContext, name: impl Into<SmolStr>) -> Self {
        Self {
            ctx,
            name: name.into(),
            table: None,
            label: None,
            columns: IndexMap::new(),
            relations: IndexMap::new(),
            read_source: None,
            write_source: None,
            mixins: Vec::new(),
            seeds: Vec::new(),
            model_traits: Vec::new(),
            collection_traits: Vec::new(),
            column_accessors: true,
            source_file: None,
        }
    }

    /// The declaration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The build context this declaration runs in.
    pub fn context(&self) -> &'a BuildContext {
        self.ctx
    }

    // ---- columns ----

    /// Declare a new column and return it for configuration.
    pub fn column(&mut self, name: impl Into<SmolStr>) -> SchemaResult<&mut Column> {
        self.add_column(Column::new(name))
    }

    /// Add a fully configured column.
    pub fn add_column(&mut self, column: Column) -> SchemaResult<&mut Column> {
        if self.columns.contains_key(&column.name) {
            return Err(SchemaError::duplicate_column(
                self.name.as_str(),
                column.name.as_str(),
            ));
        }
        let entry = self.columns.entry(column.name.clone());
        Ok(entry.or_insert(column))
    }

    /// Get a declared column for further configuration.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Check if a column has been declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns declared so far, in order.
    pub fn declared_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    // ---- relationships ----

    /// Declare a belongs-to relationship whose foreign column is the foreign
    /// schema's primary key.
    ///
    /// The foreign schema is built to find its key. Pass the key explicitly
    /// with [`belongs_to_column`](Self::belongs_to_column) when two schemas
    /// refer to each other.
    pub fn belongs_to(
        &mut self,
        accessor: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
    ) -> SchemaResult<&mut Relationship> {
        let accessor = accessor.into();
        let foreign_schema = foreign_schema.into();

        let foreign = self
            .ctx
            .schema(&foreign_schema)
            .map_err(|e| match e {
                SchemaError::UnknownSchema { name } => {
                    SchemaError::foreign_schema_not_found(self.name.as_str(), accessor.as_str(), name)
                }
                other => other,
            })?;
        let foreign_column = foreign
            .primary_key()
            .map(SmolStr::from)
            .ok_or_else(|| SchemaError::MissingPrimaryKey {
                schema: foreign.name().to_string(),
            })?;

        Ok(self.belongs_to_column(accessor, foreign_schema, foreign_column, self_column))
    }

    /// Declare a belongs-to relationship with an explicit foreign column.
    pub fn belongs_to_column(
        &mut self,
        accessor: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
    ) -> &mut Relationship {
        let accessor = accessor.into();
        let rel = Relationship::belongs_to(
            accessor.clone(),
            self.name.clone(),
            self_column,
            foreign_schema,
            foreign_column,
        );
        self.put_relation(accessor, rel)
    }

    /// Declare a has-one relationship.
    pub fn has_one(
        &mut self,
        accessor: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
    ) -> &mut Relationship {
        let accessor = accessor.into();
        let rel = Relationship::has_one(
            accessor.clone(),
            self.name.clone(),
            self_column,
            foreign_schema,
            foreign_column,
        );
        self.put_relation(accessor, rel)
    }

    /// Declare a has-many relationship.
    pub fn has_many(
        &mut self,
        accessor: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
    ) -> &mut Relationship {
        let accessor = accessor.into();
        let rel = Relationship::has_many(
            accessor.clone(),
            self.name.clone(),
            self_column,
            foreign_schema,
            foreign_column,
        );
        self.put_relation(accessor, rel)
    }

    /// Declare a many-to-many relationship through an already declared
    /// junction relation.
    pub fn many_to_many(
        &mut self,
        accessor: impl Into<SmolStr>,
        junction: impl Into<SmolStr>,
        foreign: impl Into<SmolStr>,
    ) -> SchemaResult<&mut Relationship> {
        let accessor = accessor.into();
        let junction = junction.into();
        if !self.relations.contains_key(&junction) {
            return Err(SchemaError::relation_not_defined(
                self.name.as_str(),
                junction.as_str(),
                accessor.as_str(),
            ));
        }
        let rel = Relationship::many_to_many(accessor.clone(), junction, foreign);
        Ok(self.put_relation(accessor, rel))
    }

    /// Add a prebuilt relationship. Unlike the declaration helpers, an
    /// accessor that is already taken is an error.
    pub fn add_relation(&mut self, relation: Relationship) -> SchemaResult<&mut Relationship> {
        if self.relations.contains_key(&relation.accessor) {
            return Err(SchemaError::DuplicateRelation {
                schema: self.name.to_string(),
                relation: relation.accessor.to_string(),
            });
        }
        let accessor = relation.accessor.clone();
        Ok(self.put_relation(accessor, relation))
    }

    /// Check if a relationship accessor has been declared.
    pub fn has_relation(&self, accessor: &str) -> bool {
        self.relations.contains_key(accessor)
    }

    fn put_relation(&mut self, accessor: SmolStr, rel: Relationship) -> &mut Relationship {
        if self.relations.contains_key(&accessor) {
            debug!(schema = %self.name, accessor = %accessor, "relation redeclared");
        }
        self.relations.insert(accessor.clone(), rel);
        &mut self.relations[accessor.as_str()]
    }

    // ---- mixins ----

    /// Apply a registered mixin by name.
    pub fn mixin(&mut self, name: &str, options: serde_json::Value) -> SchemaResult<&mut Self> {
        let mixin = self.ctx.mixins().create(&self.name, name, &options)?;
        self.apply_mixin(mixin)
    }

    /// Apply a mixin instance.
    ///
    /// The mixin declares into its own builder; columns, relationships and
    /// traits the host does not already have are merged in, in order.
    pub fn apply_mixin(&mut self, mixin: Arc<dyn Mixin>) -> SchemaResult<&mut Self> {
        let mut fragment = SchemaBuilder::new(self.ctx, mixin.name());
        mixin.schema(&mut fragment)?;

        for (name, column) in fragment.columns {
            if self.columns.contains_key(&name) {
                debug!(schema = %self.name, mixin = mixin.name(), column = %name, "mixin column skipped, already declared");
                continue;
            }
            self.columns.insert(name, column);
        }
        for (accessor, mut rel) in fragment.relations {
            if self.relations.contains_key(&accessor) {
                continue;
            }
            if rel.self_schema.is_some() {
                rel.self_schema = Some(self.name.clone());
            }
            self.relations.insert(accessor, rel);
        }
        for t in fragment.model_traits {
            if !self.model_traits.contains(&t) {
                self.model_traits.push(t);
            }
        }
        for t in fragment.collection_traits {
            if !self.collection_traits.contains(&t) {
                self.collection_traits.push(t);
            }
        }

        self.mixins.push(mixin);
        Ok(self)
    }

    // ---- options ----

    /// Override the table name.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Override the label.
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Route both reads and writes to a data source.
    pub fn using(&mut self, id: impl Into<SmolStr>) -> &mut Self {
        let id = id.into();
        self.read_source = Some(id.clone());
        self.write_source = Some(id);
        self
    }

    /// Route reads to a data source.
    pub fn read_from(&mut self, id: impl Into<SmolStr>) -> &mut Self {
        self.read_source = Some(id.into());
        self
    }

    /// Route writes to a data source.
    pub fn write_to(&mut self, id: impl Into<SmolStr>) -> &mut Self {
        self.write_source = Some(id.into());
        self
    }

    /// Replace the seed list.
    pub fn seeds<I, S>(&mut self, seeds: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.seeds = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Append a seed.
    pub fn add_seed(&mut self, seed: impl Into<SmolStr>) -> &mut Self {
        self.seeds.push(seed.into());
        self
    }

    pub fn add_model_trait(&mut self, name: impl Into<String>) -> &mut Self {
        self.model_traits.push(name.into());
        self
    }

    pub fn add_collection_trait(&mut self, name: impl Into<String>) -> &mut Self {
        self.collection_traits.push(name.into());
        self
    }

    /// Do not generate per-column accessors on the model.
    pub fn disable_column_accessors(&mut self) -> &mut Self {
        self.column_accessors = false;
        self
    }

    /// Record the file the declaration lives in.
    pub fn source_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.source_file = Some(path.into());
        self
    }

    // ---- finalize ----

    /// Finalize the declaration into a schema.
    pub fn build(mut self) -> SchemaResult<Schema> {
        let mixins = self.mixins.clone();
        for mixin in &mixins {
            mixin.post_schema(&mut self)?;
        }

        let primaries: Vec<&SmolStr> = self
            .columns
            .values()
            .filter(|c| c.primary)
            .map(|c| &c.name)
            .collect();

        let primary_key = match primaries.as_slice() {
            [] => None,
            [pk] => Some((*pk).clone()),
            _ => {
                return Err(SchemaError::MultiplePrimaryKeys {
                    schema: self.name.to_string(),
                    columns: primaries.iter().map(|c| c.to_string()).collect(),
                });
            }
        };

        let primary_key = match primary_key {
            Some(pk) => Some(pk),
            None if self.ctx.config().has_auto_id() && !self.has_column(AUTO_ID_COLUMN) => {
                debug!(schema = %self.name, "synthesizing auto-id primary key");
                let mut id = Column::new(AUTO_ID_COLUMN);
                id.integer().not_null().primary().auto_increment();
                self.columns.shift_insert(0, id.name.clone(), id);
                Some(SmolStr::new(AUTO_ID_COLUMN))
            }
            None => None,
        };

        let model_name = naming::short_name(naming::model_class(&self.name)).to_string();
        let default_source = SmolStr::from(self.ctx.config().default_data_source());

        Ok(Schema {
            table: self
                .table
                .unwrap_or_else(|| naming::table_name(&model_name)),
            label: self.label.unwrap_or_else(|| naming::label(&model_name)),
            name: self.name,
            columns: self.columns,
            relations: self.relations,
            primary_key,
            read_source: self.read_source.unwrap_or_else(|| default_source.clone()),
            write_source: self.write_source.unwrap_or(default_source),
            mixins: self.mixins.iter().map(|m| SmolStr::from(m.name())).collect(),
            seeds: self.seeds,
            model_traits: self.model_traits,
            collection_traits: self.collection_traits,
            column_accessors: self.column_accessors,
            source_file: self.source_file,
        })
    }
}

impl std::fmt::Debug for SchemaBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .field("columns", &self.columns.keys().collect::<Vec<_>>())
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
