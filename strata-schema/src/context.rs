//! Build context: configuration, registries and the finalized schema cache.
//!
//! Schemas are built lazily on first lookup and cached by canonical name.
//! Building a schema can trigger building others (a belongs-to relationship
//! without an explicit foreign column needs the foreign primary key); the
//! context tracks the schemas under construction per thread and reports a
//! cycle instead of recursing forever.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use smol_str::SmolStr;
use tracing::debug;

use crate::ast::Schema;
use crate::builder::SchemaBuilder;
use crate::config::OrmConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::mixin::MixinRegistry;
use crate::registry::{SchemaDeclaration, SchemaRegistry};

/// Everything a declaration needs to finalize, plus a cache of results.
#[derive(Debug)]
pub struct BuildContext {
    config: OrmConfig,
    registry: SchemaRegistry,
    mixins: MixinRegistry,
    cache: RwLock<HashMap<SmolStr, Arc<Schema>>>,
    building: Mutex<Vec<(ThreadId, SmolStr)>>,
}

impl BuildContext {
    /// Create a context with the built-in mixins.
    pub fn new(config: OrmConfig, registry: SchemaRegistry) -> Self {
        Self {
            config,
            registry,
            mixins: MixinRegistry::with_builtins(),
            cache: RwLock::new(HashMap::new()),
            building: Mutex::new(Vec::new()),
        }
    }

    /// Replace the mixin registry.
    pub fn with_mixins(mut self, mixins: MixinRegistry) -> Self {
        self.mixins = mixins;
        self
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn mixins(&self) -> &MixinRegistry {
        &self.mixins
    }

    /// Get a finalized schema by name, building it on first use.
    pub fn schema(&self, name: &str) -> SchemaResult<Arc<Schema>> {
        let decl = self
            .registry
            .get(name)
            .ok_or_else(|| SchemaError::unknown_schema(name))?;
        let canonical = SmolStr::from(decl.name());

        if let Some(schema) = self.cache.read().get(&canonical) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.build_guarded(decl, None)?);
        let mut cache = self.cache.write();
        let entry = cache.entry(canonical).or_insert(schema);
        Ok(Arc::clone(entry))
    }

    /// Build every schema a declaration provides.
    ///
    /// A template declaration yields one schema per table name; any other
    /// declaration yields its single schema.
    pub fn provide_schemas(&self, name: &str) -> SchemaResult<Vec<Arc<Schema>>> {
        let decl = self
            .registry
            .get(name)
            .ok_or_else(|| SchemaError::unknown_schema(name))?;

        match decl.template_tables() {
            Some(tables) => tables
                .iter()
                .map(|table| self.build_guarded(decl, Some(table)).map(Arc::new))
                .collect(),
            None => Ok(vec![self.schema(decl.name())?]),
        }
    }

    /// Build every registered schema, expanding templates.
    pub fn all_schemas(&self) -> SchemaResult<Vec<Arc<Schema>>> {
        let mut schemas = Vec::with_capacity(self.registry.len());
        for decl in self.registry.iter() {
            schemas.extend(self.provide_schemas(decl.name())?);
        }
        Ok(schemas)
    }

    /// Number of cached schemas.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Drop all cached schemas.
    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }

    fn build_guarded(
        &self,
        decl: &SchemaDeclaration,
        table: Option<&str>,
    ) -> SchemaResult<Schema> {
        let me = thread::current().id();
        let name = SmolStr::from(decl.name());

        {
            let mut building = self.building.lock();
            if building.iter().any(|(t, n)| *t == me && *n == name) {
                let mut chain: Vec<String> = building
                    .iter()
                    .filter(|(t, _)| *t == me)
                    .map(|(_, n)| n.to_string())
                    .skip_while(|n| n != name.as_str())
                    .collect();
                chain.push(name.to_string());
                return Err(SchemaError::CircularDeclaration { chain });
            }
            building.push((me, name.clone()));
        }

        let result = self.build_declaration(decl, table);

        let mut building = self.building.lock();
        if let Some(pos) = building
            .iter()
            .rposition(|(t, n)| *t == me && *n == name)
        {
            building.remove(pos);
        }
        result
    }

    fn build_declaration(
        &self,
        decl: &SchemaDeclaration,
        table: Option<&str>,
    ) -> SchemaResult<Schema> {
        debug!(schema = decl.name(), "building schema");
        let mut builder = SchemaBuilder::new(self, decl.name());
        decl.declare(&mut builder)?;
        if let Some(table) = table {
            builder.table(table);
        }
        builder.build()
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(OrmConfig::default(), SchemaRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register("AuthorSchema", |s| {
            s.column("name")?.varchar(128);
            Ok(())
        });
        registry.register("BookSchema", |s| {
            s.column("title")?.varchar(255);
            s.column("author_id")?.integer();
            s.belongs_to("author", "Author", "author_id")?;
            Ok(())
        });
        registry
    }

    // ==================== Cache Tests ====================

    #[test]
    fn test_schema_is_cached() {
        let ctx = BuildContext::new(OrmConfig::default(), registry());

        let a = ctx.schema("AuthorSchema").unwrap();
        let b = ctx.schema("Author").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ctx.cached_count(), 1);

        ctx.clear_cache();
        assert_eq!(ctx.cached_count(), 0);
    }

    #[test]
    fn test_unknown_schema() {
        let ctx = BuildContext::default();
        let err = ctx.schema("Publisher").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSchema { .. }));
    }

    #[test]
    fn test_belongs_to_resolves_foreign_key() {
        let ctx = BuildContext::new(OrmConfig::default(), registry());

        let book = ctx.schema("Book").unwrap();
        let rel = book.relation("author").unwrap();
        assert_eq!(rel.foreign_schema(), Some("Author"));
        assert_eq!(rel.foreign_column(), Some("id"));
        assert_eq!(rel.self_schema.as_deref(), Some("BookSchema"));
        // Author was built to find its key.
        assert_eq!(ctx.cached_count(), 2);
    }

    // ==================== Cycle Tests ====================

    #[test]
    fn test_circular_declaration() {
        let mut registry = SchemaRegistry::new();
        registry.register("ASchema", |s| {
            s.belongs_to("b", "BSchema", "b_id")?;
            Ok(())
        });
        registry.register("BSchema", |s| {
            s.belongs_to("a", "ASchema", "a_id")?;
            Ok(())
        });
        let ctx = BuildContext::new(OrmConfig::default(), registry);

        let err = ctx.schema("ASchema").unwrap_err();
        match err {
            SchemaError::CircularDeclaration { chain } => {
                assert_eq!(chain, vec!["ASchema", "BSchema", "ASchema"]);
            }
            other => panic!("Expected CircularDeclaration, got {other:?}"),
        }

        // The failed build leaves nothing behind.
        assert!(ctx.building.lock().is_empty());
    }

    #[test]
    fn test_explicit_foreign_column_breaks_cycle() {
        let mut registry = SchemaRegistry::new();
        registry.register("ASchema", |s| {
            s.belongs_to_column("b", "BSchema", "id", "b_id");
            Ok(())
        });
        registry.register("BSchema", |s| {
            s.belongs_to("a", "ASchema", "a_id")?;
            Ok(())
        });
        let ctx = BuildContext::new(OrmConfig::default(), registry);

        assert!(ctx.schema("BSchema").is_ok());
    }

    // ==================== Template Tests ====================

    #[test]
    fn test_provide_schemas_from_template() {
        let mut registry = registry();
        registry.register_template("MetricValueSchema", ["metric_cpu", "metric_mem"], |s| {
            s.column("val")?.double(10, 2);
            Ok(())
        });
        let ctx = BuildContext::new(OrmConfig::default(), registry);

        let schemas = ctx.provide_schemas("MetricValue").unwrap();
        let tables: Vec<_> = schemas.iter().map(|s| s.table()).collect();
        assert_eq!(tables, vec!["metric_cpu", "metric_mem"]);
        assert!(schemas.iter().all(|s| s.name() == "MetricValueSchema"));

        let plain = ctx.provide_schemas("Author").unwrap();
        assert_eq!(plain.len(), 1);

        assert_eq!(ctx.all_schemas().unwrap().len(), 4);
    }
}
