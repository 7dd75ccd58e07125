//! Multi-table migration plans.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use strata_schema::{BuildContext, RelationKind, Schema};
use tracing::{debug, info};

use crate::builder::{BuildOptions, TableBuilder, create_builder};
use crate::driver::Driver;
use crate::error::SqlResult;

/// Ordered DDL for a set of schemas and everything they reference.
///
/// Table statements (drops, creates, indexes) for every schema come before
/// any foreign key statement, so constraints only ever point at tables the
/// plan has already created.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    tables: Vec<String>,
    table_statements: Vec<String>,
    foreign_keys: Vec<String>,
    rollback: Vec<String>,
}

impl MigrationPlan {
    /// Plan the given root schemas plus their recursive reference closure.
    pub fn for_schemas<I, S>(
        ctx: &BuildContext,
        roots: I,
        driver: Driver,
        options: BuildOptions,
    ) -> SqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let builder = create_builder(ctx, driver, options);
        Self::with_builder(builder.as_ref(), roots)
    }

    /// Plan with an existing builder.
    pub fn with_builder<I, S>(builder: &dyn TableBuilder, roots: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schemas = collect_schemas(builder.context(), roots)?;
        let clean = builder.options().clean;
        let mut plan = Self::default();
        let mut constraints = Vec::new();

        for schema in schemas.values() {
            plan.tables.push(schema.table().to_string());
            plan.table_statements.extend(builder.build_table(schema)?);
            if !clean {
                plan.table_statements.extend(builder.build_indexes(schema)?);
                let fks = builder.foreign_key_constraints(schema)?;
                plan.foreign_keys.extend(fks.iter().map(|fk| builder.add_foreign_key(fk)));
                constraints.extend(fks);
            }
        }
        plan.rollback
            .extend(constraints.iter().rev().map(|fk| builder.drop_foreign_key(fk)));
        for schema in drop_order(builder.context(), &schemas)? {
            plan.rollback.push(builder.drop_table(&schema));
        }

        info!(
            schemas = schemas.len(),
            statements = plan.len(),
            dialect = %builder.driver().dialect(),
            "collected migration plan"
        );
        Ok(plan)
    }

    /// Tables covered by the plan, in build order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// All statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.table_statements
            .iter()
            .chain(self.foreign_keys.iter())
            .map(String::as_str)
    }

    /// Foreign key statements only.
    pub fn foreign_keys(&self) -> &[String] {
        &self.foreign_keys
    }

    /// Statements reverting the plan: foreign keys dropped in reverse order,
    /// then each table before any table it references.
    pub fn rollback(&self) -> &[String] {
        &self.rollback
    }

    /// All statements joined into one script.
    pub fn up(&self) -> String {
        self.statements().collect::<Vec<_>>().join("\n\n")
    }

    /// Rollback statements joined into one script.
    pub fn down(&self) -> String {
        self.rollback.join("\n")
    }

    pub fn len(&self) -> usize {
        self.table_statements.len() + self.foreign_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Each root followed by its recursive references, deduplicated by
/// canonical schema name.
fn collect_schemas<I, S>(ctx: &BuildContext, roots: I) -> SqlResult<IndexMap<SmolStr, Arc<Schema>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut schemas: IndexMap<SmolStr, Arc<Schema>> = IndexMap::new();

    for root in roots {
        let schema = ctx.schema(root.as_ref())?;
        if schemas.contains_key(&schema.name) {
            continue;
        }
        let references = schema.reference_schemas(ctx, true)?;
        schemas.insert(schema.name.clone(), schema);
        for (name, referenced) in references {
            schemas.entry(name).or_insert(referenced);
        }
    }

    debug!(count = schemas.len(), "schemas collected for migration plan");
    Ok(schemas)
}

/// Tables ordered so each one comes before every table its belongs-to
/// relationships point at.
fn drop_order(
    ctx: &BuildContext,
    schemas: &IndexMap<SmolStr, Arc<Schema>>,
) -> SqlResult<Vec<Arc<Schema>>> {
    let mut visited = HashSet::new();
    let mut order = Vec::with_capacity(schemas.len());
    for schema in schemas.values() {
        visit_references(ctx, schemas, schema, &mut visited, &mut order)?;
    }
    order.reverse();
    Ok(order)
}

/// Post-order walk: referenced tables are pushed before their referrers.
fn visit_references(
    ctx: &BuildContext,
    schemas: &IndexMap<SmolStr, Arc<Schema>>,
    schema: &Arc<Schema>,
    visited: &mut HashSet<SmolStr>,
    order: &mut Vec<Arc<Schema>>,
) -> SqlResult<()> {
    if !visited.insert(schema.name.clone()) {
        return Ok(());
    }
    for rel in schema.effective_relations(ctx)?.values() {
        if rel.kind != RelationKind::BelongsTo {
            continue;
        }
        let Some(foreign_name) = rel.foreign_schema() else {
            continue;
        };
        let foreign = ctx.schema(foreign_name)?;
        if let Some(referenced) = schemas.get(&foreign.name) {
            visit_references(ctx, schemas, referenced, visited, order)?;
        }
    }
    order.push(Arc::clone(schema));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;
    use strata_schema::{OrmConfig, SchemaRegistry};

    fn ctx() -> BuildContext {
        let mut registry = SchemaRegistry::new();
        registry.register("BookSchema", |s| {
            s.column("title")?.varchar(255).index();
            s.column("publisher_id")?.integer().refer("Publisher");
            Ok(())
        });
        registry.register("PublisherSchema", |s| {
            s.column("name")?.varchar(128);
            s.column("country_id")?.integer().refer("Country");
            Ok(())
        });
        registry.register("CountrySchema", |s| {
            s.column("code")?.varchar(2);
            Ok(())
        });
        registry.register("TagSchema", |s| {
            s.column("label")?.varchar(32);
            Ok(())
        });
        BuildContext::new(OrmConfig::default(), registry)
    }

    // ==================== Collection Tests ====================

    #[test]
    fn test_collects_reference_closure() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Book"],
            Driver::new(Dialect::Sqlite),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(plan.tables(), &["books", "publishers", "countries"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_deduplicates_roots() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Book", "PublisherSchema", "Tag", "Book"],
            Driver::new(Dialect::Sqlite),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(plan.tables(), &["books", "publishers", "countries", "tags"]);
    }

    #[test]
    fn test_unknown_root() {
        let ctx = ctx();
        let result = MigrationPlan::for_schemas(
            &ctx,
            ["Review"],
            Driver::new(Dialect::Sqlite),
            BuildOptions::default(),
        );
        assert!(result.is_err());
    }

    // ==================== Ordering Tests ====================

    #[test]
    fn test_foreign_keys_last() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Book"],
            Driver::new(Dialect::Postgres),
            BuildOptions::default(),
        )
        .unwrap();

        let statements: Vec<_> = plan.statements().collect();
        assert_eq!(statements.len(), 6);
        assert!(statements[0].starts_with("CREATE TABLE \"books\""));
        assert_eq!(statements[1], "CREATE INDEX \"idx_books_title\" ON \"books\" (\"title\");");
        assert!(statements[2].starts_with("CREATE TABLE \"publishers\""));
        assert!(statements[3].starts_with("CREATE TABLE \"countries\""));
        assert!(statements[4].contains("\"fk_books_publisher_id\""));
        assert!(statements[5].contains("\"fk_publishers_country_id\""));
        assert_eq!(plan.foreign_keys().len(), 2);
    }

    #[test]
    fn test_rollback_drops_referencing_tables_first() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Book"],
            Driver::new(Dialect::MySql),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(
            plan.rollback(),
            &[
                "ALTER TABLE `publishers` DROP FOREIGN KEY `fk_publishers_country_id`;",
                "ALTER TABLE `books` DROP FOREIGN KEY `fk_books_publisher_id`;",
                "DROP TABLE IF EXISTS `books`;",
                "DROP TABLE IF EXISTS `publishers`;",
                "DROP TABLE IF EXISTS `countries`;",
            ]
        );
    }

    #[test]
    fn test_rollback_order_independent_of_roots() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Country", "Tag", "Book"],
            Driver::new(Dialect::Sqlite),
            BuildOptions::default(),
        )
        .unwrap();

        assert_eq!(plan.tables(), &["countries", "tags", "books", "publishers"]);
        let dropped: Vec<_> = plan
            .rollback()
            .iter()
            .map(|sql| sql.trim_start_matches("DROP TABLE IF EXISTS ").trim_end_matches(';'))
            .collect();
        let position = |table: &str| dropped.iter().position(|t| *t == table).unwrap();

        assert_eq!(dropped.len(), 4);
        assert!(position("\"books\"") < position("\"publishers\""));
        assert!(position("\"publishers\"") < position("\"countries\""));
    }

    #[test]
    fn test_clean_plan_only_drops() {
        let ctx = ctx();
        let plan = MigrationPlan::for_schemas(
            &ctx,
            ["Book"],
            Driver::new(Dialect::Postgres),
            BuildOptions::clean(),
        )
        .unwrap();

        assert!(plan.statements().all(|s| s.starts_with("DROP TABLE")));
        assert!(plan.foreign_keys().is_empty());
        assert_eq!(plan.len(), 3);
    }
}
