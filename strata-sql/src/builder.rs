//! Dialect SQL builders compiling finalized schemas into DDL.
//!
//! Statements for one table always come out in this order: the drop (when
//! requested), the create (unless only cleaning), the indexes, then the
//! foreign keys. Indexes and foreign keys refer to the table created just
//! before them.

use serde::{Deserialize, Serialize};
use strata_schema::config::BuildConfig;
use strata_schema::{
    BuildContext, Column, ColumnType, DefaultValue, ReferentialAction, RelationKind, Schema,
};
use tracing::debug;

use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::{SqlError, SqlResult};

/// Builder mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Only drop the table.
    #[serde(default)]
    pub clean: bool,
    /// Drop the table before creating it.
    #[serde(default)]
    pub rebuild: bool,
    /// Emit foreign key statements where the dialect supports them.
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            clean: false,
            rebuild: false,
            foreign_keys: true,
        }
    }
}

impl BuildOptions {
    /// Drop-only mode.
    pub fn clean() -> Self {
        Self {
            clean: true,
            ..Self::default()
        }
    }

    /// Drop-then-create mode.
    pub fn rebuild() -> Self {
        Self {
            rebuild: true,
            ..Self::default()
        }
    }
}

impl From<&BuildConfig> for BuildOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            clean: config.clean,
            rebuild: config.rebuild,
            foreign_keys: config.foreign_keys,
        }
    }
}

/// Compiles schemas into DDL statements for one dialect.
///
/// The provided methods implement the shared algorithm; dialect builders
/// override the column-level hooks.
pub trait TableBuilder {
    /// Driver supplying the dialect and quoting policy.
    fn driver(&self) -> &Driver;

    /// Builder mode flags.
    fn options(&self) -> &BuildOptions;

    /// Context used to resolve foreign schemas.
    fn context(&self) -> &BuildContext;

    /// Auto-increment clause for a column, validated for the dialect.
    fn auto_increment(&self, schema: &Schema, column: &Column) -> SqlResult<Option<&'static str>>;

    /// Physical type of a column.
    fn column_type(&self, _schema: &Schema, column: &Column) -> SqlResult<String> {
        Ok(self.driver().dialect().column_type(column))
    }

    /// Full definition of one column inside `CREATE TABLE`.
    fn column_definition(&self, schema: &Schema, column: &Column) -> SqlResult<String> {
        self.base_column_definition(schema, column)
    }

    /// Name, type and constraint clauses shared by every dialect.
    fn base_column_definition(&self, schema: &Schema, column: &Column) -> SqlResult<String> {
        let driver = self.driver();
        let mut parts = vec![
            driver.quote_column(column.name()),
            self.column_type(schema, column)?,
        ];

        if column.primary {
            parts.push("PRIMARY KEY".to_string());
        }
        if column.auto_increment {
            if let Some(clause) = self.auto_increment(schema, column)? {
                parts.push(clause.to_string());
            }
        }
        if column.not_null && !column.primary {
            parts.push("NOT NULL".to_string());
        }
        if column.unique && !column.primary {
            parts.push("UNIQUE".to_string());
        }
        if let Some(DefaultValue::Literal(value)) = &column.default {
            let literal = driver.dialect().literal(value).ok_or_else(|| {
                SqlError::unrenderable(
                    schema.table(),
                    column.name(),
                    format!("default {:?} has no {} literal", value, driver.dialect()),
                )
            })?;
            parts.push(format!("DEFAULT {}", literal));
        }

        Ok(parts.join(" "))
    }

    /// `CREATE TABLE` with every persisted column, in column order.
    fn create_table(&self, schema: &Schema) -> SqlResult<String> {
        let columns = schema
            .columns(false)
            .into_iter()
            .map(|c| self.column_definition(schema, c).map(|def| format!("  {}", def)))
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(format!(
            "CREATE TABLE {} (\n{}\n);",
            self.driver().quote_table(schema.table()),
            columns.join(",\n")
        ))
    }

    /// `DROP TABLE IF EXISTS`.
    fn drop_table(&self, schema: &Schema) -> String {
        format!(
            "DROP TABLE IF EXISTS {};",
            self.driver().quote_table(schema.table())
        )
    }

    /// Drop and/or create statements according to the mode flags.
    fn build_table(&self, schema: &Schema) -> SqlResult<Vec<String>> {
        let options = self.options();
        let mut sqls = Vec::new();

        if options.clean || options.rebuild {
            sqls.push(self.drop_table(schema));
        }
        if options.clean {
            return Ok(sqls);
        }

        sqls.push(self.create_table(schema)?);
        Ok(sqls)
    }

    /// `CREATE INDEX` for every indexed column.
    fn build_indexes(&self, schema: &Schema) -> SqlResult<Vec<String>> {
        let driver = self.driver();
        if !driver.dialect().separate_indexes() {
            return Ok(Vec::new());
        }

        Ok(schema
            .indexed_columns()
            .filter_map(|c| c.index.as_ref().map(|idx| (c, idx)))
            .map(|(c, idx)| {
                format!(
                    "CREATE INDEX {} ON {} ({});",
                    driver.quote_table(&idx.name_for(schema.table(), c.name())),
                    driver.quote_table(schema.table()),
                    driver.quote_column(c.name())
                )
            })
            .collect())
    }

    /// Foreign key constraints for every belongs-to relationship, `refer`
    /// hints included, whose column is not the primary key. Empty when the
    /// dialect keeps references inline or foreign keys are turned off.
    fn foreign_key_constraints(&self, schema: &Schema) -> SqlResult<Vec<ForeignKey>> {
        if !self.options().foreign_keys || !self.driver().dialect().separate_foreign_keys() {
            return Ok(Vec::new());
        }

        let ctx = self.context();
        let mut constraints = Vec::new();
        for rel in schema.effective_relations(ctx)?.values() {
            if rel.kind != RelationKind::BelongsTo {
                continue;
            }
            let (Some(self_column), Some(foreign_name), Some(foreign_column)) =
                (rel.self_column(), rel.foreign_schema(), rel.foreign_column())
            else {
                continue;
            };
            if schema.primary_key() == Some(self_column) {
                continue;
            }
            if !schema.column(self_column).is_some_and(Column::is_persisted) {
                return Err(SqlError::MissingColumn {
                    table: schema.table().to_string(),
                    relation: rel.accessor().to_string(),
                    column: self_column.to_string(),
                });
            }

            let foreign = ctx.schema(foreign_name)?;
            constraints.push(ForeignKey {
                name: format!("fk_{}_{}", schema.table(), self_column),
                table: schema.table().to_string(),
                column: self_column.to_string(),
                foreign_table: foreign.table().to_string(),
                foreign_column: foreign_column.to_string(),
                on_delete: rel.on_delete.unwrap_or_default(),
            });
        }
        Ok(constraints)
    }

    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY`.
    fn add_foreign_key(&self, fk: &ForeignKey) -> String {
        let driver = self.driver();
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {};",
            driver.quote_table(&fk.table),
            driver.quote_table(&fk.name),
            driver.quote_column(&fk.column),
            driver.quote_table(&fk.foreign_table),
            driver.quote_column(&fk.foreign_column),
            fk.on_delete.as_sql()
        )
    }

    /// `ALTER TABLE ... DROP CONSTRAINT`.
    fn drop_foreign_key(&self, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.driver().quote_table(&fk.table),
            self.driver().quote_table(&fk.name)
        )
    }

    /// Add statements for every foreign key constraint of a schema.
    fn build_foreign_keys(&self, schema: &Schema) -> SqlResult<Vec<String>> {
        Ok(self
            .foreign_key_constraints(schema)?
            .iter()
            .map(|fk| self.add_foreign_key(fk))
            .collect())
    }

    /// All statements for one schema, in order.
    fn build(&self, schema: &Schema) -> SqlResult<Vec<String>> {
        let mut sqls = self.build_table(schema)?;
        if !self.options().clean {
            sqls.extend(self.build_indexes(schema)?);
            sqls.extend(self.build_foreign_keys(schema)?);
        }
        debug!(
            table = schema.table(),
            dialect = %self.driver().dialect(),
            statements = sqls.len(),
            "built table statements"
        );
        Ok(sqls)
    }
}

/// A foreign key constraint derived from a belongs-to relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name, `fk_<table>_<column>`.
    pub name: String,
    /// Referencing table.
    pub table: String,
    /// Referencing column.
    pub column: String,
    /// Referenced table.
    pub foreign_table: String,
    /// Referenced column.
    pub foreign_column: String,
    /// `ON DELETE` action.
    pub on_delete: ReferentialAction,
}

fn require_integer(schema: &Schema, column: &Column, clause: &str) -> SqlResult<()> {
    if column.isa.is_integer() {
        Ok(())
    } else {
        Err(SqlError::unrenderable(
            schema.table(),
            column.name(),
            format!("{} requires an integer column, found {}", clause, column.isa),
        ))
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// SQLite builder. Foreign keys are inline `REFERENCES` clauses; no separate
/// index or foreign key statements are emitted.
#[derive(Debug)]
pub struct SqliteBuilder<'a> {
    ctx: &'a BuildContext,
    driver: Driver,
    options: BuildOptions,
}

impl<'a> SqliteBuilder<'a> {
    pub fn new(ctx: &'a BuildContext, driver: Driver, options: BuildOptions) -> Self {
        Self {
            ctx,
            driver,
            options,
        }
    }
}

impl TableBuilder for SqliteBuilder<'_> {
    fn driver(&self) -> &Driver {
        &self.driver
    }

    fn options(&self) -> &BuildOptions {
        &self.options
    }

    fn context(&self) -> &BuildContext {
        self.ctx
    }

    fn auto_increment(&self, schema: &Schema, column: &Column) -> SqlResult<Option<&'static str>> {
        require_integer(schema, column, "AUTOINCREMENT")?;
        if !column.primary {
            return Err(SqlError::unrenderable(
                schema.table(),
                column.name(),
                "AUTOINCREMENT is only allowed on the primary key",
            ));
        }
        Ok(Some("AUTOINCREMENT"))
    }

    /// `AUTOINCREMENT` is only accepted on an `INTEGER PRIMARY KEY`, so wider
    /// integer declarations collapse to `INTEGER` (still 64-bit in SQLite).
    fn column_type(&self, _schema: &Schema, column: &Column) -> SqlResult<String> {
        let declared = self.driver.dialect().column_type(column);
        if column.auto_increment
            && column.isa.is_integer()
            && !declared.eq_ignore_ascii_case("integer")
        {
            return Ok("INTEGER".to_string());
        }
        Ok(declared)
    }

    fn column_definition(&self, schema: &Schema, column: &Column) -> SqlResult<String> {
        let mut sql = self.base_column_definition(schema, column)?;
        if column.name() == "id" {
            return Ok(sql);
        }

        for rel in schema.effective_relations(self.ctx)?.values() {
            if !rel.kind.is_direct() || rel.self_column() != Some(column.name()) {
                continue;
            }
            let (Some(foreign_name), Some(foreign_column)) =
                (rel.foreign_schema(), rel.foreign_column())
            else {
                continue;
            };
            let foreign = self.ctx.schema(foreign_name)?;
            sql.push_str(&format!(
                " REFERENCES {}({})",
                self.driver.quote_table(foreign.table()),
                self.driver.quote_column(foreign_column)
            ));
        }
        Ok(sql)
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// PostgreSQL builder. Auto-increment columns become `SERIAL`/`BIGSERIAL`.
#[derive(Debug)]
pub struct PgsqlBuilder<'a> {
    ctx: &'a BuildContext,
    driver: Driver,
    options: BuildOptions,
}

impl<'a> PgsqlBuilder<'a> {
    pub fn new(ctx: &'a BuildContext, driver: Driver, options: BuildOptions) -> Self {
        Self {
            ctx,
            driver,
            options,
        }
    }
}

impl TableBuilder for PgsqlBuilder<'_> {
    fn driver(&self) -> &Driver {
        &self.driver
    }

    fn options(&self) -> &BuildOptions {
        &self.options
    }

    fn context(&self) -> &BuildContext {
        self.ctx
    }

    fn auto_increment(&self, schema: &Schema, column: &Column) -> SqlResult<Option<&'static str>> {
        require_integer(schema, column, "SERIAL")?;
        Ok(None)
    }

    fn column_type(&self, _schema: &Schema, column: &Column) -> SqlResult<String> {
        if column.auto_increment {
            return Ok(match column.isa {
                ColumnType::BigInt => "BIGSERIAL".to_string(),
                _ => "SERIAL".to_string(),
            });
        }
        Ok(self.driver.dialect().column_type(column))
    }

    fn drop_table(&self, schema: &Schema) -> String {
        format!(
            "DROP TABLE IF EXISTS {} CASCADE;",
            self.driver.quote_table(schema.table())
        )
    }
}

// ============================================================================
// MySQL
// ============================================================================

/// MySQL builder.
#[derive(Debug)]
pub struct MysqlBuilder<'a> {
    ctx: &'a BuildContext,
    driver: Driver,
    options: BuildOptions,
}

impl<'a> MysqlBuilder<'a> {
    pub fn new(ctx: &'a BuildContext, driver: Driver, options: BuildOptions) -> Self {
        Self {
            ctx,
            driver,
            options,
        }
    }
}

impl TableBuilder for MysqlBuilder<'_> {
    fn driver(&self) -> &Driver {
        &self.driver
    }

    fn options(&self) -> &BuildOptions {
        &self.options
    }

    fn context(&self) -> &BuildContext {
        self.ctx
    }

    fn auto_increment(&self, schema: &Schema, column: &Column) -> SqlResult<Option<&'static str>> {
        require_integer(schema, column, "AUTO_INCREMENT")?;
        Ok(Some("AUTO_INCREMENT"))
    }

    fn drop_foreign_key(&self, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {};",
            self.driver.quote_table(&fk.table),
            self.driver.quote_table(&fk.name)
        )
    }
}

/// Create the builder matching a driver's dialect.
pub fn create_builder<'a>(
    ctx: &'a BuildContext,
    driver: Driver,
    options: BuildOptions,
) -> Box<dyn TableBuilder + 'a> {
    match driver.dialect() {
        Dialect::Sqlite => Box::new(SqliteBuilder::new(ctx, driver, options)),
        Dialect::Postgres => Box::new(PgsqlBuilder::new(ctx, driver, options)),
        Dialect::MySql => Box::new(MysqlBuilder::new(ctx, driver, options)),
    }
}

/// Create the builder for a configured data source, with the configured
/// build flags.
pub fn builder_for_data_source<'a>(
    ctx: &'a BuildContext,
    id: &str,
) -> SqlResult<Box<dyn TableBuilder + 'a>> {
    let driver = Driver::for_data_source(ctx.config(), id)?;
    let options = BuildOptions::from(&ctx.config().build);
    Ok(create_builder(ctx, driver, options))
}
