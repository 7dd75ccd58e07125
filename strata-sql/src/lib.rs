//! # strata-sql
//!
//! SQL generation for finalized Strata schemas.
//!
//! This crate provides:
//! - Dialect descriptors for SQLite, PostgreSQL and MySQL
//! - Drivers pairing a dialect with a data source's quoting policy
//! - Table builders emitting `CREATE TABLE`, `DROP TABLE`, indexes and
//!   foreign keys
//! - Join and select fragments for relationship traversal
//! - Migration plans covering a schema and everything it references
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌────────────────┐
//! │ BuildContext │────▶│ TableBuilder   │────▶│ Migration Plan │
//! └──────────────┘     └────────────────┘     └────────────────┘
//!         │                    ▲
//!         ▼                    │
//! ┌──────────────┐     ┌────────────────┐
//! │ OrmConfig    │────▶│ Driver/Dialect │
//! └──────────────┘     └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_sql::{BuildOptions, Dialect, Driver, MigrationPlan, create_builder};
//!
//! let builder = create_builder(&ctx, Driver::new(Dialect::Postgres), BuildOptions::rebuild());
//! for sql in builder.build(&ctx.schema("Book")?)? {
//!     println!("{sql}");
//! }
//!
//! let plan = MigrationPlan::for_schemas(&ctx, ["Book"], Driver::new(Dialect::Sqlite), BuildOptions::default())?;
//! println!("{}", plan.up());
//! ```

pub mod builder;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod plan;
pub mod query;

pub use builder::{
    BuildOptions, ForeignKey, MysqlBuilder, PgsqlBuilder, SqliteBuilder, TableBuilder,
    builder_for_data_source, create_builder,
};
pub use dialect::Dialect;
pub use driver::Driver;
pub use error::{SqlError, SqlResult};
pub use plan::MigrationPlan;
pub use query::{JoinType, RelationQuery};
