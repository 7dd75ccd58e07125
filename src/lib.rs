//! # Strata
//!
//! Declarative schema models compiled to dialect-specific SQL.
//!
//! Strata provides:
//! - A declaration builder for columns, relationships and mixins
//! - Finalized schema models with naming conventions and exports
//! - Relationship resolution into reference closures and joins
//! - DDL builders for SQLite, PostgreSQL and MySQL
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("AuthorSchema", |s| {
//!     s.column("name")?.varchar(128).not_null();
//!     Ok(())
//! });
//! registry.register("BookSchema", |s| {
//!     s.column("title")?.varchar(255);
//!     s.column("author_id")?.integer().refer("Author");
//!     Ok(())
//! });
//!
//! let ctx = BuildContext::new(OrmConfig::from_file("strata.toml")?, registry);
//! let builder = builder_for_data_source(&ctx, "default")?;
//! for sql in builder.build(&ctx.schema("Book")?)? {
//!     println!("{sql}");
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema declaration, models and configuration.
pub mod schema {
    pub use strata_schema::*;
}

/// SQL generation.
pub mod sql {
    pub use strata_sql::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::schema::{
        BuildContext, Column, ColumnType, Mixin, OrmConfig, ReferentialAction, Relationship,
        Schema, SchemaBuilder, SchemaError, SchemaRegistry, Value,
    };
    pub use crate::sql::{
        BuildOptions, Dialect, Driver, MigrationPlan, RelationQuery, SqlError, TableBuilder,
        builder_for_data_source, create_builder,
    };
}

// Re-export key types at the crate root
pub use schema::{Schema, SchemaError};
pub use sql::SqlError;
