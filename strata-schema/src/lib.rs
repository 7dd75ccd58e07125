//! # strata-schema
//!
//! Schema declaration and model types for the Strata ORM.
//!
//! This crate provides:
//! - A declaration builder for columns, relationships and mixins
//! - Finalized, immutable schema models with naming conventions
//! - A registry resolving schema names, plus a caching build context
//! - Relationship resolution into reference closures and join plans
//! - Serializable exports for code generators
//! - Configuration parser for `strata.toml` files
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_schema::{BuildContext, OrmConfig, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("AuthorSchema", |s| {
//!     s.column("name")?.varchar(128).not_null();
//!     s.column("email")?.varchar(128).unique().index();
//!     s.has_many("books", "BookSchema", "author_id", "id");
//!     Ok(())
//! });
//! registry.register("BookSchema", |s| {
//!     s.column("title")?.varchar(255);
//!     s.column("author_id")?.integer().refer("Author");
//!     Ok(())
//! });
//!
//! let ctx = BuildContext::new(OrmConfig::from_file("strata.toml")?, registry);
//! let author = ctx.schema("Author")?;
//! assert_eq!(author.table(), "authors");
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod mixin;
pub mod naming;
pub mod registry;
mod resolve;

pub use ast::*;
pub use builder::SchemaBuilder;
pub use config::{DatabaseProvider, DataSourceNode, Dsn, OrmConfig};
pub use context::BuildContext;
pub use error::{SchemaError, SchemaResult};
pub use export::SchemaExport;
pub use mixin::{LocalizeMixin, MetadataMixin, Mixin, MixinRegistry};
pub use registry::{SchemaDeclaration, SchemaRegistry};
