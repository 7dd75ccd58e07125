//! Schema model types: columns, relationships and finalized schemas.
//!
//! Everything here is a plain value object. Declaration happens through
//! [`SchemaBuilder`](crate::SchemaBuilder); these types only hold the result.

mod column;
mod relation;
mod schema;
mod types;

pub use column::*;
pub use relation::*;
pub use schema::*;
pub use types::*;
