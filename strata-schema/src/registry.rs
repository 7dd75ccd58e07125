//! Name-indexed schema declarations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::warn;

use crate::builder::SchemaBuilder;
use crate::error::SchemaResult;
use crate::naming::{PATH_SEPARATOR, SCHEMA_SUFFIX};

/// A declaration routine: fills a builder with columns, relationships and options.
pub type Declare = Arc<dyn Fn(&mut SchemaBuilder<'_>) -> SchemaResult<()> + Send + Sync>;

/// A registered declaration.
#[derive(Clone)]
pub struct SchemaDeclaration {
    name: SmolStr,
    declare: Declare,
    tables: Option<Vec<String>>,
}

impl SchemaDeclaration {
    /// Declaration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table names provided by a template declaration.
    pub fn template_tables(&self) -> Option<&[String]> {
        self.tables.as_deref()
    }

    /// Check if this declaration is a template.
    pub fn is_template(&self) -> bool {
        self.tables.is_some()
    }

    /// Run the declaration routine against a builder.
    pub fn declare(&self, builder: &mut SchemaBuilder<'_>) -> SchemaResult<()> {
        (self.declare)(builder)
    }
}

impl fmt::Debug for SchemaDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDeclaration")
            .field("name", &self.name)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

/// Registry of schema declarations keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    declarations: IndexMap<SmolStr, SchemaDeclaration>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration. A second registration under the same name replaces the first.
    pub fn register<F>(&mut self, name: impl Into<SmolStr>, declare: F) -> &mut Self
    where
        F: Fn(&mut SchemaBuilder<'_>) -> SchemaResult<()> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(declare), None);
        self
    }

    /// Register a template declaration producing one schema per table name.
    pub fn register_template<F, I, S>(
        &mut self,
        name: impl Into<SmolStr>,
        tables: I,
        declare: F,
    ) -> &mut Self
    where
        F: Fn(&mut SchemaBuilder<'_>) -> SchemaResult<()> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = tables.into_iter().map(Into::into).collect();
        self.insert(name.into(), Arc::new(declare), Some(tables));
        self
    }

    fn insert(&mut self, name: SmolStr, declare: Declare, tables: Option<Vec<String>>) {
        let decl = SchemaDeclaration {
            name: name.clone(),
            declare,
            tables,
        };
        if self.declarations.insert(name.clone(), decl).is_some() {
            warn!(schema = %name, "schema declaration replaced");
        }
    }

    /// Resolve a name to its registered canonical name.
    ///
    /// A leading `::` is ignored. `<name>Schema` is preferred over `<name>`,
    /// so `Author` finds `AuthorSchema` when both could match.
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix(PATH_SEPARATOR).unwrap_or(name);
        if !name.ends_with(SCHEMA_SUFFIX) {
            let suffixed = format!("{}{}", name, SCHEMA_SUFFIX);
            if let Some((key, _)) = self.declarations.get_key_value(suffixed.as_str()) {
                return Some(key.as_str());
            }
        }
        self.declarations
            .get_key_value(name)
            .map(|(key, _)| key.as_str())
    }

    /// Get a declaration by name, applying the naming convention.
    pub fn get(&self, name: &str) -> Option<&SchemaDeclaration> {
        self.resolve_name(name)
            .and_then(|canonical| self.declarations.get(canonical))
    }

    /// Check if a name resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve_name(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(|k| k.as_str())
    }

    /// Iterate over all declarations.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDeclaration> {
        self.declarations.values()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
