//! Reusable bundles of columns and relationships merged into host schemas.
//!
//! A mixin declares its own columns on a fresh builder; the host then takes
//! every column and relationship it does not already have. Merging is an
//! additive union keyed by name: a mixin never replaces a host column.
//!
//! After the host declaration finishes, each mixin gets a `post_schema`
//! call with the host builder, for mixins that need the full column set.
//!
//! ```rust,ignore
//! registry.register("PostSchema", |s| {
//!     s.column("title")?.varchar(255).localize();
//!     s.mixin("Metadata", serde_json::Value::Null)?;
//!     s.mixin("Localize", serde_json::json!({ "locales": ["en", "fr"] }))?;
//!     Ok(())
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::ast::{Column, ColumnType, Value};
use crate::builder::SchemaBuilder;
use crate::error::{SchemaError, SchemaResult};

/// A reusable schema fragment.
pub trait Mixin: fmt::Debug + Send + Sync {
    /// Mixin name, recorded on the host schema.
    fn name(&self) -> &str;

    /// Declare the mixin's own columns and relationships.
    fn schema(&self, builder: &mut SchemaBuilder<'_>) -> SchemaResult<()>;

    /// Hook run on the host builder after its declaration completes.
    fn post_schema(&self, _builder: &mut SchemaBuilder<'_>) -> SchemaResult<()> {
        Ok(())
    }
}

/// Creates a mixin from its options.
pub type MixinFactory =
    Arc<dyn Fn(&serde_json::Value) -> SchemaResult<Arc<dyn Mixin>> + Send + Sync>;

/// Name-indexed mixin factories.
#[derive(Clone, Default)]
pub struct MixinRegistry {
    factories: IndexMap<SmolStr, MixinFactory>,
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinRegistry")
            .field("mixins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MixinRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `Metadata` and `Localize` mixins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("Metadata", |_| Ok(Arc::new(MetadataMixin) as Arc<dyn Mixin>));
        registry.register("Localize", |options| {
            Ok(Arc::new(LocalizeMixin::from_options(options)?) as Arc<dyn Mixin>)
        });
        registry
    }

    /// Register a mixin factory under a name.
    pub fn register<F>(&mut self, name: impl Into<SmolStr>, factory: F) -> &mut Self
    where
        F: Fn(&serde_json::Value) -> SchemaResult<Arc<dyn Mixin>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Check if a mixin name resolves.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Names of all registered mixins.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    /// Find a factory by name, accepting `Name` and `NameMixin` spellings.
    fn lookup(&self, name: &str) -> Option<&MixinFactory> {
        self.factories
            .get(name)
            .or_else(|| name.strip_suffix("Mixin").and_then(|n| self.factories.get(n)))
            .or_else(|| self.factories.get(format!("{}Mixin", name).as_str()))
    }

    /// Instantiate a mixin for the named host schema.
    pub fn create(
        &self,
        schema: &str,
        name: &str,
        options: &serde_json::Value,
    ) -> SchemaResult<Arc<dyn Mixin>> {
        let factory = self
            .lookup(name)
            .ok_or_else(|| SchemaError::mixin_not_found(schema, name))?;
        factory(options)
    }
}

/// Adds `created_on` and `updated_on` timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataMixin;

impl Mixin for MetadataMixin {
    fn name(&self) -> &str {
        "Metadata"
    }

    fn schema(&self, builder: &mut SchemaBuilder<'_>) -> SchemaResult<()> {
        builder
            .column("created_on")?
            .timestamp()
            .isa(ColumnType::DateTime)
            .default(Value::raw("CURRENT_TIMESTAMP"))
            .label("Created on");
        builder
            .column("updated_on")?
            .timestamp()
            .isa(ColumnType::DateTime)
            .default(Value::raw("CURRENT_TIMESTAMP"))
            .label("Updated on");
        Ok(())
    }
}

/// Adds `<column>_<locale>` copies of every column flagged `localize`.
#[derive(Debug, Clone, Default)]
pub struct LocalizeMixin {
    locales: Vec<String>,
}

impl LocalizeMixin {
    /// Create the mixin for a set of locales.
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from `{"locales": ["en", "fr"]}`.
    pub fn from_options(options: &serde_json::Value) -> SchemaResult<Self> {
        let locales = options
            .get("locales")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::config("the Localize mixin requires a `locales` array"))?;

        let locales = locales
            .iter()
            .map(|l| {
                l.as_str()
                    .map(String::from)
                    .ok_or_else(|| SchemaError::config("locales must be strings"))
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(Self { locales })
    }

    /// Configured locales.
    pub fn locales(&self) -> &[String] {
        &self.locales
    }
}

impl Mixin for LocalizeMixin {
    fn name(&self) -> &str {
        "Localize"
    }

    fn schema(&self, _builder: &mut SchemaBuilder<'_>) -> SchemaResult<()> {
        Ok(())
    }

    fn post_schema(&self, builder: &mut SchemaBuilder<'_>) -> SchemaResult<()> {
        let sources: Vec<Column> = builder
            .declared_columns()
            .filter(|c| c.localize)
            .cloned()
            .collect();

        for source in sources {
            for locale in &self.locales {
                let name = format!("{}_{}", source.name, locale);
                if builder.has_column(&name) {
                    continue;
                }
                let mut column = source.clone();
                column.name = name.into();
                column.localize = false;
                column.primary = false;
                column.auto_increment = false;
                column.label = source.label.as_ref().map(|l| format!("{} ({})", l, locale));
                builder.add_column(column)?;
            }
        }
        Ok(())
    }
}
