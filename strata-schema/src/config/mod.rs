//! Configuration file parsing for `strata.toml`.
//!
//! ```toml
//! [data_source]
//! default = "master"
//! auto_id = true
//!
//! [data_source.nodes.master]
//! dsn = "pgsql:host=localhost;dbname=app"
//! user = "${DB_USER}"
//!
//! [data_source.nodes.archive]
//! dsn = "sqlite:archive.db"
//! quote_column = false
//!
//! [build]
//! rebuild = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;

use crate::ast::DEFAULT_DATA_SOURCE;
use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `strata.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrmConfig {
    /// Data source configuration.
    #[serde(default)]
    pub data_source: DataSourceConfig,

    /// Schema lookup configuration.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// SQL builder defaults.
    #[serde(default)]
    pub build: BuildConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl OrmConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the default data source, when nodes are declared, is one of them.
    pub fn validate(&self) -> SchemaResult<()> {
        let ds = &self.data_source;
        if !ds.nodes.is_empty() && !ds.nodes.contains_key(&ds.default) {
            return Err(SchemaError::config(format!(
                "default data source `{}` is not declared under [data_source.nodes]",
                ds.default
            )));
        }
        Ok(())
    }

    /// Whether schemas without a primary key get a synthesized `id` column.
    pub fn has_auto_id(&self) -> bool {
        self.data_source.auto_id
    }

    /// Identifier of the default data source.
    pub fn default_data_source(&self) -> &str {
        &self.data_source.default
    }

    /// Get a data source node by id.
    pub fn node(&self, id: &str) -> Option<&DataSourceNode> {
        self.data_source.nodes.get(id)
    }

    /// Apply environment-specific overrides, then validate the result.
    pub fn with_environment(mut self, env: &str) -> SchemaResult<Self> {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(ds) = overrides.data_source {
                if let Some(default) = ds.default {
                    self.data_source.default = default;
                }
                if let Some(auto_id) = ds.auto_id {
                    self.data_source.auto_id = auto_id;
                }
                self.data_source.nodes.extend(ds.nodes);
            }
            if let Some(build) = overrides.build {
                if let Some(rebuild) = build.rebuild {
                    self.build.rebuild = rebuild;
                }
                if let Some(clean) = build.clean {
                    self.build.clean = clean;
                }
                if let Some(foreign_keys) = build.foreign_keys {
                    self.build.foreign_keys = foreign_keys;
                }
            }
        }
        self.validate()?;
        Ok(self)
    }
}

/// Data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    /// Default data source id.
    #[serde(default = "default_data_source")]
    pub default: String,

    /// Synthesize an `id` primary key when a schema declares none.
    #[serde(default = "default_true")]
    pub auto_id: bool,

    /// Named connection nodes.
    #[serde(default)]
    pub nodes: IndexMap<String, DataSourceNode>,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            default: default_data_source(),
            auto_id: true,
            nodes: IndexMap::new(),
        }
    }
}

/// A single data source node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceNode {
    /// Connection DSN (`pgsql:host=localhost;dbname=app`).
    pub dsn: String,

    /// Explicit driver, overriding the DSN prefix.
    pub driver: Option<String>,

    /// Quote table names in generated SQL.
    #[serde(default = "default_true")]
    pub quote_table: bool,

    /// Quote column names in generated SQL.
    #[serde(default = "default_true")]
    pub quote_column: bool,

    /// Connection user.
    pub user: Option<String>,

    /// Connection password.
    pub pass: Option<String>,
}

impl DataSourceNode {
    /// Create a node from a DSN with default quoting.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            driver: None,
            quote_table: true,
            quote_column: true,
            user: None,
            pass: None,
        }
    }

    /// Parse the node's DSN.
    pub fn parsed_dsn(&self) -> Dsn {
        Dsn::parse(&self.dsn)
    }

    /// Resolve the database provider from the explicit driver or the DSN prefix.
    pub fn provider(&self) -> SchemaResult<DatabaseProvider> {
        let driver = match &self.driver {
            Some(driver) => driver.clone(),
            None => self.parsed_dsn().driver,
        };
        DatabaseProvider::from_driver(&driver)
            .ok_or_else(|| SchemaError::config(format!("unsupported driver `{}`", driver)))
    }
}

/// Supported database providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// PostgreSQL.
    #[serde(alias = "pgsql", alias = "postgres")]
    PostgreSql,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl DatabaseProvider {
    /// Get the provider name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Map a DSN driver prefix to a provider.
    pub fn from_driver(driver: &str) -> Option<Self> {
        match driver.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Some(Self::PostgreSql),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DSN broken into its driver and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dsn {
    /// Driver prefix (`pgsql`, `mysql`, `sqlite`).
    pub driver: String,
    /// Key/value parameters in order.
    pub params: IndexMap<String, String>,
    /// Whether this is an in-memory SQLite DSN (`sqlite::memory:`).
    pub memory: bool,
    /// Parameter text that is not `key=value`, such as a SQLite file path.
    pub path: Option<String>,
}

impl Dsn {
    /// Break a DSN of the form `driver:key=value;key=value` into parts.
    ///
    /// A DSN without `:` is taken as a bare driver name.
    pub fn parse(dsn: &str) -> Self {
        let Some((driver, rest)) = dsn.split_once(':') else {
            return Self {
                driver: dsn.to_string(),
                ..Default::default()
            };
        };

        let mut parsed = Self {
            driver: driver.to_string(),
            ..Default::default()
        };

        if rest == ":memory:" {
            parsed.memory = true;
            return parsed;
        }

        for pair in rest.split(';') {
            let pair = pair.trim();
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                    parsed
                        .params
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                _ if !pair.is_empty() && !pair.contains('=') && parsed.path.is_none() => {
                    parsed.path = Some(pair.to_string());
                }
                _ => {}
            }
        }
        parsed
    }

    /// Get a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Schema lookup configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Directories holding schema declarations.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// SQL builder defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Drop each table before creating it.
    #[serde(default)]
    pub rebuild: bool,

    /// Only drop tables.
    #[serde(default)]
    pub clean: bool,

    /// Emit foreign key constraints where the dialect supports them.
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            rebuild: false,
            clean: false,
            foreign_keys: true,
        }
    }
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

fn default_true() -> bool {
    true
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Data source overrides.
    pub data_source: Option<DataSourceOverride>,

    /// Build overrides.
    pub build: Option<BuildOverride>,
}

/// Data source configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceOverride {
    /// Override the default data source.
    pub default: Option<String>,

    /// Override auto id.
    pub auto_id: Option<bool>,

    /// Nodes added or replaced.
    #[serde(default)]
    pub nodes: IndexMap<String, DataSourceNode>,
}

/// Build configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildOverride {
    /// Override rebuild.
    pub rebuild: Option<bool>,

    /// Override clean.
    pub clean: Option<bool>,

    /// Override foreign_keys.
    pub foreign_keys: Option<bool>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
