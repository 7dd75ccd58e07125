//! Per data source driver: a dialect plus its identifier quoting policy.

use strata_schema::{DataSourceNode, OrmConfig};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};

/// Quoting policy and dialect for one data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Driver {
    dialect: Dialect,
    quote_table: bool,
    quote_column: bool,
}

impl Driver {
    /// Create a driver that quotes both tables and columns.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            quote_table: true,
            quote_column: true,
        }
    }

    /// Set the quoting policy.
    pub fn with_quoting(mut self, quote_table: bool, quote_column: bool) -> Self {
        self.quote_table = quote_table;
        self.quote_column = quote_column;
        self
    }

    /// Build a driver from a configured data source node.
    pub fn from_node(node: &DataSourceNode) -> SqlResult<Self> {
        let provider = node.provider()?;
        Ok(Self::new(provider.into()).with_quoting(node.quote_table, node.quote_column))
    }

    /// Build the driver of a data source id.
    pub fn for_data_source(config: &OrmConfig, id: &str) -> SqlResult<Self> {
        let node = config
            .node(id)
            .ok_or_else(|| SqlError::UnknownDataSource(id.to_string()))?;
        let driver = Self::from_node(node)?;
        debug!(data_source = id, dialect = %driver.dialect, "driver configured");
        Ok(driver)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Quote an identifier unconditionally.
    pub fn quote_identifier(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// Quote a table name if the policy asks for it.
    pub fn quote_table(&self, name: &str) -> String {
        if self.quote_table {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// Quote a column name if the policy asks for it.
    pub fn quote_column(&self, name: &str) -> String {
        if self.quote_column {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }
}

impl From<Dialect> for Driver {
    fn from(dialect: Dialect) -> Self {
        Self::new(dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting_policy() {
        let driver = Driver::new(Dialect::MySql).with_quoting(true, false);
        assert_eq!(driver.quote_table("authors"), "`authors`");
        assert_eq!(driver.quote_column("name"), "name");
        assert_eq!(driver.quote_identifier("name"), "`name`");
    }

    #[test]
    fn test_for_data_source() {
        let config = OrmConfig::from_str(
            r#"
            [data_source.nodes.default]
            dsn = "pgsql:host=localhost;dbname=app"
            quote_column = false
            "#,
        )
        .unwrap();

        let driver = Driver::for_data_source(&config, "default").unwrap();
        assert_eq!(driver.dialect(), Dialect::Postgres);
        assert_eq!(driver.quote_table("authors"), "\"authors\"");
        assert_eq!(driver.quote_column("name"), "name");

        assert!(matches!(
            Driver::for_data_source(&config, "slave"),
            Err(SqlError::UnknownDataSource(_))
        ));
    }

    #[test]
    fn test_unsupported_driver() {
        let node = DataSourceNode::new("odbc:dsn=legacy");
        assert!(matches!(Driver::from_node(&node), Err(SqlError::Schema(_))));
    }
}
