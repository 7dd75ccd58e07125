//! Integration tests for configuration parsing and handling.
//!
//! These tests verify that `strata.toml` files load correctly, that
//! environment overrides apply, and that configuration drives schema
//! finalization and driver selection.

use std::io::Write;

use strata::schema::{BuildContext, DatabaseProvider, Dsn, OrmConfig, SchemaError, SchemaRegistry};
use strata::sql::{BuildOptions, Dialect, Driver};

/// Test minimal configuration
#[test]
fn test_config_minimal() {
    let config = OrmConfig::from_str("").unwrap();

    assert_eq!(config.default_data_source(), "default");
    assert!(config.has_auto_id());
    assert!(config.node("default").is_none());
    assert!(config.build.foreign_keys);
}

/// Test full configuration with all sections
#[test]
fn test_config_full() {
    let config = OrmConfig::from_str(
        r#"
        [data_source]
        default = "master"
        auto_id = false

        [data_source.nodes.master]
        dsn = "pgsql:host=localhost;port=5432;dbname=library"
        user = "app"
        pass = "secret"

        [data_source.nodes.replica]
        dsn = "pgsql:host=replica;dbname=library"
        quote_column = false

        [data_source.nodes.cache]
        dsn = "sqlite::memory:"

        [schema]
        paths = ["src/schema"]

        [build]
        rebuild = true
        foreign_keys = false
        "#,
    )
    .unwrap();

    assert_eq!(config.default_data_source(), "master");
    assert!(!config.has_auto_id());
    assert_eq!(config.schema.paths, vec!["src/schema".to_string()]);

    let master = config.node("master").unwrap();
    assert_eq!(master.user.as_deref(), Some("app"));
    assert_eq!(master.provider().unwrap(), DatabaseProvider::PostgreSql);
    assert_eq!(master.parsed_dsn().param("port"), Some("5432"));

    let cache = config.node("cache").unwrap();
    assert!(cache.parsed_dsn().memory);
    assert_eq!(cache.provider().unwrap(), DatabaseProvider::Sqlite);

    let options = BuildOptions::from(&config.build);
    assert!(options.rebuild);
    assert!(!options.clean);
    assert!(!options.foreign_keys);

    let replica = Driver::for_data_source(&config, "replica").unwrap();
    assert_eq!(replica.dialect(), Dialect::Postgres);
    assert_eq!(replica.quote_column("name"), "name");
}

/// Test that unknown keys are rejected
#[test]
fn test_config_unknown_field() {
    let result = OrmConfig::from_str(
        r#"
        [data_source]
        pool_size = 10
        "#,
    );
    assert!(matches!(result, Err(SchemaError::TomlError { .. })));
}

/// Test that the default data source must exist when nodes are configured
#[test]
fn test_config_missing_default_node() {
    let result = OrmConfig::from_str(
        r#"
        [data_source]
        default = "master"

        [data_source.nodes.replica]
        dsn = "sqlite:library.db"
        "#,
    );
    assert!(matches!(result, Err(SchemaError::ConfigError { .. })));
}

/// Test environment-specific overrides
#[test]
fn test_config_environment_override() {
    let config = OrmConfig::from_str(
        r#"
        [data_source.nodes.default]
        dsn = "mysql:host=localhost;dbname=library"

        [environments.test.data_source]
        auto_id = false

        [environments.test.data_source.nodes.default]
        dsn = "sqlite::memory:"

        [environments.test.build]
        clean = true
        "#,
    )
    .unwrap()
    .with_environment("test")
    .unwrap();

    assert!(!config.has_auto_id());
    assert!(config.build.clean);
    assert_eq!(
        Driver::for_data_source(&config, "default").unwrap().dialect(),
        Dialect::Sqlite
    );
}

/// Test environment variable interpolation
#[test]
fn test_config_env_expansion() {
    // SAFETY: no other test reads or writes this variable.
    unsafe { std::env::set_var("STRATA_TEST_DB_HOST", "db.internal") };

    let config = OrmConfig::from_str(
        r#"
        [data_source.nodes.default]
        dsn = "pgsql:host=${STRATA_TEST_DB_HOST};dbname=library"
        "#,
    )
    .unwrap();

    let dsn = config.node("default").unwrap().parsed_dsn();
    assert_eq!(dsn.param("host"), Some("db.internal"));
}

/// Test loading configuration from a file
#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [data_source.nodes.default]
        dsn = "sqlite:library.db"
        "#
    )
    .unwrap();

    let config = OrmConfig::from_file(file.path()).unwrap();
    let dsn = Dsn::parse(&config.node("default").unwrap().dsn);
    assert_eq!(dsn.driver, "sqlite");
    assert_eq!(dsn.path.as_deref(), Some("library.db"));

    let missing = OrmConfig::from_file(file.path().with_extension("missing"));
    assert!(matches!(missing, Err(SchemaError::IoError { .. })));
}

/// Test that the auto-id setting drives schema finalization
#[test]
fn test_auto_id_setting() {
    let mut registry = SchemaRegistry::new();
    registry.register("TagSchema", |s| {
        s.column("label")?.varchar(32);
        Ok(())
    });

    let config = OrmConfig::from_str(
        r#"
        [data_source]
        auto_id = false
        "#,
    )
    .unwrap();
    let ctx = BuildContext::new(config, registry);
    let tag = ctx.schema("Tag").unwrap();

    assert_eq!(tag.column_names(true), vec!["label"]);
    assert_eq!(tag.primary_key(), None);
}
