//! Integration tests for schema declaration, finalization and export.
//!
//! These tests declare a small library domain through the facade crate and
//! check the finalized models the build context produces.

use std::fs::File;
use std::time::{Duration, SystemTime};

use strata::schema::{
    BuildContext, ColumnType, DefaultValue, OrmConfig, RelationKind, SchemaError, SchemaRegistry,
    Value,
};

fn library() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register("AuthorSchema", |s| {
        s.column("name")?.varchar(128).not_null().label("Name");
        s.column("email")?.varchar(128).unique().index();
        s.column("confirmed")?.boolean().default(false);
        s.mixin("Metadata", serde_json::Value::Null)?;
        s.has_many("author_books", "AuthorBookSchema", "author_id", "id");
        s.many_to_many("books", "author_books", "book")?;
        Ok(())
    });
    registry.register("AuthorBookSchema", |s| {
        s.column("author_id")?.integer().refer("Author");
        s.column("book_id")?.integer().refer("Book");
        Ok(())
    });
    registry.register("BookSchema", |s| {
        s.column("title")?.varchar(255).localize().label("Title");
        s.column("isbn")?.varchar(13).unique();
        s.column("publisher_id")?.integer();
        s.belongs_to("publisher", "Publisher", "publisher_id")?;
        s.mixin("Localize", serde_json::json!({ "locales": ["en", "fr"] }))?;
        Ok(())
    });
    registry.register("PublisherSchema", |s| {
        s.column("name")?.varchar(128);
        s.column("display_name")?.virtual_column();
        Ok(())
    });
    registry
}

/// Test the finalized shape of a schema with a mixin and relationships
#[test]
fn test_author_schema() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let author = ctx.schema("Author").unwrap();

    assert_eq!(author.name(), "AuthorSchema");
    assert_eq!(author.table(), "authors");
    assert_eq!(author.label(), "Author");
    assert_eq!(author.primary_key(), Some("id"));
    assert_eq!(
        author.column_names(false),
        vec!["id", "name", "email", "confirmed", "created_on", "updated_on"]
    );

    let created = author.column("created_on").unwrap();
    assert_eq!(created.isa, ColumnType::DateTime);
    assert_eq!(
        created.default,
        Some(DefaultValue::Literal(Value::raw("CURRENT_TIMESTAMP")))
    );

    let books = author.relation("books").unwrap();
    assert_eq!(books.kind, RelationKind::ManyToMany);
}

/// Test that lookups by short and full name share one cached schema
#[test]
fn test_lookup_by_short_and_full_name() {
    let ctx = BuildContext::new(OrmConfig::default(), library());

    let short = ctx.schema("Book").unwrap();
    let full = ctx.schema("BookSchema").unwrap();
    let rooted = ctx.schema("::BookSchema").unwrap();

    assert!(std::sync::Arc::ptr_eq(&short, &full));
    assert!(std::sync::Arc::ptr_eq(&short, &rooted));
    assert_eq!(ctx.cached_count(), 2);
}

/// Test that belongs-to resolution uses the foreign primary key
#[test]
fn test_belongs_to_foreign_column() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let book = ctx.schema("Book").unwrap();

    let publisher = book.relation("publisher").unwrap();
    assert_eq!(publisher.kind, RelationKind::BelongsTo);
    assert_eq!(publisher.self_column(), Some("publisher_id"));
    assert_eq!(publisher.foreign_column(), Some("id"));
}

/// Test localized column expansion
#[test]
fn test_localized_columns() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let book = ctx.schema("Book").unwrap();

    assert!(book.has_column("title_en"));
    assert!(book.has_column("title_fr"));
    assert_eq!(book.msg_ids(), vec!["Book", "Title", "Title (en)", "Title (fr)"]);
}

/// Test virtual columns are kept in the model but marked as not persisted
#[test]
fn test_virtual_columns() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let publisher = ctx.schema("Publisher").unwrap();

    assert_eq!(publisher.column_names(true), vec!["id", "name", "display_name"]);
    assert_eq!(publisher.column_names(false), vec!["id", "name"]);
}

/// Test the recursive reference closure across a junction schema
#[test]
fn test_reference_closure() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let author = ctx.schema("Author").unwrap();

    let direct = author.reference_schemas(&ctx, false).unwrap();
    assert_eq!(
        direct.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["AuthorBookSchema"]
    );

    let all = author.reference_schemas(&ctx, true).unwrap();
    assert!(all.contains_key("BookSchema"));
    assert!(all.contains_key("PublisherSchema"));
}

/// Test the export consumed by code generators
#[test]
fn test_export_json() {
    let ctx = BuildContext::new(OrmConfig::default(), library());
    let junction = ctx.schema("AuthorBook").unwrap();

    let export = junction.export(&ctx).unwrap();
    assert_eq!(export.table, "author_books");
    assert_eq!(export.model_class, "AuthorBook");
    assert_eq!(export.collection_class, "AuthorBookCollection");
    assert_eq!(
        export.relations.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        vec!["author", "book"]
    );

    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["column_data"]["book_id"]["refer"], "Book");
    assert_eq!(json["relations"]["author"]["foreign_schema"], "AuthorSchema");
}

/// Test that declaration errors name the offending schema
#[test]
fn test_declaration_errors() {
    let mut registry = SchemaRegistry::new();
    registry.register("BrokenSchema", |s| {
        s.column("name")?.varchar(10);
        s.column("name")?.varchar(20);
        Ok(())
    });
    registry.register("NoMixinSchema", |s| {
        s.mixin("Audit", serde_json::Value::Null)?;
        Ok(())
    });
    let ctx = BuildContext::new(OrmConfig::default(), registry);

    match ctx.schema("Broken").unwrap_err() {
        SchemaError::DuplicateColumn { schema, column } => {
            assert_eq!(schema, "BrokenSchema");
            assert_eq!(column, "name");
        }
        other => panic!("Expected DuplicateColumn, got {other:?}"),
    }
    assert!(matches!(
        ctx.schema("NoMixin").unwrap_err(),
        SchemaError::MixinNotFound { .. }
    ));
    assert!(matches!(
        ctx.schema("Missing").unwrap_err(),
        SchemaError::UnknownSchema { .. }
    ));
}

/// Test that concurrent lookups all see the same finalized schema
#[test]
fn test_concurrent_lookups() {
    let ctx = BuildContext::new(OrmConfig::default(), library());

    let schemas: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| ctx.schema("AuthorBook").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(schemas.windows(2).all(|w| std::sync::Arc::ptr_eq(&w[0], &w[1])));
}

/// Test declaration staleness against generated files
#[test]
fn test_staleness_against_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("author.rs");
    let target = dir.path().join("author_base.rs");
    File::create(&source).unwrap();

    let mut registry = SchemaRegistry::new();
    let source_path = source.clone();
    registry.register("AuthorSchema", move |s| {
        s.column("name")?.varchar(64);
        s.source_file(source_path.clone());
        Ok(())
    });
    let ctx = BuildContext::new(OrmConfig::default(), registry);
    let author = ctx.schema("Author").unwrap();

    assert!(author.is_newer_than_file(&target).unwrap());

    let generated = File::create(&target).unwrap();
    generated
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
        .unwrap();
    assert!(author.is_newer_than_file(&target).unwrap());

    let future = SystemTime::now() + Duration::from_secs(3_600);
    File::options()
        .write(true)
        .open(&target)
        .unwrap()
        .set_modified(future)
        .unwrap();
    assert!(!author.is_newer_than_file(&target).unwrap());
}
