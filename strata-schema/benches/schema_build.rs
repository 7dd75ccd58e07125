//! Benchmarks for schema declaration, finalization and export.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use strata_schema::{BuildContext, OrmConfig, SchemaRegistry};

/// Registry with an author/book/junction graph.
fn library_registry() -> SchemaRegistry {
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
        s.column("title")?.varchar(255).localize();
        s.column("isbn")?.varchar(13).unique();
        s.column("publisher_id")?.integer().refer("Publisher");
        s.mixin("Localize", serde_json::json!({ "locales": ["en", "fr", "de"] }))?;
        Ok(())
    });
    registry.register("PublisherSchema", |s| {
        s.column("name")?.varchar(128);
        Ok(())
    });
    registry
}

/// Registry with `count` independent wide schemas.
fn wide_registry(count: usize) -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for i in 0..count {
        registry.register(format!("Entity{}Schema", i), |s| {
            for c in 0..30 {
                s.column(format!("field_{}", c))?.varchar(64);
            }
            Ok(())
        });
    }
    registry
}

fn bench_build_single(c: &mut Criterion) {
    c.bench_function("build_single_schema", |b| {
        b.iter(|| {
            let ctx = BuildContext::new(OrmConfig::default(), library_registry());
            black_box(ctx.schema("Author").unwrap())
        })
    });
}

fn bench_build_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_all_schemas");

    for count in [10, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let ctx = BuildContext::new(OrmConfig::default(), wide_registry(count));
                black_box(ctx.all_schemas().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_cached_lookup(c: &mut Criterion) {
    let ctx = BuildContext::new(OrmConfig::default(), library_registry());
    ctx.schema("Author").unwrap();

    c.bench_function("cached_schema_lookup", |b| {
        b.iter(|| black_box(ctx.schema(black_box("Author")).unwrap()))
    });
}

fn bench_export(c: &mut Criterion) {
    let ctx = BuildContext::new(OrmConfig::default(), library_registry());
    let book = ctx.schema("Book").unwrap();

    c.bench_function("export_with_refers", |b| {
        b.iter(|| black_box(book.export(&ctx).unwrap()))
    });
}

fn bench_reference_closure(c: &mut Criterion) {
    let ctx = BuildContext::new(OrmConfig::default(), library_registry());
    let author = ctx.schema("Author").unwrap();

    c.bench_function("recursive_reference_schemas", |b| {
        b.iter(|| black_box(author.reference_schemas(&ctx, true).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_build_single,
    bench_build_all,
    bench_cached_lookup,
    bench_export,
    bench_reference_closure,
);

criterion_main!(benches);
