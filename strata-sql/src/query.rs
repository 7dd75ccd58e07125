//! Join and select fragments for relationship traversal.

use strata_schema::{BuildContext, JoinPlan, Schema};

use crate::driver::Driver;
use crate::error::SqlResult;

/// Join flavor used when rendering a join plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// Renders join plans with a driver's quoting policy.
#[derive(Debug, Clone, Copy)]
pub struct RelationQuery {
    driver: Driver,
    join_type: JoinType,
}

impl RelationQuery {
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            join_type: JoinType::default(),
        }
    }

    /// Use `LEFT JOIN` instead of `INNER JOIN`.
    pub fn left(mut self) -> Self {
        self.join_type = JoinType::Left;
        self
    }

    /// Render the steps of a plan as `JOIN ... ON ...` clauses.
    ///
    /// A table that is already part of the query (self references) is
    /// aliased as `<table>_<n>`, where `n` is the step number.
    pub fn join_clauses(&self, plan: &JoinPlan) -> Vec<String> {
        self.render_joins(plan).0
    }

    /// `SELECT <target columns> FROM <owner> <joins>` for a relationship
    /// accessor of `owner`.
    pub fn select_related(
        &self,
        ctx: &BuildContext,
        owner: &Schema,
        accessor: &str,
    ) -> SqlResult<String> {
        let plan = owner.join_plan(ctx, accessor)?;
        let target = ctx.schema(&plan.target_schema)?;
        let (joins, target_alias) = self.render_joins(&plan);

        let columns = target
            .column_names(false)
            .into_iter()
            .map(|c| self.qualified(&target_alias, c))
            .collect::<Vec<_>>();

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.driver.quote_table(&plan.owner_table)
        );
        for join in joins {
            sql.push(' ');
            sql.push_str(&join);
        }
        Ok(sql)
    }

    fn render_joins(&self, plan: &JoinPlan) -> (Vec<String>, String) {
        let mut seen = vec![plan.owner_table.clone()];
        let mut left = plan.owner_table.clone();
        let mut clauses = Vec::with_capacity(plan.steps.len());

        for (i, step) in plan.steps.iter().enumerate() {
            let (table_ref, right) = if seen.contains(&step.right_table) {
                let alias = format!("{}_{}", step.right_table, i + 1);
                (
                    format!(
                        "{} AS {}",
                        self.driver.quote_table(&step.right_table),
                        self.driver.quote_table(&alias)
                    ),
                    alias,
                )
            } else {
                (
                    self.driver.quote_table(&step.right_table),
                    step.right_table.clone(),
                )
            };

            clauses.push(format!(
                "{} {} ON {} = {}",
                self.join_type.as_sql(),
                table_ref,
                self.qualified(&left, &step.left_column),
                self.qualified(&right, &step.right_column)
            ));
            seen.push(right.clone());
            left = right;
        }

        (clauses, left)
    }

    fn qualified(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.driver.quote_table(table),
            self.driver.quote_column(column)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use pretty_assertions::assert_eq;
    use strata_schema::{OrmConfig, SchemaRegistry};

    fn ctx() -> BuildContext {
        let mut registry = SchemaRegistry::new();
        registry.register("AuthorSchema", |s| {
            s.column("name")?.varchar(128);
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
            s.column("title")?.varchar(255);
            s.column("publisher_id")?.integer().refer("Publisher");
            Ok(())
        });
        registry.register("PublisherSchema", |s| {
            s.column("name")?.varchar(128);
            Ok(())
        });
        registry.register("CategorySchema", |s| {
            s.column("name")?.varchar(64);
            s.column("parent_id")?.integer().refer("Category");
            Ok(())
        });
        BuildContext::new(OrmConfig::default(), registry)
    }

    #[test]
    fn test_belongs_to_select() {
        let ctx = ctx();
        let book = ctx.schema("Book").unwrap();
        let query = RelationQuery::new(Driver::new(Dialect::Postgres));

        let sql = query.select_related(&ctx, &book, "publisher").unwrap();
        assert_eq!(
            sql,
            r#"SELECT "publishers"."id", "publishers"."name" FROM "books" INNER JOIN "publishers" ON "books"."publisher_id" = "publishers"."id""#
        );
    }

    #[test]
    fn test_many_to_many_joins() {
        let ctx = ctx();
        let author = ctx.schema("Author").unwrap();
        let plan = author.join_plan(&ctx, "books").unwrap();
        let query = RelationQuery::new(Driver::new(Dialect::MySql)).left();

        assert_eq!(
            query.join_clauses(&plan),
            vec![
                "LEFT JOIN `author_books` ON `authors`.`id` = `author_books`.`author_id`".to_string(),
                "LEFT JOIN `books` ON `author_books`.`book_id` = `books`.`id`".to_string(),
            ]
        );
    }

    #[test]
    fn test_self_reference_aliased() {
        let ctx = ctx();
        let category = ctx.schema("Category").unwrap();
        let query = RelationQuery::new(Driver::new(Dialect::Sqlite));

        let sql = query.select_related(&ctx, &category, "parent").unwrap();
        assert_eq!(
            sql,
            r#"SELECT "categories_1"."id", "categories_1"."name", "categories_1"."parent_id" FROM "categories" INNER JOIN "categories" AS "categories_1" ON "categories"."parent_id" = "categories_1"."id""#
        );
    }

    #[test]
    fn test_unquoted_columns() {
        let ctx = ctx();
        let book = ctx.schema("Book").unwrap();
        let plan = book.join_plan(&ctx, "publisher").unwrap();
        let query = RelationQuery::new(Driver::new(Dialect::Sqlite).with_quoting(false, false));

        assert_eq!(
            query.join_clauses(&plan),
            vec!["INNER JOIN publishers ON books.publisher_id = publishers.id".to_string()]
        );
    }

    #[test]
    fn test_unknown_accessor() {
        let ctx = ctx();
        let book = ctx.schema("Book").unwrap();
        let query = RelationQuery::new(Driver::new(Dialect::Sqlite));

        assert!(query.select_related(&ctx, &book, "reviews").is_err());
    }
}
