//! Naming conventions that derive model classes, tables and labels from
//! declaration names.

use convert_case::{Case, Casing};

/// Suffix carried by declaration names (`AuthorSchema`).
pub const SCHEMA_SUFFIX: &str = "Schema";

/// Path separator inside declaration names (`app::model::AuthorSchema`).
pub const PATH_SEPARATOR: &str = "::";

/// Strip a trailing `Schema` from a declaration name.
///
/// `app::model::AuthorSchema` becomes `app::model::Author`; names without the
/// suffix are returned unchanged.
pub fn model_class(declaration: &str) -> &str {
    match declaration.rfind(SCHEMA_SUFFIX) {
        Some(pos) if pos > 0 && pos + SCHEMA_SUFFIX.len() == declaration.len() => {
            &declaration[..pos]
        }
        _ => declaration,
    }
}

/// Last path segment of a class name.
pub fn short_name(class: &str) -> &str {
    match class.rfind(PATH_SEPARATOR) {
        Some(pos) => &class[pos + PATH_SEPARATOR.len()..],
        None => class,
    }
}

/// Everything before the last path segment, or the class itself when it has
/// no path.
pub fn namespace(class: &str) -> &str {
    match class.rfind(PATH_SEPARATOR) {
        Some(pos) => &class[..pos],
        None => class,
    }
}

/// Convert a model name to its default table name: snake case with the last
/// word pluralized (`BookCategory` -> `book_categories`).
pub fn table_name(model_name: &str) -> String {
    let snake = model_name.to_case(Case::Snake);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralizer::pluralize(last, 2, false)),
        None => pluralizer::pluralize(&snake, 2, false),
    }
}

/// Convert a model name to its default label: underscores become spaces and
/// the first letter is upper-cased.
pub fn label(model_name: &str) -> String {
    let spaced = model_name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_class_strips_suffix() {
        assert_eq!(model_class("AuthorSchema"), "Author");
        assert_eq!(model_class("app::model::BookSchema"), "app::model::Book");
        assert_eq!(model_class("Author"), "Author");
        assert_eq!(model_class("Schema"), "Schema");
    }

    #[test]
    fn test_short_name_and_namespace() {
        assert_eq!(short_name("app::model::Book"), "Book");
        assert_eq!(short_name("Book"), "Book");
        assert_eq!(namespace("app::model::Book"), "app::model");
        assert_eq!(namespace("Book"), "Book");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("Author"), "authors");
        assert_eq!(table_name("Book"), "books");
        assert_eq!(table_name("AuthorBook"), "author_books");
        assert_eq!(table_name("BookCategory"), "book_categories");
    }

    #[test]
    fn test_label() {
        assert_eq!(label("Author"), "Author");
        assert_eq!(label("metric_value"), "Metric value");
        assert_eq!(label(""), "");
    }
}
