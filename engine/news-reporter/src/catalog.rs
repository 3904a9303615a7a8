//! Catalog of the derived report views
//!
//! The three analytical views are fixed data: each entry carries the view
//! name, its creation SQL, and the report format for its rows. Components
//! receive the catalog as a value instead of reaching for module globals,
//! so a test catalog can point somewhere else entirely.

/// How a report column is decoded from the database and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, rendered as-is
    Text,
    /// 64-bit row count
    Count,
    /// Percentage, rendered with one decimal place
    Rate,
    /// Calendar day, rendered as e.g. "July 29, 2016"
    Day,
}

/// Binding from a row-template placeholder to a view column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnBinding {
    /// Placeholder text inside the row template, braces included
    pub placeholder: &'static str,
    /// Column name produced by `SELECT * FROM <view>`
    pub column: &'static str,
    pub kind: ColumnKind,
}

/// A derived analytical view plus the report format for its rows.
#[derive(Debug, Clone, Copy)]
pub struct ViewDefinition {
    /// View name in the database schema, unique across the catalog
    pub name: &'static str,
    /// Full `CREATE VIEW` statement, name baked in
    pub create_statement: &'static str,
    /// Header line printed above the report
    pub report_header: &'static str,
    /// Template for one report line, with `{placeholder}` slots
    pub row_template: &'static str,
    /// Bindings for every placeholder in the row template
    pub columns: &'static [ColumnBinding],
}

pub const TOP3_ARTICLES_VIEW: ViewDefinition = ViewDefinition {
    name: "v_top3articles",
    create_statement: "
    CREATE VIEW v_top3articles AS (
        SELECT articles.title,
            count(*) AS article_count
        FROM log,
            articles
        WHERE concat('/article/', articles.slug) = log.path
        GROUP BY articles.title
        ORDER BY (count(*)) DESC
        LIMIT 3)
    ",
    report_header: "What are the most popular three articles of all time?",
    row_template: " * \"{title}\" -- {count} views",
    columns: &[
        ColumnBinding { placeholder: "{title}", column: "title", kind: ColumnKind::Text },
        ColumnBinding { placeholder: "{count}", column: "article_count", kind: ColumnKind::Count },
    ],
};

pub const TOP_AUTHORS_VIEW: ViewDefinition = ViewDefinition {
    name: "v_topauthors",
    create_statement: "
    CREATE VIEW v_topauthors AS (
        SELECT authors.name,
            count(*) AS article_count
        FROM articles,
            authors,
            log
        WHERE articles.author = authors.id
            AND concat('/article/', articles.slug) = log.path
        GROUP BY authors.id
        ORDER BY (count(*)) DESC)
    ",
    report_header: "Who are the most popular authors of all time?",
    row_template: " * {author} -- {count} views",
    columns: &[
        ColumnBinding { placeholder: "{author}", column: "name", kind: ColumnKind::Text },
        ColumnBinding { placeholder: "{count}", column: "article_count", kind: ColumnKind::Count },
    ],
};

pub const TOP_ERROR_DAYS_VIEW: ViewDefinition = ViewDefinition {
    name: "v_toperrordays",
    create_statement: "
    CREATE VIEW v_toperrordays AS (
        SELECT aq.log_date,
            aq.error_rate
        FROM (
            SELECT fl.log_date,
                fl.log_count,
                el.error_count,
                el.error_count::float8
                    / fl.log_count::float8
                    * 100 AS error_rate
            FROM (
                SELECT date_trunc('day'::text, log.\"time\") AS log_date,
                    count(*) AS log_count
                FROM log
                GROUP BY (date_trunc('day'::text, log.\"time\"))) fl
            JOIN (
                SELECT date_trunc('day'::text, log.\"time\") AS log_date,
                    count(*) AS error_count
                FROM log
                WHERE log.status NOT LIKE '200%'
                GROUP BY (date_trunc('day', log.time))) el
            ON fl.log_date = el.log_date) aq
        WHERE aq.error_rate > 1
        ORDER BY aq.log_date)
    ",
    report_header: "On which days did more than 1% of requests lead to errors?",
    row_template: " * {day} -- {error_rate}% errors",
    columns: &[
        ColumnBinding { placeholder: "{day}", column: "log_date", kind: ColumnKind::Day },
        ColumnBinding { placeholder: "{error_rate}", column: "error_rate", kind: ColumnKind::Rate },
    ],
};

/// The builtin report views, in report order.
const BUILTIN_VIEWS: &[ViewDefinition] =
    &[TOP3_ARTICLES_VIEW, TOP_AUTHORS_VIEW, TOP_ERROR_DAYS_VIEW];

/// Immutable registry of report views.
#[derive(Debug, Clone, Copy)]
pub struct ReportCatalog {
    views: &'static [ViewDefinition],
}

impl ReportCatalog {
    /// Catalog of the three builtin report views.
    pub const fn builtin() -> Self {
        Self { views: BUILTIN_VIEWS }
    }

    /// Catalog over a custom view set.
    pub const fn new(views: &'static [ViewDefinition]) -> Self {
        Self { views }
    }

    /// All views, in the order they are provisioned and reported.
    pub fn views(&self) -> &'static [ViewDefinition] {
        self.views
    }

    /// Look up a view by name.
    pub fn view(&self, name: &str) -> Option<&'static ViewDefinition> {
        self.views.iter().find(|view| view.name == name)
    }

    /// Look up a view that callers are required to know exists.
    ///
    /// Panics if `name` is not in the catalog. Components only ever pass
    /// names drawn from the catalog itself, so a miss is a programming
    /// error, not a runtime condition.
    pub fn expect_view(&self, name: &str) -> &'static ViewDefinition {
        self.view(name)
            .unwrap_or_else(|| panic!("view '{}' is not in the report catalog", name))
    }
}

impl Default for ReportCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_catalog_report_order() {
        let catalog = ReportCatalog::builtin();
        let names: Vec<&str> = catalog.views().iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["v_top3articles", "v_topauthors", "v_toperrordays"]);
    }

    #[test]
    fn test_view_names_are_unique() {
        let catalog = ReportCatalog::builtin();
        let names: HashSet<&str> = catalog.views().iter().map(|v| v.name).collect();
        assert_eq!(names.len(), catalog.views().len());
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = ReportCatalog::builtin();
        let view = catalog.view("v_topauthors").unwrap();
        assert_eq!(view.report_header, "Who are the most popular authors of all time?");
        assert!(catalog.view("v_unknown").is_none());
    }

    #[test]
    #[should_panic(expected = "not in the report catalog")]
    fn test_expect_view_panics_on_unknown_name() {
        ReportCatalog::builtin().expect_view("v_unknown");
    }

    #[test]
    fn test_create_statements_name_their_view() {
        for view in ReportCatalog::builtin().views() {
            let expected = format!("CREATE VIEW {} AS", view.name);
            assert!(
                view.create_statement.contains(&expected),
                "creation statement for {} does not create it",
                view.name
            );
        }
    }

    #[test]
    fn test_row_templates_reference_every_binding() {
        for view in ReportCatalog::builtin().views() {
            for binding in view.columns {
                assert!(
                    view.row_template.contains(binding.placeholder),
                    "template for {} is missing {}",
                    view.name,
                    binding.placeholder
                );
            }
        }
    }

    #[test]
    fn test_error_day_filter_is_strictly_greater_than_one() {
        let view = ReportCatalog::builtin().expect_view("v_toperrordays");
        assert!(view.create_statement.contains("error_rate > 1"));
        assert!(!view.create_statement.contains("error_rate >= 1"));
    }
}
