//! Catalog filter types.
//!
//! Filters compile to SQL WHERE fragments with `?` placeholders against
//! the products table, where `sizes`, `colors`, and `tags` are JSON text
//! columns.

use crate::ids::CategoryId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A catalog filter. Combined filters are ANDed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Filter {
    /// Filter by category.
    Category(CategoryId),
    /// Filter by discounted-price range (inclusive bounds).
    PriceRange {
        min: Option<Money>,
        max: Option<Money>,
    },
    /// Match any of the given colors.
    Colors(Vec<String>),
    /// Match any of the given sizes.
    Sizes(Vec<String>),
    /// Free-text search over name, description, and tags.
    Text(String),
    /// Only featured products.
    Featured,
    /// Only in-stock products.
    InStock,
}

impl Filter {
    /// Create a price range filter.
    pub fn price_range(min: Option<Money>, max: Option<Money>) -> Self {
        Filter::PriceRange { min, max }
    }

    /// Create a text search filter.
    pub fn text(query: impl Into<String>) -> Self {
        Filter::Text(query.into())
    }

    /// Build a SQL WHERE fragment and its bind values.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        match self {
            Filter::Category(id) => (
                "category_id = ?".to_string(),
                vec![id.as_str().to_string()],
            ),
            Filter::PriceRange { min, max } => {
                let mut clauses = Vec::new();
                let mut values = Vec::new();
                if let Some(min) = min {
                    clauses.push("discounted_price >= ?".to_string());
                    values.push(min.amount_minor.to_string());
                }
                if let Some(max) = max {
                    clauses.push("discounted_price <= ?".to_string());
                    values.push(max.amount_minor.to_string());
                }
                (clauses.join(" AND "), values)
            }
            Filter::Colors(colors) => json_set_clause("colors", colors),
            Filter::Sizes(sizes) => json_set_clause("sizes", sizes),
            Filter::Text(query) => {
                let like = format!("%{}%", query);
                (
                    "(name LIKE ? OR description LIKE ? OR tags LIKE ?)".to_string(),
                    vec![like.clone(), like.clone(), like],
                )
            }
            Filter::Featured => ("featured = 1".to_string(), vec![]),
            Filter::InStock => ("in_stock = 1".to_string(), vec![]),
        }
    }
}

/// OR a set of values against a JSON-array text column.
///
/// Values are matched as quoted JSON elements, so "Red" does not match
/// "Dark Red"'s substring but does match the element `"Red"`.
fn json_set_clause(column: &str, values: &[String]) -> (String, Vec<String>) {
    if values.is_empty() {
        return ("1=1".to_string(), vec![]);
    }
    let clause = values
        .iter()
        .map(|_| format!("{} LIKE ?", column))
        .collect::<Vec<_>>()
        .join(" OR ");
    let binds = values
        .iter()
        .map(|v| format!("%\"{}\"%", v))
        .collect();
    (format!("({})", clause), binds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_price_range_sql() {
        let filter = Filter::price_range(
            Some(Money::new(1000, Currency::INR)),
            Some(Money::new(5000, Currency::INR)),
        );
        let (sql, values) = filter.to_sql();
        assert!(sql.contains("discounted_price >="));
        assert!(sql.contains("discounted_price <="));
        assert_eq!(values, vec!["1000", "5000"]);
    }

    #[test]
    fn test_color_set_sql() {
        let filter = Filter::Colors(vec!["Ivory".to_string(), "Sage".to_string()]);
        let (sql, values) = filter.to_sql();
        assert_eq!(sql, "(colors LIKE ? OR colors LIKE ?)");
        assert_eq!(values, vec!["%\"Ivory\"%", "%\"Sage\"%"]);
    }

    #[test]
    fn test_text_filter_sql() {
        let filter = Filter::text("percale");
        let (sql, values) = filter.to_sql();
        assert!(sql.contains("name LIKE ?"));
        assert!(sql.contains("tags LIKE ?"));
        assert_eq!(values.len(), 3);
        assert!(values[0].contains("percale"));
    }

    #[test]
    fn test_empty_color_set_is_noop() {
        let filter = Filter::Colors(vec![]);
        let (sql, values) = filter.to_sql();
        assert_eq!(sql, "1=1");
        assert!(values.is_empty());
    }
}
