//! Catalog query builder.

use crate::search::Filter;
use serde::{Deserialize, Serialize};

/// Sort modes for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOption {
    /// Newest first (default).
    #[default]
    Newest,
    /// Price, low to high.
    PriceLow,
    /// Price, high to low.
    PriceHigh,
    /// Highest rated first.
    Popular,
}

impl SortOption {
    /// Get the SQL ORDER BY clause.
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOption::Newest => "created_at DESC",
            SortOption::PriceLow => "discounted_price ASC",
            SortOption::PriceHigh => "discounted_price DESC",
            SortOption::Popular => "rating DESC",
        }
    }

    /// Parse the query-string value ("price-low", "price-high", "popular").
    pub fn from_param(s: &str) -> Self {
        match s {
            "price-low" => SortOption::PriceLow,
            "price-high" => SortOption::PriceHigh,
            "popular" => SortOption::Popular,
            _ => SortOption::Newest,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::PriceLow => "price-low",
            SortOption::PriceHigh => "price-high",
            SortOption::Popular => "popular",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortOption::Newest => "Newest",
            SortOption::PriceLow => "Price: Low to High",
            SortOption::PriceHigh => "Price: High to Low",
            SortOption::Popular => "Highest Rated",
        }
    }
}

/// A catalog query: filters + sort + pagination.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogQuery {
    /// Filters to apply (ANDed).
    pub filters: Vec<Filter>,
    /// Sort mode.
    pub sort: SortOption,
    /// Current page (1-indexed).
    pub page: i64,
    /// Items per page.
    pub per_page: i64,
}

impl CatalogQuery {
    /// Create a new query with default pagination.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            sort: SortOption::Newest,
            page: 1,
            per_page: 24,
        }
    }

    /// Add a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the sort mode.
    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    /// Set pagination.
    pub fn with_pagination(mut self, page: i64, per_page: i64) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Calculate the SQL OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// Build the WHERE clause and bind values from the filters.
    pub fn build_where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut all_values = Vec::new();

        for filter in &self.filters {
            let (clause, values) = filter.to_sql();
            if !clause.is_empty() && clause != "1=1" {
                clauses.push(format!("({})", clause));
                all_values.extend(values);
            }
        }

        if clauses.is_empty() {
            return ("1=1".to_string(), vec![]);
        }
        (clauses.join(" AND "), all_values)
    }

    /// Build the full product SELECT.
    pub fn build_sql(&self) -> (String, Vec<String>) {
        let (where_clause, values) = self.build_where_clause();
        let sql = format!(
            "SELECT * FROM products WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            where_clause,
            self.sort.to_sql(),
            self.per_page,
            self.offset()
        );
        (sql, values)
    }

    /// Build the matching COUNT query.
    pub fn build_count_sql(&self) -> (String, Vec<String>) {
        let (where_clause, values) = self.build_where_clause();
        (
            format!("SELECT COUNT(*) FROM products WHERE {}", where_clause),
            values,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CategoryId;
    use crate::money::{Currency, Money};

    #[test]
    fn test_sort_param_parsing() {
        assert_eq!(SortOption::from_param("price-low"), SortOption::PriceLow);
        assert_eq!(SortOption::from_param("price-high"), SortOption::PriceHigh);
        assert_eq!(SortOption::from_param("popular"), SortOption::Popular);
        assert_eq!(SortOption::from_param("garbage"), SortOption::Newest);
    }

    #[test]
    fn test_filters_are_anded() {
        let query = CatalogQuery::new()
            .with_filter(Filter::Category(CategoryId::new("cat-1")))
            .with_filter(Filter::price_range(
                Some(Money::new(1000, Currency::INR)),
                Some(Money::new(5000, Currency::INR)),
            ))
            .with_filter(Filter::Colors(vec!["Ivory".to_string()]));

        let (clause, values) = query.build_where_clause();
        assert_eq!(clause.matches(" AND ").count(), 3);
        assert!(clause.contains("category_id = ?"));
        assert!(clause.contains("colors LIKE ?"));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_full_sql() {
        let query = CatalogQuery::new()
            .with_filter(Filter::text("linen"))
            .with_sort(SortOption::PriceLow)
            .with_pagination(2, 24);

        let (sql, values) = query.build_sql();
        assert!(sql.starts_with("SELECT * FROM products WHERE"));
        assert!(sql.contains("ORDER BY discounted_price ASC"));
        assert!(sql.contains("LIMIT 24 OFFSET 24"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_no_filters() {
        let query = CatalogQuery::new();
        let (sql, values) = query.build_sql();
        assert!(sql.contains("WHERE 1=1"));
        assert!(sql.contains("ORDER BY created_at DESC"));
        assert!(values.is_empty());
    }
}
