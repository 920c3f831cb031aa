//! CSV bulk-import mapping.
//!
//! Each CSV row maps to a product with defaults: short description is
//! truncated from the description when absent, discounted price defaults
//! to price, and list-valued fields split on commas. Rows referencing an
//! unknown category are skipped; the outcome reports how many.

use crate::catalog::{Product, ProductAttributes};
use crate::error::CommerceError;
use crate::ids::CategoryId;
use crate::money::{Currency, Money};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// One row of the bulk-upload CSV, as uploaded by the admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvProductRow {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub discounted_price: Option<f64>,
    /// Category by name, resolved against existing categories.
    pub category: String,
    #[serde(default)]
    pub sizes: Option<String>,
    #[serde(default)]
    pub colors: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub thread_count: Option<i64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_featured: Option<String>,
}

/// Result of a bulk import run.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Products ready to be persisted.
    pub created: Vec<Product>,
    /// Rows skipped (unknown category or invalid values).
    pub skipped: usize,
}

impl ImportOutcome {
    /// Total rows seen.
    pub fn total(&self) -> usize {
        self.created.len() + self.skipped
    }
}

/// Parse a CSV stream and map rows to products.
///
/// `categories` maps category name to id. Rows whose category is unknown
/// or whose values fail validation are counted as skipped rather than
/// aborting the import; a malformed CSV (bad header, wrong arity) fails
/// the whole run.
pub fn import_products(
    reader: impl Read,
    categories: &HashMap<String, CategoryId>,
    currency: Currency,
) -> Result<ImportOutcome, CommerceError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut outcome = ImportOutcome::default();

    for row in csv_reader.deserialize::<CsvProductRow>() {
        let row = row?;
        match map_row(&row, categories, currency) {
            Some(product) => outcome.created.push(product),
            None => outcome.skipped += 1,
        }
    }

    Ok(outcome)
}

/// Map one row to a product, or None if the row should be skipped.
pub fn map_row(
    row: &CsvProductRow,
    categories: &HashMap<String, CategoryId>,
    currency: Currency,
) -> Option<Product> {
    let category_id = categories.get(&row.category)?.clone();

    let price = Money::from_decimal(row.price, currency);
    let discounted = Money::from_decimal(row.discounted_price.unwrap_or(row.price), currency);

    let mut product =
        Product::new(&row.name, &row.description, price, discounted, category_id).ok()?;

    if let Some(short) = &row.short_description {
        if !short.is_empty() {
            product.short_description = short.clone();
        }
    }
    product.attributes = ProductAttributes {
        sizes: split_list(row.sizes.as_deref()),
        colors: split_list(row.colors.as_deref()),
        material: row.material.clone().filter(|m| !m.is_empty()),
        thread_count: row.thread_count,
        dimensions: row.dimensions.clone().filter(|d| !d.is_empty()),
    };
    product.images = split_list(row.images.as_deref());
    product.tags = split_list(row.tags.as_deref());
    product.featured = row.is_featured.as_deref() == Some("true");

    Some(product)
}

/// Split a comma-separated field into trimmed, non-empty values.
fn split_list(field: Option<&str>) -> Vec<String> {
    field
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> HashMap<String, CategoryId> {
        let mut map = HashMap::new();
        map.insert("Sheets".to_string(), CategoryId::new("cat-sheets"));
        map
    }

    const HEADER: &str = "name,description,shortDescription,price,discountedPrice,category,sizes,colors,material,threadCount,dimensions,images,tags,isFeatured\n";

    #[test]
    fn test_full_row_creates_product() {
        let csv = format!(
            "{HEADER}Percale Sheet Set,Crisp percale weave.,Crisp and cool.,2500,1999,Sheets,\"Queen, King\",\"Ivory, Sage\",Cotton,400,90x100 in,/uploads/a.jpg,\"bestseller, cotton\",true\n"
        );
        let outcome = import_products(csv.as_bytes(), &categories(), Currency::INR).unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.skipped, 0);

        let p = &outcome.created[0];
        assert_eq!(p.slug, "percale-sheet-set");
        assert_eq!(p.price.amount_minor, 250000);
        assert_eq!(p.discounted_price.amount_minor, 199900);
        assert_eq!(p.attributes.sizes, vec!["Queen", "King"]);
        assert_eq!(p.attributes.colors, vec!["Ivory", "Sage"]);
        assert_eq!(p.attributes.thread_count, Some(400));
        assert_eq!(p.tags, vec!["bestseller", "cotton"]);
        assert!(p.featured);
    }

    #[test]
    fn test_unknown_category_row_skipped() {
        let csv = format!(
            "{HEADER}Mystery Item,desc,,100,,Gadgets,,,,,,,,\n\
             Percale Sheet,desc,,100,,Sheets,,,,,,,,\n"
        );
        let outcome = import_products(csv.as_bytes(), &categories(), Currency::INR).unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.total(), 2);
        assert_eq!(outcome.created[0].name, "Percale Sheet");
    }

    #[test]
    fn test_defaults_applied() {
        let csv = format!("{HEADER}Plain Sheet,A plain sheet.,,500,,Sheets,,,,,,,,\n");
        let outcome = import_products(csv.as_bytes(), &categories(), Currency::INR).unwrap();

        let p = &outcome.created[0];
        // Discounted price defaults to price.
        assert_eq!(p.discounted_price, p.price);
        // Short description falls back to the truncated description.
        assert_eq!(p.short_description, "A plain sheet.");
        assert!(!p.featured);
        assert!(p.attributes.sizes.is_empty());
    }

    #[test]
    fn test_discounted_above_price_row_skipped() {
        let csv = format!("{HEADER}Bad Row,desc,,100,200,Sheets,,,,,,,,\n");
        let outcome = import_products(csv.as_bytes(), &categories(), Currency::INR).unwrap();
        assert_eq!(outcome.created.len(), 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_malformed_csv_fails() {
        let csv = "name,price\n\"unterminated,100\n";
        let result = import_products(csv.as_bytes(), &categories(), Currency::INR);
        assert!(result.is_err());
    }
}
