//! Product types.

use crate::error::CommerceError;
use crate::ids::{CategoryId, ProductId, UserId};
use crate::money::Money;
use crate::slug::slugify;
use serde::{Deserialize, Serialize};

/// Physical attributes of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProductAttributes {
    /// Available sizes (e.g., "Single", "Queen", "King").
    pub sizes: Vec<String>,
    /// Available colors.
    pub colors: Vec<String>,
    /// Material (e.g., "Egyptian cotton").
    pub material: Option<String>,
    /// Thread count, where applicable.
    pub thread_count: Option<i64>,
    /// Dimensions as free text (e.g., "90x100 in").
    pub dimensions: Option<String>,
}

/// Stock state for a product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Stock {
    /// Whether the product is sellable at all.
    pub in_stock: bool,
    /// Units on hand.
    pub quantity: i64,
}

impl Stock {
    /// Create stock with the given quantity.
    pub fn new(quantity: i64) -> Self {
        Self {
            in_stock: quantity > 0,
            quantity,
        }
    }

    /// Check whether the requested quantity can be covered.
    pub fn can_cover(&self, requested: i64) -> bool {
        self.in_stock && self.quantity >= requested
    }
}

impl Default for Stock {
    fn default() -> Self {
        Self {
            in_stock: true,
            quantity: 0,
        }
    }
}

/// A customer review on a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    /// Reviewing user.
    pub user_id: UserId,
    /// Star rating, 1 through 5.
    pub rating: u8,
    /// Review text.
    pub comment: String,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// URL-friendly slug (unique, derived from name).
    pub slug: String,
    /// Full description.
    pub description: String,
    /// Short description for listings.
    pub short_description: String,
    /// Reference/list price.
    pub price: Money,
    /// Customer-facing sell price. Invariant: `discounted_price <= price`.
    pub discounted_price: Money,
    /// Category this product belongs to.
    pub category_id: CategoryId,
    /// Physical attributes.
    pub attributes: ProductAttributes,
    /// Image paths.
    pub images: Vec<String>,
    /// Stock state.
    pub stock: Stock,
    /// Average review rating.
    pub rating: f64,
    /// Customer reviews.
    pub reviews: Vec<Review>,
    /// Tags for filtering/search.
    pub tags: Vec<String>,
    /// Featured on the home page.
    pub featured: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Product {
    /// Create a new product with a slug derived from its name.
    ///
    /// Returns an error if `discounted_price` exceeds `price` or the
    /// currencies differ.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        discounted_price: Money,
        category_id: CategoryId,
    ) -> Result<Self, CommerceError> {
        let name = name.into();
        let description: String = description.into();
        validate_pricing(&price, &discounted_price)?;

        let now = current_timestamp();
        let short_description = truncate_chars(&description, 100);
        Ok(Self {
            id: ProductId::generate(),
            slug: slugify(&name),
            name,
            description,
            short_description,
            price,
            discounted_price,
            category_id,
            attributes: ProductAttributes::default(),
            images: Vec::new(),
            stock: Stock::default(),
            rating: 0.0,
            reviews: Vec::new(),
            tags: Vec::new(),
            featured: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if the product is available for purchase.
    pub fn is_available(&self) -> bool {
        self.stock.in_stock
    }

    /// Check if the product is on sale (discounted below list price).
    pub fn is_on_sale(&self) -> bool {
        self.discounted_price.amount_minor < self.price.amount_minor
    }

    /// Calculate the discount percentage if on sale.
    pub fn discount_percentage(&self) -> Option<f64> {
        if !self.is_on_sale() || self.price.amount_minor == 0 {
            return None;
        }
        let savings = self.price.amount_minor - self.discounted_price.amount_minor;
        Some((savings as f64 / self.price.amount_minor as f64) * 100.0)
    }

    /// Append a review and recompute the average rating.
    pub fn add_review(&mut self, review: Review) -> Result<(), CommerceError> {
        if !(1..=5).contains(&review.rating) {
            return Err(CommerceError::Validation(format!(
                "rating {} out of range 1..=5",
                review.rating
            )));
        }
        self.reviews.push(review);
        self.rating = self.reviews.iter().map(|r| r.rating as f64).sum::<f64>()
            / self.reviews.len() as f64;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Add a tag if not already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Update the sell/list prices, re-validating the invariant.
    pub fn set_pricing(&mut self, price: Money, discounted_price: Money) -> Result<(), CommerceError> {
        validate_pricing(&price, &discounted_price)?;
        self.price = price;
        self.discounted_price = discounted_price;
        self.updated_at = current_timestamp();
        Ok(())
    }
}

/// Validate the `discounted_price <= price` invariant.
fn validate_pricing(price: &Money, discounted: &Money) -> Result<(), CommerceError> {
    if price.currency != discounted.currency {
        return Err(CommerceError::CurrencyMismatch {
            expected: price.currency.code().to_string(),
            got: discounted.currency.code().to_string(),
        });
    }
    if discounted.amount_minor > price.amount_minor {
        return Err(CommerceError::Validation(
            "discounted price exceeds list price".to_string(),
        ));
    }
    if price.amount_minor < 0 || discounted.amount_minor < 0 {
        return Err(CommerceError::Validation("negative price".to_string()));
    }
    Ok(())
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Get current Unix timestamp.
pub(crate) fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn product() -> Product {
        Product::new(
            "Sateen Sheet Set",
            "Long-staple cotton sateen sheet set.",
            Money::new(250000, Currency::INR),
            Money::new(199900, Currency::INR),
            CategoryId::new("cat-sheets"),
        )
        .unwrap()
    }

    #[test]
    fn test_product_creation_derives_slug() {
        let p = product();
        assert_eq!(p.slug, "sateen-sheet-set");
        assert!(p.is_available());
    }

    #[test]
    fn test_discounted_above_price_rejected() {
        let result = Product::new(
            "Bad Pricing",
            "x",
            Money::new(1000, Currency::INR),
            Money::new(2000, Currency::INR),
            CategoryId::new("cat"),
        );
        assert!(matches!(result, Err(CommerceError::Validation(_))));
    }

    #[test]
    fn test_on_sale() {
        let p = product();
        assert!(p.is_on_sale());
        let pct = p.discount_percentage().unwrap();
        assert!((pct - 20.04).abs() < 0.1);
    }

    #[test]
    fn test_review_updates_rating() {
        let mut p = product();
        p.add_review(Review {
            user_id: UserId::new("u1"),
            rating: 4,
            comment: "Soft".to_string(),
            created_at: 0,
        })
        .unwrap();
        p.add_review(Review {
            user_id: UserId::new("u2"),
            rating: 5,
            comment: "Great".to_string(),
            created_at: 0,
        })
        .unwrap();
        assert!((p.rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_review_rating_out_of_range() {
        let mut p = product();
        let result = p.add_review(Review {
            user_id: UserId::new("u1"),
            rating: 6,
            comment: String::new(),
            created_at: 0,
        });
        assert!(result.is_err());
        assert!(p.reviews.is_empty());
    }

    #[test]
    fn test_stock_can_cover() {
        let stock = Stock::new(3);
        assert!(stock.can_cover(3));
        assert!(!stock.can_cover(4));

        let empty = Stock::new(0);
        assert!(!empty.in_stock);
        assert!(!empty.can_cover(1));
    }

    #[test]
    fn test_short_description_truncation() {
        let long = "a".repeat(200);
        let p = Product::new(
            "Long Desc",
            long,
            Money::new(1000, Currency::INR),
            Money::new(1000, Currency::INR),
            CategoryId::new("cat"),
        )
        .unwrap();
        assert_eq!(p.short_description.chars().count(), 100);
    }
}
