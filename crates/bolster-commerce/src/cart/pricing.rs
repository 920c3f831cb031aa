//! Cart pricing against live product prices.
//!
//! Cart lines hold only product references; pricing resolves them against
//! the current discounted price. Order lines, by contrast, are immutable
//! snapshots taken at placement time.

use crate::cart::Cart;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shipping fee policy: a flat fee waived above a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotal strictly above which shipping is free.
    pub free_over: Money,
    /// Flat fee charged otherwise.
    pub flat_fee: Money,
}

impl ShippingPolicy {
    /// Create a policy.
    pub fn new(free_over: Money, flat_fee: Money) -> Self {
        Self { free_over, flat_fee }
    }

    /// Shipping fee for a subtotal.
    pub fn fee_for(&self, subtotal: &Money) -> Money {
        if subtotal.amount_minor > self.free_over.amount_minor {
            Money::zero(subtotal.currency)
        } else {
            self.flat_fee
        }
    }
}

impl Default for ShippingPolicy {
    /// Free shipping above 999.00 INR, else a 50.00 INR flat fee.
    fn default() -> Self {
        Self {
            free_over: Money::new(99900, Currency::INR),
            flat_fee: Money::new(5000, Currency::INR),
        }
    }
}

/// The pricing-relevant slice of a product, resolved at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProduct {
    /// Product name for display.
    pub name: String,
    /// Product slug for links.
    pub slug: String,
    /// Current customer-facing price.
    pub unit_price: Money,
    /// First image path, if any.
    pub image: Option<String>,
}

/// A cart line resolved against the current product price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    /// Product reference.
    pub product_id: ProductId,
    /// Product name.
    pub name: String,
    /// Product slug.
    pub slug: String,
    /// First product image, if any.
    pub image: Option<String>,
    /// Selected size.
    pub size: Option<String>,
    /// Selected color.
    pub color: Option<String>,
    /// Current unit price.
    pub unit_price: Money,
    /// Quantity.
    pub quantity: i64,
    /// unit_price * quantity.
    pub line_total: Money,
}

/// Complete pricing breakdown for a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Shipping fee under the active policy.
    pub shipping: Money,
    /// subtotal + shipping.
    pub total: Money,
    /// Per-line breakdown in cart order.
    pub lines: Vec<PricedLine>,
}

impl CartTotals {
    /// Price a cart against resolved products.
    ///
    /// Every cart line must resolve; a dangling product reference fails
    /// the whole computation, naming the missing product.
    pub fn compute(
        cart: &Cart,
        products: &HashMap<ProductId, PricedProduct>,
        policy: &ShippingPolicy,
    ) -> Result<Self, CommerceError> {
        let currency = products
            .values()
            .next()
            .map(|p| p.unit_price.currency)
            .unwrap_or_default();

        let mut lines = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            let product = products.get(&line.key.product_id).ok_or_else(|| {
                CommerceError::ProductNotFound(line.key.product_id.to_string())
            })?;
            let line_total = product
                .unit_price
                .try_multiply(line.quantity)
                .ok_or(CommerceError::Overflow)?;
            lines.push(PricedLine {
                product_id: line.key.product_id,
                name: product.name.clone(),
                slug: product.slug.clone(),
                image: product.image.clone(),
                size: line.key.size,
                color: line.key.color,
                unit_price: product.unit_price,
                quantity: line.quantity,
                line_total,
            });
        }

        let subtotal = Money::try_sum(lines.iter().map(|l| &l.line_total), currency)
            .ok_or(CommerceError::Overflow)?;
        let shipping = policy.fee_for(&subtotal);
        let total = subtotal.try_add(&shipping).ok_or(CommerceError::Overflow)?;

        Ok(Self {
            subtotal,
            shipping,
            total,
            lines,
        })
    }

    /// Total quantity across priced lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::LineKey;

    fn priced(name: &str, minor: i64) -> PricedProduct {
        PricedProduct {
            name: name.to_string(),
            slug: name.to_lowercase(),
            unit_price: Money::new(minor, Currency::INR),
            image: None,
        }
    }

    fn rupee_policy() -> ShippingPolicy {
        // Whole-rupee units to match the storefront's advertised numbers.
        ShippingPolicy::new(Money::new(999, Currency::INR), Money::new(50, Currency::INR))
    }

    #[test]
    fn test_below_threshold_pays_flat_fee() {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        cart.add(LineKey::new(p1.clone(), None::<&str>, None::<&str>), 1)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(p1, priced("Sheet", 900));

        let totals = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap();
        assert_eq!(totals.subtotal.amount_minor, 900);
        assert_eq!(totals.shipping.amount_minor, 50);
        assert_eq!(totals.total.amount_minor, 950);
    }

    #[test]
    fn test_above_threshold_ships_free() {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        let p2 = ProductId::new("p2");
        cart.add(LineKey::new(p1.clone(), None::<&str>, None::<&str>), 1)
            .unwrap();
        cart.add(LineKey::new(p2.clone(), None::<&str>, None::<&str>), 2)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(p1, priced("Sheet", 900));
        products.insert(p2, priced("Pillow", 600));

        let totals = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap();
        assert_eq!(totals.subtotal.amount_minor, 2100);
        assert_eq!(totals.shipping.amount_minor, 0);
        assert_eq!(totals.total.amount_minor, 2100);
    }

    #[test]
    fn test_exactly_at_threshold_still_pays() {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        cart.add(LineKey::new(p1.clone(), None::<&str>, None::<&str>), 1)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(p1, priced("Sheet", 999));

        let totals = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap();
        assert_eq!(totals.shipping.amount_minor, 50);
    }

    #[test]
    fn test_empty_cart_pays_flat_fee() {
        let cart = Cart::new();
        let products = HashMap::new();
        let totals = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap();
        assert_eq!(totals.subtotal.amount_minor, 0);
        assert_eq!(totals.shipping.amount_minor, 50);
        assert_eq!(totals.total.amount_minor, 50);
    }

    #[test]
    fn test_dangling_reference_fails_whole_cart() {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        let ghost = ProductId::new("deleted");
        cart.add(LineKey::new(p1.clone(), None::<&str>, None::<&str>), 1)
            .unwrap();
        cart.add(LineKey::new(ghost, None::<&str>, None::<&str>), 1)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(p1, priced("Sheet", 900));

        let err = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap_err();
        match err {
            CommerceError::ProductNotFound(id) => assert_eq!(id, "deleted"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_line_totals() {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        cart.add(LineKey::new(p1.clone(), Some("Queen"), Some("Ivory")), 3)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(p1, priced("Sheet", 500));

        let totals = CartTotals::compute(&cart, &products, &rupee_policy()).unwrap();
        assert_eq!(totals.lines.len(), 1);
        assert_eq!(totals.lines[0].line_total.amount_minor, 1500);
        assert_eq!(totals.item_count(), 3);
    }
}
