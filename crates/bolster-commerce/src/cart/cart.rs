//! Session cart as an explicit keyed container.
//!
//! Line identity is the (product, size, color) triple, so adding the same
//! combination twice increments quantity instead of duplicating the line.

use crate::error::CommerceError;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum quantity allowed per line.
pub const MAX_QUANTITY_PER_LINE: i64 = 9999;

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Selected size, if the product has sizes.
    pub size: Option<String>,
    /// Selected color, if the product has colors.
    pub color: Option<String>,
}

impl LineKey {
    /// Create a line key.
    pub fn new(
        product_id: ProductId,
        size: Option<impl Into<String>>,
        color: Option<impl Into<String>>,
    ) -> Self {
        Self {
            product_id,
            size: size.map(Into::into),
            color: color.map(Into::into),
        }
    }
}

/// A cart line as exposed to callers and serialized into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identity.
    pub key: LineKey,
    /// Quantity, always >= 1.
    pub quantity: i64,
}

/// A transient, session-scoped shopping cart.
///
/// Serialized as a list of lines; deserialization merges any duplicate
/// keys so a malformed session can never hold two lines for the same
/// (product, size, color) combination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: BTreeMap<LineKey, i64>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add quantity for a line key.
    ///
    /// Merges into an existing line for the same key. Returns the new
    /// quantity for the line.
    pub fn add(&mut self, key: LineKey, quantity: i64) -> Result<i64, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let current = self.lines.get(&key).copied().unwrap_or(0);
        let new_quantity = current
            .checked_add(quantity)
            .ok_or(CommerceError::Overflow)?;
        if new_quantity > MAX_QUANTITY_PER_LINE {
            return Err(CommerceError::QuantityExceedsLimit(
                new_quantity,
                MAX_QUANTITY_PER_LINE,
            ));
        }
        self.lines.insert(key, new_quantity);
        Ok(new_quantity)
    }

    /// Set the quantity for a line.
    ///
    /// A quantity <= 0 removes the line. Returns whether the line existed.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove(key));
        }
        if quantity > MAX_QUANTITY_PER_LINE {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_LINE,
            ));
        }
        match self.lines.get_mut(key) {
            Some(q) => {
                *q = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a line. Returns whether it existed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        self.lines.remove(key).is_some()
    }

    /// Clear all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.values().sum()
    }

    /// Get the quantity for a line key.
    pub fn quantity_of(&self, key: &LineKey) -> Option<i64> {
        self.lines.get(key).copied()
    }

    /// Iterate lines in stable key order.
    pub fn lines(&self) -> impl Iterator<Item = CartLine> + '_ {
        self.lines.iter().map(|(key, quantity)| CartLine {
            key: key.clone(),
            quantity: *quantity,
        })
    }

    /// Distinct product ids referenced by the cart.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.lines.keys().map(|k| k.product_id.clone()).collect();
        ids.dedup();
        ids
    }
}

impl Serialize for Cart {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let lines: Vec<CartLine> = self.lines().collect();
        lines.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<CartLine>::deserialize(deserializer)?;
        let mut cart = Cart::new();
        for line in lines {
            if line.quantity <= 0 {
                continue;
            }
            let merged = cart
                .lines
                .get(&line.key)
                .copied()
                .unwrap_or(0)
                .saturating_add(line.quantity)
                .min(MAX_QUANTITY_PER_LINE);
            cart.lines.insert(line.key, merged);
        }
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(product: &str, size: Option<&str>, color: Option<&str>) -> LineKey {
        LineKey::new(ProductId::new(product), size, color)
    }

    #[test]
    fn test_add_merges_same_key() {
        let mut cart = Cart::new();
        cart.add(key("p1", Some("Queen"), Some("Ivory")), 1).unwrap();
        cart.add(key("p1", Some("Queen"), Some("Ivory")), 2).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_different_variant_is_new_line() {
        let mut cart = Cart::new();
        cart.add(key("p1", Some("Queen"), Some("Ivory")), 1).unwrap();
        cart.add(key("p1", Some("King"), Some("Ivory")), 1).unwrap();

        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_invalid_quantity() {
        let mut cart = Cart::new();
        assert!(cart.add(key("p1", None::<&str>, None::<&str>), 0).is_err());
        assert!(cart.add(key("p1", None::<&str>, None::<&str>), -1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        let result = cart.add(
            key("p1", None::<&str>, None::<&str>),
            MAX_QUANTITY_PER_LINE + 1,
        );
        assert!(matches!(
            result,
            Err(CommerceError::QuantityExceedsLimit(_, _))
        ));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        let k = key("p1", Some("Queen"), None::<&str>);
        cart.add(k.clone(), 2).unwrap();

        assert!(cart.set_quantity(&k, 0).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        let k = key("p1", None::<&str>, None::<&str>);
        assert!(!cart.set_quantity(&k, 3).unwrap());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(key("p1", None::<&str>, None::<&str>), 1).unwrap();
        cart.add(key("p2", None::<&str>, None::<&str>), 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_roundtrip_merges_duplicates() {
        // A hand-built session payload with a duplicated key collapses
        // into a single line on deserialization.
        let json = r#"[
            {"key":{"product_id":"p1","size":"Queen","color":null},"quantity":1},
            {"key":{"product_id":"p1","size":"Queen","color":null},"quantity":2}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }
}
