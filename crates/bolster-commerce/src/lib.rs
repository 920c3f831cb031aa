//! Storefront domain types and logic for Bolster.
//!
//! This crate provides the commerce core of the storefront:
//!
//! - **Catalog**: Products, categories, reviews, stock
//! - **Cart**: Keyed session cart with totals and shipping policy
//! - **Checkout**: Orders with price snapshots, addresses
//! - **Search**: Catalog filters, sort modes, pagination
//! - **Import**: CSV row to product mapping for bulk uploads
//!
//! # Example
//!
//! ```rust,ignore
//! use bolster_commerce::prelude::*;
//!
//! let mut cart = Cart::new();
//! cart.add(LineKey::new(product.id.clone(), Some("Queen"), Some("Ivory")), 2)?;
//!
//! let totals = CartTotals::compute(&cart, &priced, &ShippingPolicy::default())?;
//! println!("Total: {}", totals.total.display());
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod import;
pub mod money;
pub mod search;
pub mod slug;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{Category, Product, ProductAttributes, Review, Stock};

    // Cart
    pub use crate::cart::{Cart, CartLine, CartTotals, LineKey, PricedLine, ShippingPolicy};

    // Checkout
    pub use crate::checkout::{
        Address, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
    };

    // Search
    pub use crate::search::{CatalogQuery, Filter, Pagination, SortOption};

    // Import
    pub use crate::import::{CsvProductRow, ImportOutcome};

    pub use crate::slug::slugify;
}
