//! Order types.
//!
//! Order lines are price snapshots taken at placement time; they never
//! change when the referenced product's price changes later.

use crate::cart::CartTotals;
use crate::checkout::Address;
use crate::error::CommerceError;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting payment/processing.
    #[default]
    Pending,
    /// Order confirmed.
    Confirmed,
    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment not yet captured.
    #[default]
    Pending,
    /// Payment captured.
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Gateway-hosted online payment.
    Online,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cod => "cod",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "online" => Some(PaymentMethod::Online),
            "cod" => Some(PaymentMethod::Cod),
            _ => None,
        }
    }
}

/// A line item in an order. All fields are snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Product reference.
    pub product_id: ProductId,
    /// Product name at placement time.
    pub name: String,
    /// Unit price at placement time.
    pub unit_price: Money,
    /// Quantity ordered.
    pub quantity: i64,
    /// Selected size.
    pub size: Option<String>,
    /// Selected color.
    pub color: Option<String>,
}

impl OrderLine {
    /// Line total (unit price * quantity).
    pub fn line_total(&self) -> Result<Money, CommerceError> {
        self.unit_price
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Price-snapshot line items.
    pub lines: Vec<OrderLine>,
    /// Shipping address snapshot.
    pub shipping_address: Address,
    /// Sum of line totals at placement time.
    pub subtotal: Money,
    /// Shipping fee at placement time.
    pub shipping: Money,
    /// subtotal + shipping.
    pub total: Money,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Order status.
    pub status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Gateway payment id, once captured.
    pub payment_id: Option<String>,
    /// Optional customer note.
    pub note: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Order {
    /// Build a pending order by snapshotting priced cart lines.
    pub fn from_cart_totals(
        user_id: UserId,
        totals: &CartTotals,
        shipping_address: Address,
        payment_method: PaymentMethod,
        note: Option<String>,
    ) -> Self {
        let now = current_timestamp();
        let lines = totals
            .lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                unit_price: l.unit_price,
                quantity: l.quantity,
                size: l.size.clone(),
                color: l.color.clone(),
            })
            .collect();

        Self {
            id: OrderId::generate(),
            user_id,
            lines,
            shipping_address,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            total: totals.total,
            payment_method,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total item count.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Mark the order paid and confirmed with the gateway payment id.
    pub fn confirm_payment(&mut self, payment_id: impl Into<String>) {
        self.payment_id = Some(payment_id.into());
        self.status = OrderStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        self.updated_at = current_timestamp();
    }

    /// Confirm a cash-on-delivery order (no payment captured yet).
    pub fn confirm_cod(&mut self) {
        self.status = OrderStatus::Confirmed;
        self.updated_at = current_timestamp();
    }

    /// Cancel the order. Only pending orders can be cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.status != OrderStatus::Pending {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = current_timestamp();
        true
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Cart, CartTotals, LineKey, PricedProduct, ShippingPolicy};
    use crate::money::Currency;
    use std::collections::HashMap;

    fn totals_for(price_minor: i64, quantity: i64) -> CartTotals {
        let mut cart = Cart::new();
        let p1 = ProductId::new("p1");
        cart.add(
            LineKey::new(p1.clone(), Some("Queen"), None::<&str>),
            quantity,
        )
        .unwrap();

        let mut products = HashMap::new();
        products.insert(
            p1,
            PricedProduct {
                name: "Percale Sheet".to_string(),
                slug: "percale-sheet".to_string(),
                unit_price: Money::new(price_minor, Currency::INR),
                image: None,
            },
        );
        CartTotals::compute(&cart, &products, &ShippingPolicy::default()).unwrap()
    }

    fn address() -> Address {
        Address::new("A. Nair", "12 Marine Dr", "Kochi", "KL", "682001", "9400000000")
    }

    #[test]
    fn test_order_snapshot_is_immutable() {
        let totals = totals_for(150000, 2);
        let order = Order::from_cart_totals(
            UserId::new("u1"),
            &totals,
            address(),
            PaymentMethod::Online,
            None,
        );

        // Re-pricing the same cart at a new product price must not affect
        // the already-created order.
        let repriced = totals_for(120000, 2);
        assert_eq!(order.lines[0].unit_price.amount_minor, 150000);
        assert_ne!(
            repriced.lines[0].unit_price.amount_minor,
            order.lines[0].unit_price.amount_minor
        );
    }

    #[test]
    fn test_order_totals_carried_over() {
        let totals = totals_for(150000, 2);
        let order = Order::from_cart_totals(
            UserId::new("u1"),
            &totals,
            address(),
            PaymentMethod::Cod,
            Some("Leave at door".to_string()),
        );
        assert_eq!(order.subtotal, totals.subtotal);
        assert_eq!(order.total, totals.total);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_confirm_payment() {
        let totals = totals_for(150000, 1);
        let mut order = Order::from_cart_totals(
            UserId::new("u1"),
            &totals,
            address(),
            PaymentMethod::Online,
            None,
        );
        order.confirm_payment("pay_123");
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.payment_id.as_deref(), Some("pay_123"));
    }

    #[test]
    fn test_cancel_only_pending() {
        let totals = totals_for(150000, 1);
        let mut order = Order::from_cart_totals(
            UserId::new("u1"),
            &totals,
            address(),
            PaymentMethod::Online,
            None,
        );
        assert!(order.cancel());
        assert!(!order.cancel());
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(OrderStatus::from_str("confirmed"), Some(OrderStatus::Confirmed));
        assert_eq!(PaymentMethod::from_str("cod"), Some(PaymentMethod::Cod));
        assert_eq!(PaymentStatus::from_str("paid"), Some(PaymentStatus::Paid));
        assert_eq!(OrderStatus::from_str("shipped"), None);
    }
}
