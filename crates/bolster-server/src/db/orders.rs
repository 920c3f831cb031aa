//! Order queries.

use super::{current_timestamp, Database};
use crate::error::AppError;
use bolster_commerce::checkout::{Address, Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus};
use bolster_commerce::ids::{OrderId, ProductId, UserId};
use bolster_commerce::money::{Currency, Money};

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    address_name: String,
    address_street: String,
    address_city: String,
    address_state: String,
    address_zip: String,
    address_phone: String,
    subtotal: i64,
    shipping: i64,
    total: i64,
    currency: String,
    payment_method: String,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    note: Option<String>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    name: String,
    unit_price: i64,
    quantity: i64,
    size: Option<String>,
    color: Option<String>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, AppError> {
        let currency = Currency::from_code(&self.currency)
            .ok_or_else(|| AppError::Internal(format!("unknown currency {}", self.currency)))?;
        let payment_method = PaymentMethod::from_str(&self.payment_method)
            .ok_or_else(|| AppError::Internal(format!("bad payment method {}", self.payment_method)))?;
        let status = OrderStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("bad order status {}", self.status)))?;
        let payment_status = PaymentStatus::from_str(&self.payment_status)
            .ok_or_else(|| AppError::Internal(format!("bad payment status {}", self.payment_status)))?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            lines: items
                .into_iter()
                .map(|i| OrderLine {
                    product_id: ProductId::new(i.product_id),
                    name: i.name,
                    unit_price: Money::new(i.unit_price, currency),
                    quantity: i.quantity,
                    size: i.size,
                    color: i.color,
                })
                .collect(),
            shipping_address: Address {
                id: None,
                name: self.address_name,
                street: self.address_street,
                city: self.address_city,
                state: self.address_state,
                zip: self.address_zip,
                phone: self.address_phone,
            },
            subtotal: Money::new(self.subtotal, currency),
            shipping: Money::new(self.shipping, currency),
            total: Money::new(self.total, currency),
            payment_method,
            status,
            payment_status,
            payment_id: self.payment_id,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Database {
    /// Persist an order and its line items.
    pub async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id,
                address_name, address_street, address_city, address_state, address_zip, address_phone,
                subtotal, shipping, total, currency,
                payment_method, status, payment_status, payment_id, note,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.user_id.as_str())
        .bind(&order.shipping_address.name)
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.state)
        .bind(&order.shipping_address.zip)
        .bind(&order.shipping_address.phone)
        .bind(order.subtotal.amount_minor)
        .bind(order.shipping.amount_minor)
        .bind(order.total.amount_minor)
        .bind(order.total.currency.code())
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.payment_id)
        .bind(&order.note)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, unit_price, quantity, size, color) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(order.id.as_str())
            .bind(line.product_id.as_str())
            .bind(&line.name)
            .bind(line.unit_price.amount_minor)
            .bind(line.quantity)
            .bind(&line.size)
            .bind(&line.color)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load an order with its line items.
    pub async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await?;

        let Some(row) = row else { return Ok(None) };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT product_id, name, unit_price, quantity, size, color FROM order_items WHERE order_id = ?",
        )
        .bind(id.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(Some(row.into_order(items)?))
    }

    /// A user's orders, newest first.
    pub async fn list_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        self.hydrate_orders(rows).await
    }

    /// Most recent orders across the store (admin dashboard).
    pub async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        self.hydrate_orders(rows).await
    }

    /// All orders, newest first (admin listing).
    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;
        self.hydrate_orders(rows).await
    }

    async fn hydrate_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, AppError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = sqlx::query_as::<_, OrderItemRow>(
                "SELECT product_id, name, unit_price, quantity, size, color FROM order_items WHERE order_id = ?",
            )
            .bind(&row.id)
            .fetch_all(self.pool())
            .await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    /// Record a verified payment: confirmed + paid + payment id.
    pub async fn record_payment(
        &self,
        id: &OrderId,
        payment_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE orders SET status = 'confirmed', payment_status = 'paid', payment_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(payment_id)
        .bind(current_timestamp())
        .bind(id.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Update order status (admin).
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(current_timestamp())
            .bind(id.as_str())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count orders.
    pub async fn count_orders(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool())
            .await?)
    }

    /// Non-cancelled orders placed within the last `days` days.
    pub async fn count_orders_since(&self, days: i64) -> Result<i64, AppError> {
        let cutoff = (chrono::Utc::now() - chrono::Duration::days(days)).timestamp();
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE created_at >= ? AND status != 'cancelled'",
        )
        .bind(cutoff)
        .fetch_one(self.pool())
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolster_auth::User;
    use bolster_commerce::cart::{Cart, CartTotals, LineKey, PricedProduct, ShippingPolicy};
    use std::collections::HashMap;

    async fn placed_order(db: &Database, unit_price: i64) -> Order {
        let user = User::new(format!("u{}@example.com", uuid::Uuid::new_v4()), "U");
        db.insert_user(&user, "h").await.unwrap();

        let mut cart = Cart::new();
        let pid = ProductId::new("p1");
        cart.add(LineKey::new(pid.clone(), Some("Queen"), Some("Ivory")), 2)
            .unwrap();

        let mut products = HashMap::new();
        products.insert(
            pid,
            PricedProduct {
                name: "Percale Sheet".to_string(),
                slug: "percale-sheet".to_string(),
                unit_price: Money::new(unit_price, Currency::INR),
                image: None,
            },
        );
        let totals = CartTotals::compute(&cart, &products, &ShippingPolicy::default()).unwrap();

        let order = Order::from_cart_totals(
            user.id.clone(),
            &totals,
            Address::new("U", "1 St", "Kochi", "KL", "682001", "94"),
            PaymentMethod::Online,
            None,
        );
        db.insert_order(&order).await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_order_roundtrip() {
        let db = Database::in_memory().await;
        let order = placed_order(&db, 150000).await;

        let found = db.find_order(&order.id).await.unwrap().unwrap();
        assert_eq!(found.lines.len(), 1);
        assert_eq!(found.lines[0].quantity, 2);
        assert_eq!(found.lines[0].unit_price.amount_minor, 150000);
        assert_eq!(found.total, order.total);
        assert_eq!(found.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_snapshot_survives_price_change() {
        let db = Database::in_memory().await;
        let order = placed_order(&db, 150000).await;

        // The stored line price is a snapshot; nothing about the product
        // feeds back into it.
        let found = db.find_order(&order.id).await.unwrap().unwrap();
        assert_eq!(found.lines[0].unit_price.amount_minor, 150000);
    }

    #[tokio::test]
    async fn test_record_payment() {
        let db = Database::in_memory().await;
        let order = placed_order(&db, 150000).await;

        db.record_payment(&order.id, "pay_9").await.unwrap();
        let found = db.find_order(&order.id).await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Confirmed);
        assert_eq!(found.payment_status, PaymentStatus::Paid);
        assert_eq!(found.payment_id.as_deref(), Some("pay_9"));
    }

    #[tokio::test]
    async fn test_counts_and_listing() {
        let db = Database::in_memory().await;
        placed_order(&db, 100).await;
        placed_order(&db, 200).await;

        assert_eq!(db.count_orders().await.unwrap(), 2);
        assert_eq!(db.recent_orders(5).await.unwrap().len(), 2);
        assert_eq!(db.list_orders().await.unwrap().len(), 2);
    }
}
