//! Wishlist queries.

use super::Database;
use crate::error::AppError;
use bolster_commerce::catalog::Product;
use bolster_commerce::ids::{ProductId, UserId};

use super::products::ProductRow;

impl Database {
    /// Toggle a product in the user's wishlist. Returns true if it is now
    /// present.
    pub async fn toggle_wishlist(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM wishlist WHERE user_id = ? AND product_id = ?")
            .bind(user_id.as_str())
            .bind(product_id.as_str())
            .execute(self.pool())
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO wishlist (user_id, product_id) VALUES (?, ?)")
            .bind(user_id.as_str())
            .bind(product_id.as_str())
            .execute(self.pool())
            .await?;
        Ok(true)
    }

    /// Products in the user's wishlist.
    pub async fn wishlist_products(&self, user_id: &UserId) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT p.* FROM products p JOIN wishlist w ON w.product_id = p.id WHERE w.user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolster_commerce::catalog::Category;
    use bolster_commerce::money::{Currency, Money};

    #[tokio::test]
    async fn test_wishlist_toggle() {
        let db = Database::in_memory().await;
        let cat = Category::new("Sheets");
        db.insert_category(&cat).await.unwrap();
        let product = Product::new(
            "Percale Sheet",
            "desc",
            Money::new(1000, Currency::INR),
            Money::new(1000, Currency::INR),
            cat.id,
        )
        .unwrap();
        db.insert_product(&product).await.unwrap();

        let user = UserId::new("u1");
        assert!(db.toggle_wishlist(&user, &product.id).await.unwrap());
        assert_eq!(db.wishlist_products(&user).await.unwrap().len(), 1);

        assert!(!db.toggle_wishlist(&user, &product.id).await.unwrap());
        assert!(db.wishlist_products(&user).await.unwrap().is_empty());
    }
}
