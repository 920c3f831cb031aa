//! Product queries.

use super::{current_timestamp, Database};
use crate::error::AppError;
use bolster_commerce::catalog::{Product, ProductAttributes, Review, Stock};
use bolster_commerce::cart::PricedProduct;
use bolster_commerce::ids::{CategoryId, ProductId, UserId};
use bolster_commerce::money::{Currency, Money};
use bolster_commerce::search::CatalogQuery;
use std::collections::HashMap;

/// Database row for the products table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub price: i64,
    pub discounted_price: i64,
    pub currency: String,
    pub category_id: String,
    pub sizes: String,
    pub colors: String,
    pub material: Option<String>,
    pub thread_count: Option<i64>,
    pub dimensions: Option<String>,
    pub images: String,
    pub tags: String,
    pub in_stock: i64,
    pub stock_quantity: i64,
    pub rating: f64,
    pub featured: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductRow {
    /// Convert to the domain type. Reviews are loaded separately.
    pub fn into_product(self) -> Result<Product, AppError> {
        let currency = Currency::from_code(&self.currency)
            .ok_or_else(|| AppError::Internal(format!("unknown currency {}", self.currency)))?;
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            short_description: self.short_description,
            price: Money::new(self.price, currency),
            discounted_price: Money::new(self.discounted_price, currency),
            category_id: CategoryId::new(self.category_id),
            attributes: ProductAttributes {
                sizes: parse_json_list(&self.sizes)?,
                colors: parse_json_list(&self.colors)?,
                material: self.material,
                thread_count: self.thread_count,
                dimensions: self.dimensions,
            },
            images: parse_json_list(&self.images)?,
            stock: Stock {
                in_stock: self.in_stock != 0,
                quantity: self.stock_quantity,
            },
            rating: self.rating,
            reviews: Vec::new(),
            tags: parse_json_list(&self.tags)?,
            featured: self.featured != 0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_json_list(raw: &str) -> Result<Vec<String>, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::Internal(format!("bad json column: {e}")))
}

fn to_json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

impl Database {
    /// Insert a product.
    pub async fn insert_product(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, slug, description, short_description,
                price, discounted_price, currency, category_id,
                sizes, colors, material, thread_count, dimensions,
                images, tags, in_stock, stock_quantity, rating, featured,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price.amount_minor)
        .bind(product.discounted_price.amount_minor)
        .bind(product.price.currency.code())
        .bind(product.category_id.as_str())
        .bind(to_json_list(&product.attributes.sizes))
        .bind(to_json_list(&product.attributes.colors))
        .bind(&product.attributes.material)
        .bind(product.attributes.thread_count)
        .bind(&product.attributes.dimensions)
        .bind(to_json_list(&product.images))
        .bind(to_json_list(&product.tags))
        .bind(product.stock.in_stock as i64)
        .bind(product.stock.quantity)
        .bind(product.rating)
        .bind(product.featured as i64)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Update an existing product in place.
    pub async fn update_product(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products SET
                name = ?, slug = ?, description = ?, short_description = ?,
                price = ?, discounted_price = ?, category_id = ?,
                sizes = ?, colors = ?, material = ?, thread_count = ?, dimensions = ?,
                images = ?, tags = ?, in_stock = ?, stock_quantity = ?,
                rating = ?, featured = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price.amount_minor)
        .bind(product.discounted_price.amount_minor)
        .bind(product.category_id.as_str())
        .bind(to_json_list(&product.attributes.sizes))
        .bind(to_json_list(&product.attributes.colors))
        .bind(&product.attributes.material)
        .bind(product.attributes.thread_count)
        .bind(&product.attributes.dimensions)
        .bind(to_json_list(&product.images))
        .bind(to_json_list(&product.tags))
        .bind(product.stock.in_stock as i64)
        .bind(product.stock.quantity)
        .bind(product.rating)
        .bind(product.featured as i64)
        .bind(current_timestamp())
        .bind(product.id.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Find a product by slug.
    pub async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        row.map(ProductRow::into_product).transpose()
    }

    /// Find a product by id.
    pub async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await?;
        row.map(ProductRow::into_product).transpose()
    }

    /// Run a catalog query, returning the page of products and the total
    /// match count.
    pub async fn search_products(
        &self,
        query: &CatalogQuery,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let (sql, binds) = query.build_sql();
        let mut q = sqlx::query_as::<_, ProductRow>(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }
        let rows = q.fetch_all(self.pool()).await?;

        let (count_sql, count_binds) = query.build_count_sql();
        let mut cq = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &count_binds {
            cq = cq.bind(bind);
        }
        let total = cq.fetch_one(self.pool()).await?;

        let products = rows
            .into_iter()
            .map(ProductRow::into_product)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((products, total))
    }

    /// Resolve the pricing slice for a set of products, keyed by id.
    pub async fn priced_products(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, PricedProduct>, AppError> {
        let mut map = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = self.find_product(id).await? {
                map.insert(
                    product.id.clone(),
                    PricedProduct {
                        name: product.name.clone(),
                        slug: product.slug.clone(),
                        unit_price: product.discounted_price,
                        image: product.images.first().cloned(),
                    },
                );
            }
        }
        Ok(map)
    }

    /// Featured products for the home page / API.
    pub async fn featured_products(&self, limit: i64) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE featured = 1 ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Related products: same category, excluding the product itself.
    pub async fn related_products(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE category_id = ? AND id != ? LIMIT ?",
        )
        .bind(product.category_id.as_str())
        .bind(product.id.as_str())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Search suggestions: name matches rank above description/tag matches.
    pub async fn product_suggestions(&self, term: &str, limit: i64) -> Result<Vec<Product>, AppError> {
        let like = format!("%{}%", term);
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1 OR description LIKE ?1 OR tags LIKE ?1
            ORDER BY CASE WHEN name LIKE ?1 THEN 0 ELSE 1 END, created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(&like)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// All products with their category names (admin listing).
    pub async fn list_products(&self) -> Result<Vec<(Product, String)>, AppError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let category: Option<String> =
                sqlx::query_scalar("SELECT name FROM categories WHERE id = ?")
                    .bind(&row.category_id)
                    .fetch_optional(self.pool())
                    .await?;
            out.push((row.into_product()?, category.unwrap_or_default()));
        }
        Ok(out)
    }

    /// Count products.
    pub async fn count_products(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool())
            .await?)
    }

    /// Append a review and refresh the stored average rating.
    pub async fn add_review(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
        rating: u8,
        comment: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO reviews (product_id, user_id, rating, comment, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(product_id.as_str())
        .bind(user_id.as_str())
        .bind(rating as i64)
        .bind(comment)
        .bind(current_timestamp())
        .execute(self.pool())
        .await?;

        sqlx::query(
            "UPDATE products SET rating = (SELECT AVG(rating) FROM reviews WHERE product_id = ?) WHERE id = ?",
        )
        .bind(product_id.as_str())
        .bind(product_id.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Reviews for a product, newest first.
    pub async fn reviews_for(&self, product_id: &ProductId) -> Result<Vec<Review>, AppError> {
        #[derive(sqlx::FromRow)]
        struct ReviewRow {
            user_id: String,
            rating: i64,
            comment: String,
            created_at: i64,
        }

        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT user_id, rating, comment, created_at FROM reviews WHERE product_id = ? ORDER BY created_at DESC",
        )
        .bind(product_id.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Review {
                user_id: UserId::new(r.user_id),
                rating: r.rating as u8,
                comment: r.comment,
                created_at: r.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolster_commerce::search::{Filter, SortOption};

    async fn seeded_db() -> Database {
        let db = Database::in_memory().await;
        let cat = bolster_commerce::catalog::Category::new("Sheets");
        db.insert_category(&cat).await.unwrap();

        for (name, price, discounted, colors) in [
            ("Percale Sheet", 250000_i64, 199900_i64, vec!["Ivory"]),
            ("Sateen Sheet", 300000, 300000, vec!["Sage"]),
            ("Linen Sheet", 400000, 350000, vec!["Ivory", "Slate"]),
        ] {
            let mut p = Product::new(
                name,
                "desc",
                Money::new(price, Currency::INR),
                Money::new(discounted, Currency::INR),
                cat.id.clone(),
            )
            .unwrap();
            p.attributes.colors = colors.into_iter().map(String::from).collect();
            p.stock = Stock::new(10);
            db.insert_product(&p).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_insert_and_find_by_slug() {
        let db = seeded_db().await;
        let p = db.find_product_by_slug("percale-sheet").await.unwrap().unwrap();
        assert_eq!(p.name, "Percale Sheet");
        assert_eq!(p.discounted_price.amount_minor, 199900);
        assert_eq!(p.attributes.colors, vec!["Ivory"]);
    }

    #[tokio::test]
    async fn test_search_with_anded_filters() {
        let db = seeded_db().await;
        let query = CatalogQuery::new()
            .with_filter(Filter::Colors(vec!["Ivory".to_string()]))
            .with_filter(Filter::price_range(
                Some(Money::new(300000, Currency::INR)),
                None,
            ));

        let (products, total) = db.search_products(&query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(products[0].name, "Linen Sheet");
    }

    #[tokio::test]
    async fn test_sort_by_price() {
        let db = seeded_db().await;
        let query = CatalogQuery::new().with_sort(SortOption::PriceLow);
        let (products, _) = db.search_products(&query).await.unwrap();
        assert_eq!(products[0].name, "Percale Sheet");
        assert_eq!(products.last().unwrap().name, "Linen Sheet");
    }

    #[tokio::test]
    async fn test_review_updates_average() {
        let db = seeded_db().await;
        let p = db.find_product_by_slug("percale-sheet").await.unwrap().unwrap();

        db.add_review(&p.id, &UserId::new("u1"), 4, "good").await.unwrap();
        db.add_review(&p.id, &UserId::new("u2"), 5, "great").await.unwrap();

        let p = db.find_product(&p.id).await.unwrap().unwrap();
        assert!((p.rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(db.reviews_for(&p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_priced_products_skips_missing() {
        let db = seeded_db().await;
        let p = db.find_product_by_slug("sateen-sheet").await.unwrap().unwrap();
        let ghost = ProductId::new("missing");

        let priced = db.priced_products(&[p.id.clone(), ghost.clone()]).await.unwrap();
        assert!(priced.contains_key(&p.id));
        assert!(!priced.contains_key(&ghost));
    }
}
