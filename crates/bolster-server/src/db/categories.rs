//! Category queries.

use super::Database;
use crate::error::AppError;
use bolster_commerce::catalog::Category;
use bolster_commerce::ids::CategoryId;
use std::collections::HashMap;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

impl Database {
    /// Insert a category.
    pub async fn insert_category(&self, category: &Category) -> Result<(), AppError> {
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES (?, ?, ?)")
            .bind(category.id.as_str())
            .bind(&category.name)
            .bind(&category.slug)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// All categories, by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Find a category by slug.
    pub async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Category::from))
    }

    /// Category name -> id map, for CSV import resolution.
    pub async fn category_name_map(&self) -> Result<HashMap<String, CategoryId>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories")
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.name, CategoryId::new(r.id)))
            .collect())
    }
}
