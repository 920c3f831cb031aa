//! Category types for product organization.

use crate::ids::CategoryId;
use crate::slug::slugify;
use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
}

impl Category {
    /// Create a new category with a slug derived from its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: CategoryId::generate(),
            slug: slugify(&name),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_slug() {
        let cat = Category::new("Duvet Covers");
        assert_eq!(cat.slug, "duvet-covers");
        assert_eq!(cat.name, "Duvet Covers");
    }
}
