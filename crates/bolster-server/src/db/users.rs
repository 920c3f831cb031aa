//! User, address, and password-reset queries.

use super::{current_timestamp, Database};
use crate::error::AppError;
use bolster_auth::{Role, User};
use bolster_commerce::checkout::Address;
use bolster_commerce::ids::{AddressId, UserId};
use std::str::FromStr;

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> (User, String) {
        let user = User {
            id: UserId::new(self.id),
            email: self.email,
            name: self.name,
            role: Role::from_str(&self.role).unwrap_or(Role::Customer),
            created_at: self.created_at,
        };
        (user, self.password_hash)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AddressRow {
    id: String,
    name: String,
    street: String,
    city: String,
    state: String,
    zip: String,
    phone: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: Some(AddressId::new(row.id)),
            name: row.name,
            street: row.street,
            city: row.city,
            state: row.state,
            zip: row.zip,
            phone: row.phone,
        }
    }
}

impl Database {
    /// Insert a user with their password hash.
    pub async fn insert_user(&self, user: &User, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Find a user by email, returning the stored password hash too.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(UserRow::into_user))
    }

    /// Find a user by id.
    pub async fn find_user(&self, id: &UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| r.into_user().0))
    }

    /// Replace a user's password hash.
    pub async fn set_password_hash(&self, id: &UserId, hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(id.as_str())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Count users.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?)
    }

    /// Add an address to a user's address book.
    pub async fn add_address(&self, user_id: &UserId, address: &Address) -> Result<AddressId, AppError> {
        let id = address.id.clone().unwrap_or_else(AddressId::generate);
        sqlx::query(
            "INSERT INTO addresses (id, user_id, name, street, city, state, zip, phone) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(user_id.as_str())
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip)
        .bind(&address.phone)
        .execute(self.pool())
        .await?;
        Ok(id)
    }

    /// Update an address, scoped to its owner.
    pub async fn update_address(
        &self,
        user_id: &UserId,
        id: &AddressId,
        address: &Address,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE addresses SET name = ?, street = ?, city = ?, state = ?, zip = ?, phone = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&address.name)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip)
        .bind(&address.phone)
        .bind(id.as_str())
        .bind(user_id.as_str())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All addresses for a user.
    pub async fn list_addresses(&self, user_id: &UserId) -> Result<Vec<Address>, AppError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT id, name, street, city, state, zip, phone FROM addresses WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// One address, scoped to its owner.
    pub async fn find_address(
        &self,
        user_id: &UserId,
        id: &AddressId,
    ) -> Result<Option<Address>, AppError> {
        let row = sqlx::query_as::<_, AddressRow>(
            "SELECT id, name, street, city, state, zip, phone FROM addresses WHERE id = ? AND user_id = ?",
        )
        .bind(id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Address::from))
    }

    /// Create a password-reset token valid for one hour.
    pub async fn create_password_reset(
        &self,
        user_id: &UserId,
        token: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO password_resets (token, user_id, expires_at, used) VALUES (?, ?, ?, 0)",
        )
        .bind(token)
        .bind(user_id.as_str())
        .bind(current_timestamp() + 3600)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Consume a reset token, returning its user if valid and unused.
    pub async fn consume_password_reset(&self, token: &str) -> Result<Option<UserId>, AppError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT user_id FROM password_resets WHERE token = ? AND used = 0 AND expires_at > ?",
        )
        .bind(token)
        .bind(current_timestamp())
        .fetch_optional(self.pool())
        .await?;

        if row.is_some() {
            sqlx::query("UPDATE password_resets SET used = 1 WHERE token = ?")
                .bind(token)
                .execute(self.pool())
                .await?;
        }
        Ok(row.map(|(id,)| UserId::new(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_roundtrip() {
        let db = Database::in_memory().await;
        let user = User::new("a@example.com", "A");
        db.insert_user(&user, "hash").await.unwrap();

        let (found, hash) = db.find_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::in_memory().await;
        db.insert_user(&User::new("a@example.com", "A"), "h").await.unwrap();
        assert!(db
            .insert_user(&User::new("a@example.com", "B"), "h")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_address_ownership() {
        let db = Database::in_memory().await;
        let alice = User::new("alice@example.com", "Alice");
        let bob = User::new("bob@example.com", "Bob");
        db.insert_user(&alice, "h").await.unwrap();
        db.insert_user(&bob, "h").await.unwrap();

        let addr = Address::new("Alice", "1 St", "Kochi", "KL", "682001", "94");
        let id = db.add_address(&alice.id, &addr).await.unwrap();

        assert!(db.find_address(&alice.id, &id).await.unwrap().is_some());
        assert!(db.find_address(&bob.id, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_single_use() {
        let db = Database::in_memory().await;
        let user = User::new("a@example.com", "A");
        db.insert_user(&user, "h").await.unwrap();

        db.create_password_reset(&user.id, "tok123").await.unwrap();
        assert_eq!(
            db.consume_password_reset("tok123").await.unwrap(),
            Some(user.id.clone())
        );
        // Second consumption fails.
        assert_eq!(db.consume_password_reset("tok123").await.unwrap(), None);
        assert_eq!(db.consume_password_reset("unknown").await.unwrap(), None);
    }
}
