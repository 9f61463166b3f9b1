//! # User Repository
//!
//! Seller/reporter resolution. User management (creation, passwords, token
//! issuance) belongs to the external identity collaborator; the engine only
//! needs to check that a referenced user exists.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use fixcel_core::{Role, User};

/// Repository for user lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a user (used by seeding and tests).
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query("INSERT INTO users (id, name, role, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(user.role)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Builds a user with a fresh id and timestamp.
pub fn new_user(name: impl Into<String>, role: Role) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        name: name.into(),
        role,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_resolve() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = new_user("Ana", Role::Seller);
        repo.insert(&user).await.unwrap();

        let fetched = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Ana");
        assert_eq!(fetched.role, Role::Seller);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }
}
