/// User persistence
///
/// Stores credential records. Email uniqueness is enforced by the table
/// constraint, so concurrent registrations with the same email resolve to
/// exactly one success and one conflict.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;

/// Stored user record. Holds the password hash, so it is never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert a new user
    ///
    /// # Errors
    /// - `DatabaseError::UniqueConstraintViolation` if the email is taken
    /// - `DatabaseError::UnexpectedError` for any other storage failure
    pub async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user.id, "User record created");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::DatabaseSettings;
    use crate::database::{get_connection_pool, run_migrations};
    use crate::error::DatabaseError;

    async fn store() -> UserStore {
        let pool = get_connection_pool(&DatabaseSettings::in_memory())
            .await
            .expect("Failed to open in-memory database");
        run_migrations(&pool).await.expect("Failed to migrate");
        UserStore::new(pool)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$notarealhashbutstoredasis".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store().await;
        let created = store.create(new_user("a@b.com")).await.expect("Failed to create");

        let by_email = store
            .find_by_email("a@b.com")
            .await
            .unwrap()
            .expect("User not found by email");
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.name, "Test User");
        assert_eq!(by_email.password_hash, created.password_hash);

        let by_id = store
            .find_by_id(created.id)
            .await
            .unwrap()
            .expect("User not found by id");
        assert_eq!(by_id.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_unknown_user_is_none() {
        let store = store().await;

        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = store().await;
        store.create(new_user("a@b.com")).await.unwrap();

        match store.create(new_user("a@b.com")).await {
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => (),
            other => panic!("Expected unique violation, got {:?}", other),
        }
    }
}
