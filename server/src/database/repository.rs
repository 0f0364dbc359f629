//! Repository layer for database operations
//!
//! `UserStore` is the record store seen by the services layer;
//! `Repository` implements it over SQLite.

use super::models::*;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Persistent table of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID
    async fn find(&self, id: i64) -> Result<Option<User>>;

    /// All users, oldest first
    async fn all(&self) -> Result<Vec<User>>;

    /// Insert a user. `None` means the store accepted the call but produced no record.
    async fn create(&self, new_user: NewUser) -> Result<Option<User>>;

    /// Persist every mutable field of an existing user
    async fn save(&self, user: &User) -> Result<User>;

    /// Remove a user
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn find(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<Option<User>> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, image, consent, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.image)
        .bind(new_user.consent)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = &user {
            tracing::debug!("Created user: {}", user.id);
        }
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let saved = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = ?, email = ?, image = ?, consent = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(user.consent)
        .bind(now)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

        tracing::debug!("Saved user: {}", saved.id);
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::UserNotFound);
        }

        tracing::debug!("Deleted user: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            image: Some(format!("{}.png", name.to_lowercase())),
            consent: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = create_test_repo().await;

        let created = repo.create(new_user("Ada")).await.unwrap().unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "Ada");
        assert_eq!(created.image.as_deref(), Some("ada.png"));
        assert!(created.consent);

        let found = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);

        assert!(repo.find(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_is_ordered_by_id() {
        let repo = create_test_repo().await;
        assert!(repo.all().await.unwrap().is_empty());

        repo.create(new_user("First")).await.unwrap();
        repo.create(new_user("Second")).await.unwrap();

        let users = repo.all().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "First");
        assert_eq!(users[1].name, "Second");
    }

    #[tokio::test]
    async fn test_save_rewrites_fields() {
        let repo = create_test_repo().await;
        let mut user = repo.create(new_user("Grace")).await.unwrap().unwrap();

        user.name = "Grace Hopper".to_string();
        user.image = Some("replaced.gif".to_string());
        user.consent = false;
        let saved = repo.save(&user).await.unwrap();

        assert_eq!(saved.name, "Grace Hopper");
        assert_eq!(saved.image.as_deref(), Some("replaced.gif"));
        assert!(!saved.consent);
        assert_eq!(saved.created_at, user.created_at);
        assert!(saved.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn test_save_missing_user() {
        let repo = create_test_repo().await;
        let mut user = repo.create(new_user("Temp")).await.unwrap().unwrap();
        repo.delete(user.id).await.unwrap();

        user.name = "Ghost".to_string();
        assert!(matches!(repo.save(&user).await, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = create_test_repo().await;
        let user = repo.create(new_user("Linus")).await.unwrap().unwrap();

        repo.delete(user.id).await.unwrap();
        assert!(repo.find(user.id).await.unwrap().is_none());

        assert!(matches!(repo.delete(user.id).await, Err(AppError::UserNotFound)));
    }
}
