//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait. Only the presence
//! columns are written here.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{PresenceUpdate, UserRepository};
use crate::shared::error::AppError;

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn update_presence(&self, user_id: i64, update: PresenceUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = $2,
                last_active = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.is_active)
        .bind(update.last_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        Ok(())
    }
}
