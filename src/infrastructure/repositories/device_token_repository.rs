//! Device Token Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{DeviceToken, DeviceTokenRepository, Platform};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct PgDeviceTokenRepository {
    pool: PgPool,
}

impl PgDeviceTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeviceTokenRow {
    id: i64,
    user_id: i64,
    token: String,
    platform: String,
    created_at: DateTime<Utc>,
}

impl DeviceTokenRow {
    fn into_device_token(self) -> Result<DeviceToken, AppError> {
        let platform = Platform::parse(&self.platform).ok_or_else(|| {
            AppError::Internal(format!("Unknown platform '{}' for token {}", self.platform, self.id))
        })?;
        Ok(DeviceToken {
            id: self.id,
            user_id: self.user_id,
            token: self.token,
            platform,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl DeviceTokenRepository for PgDeviceTokenRepository {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<DeviceToken>, AppError> {
        let row = sqlx::query_as::<_, DeviceTokenRow>(
            r#"
            SELECT id, user_id, token, platform, created_at
            FROM device_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeviceTokenRow::into_device_token).transpose()
    }

    /// A token string belongs to one device; re-registering it moves it to
    /// the new user.
    async fn upsert(&self, token: &DeviceToken) -> Result<DeviceToken, AppError> {
        let row = sqlx::query_as::<_, DeviceTokenRow>(
            r#"
            INSERT INTO device_tokens (id, user_id, token, platform, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (token) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                platform = EXCLUDED.platform,
                created_at = EXCLUDED.created_at
            RETURNING id, user_id, token, platform, created_at
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.platform.as_str())
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_device_token()
    }
}
