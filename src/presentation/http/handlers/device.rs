//! Device Token Handlers

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::application::dto::{DeviceTokenResponse, RegisterDeviceRequest};
use crate::domain::{DeviceToken, DeviceTokenRepository, Identity, Platform};
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Register (or move) a push token for the caller's device
pub async fn register_device(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceTokenResponse>, AppError> {
    request.validate().map_err(validation_error)?;
    let platform = Platform::parse(&request.platform).ok_or_else(|| {
        AppError::BadRequest(format!("Unsupported platform '{}'", request.platform))
    })?;

    let token = DeviceToken {
        id: state.snowflake.generate(),
        user_id: identity.user_id,
        token: request.token,
        platform,
        created_at: Utc::now(),
    };
    let stored = state.device_tokens.upsert(&token).await?;

    tracing::info!(user_id = identity.user_id, platform = %platform, "Device token registered");
    Ok(Json(stored.into()))
}
