//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use validator::Validate;

use super::deserialize_id;
use crate::domain::MediaItem;

/// Direct message request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendDirectMessageRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub recipient_id: i64,

    #[serde(default)]
    pub content: String,

    #[validate(length(max = 10, message = "At most 10 media items per message"))]
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// Group message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendGroupMessageRequest {
    #[serde(default)]
    pub content: String,

    #[validate(length(max = 10, message = "At most 10 media items per message"))]
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// Device token registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 4096, message = "Token must be 1-4096 characters"))]
    pub token: String,

    #[validate(length(min = 1, message = "Platform is required"))]
    pub platform: String,
}

/// Message history query parameters
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQueryParams {
    pub before: Option<String>,
    pub limit: Option<i64>,
}
