//! Message Handlers
//!
//! REST entry points into the message router. Delivery is identical to the
//! websocket path: scoped to the recipient or the group's subscribers.
//! Stored direct messages are read back page by page.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::{
    DirectSendResponse, GroupSendResponse, HistoryQueryParams, MessageResponse,
    SendDirectMessageRequest, SendGroupMessageRequest,
};
use crate::application::services::HistoryPage;
use crate::domain::Identity;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Send a direct message
pub async fn send_direct_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SendDirectMessageRequest>,
) -> Result<(StatusCode, Json<DirectSendResponse>), AppError> {
    request.validate().map_err(validation_error)?;

    let delivery = state
        .router
        .route_direct(&identity, request.recipient_id, request.content, request.media)
        .await?;

    Ok((StatusCode::CREATED, Json(delivery.into())))
}

/// Send a message to a group the caller belongs to
pub async fn send_group_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(group_id): Path<String>,
    Json(request): Json<SendGroupMessageRequest>,
) -> Result<(StatusCode, Json<GroupSendResponse>), AppError> {
    let group_id: i64 = group_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid group ID".into()))?;
    request.validate().map_err(validation_error)?;

    state.groups.ensure_member(&identity, group_id).await?;
    let delivery = state
        .router
        .route_group(&identity, group_id, request.content, request.media)
        .await?;

    Ok((StatusCode::CREATED, Json(delivery.into())))
}

/// List direct messages addressed to the caller, newest first
pub async fn list_inbox(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HistoryQueryParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = state.history.inbox(&identity, history_page(query)?).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Get the conversation between the caller and another user, oldest first
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQueryParams>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let user_id: i64 = user_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))?;

    let messages = state
        .history
        .conversation(&identity, user_id, history_page(query)?)
        .await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

fn history_page(query: HistoryQueryParams) -> Result<HistoryPage, AppError> {
    let before = query
        .before
        .map(|s| s.parse::<i64>())
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid before cursor".into()))?;

    Ok(HistoryPage {
        before,
        limit: query.limit,
    })
}
