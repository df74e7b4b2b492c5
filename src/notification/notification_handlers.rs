use crate::{
    error::Result,
    state::AppState,
    widget::{NotificationList, NotificationProvider},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::notification_dto::{
    CreateNotificationRequest, NotificationResponse, UnreadCountResponse,
    UpdateNotificationRequest,
};

/// List the live notifications of a user, newest first
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/notifications",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "List of notifications", body = Vec<NotificationResponse>)
    ),
    tag = "notifications"
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<NotificationResponse>>> {
    let notifications = state.notification_manager.get_notifications(user_id).await?;

    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// Create a notification
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/notifications",
    params(("user_id" = i64, Path, description = "Owner ID")),
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = NotificationResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResponse>)> {
    payload.validate()?;

    let notification = state
        .notification_manager
        .create(&payload.notification_type, payload.data, user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(notification.into())))
}

/// Get one notification
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/notifications/{id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn get_notification(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Result<Json<NotificationResponse>> {
    let notification = state.notification_manager.find_notification(id, user_id).await?;

    Ok(Json(notification.into()))
}

/// Replace type and data of a notification
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/notifications/{id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("id" = i64, Path, description = "Notification ID")
    ),
    request_body = UpdateNotificationRequest,
    responses(
        (status = 200, description = "Notification updated", body = NotificationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn update_notification(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateNotificationRequest>,
) -> Result<Json<NotificationResponse>> {
    payload.validate()?;

    let notification = state
        .notification_manager
        .update(id, &payload.notification_type, payload.data, user_id)
        .await?;

    Ok(Json(notification.into()))
}

/// Mark notification as read
#[utoipa::path(
    patch,
    path = "/api/users/{user_id}/notifications/{id}/read",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses((status = 204, description = "Notification marked as read")),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    state.notification_manager.mark_as_read(id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete a notification
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/notifications/{id}",
    params(
        ("user_id" = i64, Path, description = "Owner ID"),
        ("id" = i64, Path, description = "Notification ID")
    ),
    responses((status = 204, description = "Notification deleted")),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    state.notification_manager.mark_as_deleted(id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete every notification of a user
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/notifications",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses((status = 204, description = "Notifications cleared")),
    tag = "notifications"
)]
pub async fn clear_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    state.notification_manager.clear_all(user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Mark every unread notification of a user as read
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/notifications/read-all",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses((status = 204, description = "Notifications marked as read")),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    state.notification_manager.mark_all_read(user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/notifications/unread-count",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses((status = 200, description = "Unread count", body = UnreadCountResponse)),
    tag = "notifications"
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UnreadCountResponse>> {
    let unread = state.notification_manager.count_unread(user_id).await?;

    Ok(Json(UnreadCountResponse { unread }))
}

/// Render the notifications of a user as text
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/notifications/render",
    params(("user_id" = i64, Path, description = "Owner ID")),
    responses(
        (
            status = 200,
            description = "Rendered notification list",
            body = String,
            content_type = "text/plain"
        )
    ),
    tag = "notifications"
)]
pub async fn render_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<String> {
    let provider = Arc::new(state.notification_manager.clone());
    let widget = NotificationList::builder(provider, user_id)
        .settings(state.config.render.clone())
        .build();

    widget.run().await
}
