//! Notification routes. Users only ever see their own notifications.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use budgetaire_db::{NotificationRepository, entities::notifications};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiResult, middleware::AuthUser};

use super::page_of;

/// A notification as returned by the API.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: Uuid,
    /// Text.
    pub message: String,
    /// Read flag.
    pub lu: bool,
    /// Creation time.
    pub date_creation: DateTime<FixedOffset>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(n: notifications::Model) -> Self {
        Self {
            id: n.id,
            message: n.message,
            lu: n.is_read,
            date_creation: n.created_at,
        }
    }
}

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/", get(list_notifications))
        .route("/notifications/non-lues/", get(unread_count))
        .route("/notifications/toutes-lues/", post(mark_all_read))
        .route("/notifications/{id}/lue/", post(mark_read))
}

/// GET `/notifications/` - The caller's notifications, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    let page = page.normalized();
    let rows = NotificationRepository::new((*state.db).clone())
        .list_for_user(auth.user_id(), page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, NotificationResponse::from)))
}

/// GET `/notifications/non-lues/` - Number of unread notifications.
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let count = NotificationRepository::new((*state.db).clone())
        .unread_count(auth.user_id())
        .await?;
    Ok(Json(json!({ "non_lues": count })))
}

/// POST `/notifications/{id}/lue/` - Mark one notification as read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NotificationResponse>> {
    let notification = NotificationRepository::new((*state.db).clone())
        .mark_read(auth.user_id(), id)
        .await?;
    Ok(Json(notification.into()))
}

/// POST `/notifications/toutes-lues/` - Mark every notification as read.
async fn mark_all_read(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Value>> {
    let updated = NotificationRepository::new((*state.db).clone())
        .mark_all_read(auth.user_id())
        .await?;
    Ok(Json(json!({ "marquees": updated })))
}
