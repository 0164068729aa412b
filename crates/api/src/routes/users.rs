//! User directory routes (read-only).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use budgetaire_core::auth::{Capability, Role};
use budgetaire_db::{UserRepository, entities::users};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

use super::page_of;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Login e-mail.
    pub email: String,
    /// Display name.
    pub nom: String,
    /// Role label.
    pub role: &'static str,
    /// Account creation time.
    pub date_creation: DateTime<FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nom: user.nom,
            role: Role::from(user.role).as_str(),
            date_creation: user.created_at,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/utilisateurs/", get(list_users))
        .route("/utilisateurs/{id}/", get(get_user))
}

/// GET `/utilisateurs/` - List accounts.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<UserResponse>>> {
    auth.require(Capability::ManageUsers)?;
    let page = page.normalized();
    let rows = UserRepository::new((*state.db).clone())
        .list(page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, UserResponse::from)))
}

/// GET `/utilisateurs/{id}/` - Get one account.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    auth.require(Capability::ManageUsers)?;
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Utilisateur introuvable."))?;
    Ok(Json(user.into()))
}
