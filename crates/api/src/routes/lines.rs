//! Budget line routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_db::{
    BudgetLineRepository,
    entities::budget_lines,
    repositories::{CreateLineInput, UpdateLineInput},
};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiResult, middleware::AuthUser};

use super::page_of;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A budget line as returned by the API.
#[derive(Debug, Serialize)]
pub struct LineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Owning budget.
    pub budget: Uuid,
    /// Earmarked article.
    pub article: String,
    /// Remaining allocation.
    pub montant_alloue: Decimal,
}

impl From<budget_lines::Model> for LineResponse {
    fn from(line: budget_lines::Model) -> Self {
        Self {
            id: line.id,
            budget: line.budget_id,
            article: line.article,
            montant_alloue: line.montant_alloue,
        }
    }
}

/// Body of `POST /lignes/`.
#[derive(Debug, Deserialize)]
pub struct CreateLineRequest {
    /// Owning budget.
    pub budget: Uuid,
    /// Earmarked article.
    pub article: String,
    /// Allocation, strictly positive.
    pub montant_alloue: Decimal,
}

/// Body of `PUT /lignes/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    /// New article.
    pub article: Option<String>,
    /// New allocation; the budget absorbs the difference.
    pub montant_alloue: Option<Decimal>,
}

/// Query of `GET /lignes/`.
#[derive(Debug, Deserialize)]
pub struct LineQuery {
    /// Only this budget's lines.
    pub budget: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the budget line routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lignes/", get(list_lines).post(create_line))
        .route(
            "/lignes/{id}/",
            get(get_line).put(update_line).delete(delete_line),
        )
}

/// GET `/lignes/` - List budget lines.
async fn list_lines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<LineQuery>,
) -> ApiResult<Json<PageResponse<LineResponse>>> {
    let page = page.normalized();
    let rows = BudgetLineRepository::new((*state.db).clone())
        .list(query.budget, page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, LineResponse::from)))
}

/// GET `/lignes/{id}/` - Get a budget line.
async fn get_line(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LineResponse>> {
    let line = BudgetLineRepository::new((*state.db).clone())
        .get(id)
        .await?;
    Ok(Json(line.into()))
}

/// POST `/lignes/` - Allocate a line out of the budget's available balance.
async fn create_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateLineRequest>,
) -> ApiResult<(StatusCode, Json<LineResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let line = BudgetLineRepository::new((*state.db).clone())
        .create(
            CreateLineInput {
                budget_id: payload.budget,
                article: payload.article,
                montant_alloue: payload.montant_alloue,
            },
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(line.into())))
}

/// PUT `/lignes/{id}/` - Rename or reallocate a line.
async fn update_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLineRequest>,
) -> ApiResult<Json<LineResponse>> {
    auth.require(Capability::ManageFinance)?;
    let line = BudgetLineRepository::new((*state.db).clone())
        .update(
            id,
            UpdateLineInput {
                article: payload.article,
                montant_alloue: payload.montant_alloue,
            },
            auth.actor(),
        )
        .await?;
    Ok(Json(line.into()))
}

/// DELETE `/lignes/{id}/` - Release an unused line.
async fn delete_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    BudgetLineRepository::new((*state.db).clone())
        .delete(id, auth.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
