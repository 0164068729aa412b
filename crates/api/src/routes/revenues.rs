//! Recette routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_db::{
    BudgetRepository,
    entities::revenues,
    repositories::{CreateRevenueInput, UpdateRevenueInput},
};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiResult, middleware::AuthUser};

use super::page_of;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A recette as returned by the API.
#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    /// Recette ID.
    pub id: Uuid,
    /// Budget credited.
    pub budget: Uuid,
    /// Origin of the funds.
    pub source: String,
    /// Kind of recette.
    #[serde(rename = "type")]
    pub type_recette: String,
    /// Amount.
    pub montant: Decimal,
    /// Date received.
    pub date_recette: NaiveDate,
    /// Recording time.
    pub date_creation: DateTime<FixedOffset>,
}

impl From<revenues::Model> for RevenueResponse {
    fn from(r: revenues::Model) -> Self {
        Self {
            id: r.id,
            budget: r.budget_id,
            source: r.source,
            type_recette: r.revenue_type,
            montant: r.montant,
            date_recette: r.received_on,
            date_creation: r.created_at,
        }
    }
}

/// Body of `POST /recettes/`.
#[derive(Debug, Deserialize)]
pub struct CreateRevenueRequest {
    /// Budget credited.
    pub budget: Uuid,
    /// Origin of the funds.
    pub source: String,
    /// Kind of recette.
    #[serde(rename = "type")]
    pub type_recette: String,
    /// Amount, strictly positive.
    pub montant: Decimal,
    /// Date received, today if absent.
    pub date_recette: Option<NaiveDate>,
}

/// Body of `PUT /recettes/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateRevenueRequest {
    /// New origin.
    pub source: Option<String>,
    /// New kind.
    #[serde(rename = "type")]
    pub type_recette: Option<String>,
    /// New amount.
    pub montant: Option<Decimal>,
    /// New date.
    pub date_recette: Option<NaiveDate>,
}

/// Query of `GET /recettes/`.
#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    /// Only this budget's recettes.
    pub budget: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the recette routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recettes/", get(list_revenues).post(create_revenue))
        .route(
            "/recettes/{id}/",
            get(get_revenue).put(update_revenue).delete(delete_revenue),
        )
}

/// GET `/recettes/` - List recettes.
async fn list_revenues(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<RevenueQuery>,
) -> ApiResult<Json<PageResponse<RevenueResponse>>> {
    let page = page.normalized();
    let rows = BudgetRepository::new((*state.db).clone())
        .list_revenues(query.budget, page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, RevenueResponse::from)))
}

/// GET `/recettes/{id}/` - Get a recette.
async fn get_revenue(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RevenueResponse>> {
    let revenue = BudgetRepository::new((*state.db).clone())
        .get_revenue(id)
        .await?;
    Ok(Json(revenue.into()))
}

/// POST `/recettes/` - Record a recette, crediting its budget.
async fn create_revenue(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateRevenueRequest>,
) -> ApiResult<(StatusCode, Json<RevenueResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let revenue = BudgetRepository::new((*state.db).clone())
        .create_revenue(
            CreateRevenueInput {
                budget_id: payload.budget,
                source: payload.source,
                revenue_type: payload.type_recette,
                montant: payload.montant,
                received_on: payload.date_recette,
            },
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(revenue.into())))
}

/// PUT `/recettes/{id}/` - Amend a recette.
async fn update_revenue(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRevenueRequest>,
) -> ApiResult<Json<RevenueResponse>> {
    auth.require(Capability::ManageFinance)?;
    let revenue = BudgetRepository::new((*state.db).clone())
        .update_revenue(
            id,
            UpdateRevenueInput {
                source: payload.source,
                revenue_type: payload.type_recette,
                montant: payload.montant,
                received_on: payload.date_recette,
            },
            auth.actor(),
        )
        .await?;
    Ok(Json(revenue.into()))
}

/// DELETE `/recettes/{id}/` - Remove a recette, debiting its budget.
async fn delete_revenue(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    BudgetRepository::new((*state.db).clone())
        .delete_revenue(id, auth.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
