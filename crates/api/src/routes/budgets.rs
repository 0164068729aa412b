//! Budget routes.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_core::budget::BudgetStatus;
use budgetaire_core::storage::StorageService;
use budgetaire_db::{
    BudgetRepository,
    entities::budgets,
    repositories::{BudgetDetails, CreateBudgetInput, UpdateBudgetInput},
};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

use super::{
    expenses::ExpenseResponse, lines::LineResponse, page_of, revenues::RevenueResponse,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A budget as returned by the API.
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    /// Budget ID.
    pub id: Uuid,
    /// Fiscal year label.
    pub exercice: String,
    /// Total funds.
    pub montant_total: Decimal,
    /// Funds neither allocated to lines nor spent.
    pub montant_disponible: Decimal,
    /// `ouvert` or `cloture`.
    pub statut: &'static str,
    /// Free text.
    pub description: Option<String>,
    /// Creation time.
    pub date_creation: DateTime<FixedOffset>,
}

impl From<budgets::Model> for BudgetResponse {
    fn from(b: budgets::Model) -> Self {
        Self {
            id: b.id,
            exercice: b.exercice,
            montant_total: b.montant_total,
            montant_disponible: b.montant_disponible,
            statut: BudgetStatus::from(b.status).as_str(),
            description: b.description,
            date_creation: b.created_at,
        }
    }
}

/// A budget with everything attached to it.
#[derive(Debug, Serialize)]
pub struct BudgetDetailResponse {
    /// The budget itself.
    #[serde(flatten)]
    pub budget: BudgetResponse,
    /// Recettes credited to it.
    pub recettes: Vec<RevenueResponse>,
    /// Expenses recorded against it.
    pub depenses: Vec<ExpenseResponse>,
    /// Its lines.
    pub lignes: Vec<LineResponse>,
}

impl From<BudgetDetails> for BudgetDetailResponse {
    fn from(details: BudgetDetails) -> Self {
        let articles: HashMap<Uuid, String> = details
            .lignes
            .iter()
            .map(|l| (l.id, l.article.clone()))
            .collect();
        Self {
            budget: details.budget.into(),
            recettes: details.recettes.into_iter().map(Into::into).collect(),
            depenses: details
                .depenses
                .into_iter()
                .map(|d| {
                    let article = articles.get(&d.line_id).cloned();
                    ExpenseResponse::new(d, article)
                })
                .collect(),
            lignes: details.lignes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body of `POST /budgets/`.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    /// Fiscal year label, unique.
    pub exercice: String,
    /// Total funds, not negative.
    pub montant_total: Decimal,
    /// Initial status, `ouvert` if absent.
    pub statut: Option<String>,
    /// Free text.
    pub description: Option<String>,
}

/// Body of `PUT /budgets/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    /// New fiscal year label.
    pub exercice: Option<String>,
    /// New total; the available balance moves by the same delta.
    pub montant_total: Option<Decimal>,
    /// New status.
    pub statut: Option<String>,
    /// New text.
    pub description: Option<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_status(statut: Option<&str>) -> ApiResult<Option<BudgetStatus>> {
    statut
        .map(|s| {
            BudgetStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Statut de budget invalide : {s}")))
        })
        .transpose()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets/", get(list_budgets).post(create_budget))
        .route(
            "/budgets/{id}/",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
}

/// GET `/budgets/` - List budgets, latest fiscal year first.
async fn list_budgets(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<BudgetResponse>>> {
    let page = page.normalized();
    let rows = BudgetRepository::new((*state.db).clone())
        .list(page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, BudgetResponse::from)))
}

/// GET `/budgets/{id}/` - Get a budget with its recettes, expenses and lines.
async fn get_budget(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BudgetDetailResponse>> {
    let details = BudgetRepository::new((*state.db).clone())
        .get_details(id)
        .await?;
    Ok(Json(details.into()))
}

/// POST `/budgets/` - Open a budget.
async fn create_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBudgetRequest>,
) -> ApiResult<(StatusCode, Json<BudgetResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let budget = BudgetRepository::new((*state.db).clone())
        .create(
            CreateBudgetInput {
                exercice: payload.exercice,
                montant_total: payload.montant_total,
                status: parse_status(payload.statut.as_deref())?,
                description: payload.description,
            },
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(budget.into())))
}

/// PUT `/budgets/{id}/` - Update a budget.
async fn update_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBudgetRequest>,
) -> ApiResult<Json<BudgetResponse>> {
    auth.require(Capability::ManageFinance)?;
    let budget = BudgetRepository::new((*state.db).clone())
        .update(
            id,
            UpdateBudgetInput {
                exercice: payload.exercice,
                montant_total: payload.montant_total,
                status: parse_status(payload.statut.as_deref())?,
                description: payload.description,
            },
            auth.actor(),
        )
        .await?;
    Ok(Json(budget.into()))
}

/// DELETE `/budgets/{id}/` - Delete a budget and everything attached to it.
async fn delete_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    BudgetRepository::new((*state.db).clone())
        .delete(id, auth.actor())
        .await?;
    if let Err(e) = state
        .storage
        .delete_prefix(&StorageService::budget_prefix(id))
        .await
    {
        warn!(budget_id = %id, error = %e, "Failed to delete budget report artifacts");
    }
    Ok(StatusCode::NO_CONTENT)
}
