//! Expense routes, including the supervision and validation steps.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_core::workflow::{ValidationStatus, WorkflowService};
use budgetaire_db::{
    ExpenseRepository,
    entities::expenses,
    repositories::{CreateExpenseInput, ExpenseFilter, ExpenseWithLine, UpdateExpenseInput},
};
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

/// An expense as returned by the API.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Budget debited on validation.
    pub budget: Uuid,
    /// Budget line.
    pub ligne_budgetaire: Uuid,
    /// Article of the budget line.
    pub ligne_budgetaire_nom: Option<String>,
    /// Kind of expense.
    pub type_depense: String,
    /// Category.
    pub categorie: String,
    /// Amount.
    pub montant: Decimal,
    /// Free text.
    pub description: String,
    /// `en_attente`, `validee` or `rejettee`.
    pub statut_validation: &'static str,
    /// Supervising CSA.
    pub supervise_par: Option<Uuid>,
    /// Supervision time.
    pub date_supervision: Option<DateTime<FixedOffset>>,
    /// Deciding director.
    pub valide_par: Option<Uuid>,
    /// Decision time.
    pub date_validation: Option<DateTime<FixedOffset>>,
    /// Date of the expense.
    pub date_depense: NaiveDate,
}

impl ExpenseResponse {
    /// Builds the response, with the line's article when known.
    #[must_use]
    pub fn new(e: expenses::Model, ligne_budgetaire_nom: Option<String>) -> Self {
        Self {
            id: e.id,
            budget: e.budget_id,
            ligne_budgetaire: e.line_id,
            ligne_budgetaire_nom,
            type_depense: e.expense_type,
            categorie: e.category,
            montant: e.montant,
            description: e.description,
            statut_validation: ValidationStatus::from(e.status).as_str(),
            supervise_par: e.supervised_by,
            date_supervision: e.supervised_at,
            valide_par: e.validated_by,
            date_validation: e.validated_at,
            date_depense: e.spent_on,
        }
    }
}

impl From<ExpenseWithLine> for ExpenseResponse {
    fn from((expense, line): ExpenseWithLine) -> Self {
        Self::new(expense, line.map(|l| l.article))
    }
}

/// Body of `POST /depenses/`.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Budget.
    pub budget: Uuid,
    /// Budget line, which must belong to the budget.
    pub ligne_budgetaire: Uuid,
    /// Kind of expense.
    pub type_depense: String,
    /// Category.
    pub categorie: String,
    /// Amount, strictly positive.
    pub montant: Decimal,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Date of the expense, today if absent.
    pub date_depense: Option<NaiveDate>,
}

/// Body of `PUT /depenses/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    /// New budget.
    pub budget: Option<Uuid>,
    /// New line.
    pub ligne_budgetaire: Option<Uuid>,
    /// New kind.
    pub type_depense: Option<String>,
    /// New category.
    pub categorie: Option<String>,
    /// New amount.
    pub montant: Option<Decimal>,
    /// New text.
    pub description: Option<String>,
    /// New date.
    pub date_depense: Option<NaiveDate>,
}

/// Body of `POST /depenses/{id}/valider/`.
#[derive(Debug, Deserialize)]
pub struct ValidateExpenseRequest {
    /// `validee` or `rejettee`.
    pub statut_validation: String,
}

/// Query of `GET /depenses/`.
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    /// Only this budget's expenses.
    pub budget: Option<Uuid>,
    /// Only expenses in this status.
    pub statut_validation: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/depenses/", get(list_expenses).post(create_expense))
        .route(
            "/depenses/{id}/",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/depenses/{id}/superviser/", post(supervise_expense))
        .route("/depenses/{id}/valider/", post(validate_expense))
}

/// GET `/depenses/` - List expenses.
async fn list_expenses(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ExpenseQuery>,
) -> ApiResult<Json<PageResponse<ExpenseResponse>>> {
    let status = query
        .statut_validation
        .as_deref()
        .map(|s| {
            ValidationStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Statut invalide : {s}")))
        })
        .transpose()?;
    let filter = ExpenseFilter {
        budget_id: query.budget,
        status,
    };

    let page = page.normalized();
    let rows = ExpenseRepository::new((*state.db).clone())
        .list(&filter, page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, ExpenseResponse::from)))
}

/// GET `/depenses/{id}/` - Get an expense.
async fn get_expense(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExpenseResponse>> {
    let row = ExpenseRepository::new((*state.db).clone()).get(id).await?;
    Ok(Json(row.into()))
}

/// POST `/depenses/` - Record a pending expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<ExpenseResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = repo
        .create(
            CreateExpenseInput {
                budget_id: payload.budget,
                line_id: payload.ligne_budgetaire,
                expense_type: payload.type_depense,
                category: payload.categorie,
                montant: payload.montant,
                description: payload.description,
                spent_on: payload.date_depense,
            },
            auth.actor(),
        )
        .await?;
    let row = repo.get(expense.id).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT `/depenses/{id}/` - Amend a pending expense.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> ApiResult<Json<ExpenseResponse>> {
    auth.require(Capability::ManageFinance)?;
    let repo = ExpenseRepository::new((*state.db).clone());
    repo.update(
        id,
        UpdateExpenseInput {
            budget_id: payload.budget,
            line_id: payload.ligne_budgetaire,
            expense_type: payload.type_depense,
            category: payload.categorie,
            montant: payload.montant,
            description: payload.description,
            spent_on: payload.date_depense,
        },
        auth.actor(),
    )
    .await?;
    let row = repo.get(id).await?;
    Ok(Json(row.into()))
}

/// DELETE `/depenses/{id}/` - Delete a pending expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    ExpenseRepository::new((*state.db).clone())
        .delete(id, auth.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/depenses/{id}/superviser/` - Record the CSA's supervision.
async fn supervise_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExpenseResponse>> {
    auth.require(Capability::SuperviseExpense)?;
    let repo = ExpenseRepository::new((*state.db).clone());
    repo.supervise(id, auth.actor()).await?;
    let row = repo.get(id).await?;
    Ok(Json(row.into()))
}

/// POST `/depenses/{id}/valider/` - Validate or reject a supervised expense.
async fn validate_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ValidateExpenseRequest>,
) -> ApiResult<Json<ExpenseResponse>> {
    auth.require(Capability::ValidateExpense)?;
    let repo = ExpenseRepository::new((*state.db).clone());
    let (current, _) = repo.get(id).await?;
    WorkflowService::ensure_pending(current.status.into(), "Dépense")?;
    let decision = WorkflowService::parse_validation(&payload.statut_validation)?;
    repo.decide(id, decision, auth.actor()).await?;
    let row = repo.get(id).await?;
    Ok(Json(row.into()))
}
