//! Expense request routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_core::workflow::{RequestStatus, WorkflowService};
use budgetaire_db::{
    ExpenseRequestRepository,
    entities::expense_requests,
    repositories::{CreateRequestInput, RequestWithUser, UpdateRequestInput},
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

/// An expense request as returned by the API.
#[derive(Debug, Serialize)]
pub struct ExpenseRequestResponse {
    /// Request ID.
    pub id: Uuid,
    /// Submitter.
    pub utilisateur: Uuid,
    /// Submitter's name.
    pub utilisateur_nom: Option<String>,
    /// Subject.
    pub objet: String,
    /// Estimated amount.
    pub montant_estime: Decimal,
    /// `en_attente`, `approuvee` or `refusee`.
    pub statut: &'static str,
    /// Director's comment on the decision.
    pub commentaire_directeur: Option<String>,
    /// Submission time.
    pub date_demande: DateTime<FixedOffset>,
    /// Decision time.
    pub date_validation: Option<DateTime<FixedOffset>>,
}

impl ExpenseRequestResponse {
    fn new(r: expense_requests::Model, utilisateur_nom: Option<String>) -> Self {
        Self {
            id: r.id,
            utilisateur: r.user_id,
            utilisateur_nom,
            objet: r.objet,
            montant_estime: r.montant_estime,
            statut: RequestStatus::from(r.status).as_str(),
            commentaire_directeur: r.director_comment,
            date_demande: r.requested_at,
            date_validation: r.decided_at,
        }
    }
}

impl From<RequestWithUser> for ExpenseRequestResponse {
    fn from((request, user): RequestWithUser) -> Self {
        Self::new(request, user.map(|u| u.nom))
    }
}

/// Body of `POST /demandes/`. The submitter is the caller.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequestRequest {
    /// Subject.
    pub objet: String,
    /// Estimated amount, strictly positive.
    pub montant_estime: Decimal,
}

/// Body of `PUT /demandes/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequestRequest {
    /// New subject.
    pub objet: Option<String>,
    /// New estimate.
    pub montant_estime: Option<Decimal>,
}

/// Body of `POST /demandes/{id}/valider/`.
#[derive(Debug, Deserialize)]
pub struct DecideRequestRequest {
    /// `approuvee` or `refusee`, accents allowed.
    pub statut: String,
    /// Optional comment for the submitter.
    pub commentaire: Option<String>,
}

/// Query of `GET /demandes/`.
#[derive(Debug, Deserialize)]
pub struct ExpenseRequestQuery {
    /// Only requests in this status.
    pub statut: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the expense request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/demandes/", get(list_requests).post(create_request))
        .route(
            "/demandes/{id}/",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/demandes/{id}/valider/", post(decide_request))
}

/// GET `/demandes/` - List requests.
async fn list_requests(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ExpenseRequestQuery>,
) -> ApiResult<Json<PageResponse<ExpenseRequestResponse>>> {
    let status = query
        .statut
        .as_deref()
        .map(|s| {
            RequestStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Statut invalide : {s}")))
        })
        .transpose()?;

    let page = page.normalized();
    let rows = ExpenseRequestRepository::new((*state.db).clone())
        .list(status.map(Into::into), page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, ExpenseRequestResponse::from)))
}

/// GET `/demandes/{id}/` - Get a request.
async fn get_request(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExpenseRequestResponse>> {
    let row = ExpenseRequestRepository::new((*state.db).clone())
        .get(id)
        .await?;
    Ok(Json(row.into()))
}

/// POST `/demandes/` - Submit a request.
async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequestRequest>,
) -> ApiResult<(StatusCode, Json<ExpenseRequestResponse>)> {
    auth.require(Capability::Participate)?;
    let request = ExpenseRequestRepository::new((*state.db).clone())
        .create(
            CreateRequestInput {
                objet: payload.objet,
                montant_estime: payload.montant_estime,
            },
            auth.actor(),
        )
        .await?;
    let response = ExpenseRequestResponse::new(request, Some(auth.actor().nom.clone()));
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT `/demandes/{id}/` - Amend a pending request.
async fn update_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequestRequest>,
) -> ApiResult<Json<ExpenseRequestResponse>> {
    let repo = ExpenseRequestRepository::new((*state.db).clone());
    repo.update(
        id,
        UpdateRequestInput {
            objet: payload.objet,
            montant_estime: payload.montant_estime,
        },
        auth.actor(),
    )
    .await?;
    let row = repo.get(id).await?;
    Ok(Json(row.into()))
}

/// DELETE `/demandes/{id}/` - Withdraw a pending request.
async fn delete_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ExpenseRequestRepository::new((*state.db).clone())
        .delete(id, auth.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/demandes/{id}/valider/` - Approve or refuse a request.
async fn decide_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideRequestRequest>,
) -> ApiResult<Json<ExpenseRequestResponse>> {
    auth.require(Capability::DecideRequest)?;
    let repo = ExpenseRequestRepository::new((*state.db).clone());
    let (current, _) = repo.get(id).await?;
    WorkflowService::ensure_request_pending(current.status.into())?;
    let decision = WorkflowService::parse_request(&payload.statut)?;
    repo.decide(id, decision, payload.commentaire, auth.actor())
        .await?;
    let row = repo.get(id).await?;
    Ok(Json(row.into()))
}
