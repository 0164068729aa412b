//! Purchase order routes.

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
    PurchaseOrderRepository,
    entities::purchase_orders,
    repositories::{CreateOrderInput, OrderFilter, UpdateOrderInput},
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

/// A purchase order as returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Unique reference.
    pub reference: String,
    /// What is ordered.
    pub designation: String,
    /// Supplier.
    pub fournisseur: Uuid,
    /// Budget line drawn from.
    pub ligne_budgetaire: Uuid,
    /// Quantity.
    pub quantite: i32,
    /// Unit price.
    pub prix_unitaire: Decimal,
    /// Quantity times unit price.
    pub total: Decimal,
    /// `en_attente`, `validee` or `rejettee`.
    pub statut: &'static str,
    /// Order date.
    pub date_commande: NaiveDate,
    /// Decision time.
    pub date_decision: Option<DateTime<FixedOffset>>,
}

impl From<purchase_orders::Model> for OrderResponse {
    fn from(o: purchase_orders::Model) -> Self {
        Self {
            id: o.id,
            reference: o.reference,
            designation: o.designation,
            fournisseur: o.supplier_id,
            ligne_budgetaire: o.line_id,
            quantite: o.quantite,
            prix_unitaire: o.prix_unitaire,
            total: o.total,
            statut: ValidationStatus::from(o.status).as_str(),
            date_commande: o.ordered_on,
            date_decision: o.decided_at,
        }
    }
}

/// Body of `POST /commandes/`. Any `total` sent is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Unique reference.
    pub reference: String,
    /// What is ordered.
    pub designation: String,
    /// Supplier.
    pub fournisseur: Uuid,
    /// Budget line drawn from.
    pub ligne_budgetaire: Uuid,
    /// Quantity, strictly positive.
    pub quantite: i32,
    /// Unit price, not negative.
    pub prix_unitaire: Decimal,
    /// Order date, today if absent.
    pub date_commande: Option<NaiveDate>,
}

/// Body of `PUT /commandes/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    /// New reference.
    pub reference: Option<String>,
    /// New designation.
    pub designation: Option<String>,
    /// New supplier.
    pub fournisseur: Option<Uuid>,
    /// New line.
    pub ligne_budgetaire: Option<Uuid>,
    /// New quantity.
    pub quantite: Option<i32>,
    /// New unit price.
    pub prix_unitaire: Option<Decimal>,
    /// New date.
    pub date_commande: Option<NaiveDate>,
}

/// Body of `POST /commandes/{id}/valider/`.
#[derive(Debug, Deserialize)]
pub struct DecideOrderRequest {
    /// `validee` or `rejettee`.
    pub statut: String,
}

/// Query of `GET /commandes/`.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    /// Only this line's orders.
    pub ligne_budgetaire: Option<Uuid>,
    /// Only this supplier's orders.
    pub fournisseur: Option<Uuid>,
    /// Only orders in this status.
    pub statut: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/commandes/", get(list_orders).post(create_order))
        .route(
            "/commandes/{id}/",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/commandes/{id}/valider/", post(decide_order))
}

/// GET `/commandes/` - List orders.
async fn list_orders(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<PageResponse<OrderResponse>>> {
    let status = query
        .statut
        .as_deref()
        .map(|s| {
            ValidationStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("Statut invalide : {s}")))
        })
        .transpose()?;
    let filter = OrderFilter {
        line_id: query.ligne_budgetaire,
        supplier_id: query.fournisseur,
        status,
    };

    let page = page.normalized();
    let rows = PurchaseOrderRepository::new((*state.db).clone())
        .list(&filter, page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, OrderResponse::from)))
}

/// GET `/commandes/{id}/` - Get an order.
async fn get_order(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let order = PurchaseOrderRepository::new((*state.db).clone())
        .get(id)
        .await?;
    Ok(Json(order.into()))
}

/// POST `/commandes/` - Record a pending order.
async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let order = PurchaseOrderRepository::new((*state.db).clone())
        .create(
            CreateOrderInput {
                reference: payload.reference,
                designation: payload.designation,
                supplier_id: payload.fournisseur,
                line_id: payload.ligne_budgetaire,
                quantite: payload.quantite,
                prix_unitaire: payload.prix_unitaire,
                ordered_on: payload.date_commande,
            },
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT `/commandes/{id}/` - Amend a pending order.
async fn update_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    auth.require(Capability::ManageFinance)?;
    let order = PurchaseOrderRepository::new((*state.db).clone())
        .update(
            id,
            UpdateOrderInput {
                reference: payload.reference,
                designation: payload.designation,
                supplier_id: payload.fournisseur,
                line_id: payload.ligne_budgetaire,
                quantite: payload.quantite,
                prix_unitaire: payload.prix_unitaire,
                ordered_on: payload.date_commande,
            },
            auth.actor(),
        )
        .await?;
    Ok(Json(order.into()))
}

/// DELETE `/commandes/{id}/` - Delete a pending order.
async fn delete_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    PurchaseOrderRepository::new((*state.db).clone())
        .delete(id, auth.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/commandes/{id}/valider/` - Validate or reject an order.
async fn decide_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    auth.require(Capability::ValidateOrder)?;
    let repo = PurchaseOrderRepository::new((*state.db).clone());
    let current = repo.get(id).await?;
    WorkflowService::ensure_pending(current.status.into(), "Commande")?;
    let decision = WorkflowService::parse_validation(&payload.statut)?;
    let order = repo.decide(id, decision, auth.actor()).await?;
    Ok(Json(order.into()))
}
