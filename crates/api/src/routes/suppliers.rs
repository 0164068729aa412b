//! Supplier routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_core::auth::Capability;
use budgetaire_db::{SupplierRepository, entities::suppliers, repositories::SupplierInput};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiResult, middleware::AuthUser};

use super::page_of;

/// A supplier as returned by the API.
#[derive(Debug, Serialize)]
pub struct SupplierResponse {
    /// Supplier ID.
    pub id: Uuid,
    /// Company name.
    pub nom: String,
    /// Contact person.
    pub contact: Option<String>,
    /// Phone number.
    pub telephone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Postal address.
    pub adresse: Option<String>,
}

impl From<suppliers::Model> for SupplierResponse {
    fn from(s: suppliers::Model) -> Self {
        Self {
            id: s.id,
            nom: s.nom,
            contact: s.contact,
            telephone: s.telephone,
            email: s.email,
            adresse: s.adresse,
        }
    }
}

/// Body of `POST /fournisseurs/` and `PUT /fournisseurs/{id}/`.
#[derive(Debug, Default, Deserialize)]
pub struct SupplierRequest {
    /// Company name, required on creation.
    pub nom: Option<String>,
    /// Contact person.
    pub contact: Option<String>,
    /// Phone number.
    pub telephone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Postal address.
    pub adresse: Option<String>,
}

impl From<SupplierRequest> for SupplierInput {
    fn from(r: SupplierRequest) -> Self {
        Self {
            nom: r.nom,
            contact: r.contact,
            telephone: r.telephone,
            email: r.email,
            adresse: r.adresse,
        }
    }
}

/// Creates the supplier routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fournisseurs/", get(list_suppliers).post(create_supplier))
        .route(
            "/fournisseurs/{id}/",
            get(get_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

/// GET `/fournisseurs/` - List suppliers by name.
async fn list_suppliers(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<SupplierResponse>>> {
    let page = page.normalized();
    let rows = SupplierRepository::new((*state.db).clone())
        .list(page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, SupplierResponse::from)))
}

/// GET `/fournisseurs/{id}/` - Get a supplier.
async fn get_supplier(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SupplierResponse>> {
    let supplier = SupplierRepository::new((*state.db).clone())
        .get(id)
        .await?;
    Ok(Json(supplier.into()))
}

/// POST `/fournisseurs/` - Add a supplier.
async fn create_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SupplierRequest>,
) -> ApiResult<(StatusCode, Json<SupplierResponse>)> {
    auth.require(Capability::ManageFinance)?;
    let supplier = SupplierRepository::new((*state.db).clone())
        .create(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(supplier.into())))
}

/// PUT `/fournisseurs/{id}/` - Update a supplier.
async fn update_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierRequest>,
) -> ApiResult<Json<SupplierResponse>> {
    auth.require(Capability::ManageFinance)?;
    let supplier = SupplierRepository::new((*state.db).clone())
        .update(id, payload.into())
        .await?;
    Ok(Json(supplier.into()))
}

/// DELETE `/fournisseurs/{id}/` - Remove a supplier no order refers to.
async fn delete_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageFinance)?;
    SupplierRepository::new((*state.db).clone())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
