//! Financial report routes: metadata, generation and download.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use budgetaire_core::storage::sanitize_filename;
use budgetaire_db::{
    ReportRepository,
    entities::financial_reports,
    repositories::{CreateReportInput, UpdateReportInput},
};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiResult, middleware::AuthUser};

use super::page_of;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Report metadata as returned by the API.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Report ID.
    pub id: Uuid,
    /// Budget reported on.
    pub budget: Uuid,
    /// Period label.
    pub periode: String,
    /// File extension.
    #[serde(rename = "type")]
    pub type_rapport: String,
    /// Name of the artifact.
    pub nom_fichier: String,
    /// Storage key of the artifact, absent until generated.
    pub fichier: Option<String>,
    /// Author.
    pub genere_par: Option<Uuid>,
    /// Creation time.
    pub date_generation: DateTime<FixedOffset>,
}

impl From<financial_reports::Model> for ReportResponse {
    fn from(r: financial_reports::Model) -> Self {
        Self {
            id: r.id,
            budget: r.budget_id,
            periode: r.periode,
            type_rapport: r.report_type,
            nom_fichier: r.file_name,
            fichier: r.storage_key,
            genere_par: r.generated_by,
            date_generation: r.generated_at,
        }
    }
}

/// Body of `POST /rapports/`.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    /// Budget reported on.
    pub budget: Uuid,
    /// Period label.
    pub periode: Option<String>,
    /// File extension, `pdf` if absent.
    #[serde(rename = "type")]
    pub type_rapport: Option<String>,
}

/// Body of `PUT /rapports/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    /// New period label.
    pub periode: Option<String>,
    /// New file extension.
    #[serde(rename = "type")]
    pub type_rapport: Option<String>,
}

/// Body of `POST /rapports/generer/`.
#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    /// Budget reported on.
    pub budget: Uuid,
    /// Period label.
    pub periode: Option<String>,
}

/// Query of `GET /rapports/`.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Only this budget's reports.
    pub budget: Option<Uuid>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn content_type(report_type: &str) -> &'static str {
    match report_type {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition` for a download: an ASCII fallback name plus the
/// exact UTF-8 name percent-encoded per RFC 5987.
fn content_disposition(file_name: &str) -> String {
    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{encoded}",
        sanitize_filename(file_name)
    )
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rapports/", get(list_reports).post(create_report))
        .route("/rapports/generer/", post(generate_report))
        .route(
            "/rapports/{id}/",
            get(get_report).put(update_report).delete(delete_report),
        )
        .route("/rapports/{id}/telecharger/", get(download_report))
}

/// GET `/rapports/` - List reports, newest first.
async fn list_reports(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<PageResponse<ReportResponse>>> {
    let page = page.normalized();
    let rows = ReportRepository::new((*state.db).clone())
        .list(query.budget, page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, ReportResponse::from)))
}

/// GET `/rapports/{id}/` - Get report metadata.
async fn get_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReportResponse>> {
    let report = ReportRepository::new((*state.db).clone()).get(id).await?;
    Ok(Json(report.into()))
}

/// POST `/rapports/` - Record report metadata without generating it.
async fn create_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportResponse>)> {
    let report = ReportRepository::new((*state.db).clone())
        .create(
            CreateReportInput {
                budget_id: payload.budget,
                periode: payload.periode,
                report_type: payload.type_rapport,
            },
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report.into())))
}

/// PUT `/rapports/{id}/` - Edit metadata of a report not yet generated.
async fn update_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReportRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let report = ReportRepository::new((*state.db).clone())
        .update(
            id,
            UpdateReportInput {
                periode: payload.periode,
                report_type: payload.type_rapport,
            },
        )
        .await?;
    Ok(Json(report.into()))
}

/// DELETE `/rapports/{id}/` - Delete a report and its artifact.
async fn delete_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let report = ReportRepository::new((*state.db).clone())
        .delete(id)
        .await?;
    if let Some(key) = report.storage_key {
        if let Err(e) = state.storage.delete(&key).await {
            warn!(report_id = %id, key = %key, error = %e, "Failed to delete report artifact");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/rapports/generer/` - Render and store a PDF report.
async fn generate_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<GenerateReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportResponse>)> {
    let report = ReportRepository::new((*state.db).clone())
        .generate(
            &state.storage,
            payload.budget,
            payload.periode.as_deref(),
            auth.actor(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report.into())))
}

/// GET `/rapports/{id}/telecharger/` - Download the generated artifact.
async fn download_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (report, object) = ReportRepository::new((*state.db).clone())
        .download(&state.storage, id)
        .await?;

    let disposition = content_disposition(&report.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&report.report_type).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        object.bytes,
    ))
}
