//! Audit journal routes (read-only).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use budgetaire_db::{
    AuditRepository,
    repositories::{AuditEntry, AuditFilter},
};
use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

use super::page_of;

/// Shown in place of a deleted author.
const UNKNOWN: &str = "Inconnu";

/// A journal entry as returned by the API.
#[derive(Debug, Serialize)]
pub struct JournalResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Author's name.
    pub utilisateur_nom: String,
    /// Author's e-mail.
    pub utilisateur_email: String,
    /// What happened.
    pub action: String,
    /// When it happened.
    pub date_heure: DateTime<FixedOffset>,
}

impl From<AuditEntry> for JournalResponse {
    fn from((entry, user): AuditEntry) -> Self {
        let (utilisateur_nom, utilisateur_email) = user.map_or_else(
            || (UNKNOWN.to_string(), UNKNOWN.to_string()),
            |u| (u.nom, u.email),
        );
        Self {
            id: entry.id,
            utilisateur_nom,
            utilisateur_email,
            action: entry.action,
            date_heure: entry.created_at,
        }
    }
}

/// Query of `GET /journal/`.
#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    /// Only this user's entries.
    pub utilisateur: Option<Uuid>,
    /// Substring of the action text.
    pub action: Option<String>,
    /// First day included.
    pub date_debut: Option<NaiveDate>,
    /// Last day included.
    pub date_fin: Option<NaiveDate>,
}

impl From<JournalQuery> for AuditFilter {
    fn from(q: JournalQuery) -> Self {
        Self {
            user_id: q.utilisateur,
            action: q.action,
            date_from: q.date_debut,
            date_to: q.date_fin,
        }
    }
}

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal/", get(list_entries))
        .route("/journal/{id}/", get(get_entry))
}

/// GET `/journal/` - List entries, newest first.
async fn list_entries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(query): Query<JournalQuery>,
) -> ApiResult<Json<PageResponse<JournalResponse>>> {
    let page = page.normalized();
    let rows = AuditRepository::new((*state.db).clone())
        .list(&query.into(), page.offset(), page.limit())
        .await?;
    Ok(Json(page_of(&page, rows, JournalResponse::from)))
}

/// GET `/journal/{id}/` - Get one entry.
async fn get_entry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JournalResponse>> {
    let entry = AuditRepository::new((*state.db).clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Entrée du journal introuvable."))?;
    Ok(Json(entry.into()))
}
