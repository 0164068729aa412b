//! Financial report repository.
//!
//! Gathers the snapshot a report is rendered from, stores the rendered
//! artifact and keeps the report metadata.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use budgetaire_core::auth::ActingUser;
use budgetaire_core::reports::{
    ExpenseItem, OrderItem, ReportBudget, ReportError, ReportService, ReportSnapshot, RevenueItem,
};
use budgetaire_core::storage::{StorageService, StoredObject};

use crate::entities::{
    budget_lines, budgets, expenses, financial_reports, purchase_orders, revenues,
    sea_orm_active_enums::ValidationStatus,
};

use super::{AuditRepository, RepositoryError};

/// Inserts a generated report and its journal entry in one transaction.
async fn record_generation(
    db: &DatabaseConnection,
    model: financial_reports::ActiveModel,
    actor: &ActingUser,
) -> Result<financial_reports::Model, DbErr> {
    let txn = db.begin().await?;
    let report = model.insert(&txn).await?;
    AuditRepository::append(
        &txn,
        actor.id,
        format!("Rapport {} GENERE - {}", report.file_name, report.periode),
    )
    .await?;
    txn.commit().await?;
    Ok(report)
}

/// Report type of generated artifacts.
pub const PDF: &str = "pdf";

/// Fields of report metadata created without an artifact.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    /// Budget reported on.
    pub budget_id: Uuid,
    /// Period label.
    pub periode: Option<String>,
    /// File extension, `pdf` unless given.
    pub report_type: Option<String>,
}

/// Report metadata fields that may change while no artifact exists.
#[derive(Debug, Clone, Default)]
pub struct UpdateReportInput {
    /// New period label.
    pub periode: Option<String>,
    /// New file extension.
    pub report_type: Option<String>,
}

/// Financial report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        budget_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<financial_reports::Model>, u64), RepositoryError> {
        let mut query = financial_reports::Entity::find();
        if let Some(budget_id) = budget_id {
            query = query.filter(financial_reports::Column::BudgetId.eq(budget_id));
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(financial_reports::Column::GeneratedAt)
            .order_by_desc(financial_reports::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a report by ID.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ReportNotFound` if the report does not exist.
    pub async fn get(&self, id: Uuid) -> Result<financial_reports::Model, RepositoryError> {
        financial_reports::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ReportError::ReportNotFound(id).into())
    }

    async fn budget(&self, budget_id: Uuid) -> Result<budgets::Model, RepositoryError> {
        budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ReportError::BudgetNotFound(budget_id).into())
    }

    /// Creates report metadata without an artifact.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::BudgetNotFound` for an unknown budget.
    pub async fn create(
        &self,
        input: CreateReportInput,
        actor: &ActingUser,
    ) -> Result<financial_reports::Model, RepositoryError> {
        let budget = self.budget(input.budget_id).await?;
        let periode = ReportService::period_or_default(input.periode.as_deref());
        let report_type = input.report_type.unwrap_or_else(|| PDF.to_string());

        let report = financial_reports::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_id: Set(budget.id),
            file_name: Set(ReportService::file_name(&budget.exercice, &periode, &report_type)),
            periode: Set(periode),
            report_type: Set(report_type),
            storage_key: Set(None),
            generated_by: Set(Some(actor.id)),
            generated_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(report_id = %report.id, budget_id = %report.budget_id, "Report metadata created");
        Ok(report)
    }

    /// Updates report metadata.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ArtifactLocked` once an artifact was generated.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateReportInput,
    ) -> Result<financial_reports::Model, RepositoryError> {
        let report = self.get(id).await?;
        if report.storage_key.is_some() {
            return Err(ReportError::ArtifactLocked.into());
        }
        let budget = self.budget(report.budget_id).await?;

        let periode = input
            .periode
            .map_or_else(|| report.periode.clone(), |p| {
                ReportService::period_or_default(Some(&p))
            });
        let report_type = input
            .report_type
            .unwrap_or_else(|| report.report_type.clone());

        let mut active: financial_reports::ActiveModel = report.into();
        active.file_name = Set(ReportService::file_name(&budget.exercice, &periode, &report_type));
        active.periode = Set(periode);
        active.report_type = Set(report_type);
        Ok(active.update(&self.db).await?)
    }

    /// Deletes report metadata and returns it, so the caller can drop the
    /// artifact.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ReportNotFound` if the report does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<financial_reports::Model, RepositoryError> {
        let report = self.get(id).await?;
        report.clone().delete(&self.db).await?;
        info!(report_id = %id, "Report deleted");
        Ok(report)
    }

    /// Collects what a report on `budget_id` shows.
    ///
    /// Orders are found through their line's budget; only validated expenses
    /// are included.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::BudgetNotFound` for an unknown budget.
    pub async fn snapshot(
        &self,
        budget_id: Uuid,
        periode: Option<&str>,
        actor: &ActingUser,
    ) -> Result<ReportSnapshot, RepositoryError> {
        let budget = self.budget(budget_id).await?;

        let recettes = revenues::Entity::find()
            .filter(revenues::Column::BudgetId.eq(budget_id))
            .order_by_asc(revenues::Column::ReceivedOn)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| RevenueItem {
                source: r.source,
                type_recette: r.revenue_type,
                montant: r.montant,
            })
            .collect();

        let depenses = expenses::Entity::find()
            .filter(expenses::Column::BudgetId.eq(budget_id))
            .filter(expenses::Column::Status.eq(ValidationStatus::Validee))
            .order_by_asc(expenses::Column::SpentOn)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| ExpenseItem {
                type_depense: d.expense_type,
                categorie: d.category,
                montant: d.montant,
            })
            .collect();

        let line_ids: Vec<Uuid> = budget_lines::Entity::find()
            .select_only()
            .column(budget_lines::Column::Id)
            .filter(budget_lines::Column::BudgetId.eq(budget_id))
            .into_tuple()
            .all(&self.db)
            .await?;
        let commandes = if line_ids.is_empty() {
            Vec::new()
        } else {
            purchase_orders::Entity::find()
                .filter(purchase_orders::Column::LineId.is_in(line_ids))
                .order_by_asc(purchase_orders::Column::OrderedOn)
                .order_by_asc(purchase_orders::Column::Reference)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| OrderItem {
                    designation: c.designation,
                    quantite: c.quantite,
                    total: c.total,
                })
                .collect()
        };

        Ok(ReportSnapshot {
            budget: ReportBudget {
                exercice: budget.exercice,
                montant_total: budget.montant_total,
                montant_disponible: budget.montant_disponible,
            },
            periode: ReportService::period_or_default(periode),
            recettes,
            depenses,
            commandes,
            genere_par_nom: actor.nom.clone(),
            genere_par_role: actor.role.as_str().to_string(),
            generated_at: Utc::now(),
        })
    }

    /// Renders a PDF report, stores it and records its metadata.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::BudgetNotFound` for an unknown budget and
    /// `ReportError::Storage` if the artifact cannot be written. The
    /// metadata row and its journal entry are committed together; if that
    /// fails the stored artifact is removed again.
    pub async fn generate(
        &self,
        storage: &StorageService,
        budget_id: Uuid,
        periode: Option<&str>,
        actor: &ActingUser,
    ) -> Result<financial_reports::Model, RepositoryError> {
        let snapshot = self.snapshot(budget_id, periode, actor).await?;
        let rendered = ReportService::render(&snapshot);

        let report_id = Uuid::new_v4();
        let key = StorageService::report_key(budget_id, report_id, &rendered.nom_fichier);
        storage
            .write(&key, rendered.bytes)
            .await
            .map_err(ReportError::from)?;

        let model = financial_reports::ActiveModel {
            id: Set(report_id),
            budget_id: Set(budget_id),
            periode: Set(snapshot.periode),
            report_type: Set(PDF.to_string()),
            file_name: Set(rendered.nom_fichier),
            storage_key: Set(Some(key.clone())),
            generated_by: Set(Some(actor.id)),
            generated_at: Set(snapshot.generated_at.into()),
        };
        let report = match record_generation(&self.db, model, actor).await {
            Ok(report) => report,
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove orphaned report artifact");
                }
                return Err(e.into());
            }
        };

        info!(report_id = %report.id, budget_id = %budget_id, file = %report.file_name, "Report generated");
        Ok(report)
    }

    /// Reads a report's artifact.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NoArtifact` if nothing was generated.
    pub async fn download(
        &self,
        storage: &StorageService,
        id: Uuid,
    ) -> Result<(financial_reports::Model, StoredObject), RepositoryError> {
        let report = self.get(id).await?;
        let key = report
            .storage_key
            .clone()
            .ok_or(ReportError::NoArtifact(id))?;
        let object = storage.read(&key).await.map_err(ReportError::from)?;
        Ok((report, object))
    }
}
