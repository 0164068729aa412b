//! Expense request repository.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use budgetaire_core::auth::ActingUser;
use budgetaire_core::budget::BudgetError;
use budgetaire_core::workflow::{RequestDecision, RequestSnapshot, WorkflowService};

use crate::entities::{expense_requests, sea_orm_active_enums::RequestStatus, users};

use super::{AuditRepository, NotificationRepository, RepositoryError};

/// Fields of a new request. The submitter is the acting user.
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    /// Subject.
    pub objet: String,
    /// Estimated amount, strictly positive.
    pub montant_estime: Decimal,
}

/// Request fields that may change while pending.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequestInput {
    /// New subject.
    pub objet: Option<String>,
    /// New estimate.
    pub montant_estime: Option<Decimal>,
}

/// Request together with its submitter.
pub type RequestWithUser = (expense_requests::Model, Option<users::Model>);

fn snapshot(request: &expense_requests::Model) -> RequestSnapshot {
    RequestSnapshot {
        id: request.id,
        status: request.status.into(),
        submitted_by: request.user_id,
        objet: request.objet.clone(),
        montant_estime: request.montant_estime,
    }
}

fn require_positive(montant: Decimal) -> Result<(), RepositoryError> {
    if montant <= Decimal::ZERO {
        return Err(BudgetError::NonPositiveAmount.into());
    }
    Ok(())
}

/// Expense request repository.
#[derive(Debug, Clone)]
pub struct ExpenseRequestRepository {
    db: DatabaseConnection,
}

impl ExpenseRequestRepository {
    /// Creates a new expense request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists requests with their submitter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<RequestWithUser>, u64), RepositoryError> {
        let mut query = expense_requests::Entity::find();
        if let Some(status) = status {
            query = query.filter(expense_requests::Column::Status.eq(status));
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(expense_requests::Column::RequestedAt)
            .order_by_desc(expense_requests::Column::Id)
            .offset(offset)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a request with its submitter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    pub async fn get(&self, id: Uuid) -> Result<RequestWithUser, RepositoryError> {
        expense_requests::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Demande", id))
    }

    /// Submits a request on behalf of the acting user.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveAmount` for a non-positive estimate.
    pub async fn create(
        &self,
        input: CreateRequestInput,
        actor: &ActingUser,
    ) -> Result<expense_requests::Model, RepositoryError> {
        require_positive(input.montant_estime)?;

        let request = expense_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.id),
            objet: Set(input.objet),
            montant_estime: Set(input.montant_estime),
            status: Set(RequestStatus::EnAttente),
            director_comment: Set(None),
            decided_by: Set(None),
            decided_at: Set(None),
            requested_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        info!(request_id = %request.id, submitted_by = %actor.id, "Expense request submitted");
        Ok(request)
    }

    /// Updates a pending request.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotOwner` unless the actor submitted it or is
    /// an accountant, `WorkflowError::NotEditable` once decided.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateRequestInput,
        actor: &ActingUser,
    ) -> Result<expense_requests::Model, RepositoryError> {
        let (request, _) = self.get(id).await?;
        WorkflowService::ensure_request_mutable(&snapshot(&request), actor)?;

        let mut active: expense_requests::ActiveModel = request.into();
        if let Some(objet) = input.objet {
            active.objet = Set(objet);
        }
        if let Some(montant) = input.montant_estime {
            require_positive(montant)?;
            active.montant_estime = Set(montant);
        }
        let updated = active.update(&self.db).await?;

        info!(request_id = %id, actor = %actor.id, "Expense request updated");
        Ok(updated)
    }

    /// Deletes a pending request.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    pub async fn delete(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let (request, _) = self.get(id).await?;
        WorkflowService::ensure_request_mutable(&snapshot(&request), actor)?;
        request.delete(&self.db).await?;
        info!(request_id = %id, actor = %actor.id, "Expense request deleted");
        Ok(())
    }

    /// Approves or refuses a pending request.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotPermitted` unless the actor is a director,
    /// `WorkflowError::AlreadyProcessed` once decided.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: RequestDecision,
        comment: Option<String>,
        actor: &ActingUser,
    ) -> Result<expense_requests::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let request = expense_requests::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Demande", id))?;

        let action = WorkflowService::decide_request(&snapshot(&request), decision, actor)?;

        let mut active: expense_requests::ActiveModel = request.into();
        active.status = Set(action.new_status.into());
        active.director_comment = Set(comment.filter(|c| !c.trim().is_empty()));
        active.decided_by = Set(Some(action.decided_by));
        active.decided_at = Set(Some(action.decided_at.into()));
        let updated = active.update(&txn).await?;

        AuditRepository::append(&txn, actor.id, action.audit).await?;
        NotificationRepository::deliver(&txn, &action.notices).await?;
        txn.commit().await?;

        info!(request_id = %id, status = %action.new_status, decided_by = %actor.id, "Expense request decided");
        Ok(updated)
    }
}
