//! Expense repository: CRUD plus the supervision and validation steps.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use budgetaire_core::auth::ActingUser;
use budgetaire_core::budget::LedgerService;
use budgetaire_core::workflow::{
    BalanceEffect, ExpenseSnapshot, ValidationDecision, ValidationStatus, WorkflowService,
};

use crate::entities::{budget_lines, budgets, expenses, sea_orm_active_enums};

use super::budget::{balance_of, lock_budget, write_balance};
use super::{AuditRepository, NotificationRepository, RepositoryError};

/// Fields of a new expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Budget debited on validation.
    pub budget_id: Uuid,
    /// Line the expense belongs to; must be on the same budget.
    pub line_id: Uuid,
    /// Kind of expense.
    pub expense_type: String,
    /// Category.
    pub category: String,
    /// Amount, strictly positive.
    pub montant: Decimal,
    /// Free text.
    pub description: String,
    /// Date of the expense, today unless given.
    pub spent_on: Option<NaiveDate>,
}

/// Expense fields that may change while pending.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New budget.
    pub budget_id: Option<Uuid>,
    /// New line.
    pub line_id: Option<Uuid>,
    /// New kind.
    pub expense_type: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New amount.
    pub montant: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New date.
    pub spent_on: Option<NaiveDate>,
}

/// Filters accepted by the expense listing.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only this budget's expenses.
    pub budget_id: Option<Uuid>,
    /// Only expenses in this status.
    pub status: Option<ValidationStatus>,
}

/// Expense together with its line's article.
pub type ExpenseWithLine = (expenses::Model, Option<budget_lines::Model>);

fn snapshot(expense: &expenses::Model) -> ExpenseSnapshot {
    ExpenseSnapshot {
        id: expense.id,
        status: expense.status.into(),
        supervised_by: expense.supervised_by,
        montant: expense.montant,
        description: expense.description.clone(),
    }
}

async fn lock_expense(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<expenses::Model, RepositoryError> {
    expenses::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(RepositoryError::not_found("Dépense", id))
}

async fn check_attachment<C: ConnectionTrait>(
    conn: &C,
    budget_id: Uuid,
    line_id: Uuid,
    montant: Decimal,
) -> Result<(), RepositoryError> {
    let budget = budgets::Entity::find_by_id(budget_id)
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::Invalid("Budget introuvable.".to_string()))?;
    let line = budget_lines::Entity::find_by_id(line_id)
        .one(conn)
        .await?
        .ok_or_else(|| RepositoryError::Invalid("Ligne budgétaire introuvable.".to_string()))?;
    LedgerService::check_expense(budget.status.into(), budget.id, line.budget_id, montant)?;
    Ok(())
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists expenses with their line, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &ExpenseFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ExpenseWithLine>, u64), RepositoryError> {
        let mut query = expenses::Entity::find();
        if let Some(budget_id) = filter.budget_id {
            query = query.filter(expenses::Column::BudgetId.eq(budget_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                expenses::Column::Status.eq(sea_orm_active_enums::ValidationStatus::from(status)),
            );
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .offset(offset)
            .limit(limit)
            .find_also_related(budget_lines::Entity)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets an expense with its line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expense does not exist.
    pub async fn get(&self, id: Uuid) -> Result<ExpenseWithLine, RepositoryError> {
        expenses::Entity::find_by_id(id)
            .find_also_related(budget_lines::Entity)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Dépense", id))
    }

    /// Records a pending expense.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::BudgetClosed`, `BudgetError::LineBudgetMismatch`
    /// or `BudgetError::NonPositiveAmount`.
    pub async fn create(
        &self,
        input: CreateExpenseInput,
        actor: &ActingUser,
    ) -> Result<expenses::Model, RepositoryError> {
        check_attachment(&self.db, input.budget_id, input.line_id, input.montant).await?;

        let now = Utc::now();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_id: Set(input.budget_id),
            line_id: Set(input.line_id),
            expense_type: Set(input.expense_type),
            category: Set(input.category),
            montant: Set(input.montant),
            description: Set(input.description),
            status: Set(sea_orm_active_enums::ValidationStatus::EnAttente),
            supervised_by: Set(None),
            supervised_at: Set(None),
            validated_by: Set(None),
            validated_at: Set(None),
            spent_on: Set(input.spent_on.unwrap_or_else(|| now.date_naive())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(expense_id = %expense.id, montant = %expense.montant, actor = %actor.id, "Expense recorded");
        Ok(expense)
    }

    /// Updates a pending expense.
    ///
    /// The row is locked for the whole update so a concurrent decision either
    /// sees the new amount or makes the update fail with `NotEditable`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` once the expense left pending,
    /// or the same errors as [`Self::create`].
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateExpenseInput,
        actor: &ActingUser,
    ) -> Result<expenses::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, id).await?;
        WorkflowService::ensure_editable(expense.status.into(), "Dépense")?;

        let budget_id = input.budget_id.unwrap_or(expense.budget_id);
        let line_id = input.line_id.unwrap_or(expense.line_id);
        let montant = input.montant.unwrap_or(expense.montant);
        check_attachment(&txn, budget_id, line_id, montant).await?;

        let mut active: expenses::ActiveModel = expense.into();
        active.budget_id = Set(budget_id);
        active.line_id = Set(line_id);
        active.montant = Set(montant);
        if let Some(expense_type) = input.expense_type {
            active.expense_type = Set(expense_type);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(spent_on) = input.spent_on {
            active.spent_on = Set(spent_on);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(expense_id = %id, actor = %actor.id, "Expense updated");
        Ok(updated)
    }

    /// Deletes a pending expense.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` once the expense left pending.
    pub async fn delete(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, id).await?;
        WorkflowService::ensure_editable(expense.status.into(), "Dépense")?;
        expense.delete(&txn).await?;
        txn.commit().await?;
        info!(expense_id = %id, actor = %actor.id, "Expense deleted");
        Ok(())
    }

    /// Records the supervision of a pending expense.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotPermitted` unless the actor is a CSA,
    /// `WorkflowError::AlreadySupervised` or `WorkflowError::AlreadyProcessed`.
    pub async fn supervise(
        &self,
        id: Uuid,
        actor: &ActingUser,
    ) -> Result<expenses::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, id).await?;
        let action = WorkflowService::supervise_expense(&snapshot(&expense), actor)?;

        let mut active: expenses::ActiveModel = expense.into();
        active.supervised_by = Set(Some(action.supervised_by));
        active.supervised_at = Set(Some(action.supervised_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::append(&txn, actor.id, action.audit).await?;
        NotificationRepository::deliver(&txn, &action.notices).await?;
        txn.commit().await?;

        info!(expense_id = %id, supervised_by = %actor.id, "Expense supervised");
        Ok(updated)
    }

    /// Validates or rejects a supervised expense.
    ///
    /// Validation debits the budget's available balance, read under lock. The
    /// status, balance, journal entry and notifications commit together.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotPermitted` unless the actor is a director,
    /// `WorkflowError::AlreadyProcessed`, `WorkflowError::NotSupervised` or
    /// `BudgetError::InsufficientFunds`.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: ValidationDecision,
        actor: &ActingUser,
    ) -> Result<expenses::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, id).await?;
        let budget = lock_budget(&txn, expense.budget_id).await?;

        let action =
            WorkflowService::decide_expense(&snapshot(&expense), decision, actor, balance_of(&budget))?;

        if let BalanceEffect::DebitBudget(after) = action.effect {
            write_balance(&txn, budget, after).await?;
        }

        let mut active: expenses::ActiveModel = expense.into();
        active.status = Set(action.new_status.into());
        active.validated_by = Set(Some(action.decided_by));
        active.validated_at = Set(Some(action.decided_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::append(&txn, actor.id, action.audit).await?;
        NotificationRepository::deliver(&txn, &action.notices).await?;
        txn.commit().await?;

        info!(
            expense_id = %id,
            status = %action.new_status,
            decided_by = %actor.id,
            "Expense decided"
        );
        Ok(updated)
    }
}
