//! Budget line repository.
//!
//! Allocating a line takes its amount out of the budget's available balance;
//! deleting an unused line gives the remainder back.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use budgetaire_core::auth::ActingUser;
use budgetaire_core::budget::{BudgetError, LedgerService};

use crate::entities::{budget_lines, expenses, purchase_orders};

use super::budget::{balance_of, lock_budget, write_balance};
use super::{AuditRepository, RepositoryError};

/// Fields of a new line.
#[derive(Debug, Clone)]
pub struct CreateLineInput {
    /// Budget the line draws from.
    pub budget_id: Uuid,
    /// Article or category earmarked.
    pub article: String,
    /// Allocation, strictly positive.
    pub montant_alloue: Decimal,
}

/// Line fields that may change.
#[derive(Debug, Clone, Default)]
pub struct UpdateLineInput {
    /// New article.
    pub article: Option<String>,
    /// New allocation; the budget absorbs the difference.
    pub montant_alloue: Option<Decimal>,
}

/// Budget line repository.
#[derive(Debug, Clone)]
pub struct BudgetLineRepository {
    db: DatabaseConnection,
}

impl BudgetLineRepository {
    /// Creates a new budget line repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists lines, optionally for one budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        budget_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<budget_lines::Model>, u64), RepositoryError> {
        let mut query = budget_lines::Entity::find();
        if let Some(budget_id) = budget_id {
            query = query.filter(budget_lines::Column::BudgetId.eq(budget_id));
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_asc(budget_lines::Column::Article)
            .order_by_asc(budget_lines::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a line by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    pub async fn get(&self, id: Uuid) -> Result<budget_lines::Model, RepositoryError> {
        budget_lines::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Ligne budgétaire", id))
    }

    /// Allocates a new line.
    ///
    /// Existing allocations plus the new one must fit in the available
    /// balance, read under lock.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::AllocationExceedsAvailable`,
    /// `BudgetError::BudgetClosed` or `BudgetError::NonPositiveAmount`; the
    /// budget is left untouched.
    pub async fn create(
        &self,
        input: CreateLineInput,
        actor: &ActingUser,
    ) -> Result<budget_lines::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let budget = lock_budget(&txn, input.budget_id).await?;

        let existing: Decimal = budget_lines::Entity::find()
            .filter(budget_lines::Column::BudgetId.eq(budget.id))
            .all(&txn)
            .await?
            .iter()
            .map(|line| line.montant_alloue)
            .sum();

        let balance = LedgerService::allocate_line(
            balance_of(&budget),
            budget.status.into(),
            existing,
            input.montant_alloue,
        )?;

        let now = Utc::now().into();
        let line = budget_lines::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_id: Set(budget.id),
            article: Set(input.article),
            montant_alloue: Set(input.montant_alloue),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let exercice = budget.exercice.clone();
        write_balance(&txn, budget, balance).await?;
        AuditRepository::append(
            &txn,
            actor.id,
            format!(
                "Ligne {} ALLOUEE sur le budget {exercice} - {} F",
                line.article, line.montant_alloue
            ),
        )
        .await?;
        txn.commit().await?;

        info!(
            line_id = %line.id,
            budget_id = %line.budget_id,
            montant_alloue = %line.montant_alloue,
            "Budget line allocated"
        );
        Ok(line)
    }

    /// Updates a line; a new allocation moves the budget by the difference.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::AllocationExceedsAvailable` when an increase
    /// does not fit.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateLineInput,
        actor: &ActingUser,
    ) -> Result<budget_lines::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let line = budget_lines::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Ligne budgétaire", id))?;

        if let Some(montant) = input.montant_alloue {
            let budget = lock_budget(&txn, line.budget_id).await?;
            let balance = LedgerService::reallocate_line(
                balance_of(&budget),
                budget.status.into(),
                line.montant_alloue,
                montant,
            )?;
            write_balance(&txn, budget, balance).await?;
        }

        let mut active: budget_lines::ActiveModel = line.into();
        if let Some(article) = input.article {
            active.article = Set(article);
        }
        if let Some(montant) = input.montant_alloue {
            active.montant_alloue = Set(montant);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(line_id = %id, actor = %actor.id, "Budget line updated");
        Ok(updated)
    }

    /// Deletes an unused line and returns its remaining allocation.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineInUse` while orders or expenses reference it.
    pub async fn delete(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let line = budget_lines::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Ligne budgétaire", id))?;

        let orders = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::LineId.eq(id))
            .count(&txn)
            .await?;
        let spent = expenses::Entity::find()
            .filter(expenses::Column::LineId.eq(id))
            .count(&txn)
            .await?;
        if orders > 0 || spent > 0 {
            return Err(BudgetError::LineInUse.into());
        }

        let budget = lock_budget(&txn, line.budget_id).await?;
        let balance = LedgerService::release_line(balance_of(&budget), line.montant_alloue);
        write_balance(&txn, budget, balance).await?;
        line.delete(&txn).await?;

        txn.commit().await?;
        info!(line_id = %id, actor = %actor.id, "Budget line deleted");
        Ok(())
    }
}
