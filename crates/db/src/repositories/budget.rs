//! Budget repository: budgets and their recettes.
//!
//! Every write that moves a balance runs in one transaction that re-reads the
//! budget row with an exclusive lock, asks [`LedgerService`] for the new
//! balances and writes them back together with the audit entry.

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
use budgetaire_core::budget::{BudgetBalance, BudgetStatus, LedgerService};

use crate::entities::{
    budget_lines, budgets, expenses, revenues, sea_orm_active_enums::BudgetStatus as DbBudgetStatus,
};

use super::{AuditRepository, RepositoryError};

/// Fields of a new budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Fiscal year label, unique.
    pub exercice: String,
    /// Opening total; the whole of it starts available.
    pub montant_total: Decimal,
    /// Initial status, open unless given.
    pub status: Option<BudgetStatus>,
    /// Free text.
    pub description: Option<String>,
}

/// Budget fields that may change.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetInput {
    /// New fiscal year label.
    pub exercice: Option<String>,
    /// New total; the available balance moves by the same delta.
    pub montant_total: Option<Decimal>,
    /// New status.
    pub status: Option<BudgetStatus>,
    /// New description.
    pub description: Option<String>,
}

/// Fields of a new recette.
#[derive(Debug, Clone)]
pub struct CreateRevenueInput {
    /// Budget credited.
    pub budget_id: Uuid,
    /// Origin of the funds.
    pub source: String,
    /// Kind of revenue.
    pub revenue_type: String,
    /// Amount, strictly positive.
    pub montant: Decimal,
    /// Reception date, today unless given.
    pub received_on: Option<NaiveDate>,
}

/// Recette fields that may change. The budget cannot.
#[derive(Debug, Clone, Default)]
pub struct UpdateRevenueInput {
    /// New origin.
    pub source: Option<String>,
    /// New kind.
    pub revenue_type: Option<String>,
    /// New amount; both budget balances move by the difference.
    pub montant: Option<Decimal>,
    /// New reception date.
    pub received_on: Option<NaiveDate>,
}

/// A budget with everything attached to it.
#[derive(Debug, Clone)]
pub struct BudgetDetails {
    /// The budget row.
    pub budget: budgets::Model,
    /// Its recettes.
    pub recettes: Vec<revenues::Model>,
    /// Its expenses, whatever their status.
    pub depenses: Vec<expenses::Model>,
    /// Its lines.
    pub lignes: Vec<budget_lines::Model>,
}

/// Reads a budget row under an exclusive lock.
pub(crate) async fn lock_budget(
    txn: &DatabaseTransaction,
    budget_id: Uuid,
) -> Result<budgets::Model, RepositoryError> {
    budgets::Entity::find_by_id(budget_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(RepositoryError::not_found("Budget", budget_id))
}

/// The two balances of a budget row.
pub(crate) const fn balance_of(budget: &budgets::Model) -> BudgetBalance {
    BudgetBalance {
        montant_total: budget.montant_total,
        montant_disponible: budget.montant_disponible,
    }
}

/// Writes new balances on a budget row.
pub(crate) async fn write_balance<C: ConnectionTrait>(
    conn: &C,
    budget: budgets::Model,
    balance: BudgetBalance,
) -> Result<budgets::Model, RepositoryError> {
    let mut active: budgets::ActiveModel = budget.into();
    active.montant_total = Set(balance.montant_total);
    active.montant_disponible = Set(balance.montant_disponible);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Budget repository for budgets and recettes.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Budgets
    // ========================================================================

    /// Lists budgets, most recent fiscal year first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<budgets::Model>, u64), RepositoryError> {
        let total = budgets::Entity::find().count(&self.db).await?;
        let items = budgets::Entity::find()
            .order_by_desc(budgets::Column::Exercice)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a budget by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the budget does not exist.
    pub async fn get(&self, id: Uuid) -> Result<budgets::Model, RepositoryError> {
        budgets::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Budget", id))
    }

    /// Gets a budget with its recettes, expenses and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the budget does not exist.
    pub async fn get_details(&self, id: Uuid) -> Result<BudgetDetails, RepositoryError> {
        let budget = self.get(id).await?;
        let recettes = budget
            .find_related(revenues::Entity)
            .order_by_asc(revenues::Column::ReceivedOn)
            .all(&self.db)
            .await?;
        let depenses = budget
            .find_related(expenses::Entity)
            .order_by_asc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let lignes = budget
            .find_related(budget_lines::Entity)
            .order_by_asc(budget_lines::Column::Article)
            .all(&self.db)
            .await?;
        Ok(BudgetDetails {
            budget,
            recettes,
            depenses,
            lignes,
        })
    }

    async fn ensure_exercice_free(
        &self,
        exercice: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = budgets::Entity::find().filter(budgets::Column::Exercice.eq(exercice));
        if let Some(id) = except {
            query = query.filter(budgets::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(RepositoryError::Duplicate(format!(
                "Un budget existe déjà pour l'exercice {exercice}."
            )));
        }
        Ok(())
    }

    /// Creates a budget whose whole total is available.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the fiscal year already has a
    /// budget, or a budget error for a negative total.
    pub async fn create(
        &self,
        input: CreateBudgetInput,
        actor: &ActingUser,
    ) -> Result<budgets::Model, RepositoryError> {
        let exercice = input.exercice.trim().to_string();
        if exercice.is_empty() {
            return Err(RepositoryError::Invalid(
                "L'exercice est obligatoire.".to_string(),
            ));
        }
        self.ensure_exercice_free(&exercice, None).await?;
        let balance = LedgerService::open(input.montant_total)?;

        let now = Utc::now().into();
        let budget = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            exercice: Set(exercice),
            montant_total: Set(balance.montant_total),
            montant_disponible: Set(balance.montant_disponible),
            status: Set(input
                .status
                .map_or(DbBudgetStatus::Ouvert, DbBudgetStatus::from)),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(budget_id = %budget.id, exercice = %budget.exercice, actor = %actor.id, "Budget created");
        Ok(budget)
    }

    /// Updates a budget.
    ///
    /// A new total moves the available balance by the same delta.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::TotalBelowCommitted` when the cut exceeds the
    /// available balance, `RepositoryError::Duplicate` for a taken fiscal year.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateBudgetInput,
        actor: &ActingUser,
    ) -> Result<budgets::Model, RepositoryError> {
        let exercice = input.exercice.map(|e| e.trim().to_string());
        if let Some(exercice) = &exercice {
            self.ensure_exercice_free(exercice, Some(id)).await?;
        }

        let txn = self.db.begin().await?;
        let budget = lock_budget(&txn, id).await?;

        let balance = match input.montant_total {
            Some(total) => LedgerService::retotal(balance_of(&budget), total)?,
            None => balance_of(&budget),
        };

        let mut active: budgets::ActiveModel = budget.into();
        if let Some(exercice) = exercice {
            active.exercice = Set(exercice);
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.montant_total = Set(balance.montant_total);
        active.montant_disponible = Set(balance.montant_disponible);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(budget_id = %id, actor = %actor.id, "Budget updated");
        Ok(updated)
    }

    /// Deletes a budget with everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the budget does not exist.
    pub async fn delete(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let result = budgets::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found("Budget", id));
        }
        info!(budget_id = %id, actor = %actor.id, "Budget deleted");
        Ok(())
    }

    // ========================================================================
    // Recettes
    // ========================================================================

    /// Lists recettes, optionally for one budget, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_revenues(
        &self,
        budget_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<revenues::Model>, u64), RepositoryError> {
        let mut query = revenues::Entity::find();
        if let Some(budget_id) = budget_id {
            query = query.filter(revenues::Column::BudgetId.eq(budget_id));
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(revenues::Column::ReceivedOn)
            .order_by_desc(revenues::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a recette by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recette does not exist.
    pub async fn get_revenue(&self, id: Uuid) -> Result<revenues::Model, RepositoryError> {
        revenues::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Recette", id))
    }

    /// Records a recette and credits its budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveAmount` unless `montant > 0`,
    /// `RepositoryError::NotFound` for an unknown budget.
    pub async fn create_revenue(
        &self,
        input: CreateRevenueInput,
        actor: &ActingUser,
    ) -> Result<revenues::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let budget = lock_budget(&txn, input.budget_id).await?;
        let balance = LedgerService::add_revenue(balance_of(&budget), input.montant)?;

        let now = Utc::now();
        let revenue = revenues::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_id: Set(budget.id),
            source: Set(input.source),
            revenue_type: Set(input.revenue_type),
            montant: Set(input.montant),
            received_on: Set(input.received_on.unwrap_or_else(|| now.date_naive())),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let exercice = budget.exercice.clone();
        write_balance(&txn, budget, balance).await?;
        AuditRepository::append(
            &txn,
            actor.id,
            format!(
                "Recette {} AJOUTEE au budget {exercice} - {} F",
                revenue.id, revenue.montant
            ),
        )
        .await?;
        txn.commit().await?;

        info!(
            revenue_id = %revenue.id,
            budget_id = %revenue.budget_id,
            montant = %revenue.montant,
            "Revenue recorded"
        );
        Ok(revenue)
    }

    /// Updates a recette; a new amount moves both budget balances.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InsufficientFunds` when lowering the amount
    /// would take back money already committed.
    pub async fn update_revenue(
        &self,
        id: Uuid,
        input: UpdateRevenueInput,
        actor: &ActingUser,
    ) -> Result<revenues::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let revenue = revenues::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Recette", id))?;

        if let Some(montant) = input.montant {
            let budget = lock_budget(&txn, revenue.budget_id).await?;
            let balance =
                LedgerService::amend_revenue(balance_of(&budget), revenue.montant, montant)?;
            write_balance(&txn, budget, balance).await?;
        }

        let mut active: revenues::ActiveModel = revenue.into();
        if let Some(source) = input.source {
            active.source = Set(source);
        }
        if let Some(revenue_type) = input.revenue_type {
            active.revenue_type = Set(revenue_type);
        }
        if let Some(montant) = input.montant {
            active.montant = Set(montant);
        }
        if let Some(received_on) = input.received_on {
            active.received_on = Set(received_on);
        }
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(revenue_id = %id, actor = %actor.id, "Revenue updated");
        Ok(updated)
    }

    /// Deletes a recette and takes its amount back from the budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InsufficientFunds` if the money was already committed.
    pub async fn delete_revenue(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let revenue = revenues::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Recette", id))?;

        let budget = lock_budget(&txn, revenue.budget_id).await?;
        let balance = LedgerService::withdraw_revenue(balance_of(&budget), revenue.montant)?;
        write_balance(&txn, budget, balance).await?;
        revenue.delete(&txn).await?;

        txn.commit().await?;
        info!(revenue_id = %id, actor = %actor.id, "Revenue deleted");
        Ok(())
    }
}
