//! Purchase order repository.
//!
//! The total is always computed here from quantity and unit price; validating
//! an order draws it from the order's budget line.

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
    BalanceEffect, OrderSnapshot, ValidationDecision, ValidationStatus, WorkflowService,
};

use crate::entities::{budget_lines, purchase_orders, sea_orm_active_enums, suppliers};

use super::{AuditRepository, RepositoryError};

/// Fields of a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    /// Unique reference.
    pub reference: String,
    /// What is ordered.
    pub designation: String,
    /// Supplier.
    pub supplier_id: Uuid,
    /// Line the order draws from.
    pub line_id: Uuid,
    /// Quantity, strictly positive.
    pub quantite: i32,
    /// Unit price, not negative.
    pub prix_unitaire: Decimal,
    /// Order date, today unless given.
    pub ordered_on: Option<NaiveDate>,
}

/// Order fields that may change while pending.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrderInput {
    /// New reference.
    pub reference: Option<String>,
    /// New designation.
    pub designation: Option<String>,
    /// New supplier.
    pub supplier_id: Option<Uuid>,
    /// New line.
    pub line_id: Option<Uuid>,
    /// New quantity.
    pub quantite: Option<i32>,
    /// New unit price.
    pub prix_unitaire: Option<Decimal>,
    /// New date.
    pub ordered_on: Option<NaiveDate>,
}

/// Filters accepted by the order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only this line's orders.
    pub line_id: Option<Uuid>,
    /// Only this supplier's orders.
    pub supplier_id: Option<Uuid>,
    /// Only orders in this status.
    pub status: Option<ValidationStatus>,
}

fn snapshot(order: &purchase_orders::Model) -> OrderSnapshot {
    OrderSnapshot {
        id: order.id,
        reference: order.reference.clone(),
        status: order.status.into(),
        quantite: order.quantite,
        prix_unitaire: order.prix_unitaire,
    }
}

async fn check_references<C: ConnectionTrait>(
    conn: &C,
    reference: &str,
    except: Option<Uuid>,
    supplier_id: Uuid,
    line_id: Uuid,
) -> Result<(), RepositoryError> {
    if reference.trim().is_empty() {
        return Err(RepositoryError::Invalid(
            "La référence est obligatoire.".to_string(),
        ));
    }
    let mut taken = purchase_orders::Entity::find()
        .filter(purchase_orders::Column::Reference.eq(reference));
    if let Some(id) = except {
        taken = taken.filter(purchase_orders::Column::Id.ne(id));
    }
    if taken.count(conn).await? > 0 {
        return Err(RepositoryError::Duplicate(format!(
            "La référence {reference} existe déjà."
        )));
    }
    if suppliers::Entity::find_by_id(supplier_id)
        .one(conn)
        .await?
        .is_none()
    {
        return Err(RepositoryError::Invalid("Fournisseur introuvable.".to_string()));
    }
    if budget_lines::Entity::find_by_id(line_id)
        .one(conn)
        .await?
        .is_none()
    {
        return Err(RepositoryError::Invalid(
            "Ligne budgétaire introuvable.".to_string(),
        ));
    }
    Ok(())
}

async fn lock_order(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<purchase_orders::Model, RepositoryError> {
    purchase_orders::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(RepositoryError::not_found("Commande", id))
}

/// Purchase order repository.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    db: DatabaseConnection,
}

impl PurchaseOrderRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<purchase_orders::Model>, u64), RepositoryError> {
        let mut query = purchase_orders::Entity::find();
        if let Some(line_id) = filter.line_id {
            query = query.filter(purchase_orders::Column::LineId.eq(line_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_orders::Column::SupplierId.eq(supplier_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                purchase_orders::Column::Status
                    .eq(sea_orm_active_enums::ValidationStatus::from(status)),
            );
        }
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .order_by_desc(purchase_orders::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn get(&self, id: Uuid) -> Result<purchase_orders::Model, RepositoryError> {
        purchase_orders::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Commande", id))
    }

    /// Records a pending order with a server-computed total.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveQuantity`, `BudgetError::NegativeAmount`,
    /// `RepositoryError::Duplicate` for a taken reference, or
    /// `RepositoryError::Invalid` for an unknown supplier or line.
    pub async fn create(
        &self,
        input: CreateOrderInput,
        actor: &ActingUser,
    ) -> Result<purchase_orders::Model, RepositoryError> {
        let total = LedgerService::order_total(input.quantite, input.prix_unitaire)?;
        let reference = input.reference.trim().to_string();
        check_references(&self.db, &reference, None, input.supplier_id, input.line_id).await?;

        let now = Utc::now();
        let order = purchase_orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            reference: Set(reference),
            designation: Set(input.designation),
            supplier_id: Set(input.supplier_id),
            line_id: Set(input.line_id),
            quantite: Set(input.quantite),
            prix_unitaire: Set(input.prix_unitaire),
            total: Set(total),
            status: Set(sea_orm_active_enums::ValidationStatus::EnAttente),
            decided_by: Set(None),
            decided_at: Set(None),
            ordered_on: Set(input.ordered_on.unwrap_or_else(|| now.date_naive())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(order_id = %order.id, reference = %order.reference, total = %order.total, actor = %actor.id, "Purchase order created");
        Ok(order)
    }

    /// Updates a pending order, recomputing its total.
    ///
    /// The row is locked for the whole update so a concurrent decision either
    /// draws the new total or makes the update fail with `NotEditable`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` once the order left pending, or
    /// the same errors as [`Self::create`].
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateOrderInput,
        actor: &ActingUser,
    ) -> Result<purchase_orders::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let order = lock_order(&txn, id).await?;
        WorkflowService::ensure_editable(order.status.into(), "Commande")?;

        let quantite = input.quantite.unwrap_or(order.quantite);
        let prix_unitaire = input.prix_unitaire.unwrap_or(order.prix_unitaire);
        let total = LedgerService::order_total(quantite, prix_unitaire)?;
        let reference = input
            .reference
            .map_or_else(|| order.reference.clone(), |r| r.trim().to_string());
        let supplier_id = input.supplier_id.unwrap_or(order.supplier_id);
        let line_id = input.line_id.unwrap_or(order.line_id);
        check_references(&txn, &reference, Some(id), supplier_id, line_id).await?;

        let mut active: purchase_orders::ActiveModel = order.into();
        active.reference = Set(reference);
        active.supplier_id = Set(supplier_id);
        active.line_id = Set(line_id);
        active.quantite = Set(quantite);
        active.prix_unitaire = Set(prix_unitaire);
        active.total = Set(total);
        if let Some(designation) = input.designation {
            active.designation = Set(designation);
        }
        if let Some(ordered_on) = input.ordered_on {
            active.ordered_on = Set(ordered_on);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = %id, actor = %actor.id, "Purchase order updated");
        Ok(updated)
    }

    /// Deletes a pending order.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` once the order left pending.
    pub async fn delete(&self, id: Uuid, actor: &ActingUser) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let order = lock_order(&txn, id).await?;
        WorkflowService::ensure_editable(order.status.into(), "Commande")?;
        order.delete(&txn).await?;
        txn.commit().await?;
        info!(order_id = %id, actor = %actor.id, "Purchase order deleted");
        Ok(())
    }

    /// Validates or rejects a pending order.
    ///
    /// Validation draws the total from the line's allocation, read under lock.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotPermitted` unless the actor is an
    /// accountant, `WorkflowError::AlreadyProcessed` or
    /// `BudgetError::LineExhausted`; the line is then left untouched.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: ValidationDecision,
        actor: &ActingUser,
    ) -> Result<purchase_orders::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let order = lock_order(&txn, id).await?;
        let line = budget_lines::Entity::find_by_id(order.line_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::not_found("Ligne budgétaire", order.line_id))?;

        let action =
            WorkflowService::decide_order(&snapshot(&order), decision, actor, line.montant_alloue)?;

        if let BalanceEffect::ConsumeLine { remaining } = action.effect {
            let mut line: budget_lines::ActiveModel = line.into();
            line.montant_alloue = Set(remaining);
            line.updated_at = Set(Utc::now().into());
            line.update(&txn).await?;
        }

        let mut active: purchase_orders::ActiveModel = order.into();
        active.status = Set(action.new_status.into());
        active.decided_by = Set(Some(action.decided_by));
        active.decided_at = Set(Some(action.decided_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        AuditRepository::append(&txn, actor.id, action.audit).await?;
        txn.commit().await?;

        info!(
            order_id = %id,
            status = %action.new_status,
            total = %updated.total,
            decided_by = %actor.id,
            "Purchase order decided"
        );
        Ok(updated)
    }
}
