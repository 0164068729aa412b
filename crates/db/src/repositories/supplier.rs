//! Supplier repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{purchase_orders, suppliers};

use super::RepositoryError;

/// Supplier fields. On update, `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SupplierInput {
    /// Company name.
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

/// Supplier repository.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    db: DatabaseConnection,
}

impl SupplierRepository {
    /// Creates a new supplier repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists suppliers by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<suppliers::Model>, u64), RepositoryError> {
        let total = suppliers::Entity::find().count(&self.db).await?;
        let items = suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Nom)
            .order_by_asc(suppliers::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Gets a supplier by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    pub async fn get(&self, id: Uuid) -> Result<suppliers::Model, RepositoryError> {
        suppliers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Fournisseur", id))
    }

    /// Creates a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` without a name.
    pub async fn create(&self, input: SupplierInput) -> Result<suppliers::Model, RepositoryError> {
        let nom = input
            .nom
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RepositoryError::Invalid("Le nom est obligatoire.".to_string()))?;

        let now = Utc::now().into();
        let supplier = suppliers::ActiveModel {
            id: Set(Uuid::new_v4()),
            nom: Set(nom),
            contact: Set(input.contact),
            telephone: Set(input.telephone),
            email: Set(input.email),
            adresse: Set(input.adresse),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    /// Updates a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: SupplierInput,
    ) -> Result<suppliers::Model, RepositoryError> {
        let supplier = self.get(id).await?;
        let mut active: suppliers::ActiveModel = supplier.into();
        if let Some(nom) = input.nom.filter(|n| !n.trim().is_empty()) {
            active.nom = Set(nom);
        }
        if input.contact.is_some() {
            active.contact = Set(input.contact);
        }
        if input.telephone.is_some() {
            active.telephone = Set(input.telephone);
        }
        if input.email.is_some() {
            active.email = Set(input.email);
        }
        if input.adresse.is_some() {
            active.adresse = Set(input.adresse);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a supplier no order refers to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` while orders reference it.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let supplier = self.get(id).await?;
        let orders = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::SupplierId.eq(id))
            .count(&self.db)
            .await?;
        if orders > 0 {
            return Err(RepositoryError::InUse(
                "Ce fournisseur est référencé par des commandes.".to_string(),
            ));
        }
        supplier.delete(&self.db).await?;
        info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }
}
