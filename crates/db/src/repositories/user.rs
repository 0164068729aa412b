//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use budgetaire_core::auth::Role;

use crate::entities::{sea_orm_active_enums::UserRole, users};

use super::RepositoryError;

/// Fields of a new account.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login e-mail, unique.
    pub email: String,
    /// Display name.
    pub nom: String,
    /// Role.
    pub role: Role,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the email is taken.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, RepositoryError> {
        if self.email_exists(&input.email).await? {
            return Err(RepositoryError::Duplicate(
                "Un utilisateur avec cet email existe déjà.".to_string(),
            ));
        }

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&input.email)),
            nom: Set(input.nom.trim().to_string()),
            role: Set(UserRole::from(input.role)),
            password_hash: Set(input.password_hash),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(user_id = %user.id, role = ?user.role, "User registered");
        Ok(user)
    }

    /// Lists users by creation date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<users::Model>, u64), DbErr> {
        let total = users::Entity::find().count(&self.db).await?;
        let items = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Counts users, used by the seeder to detect a fresh install.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        users::Entity::find().count(&self.db).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
