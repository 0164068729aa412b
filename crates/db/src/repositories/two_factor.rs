//! One-time login code repository.
//!
//! A user holds at most one live code: issuing a new one retires the others.
//! Only the SHA-256 digest is stored.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use budgetaire_core::auth::{OneTimeCode, verify_code};

use crate::entities::two_factor_codes;

/// Two-factor code repository.
#[derive(Debug, Clone)]
pub struct TwoFactorRepository {
    db: DatabaseConnection,
}

impl TwoFactorRepository {
    /// Creates a new two-factor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a freshly generated code, retiring any live one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn store(
        &self,
        user_id: Uuid,
        code: &OneTimeCode,
    ) -> Result<two_factor_codes::Model, DbErr> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        two_factor_codes::Entity::update_many()
            .col_expr(
                two_factor_codes::Column::UsedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(two_factor_codes::Column::UserId.eq(user_id))
            .filter(two_factor_codes::Column::UsedAt.is_null())
            .exec(&txn)
            .await?;

        let stored = two_factor_codes::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            code_hash: Set(code.code_hash.clone()),
            expires_at: Set(code.expires_at.into()),
            used_at: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(stored)
    }

    /// Consumes the user's live code if `submitted` matches it.
    ///
    /// Returns `false` when there is no live code, it expired, or it does
    /// not match. A code is accepted at most once even under concurrent calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn consume(&self, user_id: Uuid, submitted: &str) -> Result<bool, DbErr> {
        let code = two_factor_codes::Entity::find()
            .filter(two_factor_codes::Column::UserId.eq(user_id))
            .filter(two_factor_codes::Column::UsedAt.is_null())
            .order_by_desc(two_factor_codes::Column::CreatedAt)
            .one(&self.db)
            .await?;

        let Some(code) = code else {
            return Ok(false);
        };
        if !verify_code(submitted, &code.code_hash, code.expires_at.to_utc()) {
            return Ok(false);
        }

        let result = two_factor_codes::Entity::update_many()
            .col_expr(
                two_factor_codes::Column::UsedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(two_factor_codes::Column::Id.eq(code.id))
            .filter(two_factor_codes::Column::UsedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Deletes expired codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = two_factor_codes::Entity::delete_many()
            .filter(two_factor_codes::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
