//! Notification repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use budgetaire_core::auth::Role;
use budgetaire_core::workflow::{Notice, Recipient};

use crate::entities::{notifications, sea_orm_active_enums::UserRole, users};

use super::RepositoryError;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates one notification per active user holding `role`.
    ///
    /// Returns the number of notifications created.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn fan_out<C: ConnectionTrait>(
        conn: &C,
        role: Role,
        message: &str,
    ) -> Result<u64, DbErr> {
        let recipients: Vec<Uuid> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::Role.eq(UserRole::from(role)))
            .filter(users::Column::IsActive.eq(true))
            .into_tuple()
            .all(conn)
            .await?;

        if recipients.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = recipients.into_iter().map(|user_id| notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(now.into()),
        });
        notifications::Entity::insert_many(rows)
            .exec_without_returning(conn)
            .await
    }

    /// Creates a notification for a single user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn notify_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        message: &str,
    ) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
    }

    /// Persists every notice produced by a workflow decision.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    pub async fn deliver<C: ConnectionTrait>(conn: &C, notices: &[Notice]) -> Result<u64, DbErr> {
        let mut created = 0;
        for notice in notices {
            created += match notice.recipient {
                Recipient::Role(role) => Self::fan_out(conn, role, &notice.message).await?,
                Recipient::User(user_id) => {
                    Self::notify_user(conn, user_id, &notice.message).await?;
                    1
                }
            };
        }
        Ok(created)
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<notifications::Model>, u64), DbErr> {
        let query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id));
        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok((items, total))
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }

    /// Marks one of the user's notifications as read.
    ///
    /// Another user's notification is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or a database error.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<notifications::Model, RepositoryError> {
        let notification = notifications::Entity::find_by_id(id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::not_found("Notification", id))?;

        if notification.is_read {
            return Ok(notification);
        }
        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        Ok(active.update(&self.db).await?)
    }

    /// Marks all of the user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = notifications::Entity::update_many()
            .col_expr(
                notifications::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
