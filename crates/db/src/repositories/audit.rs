//! Audit journal repository.
//!
//! The journal is append-only: entries are written by the repositories that
//! perform workflow transitions, inside their own transactions, and read back
//! newest first.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entities::{audit_log, users};

/// Filters accepted by the journal listing.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only entries written by this user.
    pub user_id: Option<Uuid>,
    /// Substring of the action text.
    pub action: Option<String>,
    /// First day included.
    pub date_from: Option<NaiveDate>,
    /// Last day included.
    pub date_to: Option<NaiveDate>,
}

/// Journal entry joined with its author, if the author still exists.
pub type AuditEntry = (audit_log::Model, Option<users::Model>);

/// Audit journal repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry on `conn`, usually an open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        action: impl Into<String>,
    ) -> Result<audit_log::Model, DbErr> {
        audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(Some(user_id)),
            action: Set(action.into()),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
    }

    fn filtered(filter: &AuditFilter) -> Select<audit_log::Entity> {
        let mut query = audit_log::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(audit_log::Column::UserId.eq(user_id));
        }
        if let Some(action) = filter.action.as_deref().filter(|a| !a.is_empty()) {
            query = query.filter(audit_log::Column::Action.contains(action));
        }
        if let Some(from) = filter.date_from {
            let start = from.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(audit_log::Column::CreatedAt.gte(start));
        }
        if let Some(to) = filter.date_to.and_then(|d| d.checked_add_days(Days::new(1))) {
            let end = to.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(audit_log::Column::CreatedAt.lt(end));
        }
        query
    }

    /// Lists entries matching `filter`, newest first.
    ///
    /// Returns the page and the total number of matching entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &AuditFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditEntry>, u64), DbErr> {
        let total = Self::filtered(filter).count(&self.db).await?;
        let entries = Self::filtered(filter)
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .offset(offset)
            .limit(limit)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;
        Ok((entries, total))
    }

    /// Finds one entry with its author.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEntry>, DbErr> {
        audit_log::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
    }
}
