//! Initial database migration.
//!
//! Creates every table of the budget backend with its foreign keys and the
//! indexes used by the list endpoints.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        // ============================================================
        // USERS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Nom).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(Users::CreatedAt))
                    .col(timestamp(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // BUDGETS, RECETTES, LINES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Budgets::Exercice)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(money(backend, Budgets::MontantTotal))
                    .col(money(backend, Budgets::MontantDisponible))
                    .col(
                        ColumnDef::new(Budgets::Status)
                            .string_len(16)
                            .not_null()
                            .default("ouvert"),
                    )
                    .col(ColumnDef::new(Budgets::Description).text().null())
                    .col(timestamp(Budgets::CreatedAt))
                    .col(timestamp(Budgets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Revenues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Revenues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Revenues::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(Revenues::Source).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Revenues::RevenueType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(money(backend, Revenues::Montant))
                    .col(ColumnDef::new(Revenues::ReceivedOn).date().not_null())
                    .col(timestamp(Revenues::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_revenues_budget")
                            .from(Revenues::Table, Revenues::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetLines::BudgetId).uuid().not_null())
                    .col(
                        ColumnDef::new(BudgetLines::Article)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(money(backend, BudgetLines::MontantAlloue))
                    .col(timestamp(BudgetLines::CreatedAt))
                    .col(timestamp(BudgetLines::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_lines_budget")
                            .from(BudgetLines::Table, BudgetLines::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // EXPENSES AND REQUESTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::LineId).uuid().not_null())
                    .col(
                        ColumnDef::new(Expenses::ExpenseType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Category).string_len(100).not_null())
                    .col(money(backend, Expenses::Montant))
                    .col(
                        ColumnDef::new(Expenses::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(status(Expenses::Status))
                    .col(ColumnDef::new(Expenses::SupervisedBy).uuid().null())
                    .col(
                        ColumnDef::new(Expenses::SupervisedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Expenses::ValidatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Expenses::ValidatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Expenses::SpentOn).date().not_null())
                    .col(timestamp(Expenses::CreatedAt))
                    .col(timestamp(Expenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_budget")
                            .from(Expenses::Table, Expenses::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_line")
                            .from(Expenses::Table, Expenses::LineId)
                            .to(BudgetLines::Table, BudgetLines::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_supervisor")
                            .from(Expenses::Table, Expenses::SupervisedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_validator")
                            .from(Expenses::Table, Expenses::ValidatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseRequests::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExpenseRequests::Objet)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(money(backend, ExpenseRequests::MontantEstime))
                    .col(status(ExpenseRequests::Status))
                    .col(
                        ColumnDef::new(ExpenseRequests::DirectorComment)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(ExpenseRequests::DecidedBy).uuid().null())
                    .col(
                        ColumnDef::new(ExpenseRequests::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(ExpenseRequests::RequestedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_requests_user")
                            .from(ExpenseRequests::Table, ExpenseRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PURCHASING
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Suppliers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Suppliers::Nom).string_len(255).not_null())
                    .col(ColumnDef::new(Suppliers::Contact).string_len(255).null())
                    .col(ColumnDef::new(Suppliers::Telephone).string_len(50).null())
                    .col(ColumnDef::new(Suppliers::Email).string_len(255).null())
                    .col(ColumnDef::new(Suppliers::Adresse).text().null())
                    .col(timestamp(Suppliers::CreatedAt))
                    .col(timestamp(Suppliers::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::Reference)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::Designation)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::LineId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::Quantite).integer().not_null())
                    .col(money(backend, PurchaseOrders::PrixUnitaire))
                    .col(money(backend, PurchaseOrders::Total))
                    .col(status(PurchaseOrders::Status))
                    .col(ColumnDef::new(PurchaseOrders::DecidedBy).uuid().null())
                    .col(
                        ColumnDef::new(PurchaseOrders::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::OrderedOn).date().not_null())
                    .col(timestamp(PurchaseOrders::CreatedAt))
                    .col(timestamp(PurchaseOrders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supplier")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_line")
                            .from(PurchaseOrders::Table, PurchaseOrders::LineId)
                            .to(BudgetLines::Table, BudgetLines::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // REPORTS, JOURNAL, NOTIFICATIONS, 2FA
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(FinancialReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinancialReports::BudgetId).uuid().not_null())
                    .col(
                        ColumnDef::new(FinancialReports::Periode)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::ReportType)
                            .string_len(16)
                            .not_null()
                            .default("pdf"),
                    )
                    .col(
                        ColumnDef::new(FinancialReports::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialReports::StorageKey).text().null())
                    .col(ColumnDef::new(FinancialReports::GeneratedBy).uuid().null())
                    .col(timestamp(FinancialReports::GeneratedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_reports_budget")
                            .from(FinancialReports::Table, FinancialReports::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_financial_reports_user")
                            .from(FinancialReports::Table, FinancialReports::GeneratedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLog::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AuditLog::UserId).uuid().null())
                    .col(ColumnDef::new(AuditLog::Action).text().not_null())
                    .col(timestamp(AuditLog::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_log_user")
                            .from(AuditLog::Table, AuditLog::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(timestamp(Notifications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TwoFactorCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TwoFactorCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TwoFactorCodes::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TwoFactorCodes::CodeHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(timestamp(TwoFactorCodes::ExpiresAt))
                    .col(
                        ColumnDef::new(TwoFactorCodes::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(TwoFactorCodes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_two_factor_codes_user")
                            .from(TwoFactorCodes::Table, TwoFactorCodes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // INDEXES
        // ============================================================
        let indexes = [
            ("idx_revenues_budget", Revenues::Table.into_iden(), Revenues::BudgetId.into_iden()),
            ("idx_budget_lines_budget", BudgetLines::Table.into_iden(), BudgetLines::BudgetId.into_iden()),
            ("idx_expenses_budget", Expenses::Table.into_iden(), Expenses::BudgetId.into_iden()),
            ("idx_expenses_line", Expenses::Table.into_iden(), Expenses::LineId.into_iden()),
            ("idx_purchase_orders_line", PurchaseOrders::Table.into_iden(), PurchaseOrders::LineId.into_iden()),
            ("idx_expense_requests_user", ExpenseRequests::Table.into_iden(), ExpenseRequests::UserId.into_iden()),
            ("idx_notifications_user", Notifications::Table.into_iden(), Notifications::UserId.into_iden()),
            ("idx_audit_log_created", AuditLog::Table.into_iden(), AuditLog::CreatedAt.into_iden()),
            ("idx_two_factor_codes_user", TwoFactorCodes::Table.into_iden(), TwoFactorCodes::UserId.into_iden()),
        ];
        for (name, table, column) in indexes {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables = [
            TwoFactorCodes::Table.into_iden(),
            Notifications::Table.into_iden(),
            AuditLog::Table.into_iden(),
            FinancialReports::Table.into_iden(),
            PurchaseOrders::Table.into_iden(),
            Suppliers::Table.into_iden(),
            ExpenseRequests::Table.into_iden(),
            Expenses::Table.into_iden(),
            BudgetLines::Table.into_iden(),
            Revenues::Table.into_iden(),
            Budgets::Table.into_iden(),
            Users::Table.into_iden(),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

/// Largest decimal precision SQLite's schema builder accepts.
const SQLITE_MAX_PRECISION: u32 = 16;

/// Amount column: 18 digits with 2 decimals, narrowed to 16 on SQLite.
fn money<T: IntoIden>(backend: DbBackend, column: T) -> ColumnDef {
    let precision = if backend == DbBackend::Sqlite {
        SQLITE_MAX_PRECISION
    } else {
        18
    };
    ColumnDef::new(column)
        .decimal_len(precision, 2)
        .not_null()
        .to_owned()
}

fn timestamp<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn status<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .string_len(16)
        .not_null()
        .default("en_attente")
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Nom,
    Role,
    PasswordHash,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Exercice,
    MontantTotal,
    MontantDisponible,
    Status,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Revenues {
    Table,
    Id,
    BudgetId,
    Source,
    RevenueType,
    Montant,
    ReceivedOn,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BudgetLines {
    Table,
    Id,
    BudgetId,
    Article,
    MontantAlloue,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    BudgetId,
    LineId,
    ExpenseType,
    Category,
    Montant,
    Description,
    Status,
    SupervisedBy,
    SupervisedAt,
    ValidatedBy,
    ValidatedAt,
    SpentOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpenseRequests {
    Table,
    Id,
    UserId,
    Objet,
    MontantEstime,
    Status,
    DirectorComment,
    DecidedBy,
    DecidedAt,
    RequestedAt,
}

#[derive(DeriveIden)]
enum Suppliers {
    Table,
    Id,
    Nom,
    Contact,
    Telephone,
    Email,
    Adresse,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    Reference,
    Designation,
    SupplierId,
    LineId,
    Quantite,
    PrixUnitaire,
    Total,
    Status,
    DecidedBy,
    DecidedAt,
    OrderedOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FinancialReports {
    Table,
    Id,
    BudgetId,
    Periode,
    ReportType,
    FileName,
    StorageKey,
    GeneratedBy,
    GeneratedAt,
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    UserId,
    Action,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Message,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TwoFactorCodes {
    Table,
    Id,
    UserId,
    CodeHash,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}
