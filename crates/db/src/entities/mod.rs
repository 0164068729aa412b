//! `SeaORM` entity definitions.

pub mod prelude;

pub mod audit_log;
pub mod budget_lines;
pub mod budgets;
pub mod expense_requests;
pub mod expenses;
pub mod financial_reports;
pub mod notifications;
pub mod purchase_orders;
pub mod revenues;
pub mod sea_orm_active_enums;
pub mod suppliers;
pub mod two_factor_codes;
pub mod users;
