//! Entity re-exports.

pub use super::audit_log::Entity as AuditLog;
pub use super::budget_lines::Entity as BudgetLines;
pub use super::budgets::Entity as Budgets;
pub use super::expense_requests::Entity as ExpenseRequests;
pub use super::expenses::Entity as Expenses;
pub use super::financial_reports::Entity as FinancialReports;
pub use super::notifications::Entity as Notifications;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::revenues::Entity as Revenues;
pub use super::suppliers::Entity as Suppliers;
pub use super::two_factor_codes::Entity as TwoFactorCodes;
pub use super::users::Entity as Users;
