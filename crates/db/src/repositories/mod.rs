//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Operations that move a balance run inside one transaction together with
//! their journal entry and notifications.

pub mod audit;
pub mod budget;
pub mod budget_line;
pub mod error;
pub mod expense;
pub mod expense_request;
pub mod notification;
pub mod purchase_order;
pub mod report;
pub mod supplier;
pub mod two_factor;
pub mod user;

pub use audit::{AuditEntry, AuditFilter, AuditRepository};
pub use budget::{
    BudgetDetails, BudgetRepository, CreateBudgetInput, CreateRevenueInput, UpdateBudgetInput,
    UpdateRevenueInput,
};
pub use budget_line::{BudgetLineRepository, CreateLineInput, UpdateLineInput};
pub use error::RepositoryError;
pub use expense::{
    CreateExpenseInput, ExpenseFilter, ExpenseRepository, ExpenseWithLine, UpdateExpenseInput,
};
pub use expense_request::{
    CreateRequestInput, ExpenseRequestRepository, RequestWithUser, UpdateRequestInput,
};
pub use notification::NotificationRepository;
pub use purchase_order::{CreateOrderInput, OrderFilter, PurchaseOrderRepository, UpdateOrderInput};
pub use report::{CreateReportInput, ReportRepository, UpdateReportInput};
pub use supplier::{SupplierInput, SupplierRepository};
pub use two_factor::TwoFactorRepository;
pub use user::{CreateUserInput, UserRepository};
