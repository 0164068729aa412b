//! API route definitions.

use axum::{Router, middleware};

use budgetaire_shared::types::{PageRequest, PageResponse};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod budgets;
pub mod expense_requests;
pub mod expenses;
pub mod health;
pub mod journal;
pub mod lines;
pub mod notifications;
pub mod orders;
pub mod reports;
pub mod revenues;
pub mod suppliers;
pub mod users;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require an access token
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(budgets::routes())
        .merge(revenues::routes())
        .merge(lines::routes())
        .merge(expenses::routes())
        .merge(expense_requests::routes())
        .merge(suppliers::routes())
        .merge(orders::routes())
        .merge(reports::routes())
        .merge(journal::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Builds a page from repository output, converting each row.
pub(crate) fn page_of<M, T>(
    page: &PageRequest,
    (rows, total): (Vec<M>, u64),
    convert: impl FnMut(M) -> T,
) -> PageResponse<T> {
    PageResponse::new(
        rows.into_iter().map(convert).collect(),
        page.page,
        page.per_page,
        total,
    )
}
