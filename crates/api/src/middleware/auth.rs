//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use budgetaire_core::auth::{ActingUser, Capability};
use budgetaire_db::UserRepository;
use budgetaire_shared::TokenKind;

use crate::{AppState, error::ApiError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates access tokens.
///
/// The token must be an access token and its subject an active account;
/// the account's current role and name are loaded from the database and
/// stored in the request extensions as an [`ActingUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_owned);

    match authenticate(&state, token.as_deref()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn authenticate(state: &AppState, token: Option<&str>) -> Result<ActingUser, ApiError> {
    let token = token.ok_or_else(|| ApiError::unauthorized("Authentification requise."))?;

    let claims = state.jwt_service.validate_kind(token, TokenKind::Access)?;

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(claims.user_id())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| {
            warn!(user_id = %claims.user_id(), "Token for unknown or disabled account");
            ApiError::unauthorized("Compte inconnu ou désactivé.")
        })?;

    Ok(ActingUser::new(user.id, user.role.into(), user.nom))
}

/// Extractor for the authenticated user.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> ApiResult<Json<Value>> {
///     auth.require(Capability::ManageFinance)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub ActingUser);

impl AuthUser {
    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> uuid::Uuid {
        self.0.id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> &ActingUser {
        &self.0
    }

    /// Fails with 403 unless the user's role holds the capability.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error for any other role.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.0.can(capability) {
            Ok(())
        } else {
            warn!(user_id = %self.0.id, role = %self.0.role, ?capability, "Operation refused for role");
            Err(ApiError::forbidden(format!(
                "Le rôle {} n'est pas autorisé à effectuer cette opération.",
                self.0.role
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActingUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentification requise."))
    }
}
