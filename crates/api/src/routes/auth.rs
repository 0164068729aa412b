//! Authentication routes: two-step login, code resend, token refresh and
//! account registration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use budgetaire_core::auth::{Capability, Role, generate_code, hash_password, verify_password};
use budgetaire_db::{TwoFactorRepository, UserRepository, entities::users, repositories::CreateUserInput};
use budgetaire_shared::TokenKind;
use budgetaire_shared::auth::{
    CodeSentResponse, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest,
    ResendCodeRequest, UserInfo, VerifyCodeRequest,
};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

use super::users::UserResponse;

const CODE_SENT: &str = "Un code de vérification a été envoyé à votre adresse e-mail.";

// ============================================================================
// Helper Functions
// ============================================================================

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Email ou mot de passe incorrect.")
}

fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        nom: user.nom.clone(),
        role: Role::from(user.role).as_str().to_string(),
    }
}

/// Issues a fresh one-time code for the user and sends it.
async fn issue_code(state: &AppState, user: &users::Model) -> ApiResult<()> {
    let code = generate_code(state.code_ttl_secs);
    TwoFactorRepository::new((*state.db).clone())
        .store(user.id, &code)
        .await?;

    state
        .email_service
        .send_two_factor_code(&user.email, &user.nom, &code.code, state.code_ttl_secs / 60)
        .await
        .map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to send one-time code");
            ApiError::from(e)
        })
}

async fn active_user(state: &AppState, email: &str) -> ApiResult<Option<users::Model>> {
    Ok(UserRepository::new((*state.db).clone())
        .find_by_email(email)
        .await?
        .filter(|u| u.is_active))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login/", post(login))
        .route("/login/2fa/", post(verify_code))
        .route("/2fa/resend/", post(resend_code))
        .route("/token/refresh/", post(refresh))
}

/// Creates the auth routes that need an access token.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/register/", post(register))
}

/// POST `/login/` - Check credentials and send a one-time code.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<CodeSentResponse>> {
    let Some(user) = active_user(&state, &payload.email).await? else {
        info!(email = %payload.email, "Login attempt for unknown or disabled account");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.mot_de_passe, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    issue_code(&state, &user).await?;
    info!(user_id = %user.id, "Credentials accepted, one-time code issued");

    Ok(Json(CodeSentResponse {
        message: CODE_SENT.to_string(),
        email: user.email,
    }))
}

/// POST `/login/2fa/` - Exchange a one-time code for tokens.
async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let rejected = || ApiError::unauthorized("Code invalide ou expiré.");

    let Some(user) = active_user(&state, &payload.email).await? else {
        return Err(rejected());
    };

    let accepted = TwoFactorRepository::new((*state.db).clone())
        .consume(user.id, payload.code.trim())
        .await?;
    if !accepted {
        warn!(user_id = %user.id, "Rejected one-time code");
        return Err(rejected());
    }

    let tokens = state
        .jwt_service
        .generate_pair(user.id, Role::from(user.role).as_str())?;

    info!(user_id = %user.id, "User logged in successfully");
    Ok(Json(LoginResponse::new(tokens, user_info(&user))))
}

/// POST `/2fa/resend/` - Send a new one-time code.
///
/// The answer is the same whether or not the address belongs to an account.
async fn resend_code(
    State(state): State<AppState>,
    Json(payload): Json<ResendCodeRequest>,
) -> ApiResult<Json<CodeSentResponse>> {
    match active_user(&state, &payload.email).await? {
        Some(user) => {
            issue_code(&state, &user).await?;
            info!(user_id = %user.id, "One-time code reissued");
        }
        None => info!(email = %payload.email, "Code resend for unknown account"),
    }

    Ok(Json(CodeSentResponse {
        message: CODE_SENT.to_string(),
        email: payload.email,
    }))
}

/// POST `/token/refresh/` - Issue a new access token from a refresh token.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let claims = state
        .jwt_service
        .validate_kind(&payload.refresh, TokenKind::Refresh)?;

    // Role is re-read so a changed role takes effect on refresh.
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(claims.user_id())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Compte inconnu ou désactivé."))?;

    let access = state
        .jwt_service
        .generate_access_token(user.id, Role::from(user.role).as_str())?;

    Ok(Json(json!({
        "access": access,
        "expires_in": state.jwt_service.access_token_expires_in(),
    })))
}

/// POST `/register/` - Create an account.
async fn register(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    auth.require(Capability::ManageUsers)?;

    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::validation(format!("Rôle inconnu : {}", payload.role)))?;
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(ApiError::validation("Adresse e-mail invalide."));
    }
    if payload.nom.trim().is_empty() {
        return Err(ApiError::validation("Le nom est obligatoire."));
    }
    if payload.mot_de_passe.len() < 8 {
        return Err(ApiError::validation(
            "Le mot de passe doit contenir au moins 8 caractères.",
        ));
    }

    let password_hash = hash_password(&payload.mot_de_passe)?;
    let user = UserRepository::new((*state.db).clone())
        .create(CreateUserInput {
            email: payload.email,
            nom: payload.nom,
            role,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, registered_by = %auth.user_id(), "New user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}
