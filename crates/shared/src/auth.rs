//! Authentication types for JWT and the login exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Accepted by the auth middleware.
    Access,
    /// Accepted only by the refresh endpoint.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User's role label (`Comptable`, `Directeur`, `CSA`).
    pub role: String,
    /// Token kind.
    pub typ: TokenKind,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, role: &str, typ: TokenKind, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            typ,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns true for access tokens.
    #[must_use]
    pub fn is_access(&self) -> bool {
        self.typ == TokenKind::Access
    }
}

/// Token pair returned after the second login step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access: String,
    /// Refresh token (long-lived).
    pub refresh: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access: String, refresh: String, expires_in: i64) -> Self {
        Self {
            access,
            refresh,
            expires_in,
        }
    }
}

/// First login step payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub mot_de_passe: String,
}

/// Second login step payload.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    /// User email.
    pub email: String,
    /// Six-digit one-time code.
    pub code: String,
}

/// Request a fresh one-time code.
#[derive(Debug, Clone, Deserialize)]
pub struct ResendCodeRequest {
    /// User email.
    pub email: String,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// Display name.
    pub nom: String,
    /// Role label.
    pub role: String,
    /// Plain password.
    pub mot_de_passe: String,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh: String,
}

/// Answer to the first login step and to code resends.
#[derive(Debug, Clone, Serialize)]
pub struct CodeSentResponse {
    /// Human-readable message.
    pub message: String,
    /// Address the code was sent to.
    pub email: String,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// Display name.
    pub nom: String,
    /// Role label.
    pub role: String,
}

/// Answer to the second login step.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Access token.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
    /// Authenticated user.
    pub user: UserInfo,
}

impl LoginResponse {
    /// Combines a token pair with the user it was issued for.
    #[must_use]
    pub fn new(tokens: TokenPair, user: UserInfo) -> Self {
        Self {
            access: tokens.access,
            refresh: tokens.refresh,
            expires_in: tokens.expires_in,
            user,
        }
    }
}
