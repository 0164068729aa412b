//! Shared fixtures for HTTP tests.
//!
//! Each test drives a fresh router backed by its own in-memory SQLite
//! database and in-memory report storage.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

use budgetaire_api::{AppState, create_router};
use budgetaire_core::auth::{Role, hash_password};
use budgetaire_core::storage::StorageService;
use budgetaire_db::{UserRepository, migration::Migrator, repositories::CreateUserInput};
use budgetaire_shared::{EmailConfig, EmailService, JwtConfig, JwtService};

pub const PASSWORD: &str = "motdepasse-solide";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// A registered account and an access token for it.
pub struct Account {
    pub id: uuid::Uuid,
    pub email: String,
    pub token: String,
}

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations apply");
    db
}

pub async fn spawn_app() -> TestApp {
    let state = AppState {
        db: Arc::new(setup_db().await),
        jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        email_service: Arc::new(EmailService::new(EmailConfig::default())),
        storage: Arc::new(StorageService::in_memory().expect("memory storage")),
        code_ttl_secs: 300,
    };
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn account(&self, email: &str, role: Role) -> Account {
        let user = UserRepository::new((*self.state.db).clone())
            .create(CreateUserInput {
                email: email.to_string(),
                nom: email.split('@').next().unwrap_or(email).to_string(),
                role,
                password_hash: hash_password(PASSWORD).expect("hash"),
            })
            .await
            .expect("user created");
        let token = self
            .state
            .jwt_service
            .generate_access_token(user.id, role.as_str())
            .expect("token");
        Account {
            id: user.id,
            email: user.email,
            token,
        }
    }

    /// Sends a request and returns the status with the JSON body
    /// (`Value::Null` for an empty body).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router")
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }
}

/// Reads a decimal field, serialized either as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

/// Extracts the `id` of a created resource.
pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id field").to_string()
}
