//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own in-memory SQLite database with the schema applied.
//! The pool holds a single connection so the database lives as long as it.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use budgetaire_core::auth::{ActingUser, Role};
use budgetaire_db::entities::{budget_lines, budgets, suppliers};
use budgetaire_db::migration::Migrator;
use budgetaire_db::repositories::{
    BudgetLineRepository, BudgetRepository, CreateBudgetInput, CreateLineInput, CreateUserInput,
    SupplierInput, SupplierRepository, UserRepository,
};

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

/// One user per role.
pub struct Staff {
    pub comptable: ActingUser,
    pub directeur: ActingUser,
    pub csa: ActingUser,
}

pub async fn create_user(db: &DatabaseConnection, email: &str, role: Role) -> ActingUser {
    let user = UserRepository::new(db.clone())
        .create(CreateUserInput {
            email: email.to_string(),
            nom: email.split('@').next().unwrap_or(email).to_string(),
            role,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .expect("user created");
    ActingUser::new(user.id, role, user.nom)
}

pub async fn staff(db: &DatabaseConnection) -> Staff {
    Staff {
        comptable: create_user(db, "comptable@ecole.test", Role::Accountant).await,
        directeur: create_user(db, "directeur@ecole.test", Role::Director).await,
        csa: create_user(db, "csa@ecole.test", Role::SupervisoryAgent).await,
    }
}

pub async fn open_budget(
    db: &DatabaseConnection,
    actor: &ActingUser,
    exercice: &str,
    total: Decimal,
) -> budgets::Model {
    BudgetRepository::new(db.clone())
        .create(
            CreateBudgetInput {
                exercice: exercice.to_string(),
                montant_total: total,
                status: None,
                description: None,
            },
            actor,
        )
        .await
        .expect("budget created")
}

pub async fn allocate(
    db: &DatabaseConnection,
    actor: &ActingUser,
    budget_id: uuid::Uuid,
    article: &str,
    montant: Decimal,
) -> budget_lines::Model {
    BudgetLineRepository::new(db.clone())
        .create(
            CreateLineInput {
                budget_id,
                article: article.to_string(),
                montant_alloue: montant,
            },
            actor,
        )
        .await
        .expect("line allocated")
}

pub async fn supplier(db: &DatabaseConnection, nom: &str) -> suppliers::Model {
    SupplierRepository::new(db.clone())
        .create(SupplierInput {
            nom: Some(nom.to_string()),
            ..SupplierInput::default()
        })
        .await
        .expect("supplier created")
}

pub async fn reload_budget(db: &DatabaseConnection, id: uuid::Uuid) -> budgets::Model {
    BudgetRepository::new(db.clone())
        .get(id)
        .await
        .expect("budget exists")
}
