//! Database seeder.
//!
//! Creates the first accountant account on an empty database so that
//! further accounts can be registered through the API. With the `demo`
//! argument it also adds a director, a supervisory agent and a small
//! budget to click through.
//!
//! Usage: cargo run --bin seeder [demo]
//!
//! Environment:
//!   DATABASE_URL             - connection string (required)
//!   SEED_ADMIN_EMAIL         - accountant e-mail (default comptable@budgetaire.local)
//!   SEED_ADMIN_NAME          - accountant display name
//!   SEED_ADMIN_PASSWORD      - accountant password (required)

use anyhow::{Context, bail};
use rust_decimal::Decimal;

use budgetaire_core::auth::{ActingUser, Role, hash_password};
use budgetaire_db::{
    BudgetLineRepository, BudgetRepository, SupplierRepository, UserRepository,
    repositories::{
        CreateBudgetInput, CreateLineInput, CreateRevenueInput, CreateUserInput, SupplierInput,
    },
};
use budgetaire_shared::config::DatabaseConfig;
use sea_orm::DatabaseConnection;

const DEMO_PASSWORD: &str = "demo-budgetaire";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let demo = std::env::args().nth(1).as_deref() == Some("demo");

    println!("Connecting to database...");
    let db = budgetaire_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    let users = UserRepository::new(db.clone());
    if users.count().await? > 0 {
        println!("Users already exist, skipping bootstrap.");
        return Ok(());
    }

    println!("Seeding first accountant...");
    let accountant = seed_accountant(&users).await?;

    if demo {
        println!("Seeding demo data...");
        seed_demo(&db, &users, &accountant).await?;
    }

    println!("Seeding complete!");
    Ok(())
}

async fn seed_accountant(users: &UserRepository) -> anyhow::Result<ActingUser> {
    let email = std::env::var("SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| "comptable@budgetaire.local".to_string());
    let nom = std::env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Comptable".to_string());
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?;
    if password.len() < 8 {
        bail!("SEED_ADMIN_PASSWORD must be at least 8 characters");
    }

    let user = users
        .create(CreateUserInput {
            email,
            nom,
            role: Role::Accountant,
            password_hash: hash_password(&password)?,
        })
        .await?;
    println!("  {} ({})", user.email, Role::Accountant);
    Ok(ActingUser::new(user.id, Role::Accountant, user.nom))
}

async fn seed_demo(
    db: &DatabaseConnection,
    users: &UserRepository,
    accountant: &ActingUser,
) -> anyhow::Result<()> {
    for (email, nom, role) in [
        ("directeur@budgetaire.local", "Directeur", Role::Director),
        ("csa@budgetaire.local", "Agent CSA", Role::SupervisoryAgent),
    ] {
        users
            .create(CreateUserInput {
                email: email.to_string(),
                nom: nom.to_string(),
                role,
                password_hash: hash_password(DEMO_PASSWORD)?,
            })
            .await?;
        println!("  {email} ({role}), password {DEMO_PASSWORD}");
    }

    let budgets = BudgetRepository::new(db.clone());
    let budget = budgets
        .create(
            CreateBudgetInput {
                exercice: "2025".to_string(),
                montant_total: Decimal::new(10_000_000, 0),
                status: None,
                description: Some("Budget de démonstration".to_string()),
            },
            accountant,
        )
        .await?;
    budgets
        .create_revenue(
            CreateRevenueInput {
                budget_id: budget.id,
                source: "Subvention de l'État".to_string(),
                revenue_type: "subvention".to_string(),
                montant: Decimal::new(2_500_000, 0),
                received_on: None,
            },
            accountant,
        )
        .await?;

    let lines = BudgetLineRepository::new(db.clone());
    for (article, montant) in [
        ("Fournitures scolaires", 1_500_000),
        ("Entretien des locaux", 800_000),
        ("Équipement informatique", 2_000_000),
    ] {
        lines
            .create(
                CreateLineInput {
                    budget_id: budget.id,
                    article: article.to_string(),
                    montant_alloue: Decimal::new(montant, 0),
                },
                accountant,
            )
            .await?;
    }

    SupplierRepository::new(db.clone())
        .create(SupplierInput {
            nom: Some("Papeterie Centrale".to_string()),
            contact: Some("Service commercial".to_string()),
            telephone: None,
            email: Some("contact@papeterie.example".to_string()),
            adresse: None,
        })
        .await?;

    println!("  budget {} with 3 lines and 1 supplier", budget.exercice);
    Ok(())
}
