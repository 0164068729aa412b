//! Report metadata and PDF artifacts backed by in-memory storage.

mod common;

use rust_decimal_macros::dec;
use sea_orm::ConnectionTrait;

use budgetaire_core::reports::ReportError;
use budgetaire_core::storage::StorageService;
use budgetaire_core::workflow::ValidationDecision;
use budgetaire_db::repositories::{
    AuditFilter, AuditRepository, BudgetRepository, CreateExpenseInput, CreateOrderInput,
    CreateReportInput, CreateRevenueInput, ExpenseRepository, PurchaseOrderRepository,
    ReportRepository, RepositoryError, UpdateReportInput,
};

use common::{allocate, open_budget, setup_db, staff, supplier};

#[tokio::test]
async fn test_snapshot_collects_recettes_validated_expenses_and_orders() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let budget = open_budget(&db, &staff.comptable, "2026", dec!(100_000)).await;
    let line = allocate(&db, &staff.comptable, budget.id, "Fournitures", dec!(30_000)).await;

    BudgetRepository::new(db.clone())
        .create_revenue(
            CreateRevenueInput {
                budget_id: budget.id,
                source: "Mairie".to_string(),
                revenue_type: "subvention".to_string(),
                montant: dec!(10_000),
                received_on: None,
            },
            &staff.comptable,
        )
        .await
        .unwrap();

    let expenses = ExpenseRepository::new(db.clone());
    let mut ids = Vec::new();
    for montant in [dec!(2_000), dec!(3_000)] {
        let expense = expenses
            .create(
                CreateExpenseInput {
                    budget_id: budget.id,
                    line_id: line.id,
                    expense_type: "fonctionnement".to_string(),
                    category: "papeterie".to_string(),
                    montant,
                    description: "Stylos".to_string(),
                    spent_on: None,
                },
                &staff.comptable,
            )
            .await
            .unwrap();
        ids.push(expense.id);
    }
    expenses.supervise(ids[0], &staff.csa).await.unwrap();
    expenses
        .decide(ids[0], ValidationDecision::Validate, &staff.directeur)
        .await
        .unwrap();

    let fournisseur = supplier(&db, "Papeterie Moderne").await;
    PurchaseOrderRepository::new(db.clone())
        .create(
            CreateOrderInput {
                reference: "BC-R1".to_string(),
                designation: "Classeurs".to_string(),
                supplier_id: fournisseur.id,
                line_id: line.id,
                quantite: 4,
                prix_unitaire: dec!(250),
                ordered_on: None,
            },
            &staff.comptable,
        )
        .await
        .unwrap();

    let snapshot = ReportRepository::new(db.clone())
        .snapshot(budget.id, Some("T1"), &staff.csa)
        .await
        .unwrap();
    assert_eq!(snapshot.periode, "T1");
    assert_eq!(snapshot.budget.exercice, "2026");
    assert_eq!(snapshot.budget.montant_disponible, dec!(78_000));
    assert_eq!(snapshot.recettes.len(), 1);
    assert_eq!(snapshot.depenses.len(), 1);
    assert_eq!(snapshot.depenses[0].montant, dec!(2_000));
    assert_eq!(snapshot.commandes.len(), 1);
    assert_eq!(snapshot.commandes[0].total, dec!(1_000));
    assert_eq!(snapshot.genere_par_role, "CSA");
}

#[tokio::test]
async fn test_generate_then_download() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let storage = StorageService::in_memory().unwrap();
    let reports = ReportRepository::new(db.clone());
    let budget = open_budget(&db, &staff.comptable, "2026", dec!(50_000)).await;

    let report = reports
        .generate(&storage, budget.id, None, &staff.directeur)
        .await
        .unwrap();
    assert_eq!(report.report_type, "pdf");
    assert_eq!(report.file_name, format!("rapport_2026_{}.pdf", report.periode));
    assert_eq!(report.generated_by, Some(staff.directeur.id));
    let key = report.storage_key.clone().unwrap();
    assert!(storage.exists(&key).await);

    let (found, object) = reports.download(&storage, report.id).await.unwrap();
    assert_eq!(found.id, report.id);
    assert!(object.bytes.starts_with(b"%PDF-"));

    let (entries, _) = AuditRepository::new(db.clone())
        .list(
            &AuditFilter {
                action: Some("GENERE".to_string()),
                ..AuditFilter::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    // A generated report is pinned.
    let err = reports
        .update(
            report.id,
            UpdateReportInput {
                periode: Some("T2".to_string()),
                ..UpdateReportInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Report(ReportError::ArtifactLocked)));
}

#[tokio::test]
async fn test_metadata_only_report_has_no_artifact() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let storage = StorageService::in_memory().unwrap();
    let reports = ReportRepository::new(db.clone());
    let budget = open_budget(&db, &staff.comptable, "2027", dec!(1_000)).await;

    let report = reports
        .create(
            CreateReportInput {
                budget_id: budget.id,
                periode: Some("Annuel".to_string()),
                report_type: None,
            },
            &staff.comptable,
        )
        .await
        .unwrap();
    assert_eq!(report.file_name, "rapport_2027_Annuel.pdf");
    assert!(report.storage_key.is_none());

    let updated = reports
        .update(
            report.id,
            UpdateReportInput {
                report_type: Some("xlsx".to_string()),
                ..UpdateReportInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.file_name, "rapport_2027_Annuel.xlsx");

    let err = reports.download(&storage, report.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Report(ReportError::NoArtifact(_))));

    let deleted = reports.delete(report.id).await.unwrap();
    assert_eq!(deleted.id, report.id);
    let err = reports.get(report.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Report(ReportError::ReportNotFound(_))));
}

#[tokio::test]
async fn test_report_on_unknown_budget() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let storage = StorageService::in_memory().unwrap();

    let err = ReportRepository::new(db.clone())
        .generate(&storage, uuid::Uuid::new_v4(), None, &staff.comptable)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Report(ReportError::BudgetNotFound(_))));
}

#[tokio::test]
async fn test_failed_journal_write_rolls_back_generation() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let storage = StorageService::in_memory().unwrap();
    let reports = ReportRepository::new(db.clone());
    let budget = open_budget(&db, &staff.comptable, "2026", dec!(20_000)).await;

    db.execute_unprepared(
        "CREATE TRIGGER journal_ferme BEFORE INSERT ON audit_log \
         BEGIN SELECT RAISE(ABORT, 'journal ferme'); END;",
    )
    .await
    .unwrap();

    let err = reports
        .generate(&storage, budget.id, Some("T3"), &staff.directeur)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Database(_)));

    let (rows, total) = reports.list(Some(budget.id), 0, 10).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 0);
    assert!(
        storage
            .list(&StorageService::budget_prefix(budget.id))
            .await
            .unwrap()
            .is_empty()
    );
}
