//! Supervision, validation and request decisions, with their journal entries
//! and notifications.

mod common;

use rust_decimal_macros::dec;

use budgetaire_core::auth::Role;
use budgetaire_core::workflow::{RequestDecision, ValidationDecision, WorkflowError};
use budgetaire_db::entities::{budgets, expenses, sea_orm_active_enums::RequestStatus};
use budgetaire_db::repositories::{
    AuditFilter, AuditRepository, CreateExpenseInput, CreateRequestInput, ExpenseRepository,
    ExpenseRequestRepository, NotificationRepository, RepositoryError, UpdateExpenseInput,
    UpdateRequestInput,
};
use sea_orm::DatabaseConnection;

use common::{Staff, allocate, create_user, open_budget, setup_db, staff};

async fn pending_expense(db: &DatabaseConnection, staff: &Staff) -> (budgets::Model, expenses::Model) {
    let budget = open_budget(db, &staff.comptable, "2026", dec!(100_000)).await;
    let line = allocate(db, &staff.comptable, budget.id, "Fournitures", dec!(20_000)).await;
    let expense = ExpenseRepository::new(db.clone())
        .create(
            CreateExpenseInput {
                budget_id: budget.id,
                line_id: line.id,
                expense_type: "fonctionnement".to_string(),
                category: "papeterie".to_string(),
                montant: dec!(5_000),
                description: "Cahiers".to_string(),
                spent_on: None,
            },
            &staff.comptable,
        )
        .await
        .expect("expense recorded");
    (budget, expense)
}

// ============================================================================
// Expense workflow
// ============================================================================

#[tokio::test]
async fn test_validation_requires_supervision() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let (_, expense) = pending_expense(&db, &staff).await;

    let err = ExpenseRepository::new(db.clone())
        .decide(expense.id, ValidationDecision::Validate, &staff.directeur)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Workflow(WorkflowError::NotSupervised)));
}

#[tokio::test]
async fn test_only_csa_supervises_and_only_once() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let (_, expense) = pending_expense(&db, &staff).await;
    let repo = ExpenseRepository::new(db.clone());

    let err = repo.supervise(expense.id, &staff.directeur).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::NotPermitted { .. })
    ));

    repo.supervise(expense.id, &staff.csa).await.unwrap();
    let err = repo.supervise(expense.id, &staff.csa).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::AlreadySupervised)
    ));
}

#[tokio::test]
async fn test_only_director_validates_expenses() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let (_, expense) = pending_expense(&db, &staff).await;
    let repo = ExpenseRepository::new(db.clone());
    repo.supervise(expense.id, &staff.csa).await.unwrap();

    for actor in [&staff.comptable, &staff.csa] {
        let err = repo
            .decide(expense.id, ValidationDecision::Validate, actor)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Workflow(WorkflowError::NotPermitted { .. })
        ));
    }
}

#[tokio::test]
async fn test_decided_expense_is_final() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let (budget, expense) = pending_expense(&db, &staff).await;
    let repo = ExpenseRepository::new(db.clone());
    repo.supervise(expense.id, &staff.csa).await.unwrap();
    repo.decide(expense.id, ValidationDecision::Validate, &staff.directeur)
        .await
        .unwrap();

    let err = repo
        .decide(expense.id, ValidationDecision::Reject, &staff.directeur)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::AlreadyProcessed { .. })
    ));

    let err = repo
        .update(
            expense.id,
            UpdateExpenseInput {
                montant: Some(dec!(1)),
                ..UpdateExpenseInput::default()
            },
            &staff.comptable,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::NotEditable { .. })
    ));

    let err = repo.delete(expense.id, &staff.comptable).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::NotEditable { .. })
    ));

    // Debited exactly once.
    assert_eq!(
        common::reload_budget(&db, budget.id).await.montant_disponible,
        dec!(75_000)
    );
}

#[tokio::test]
async fn test_supervision_and_validation_notify_and_journal() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let second_director = create_user(&db, "adjoint@ecole.test", Role::Director).await;
    let (_, expense) = pending_expense(&db, &staff).await;
    let repo = ExpenseRepository::new(db.clone());
    let notifications = NotificationRepository::new(db.clone());

    repo.supervise(expense.id, &staff.csa).await.unwrap();
    for director in [&staff.directeur, &second_director] {
        let (items, total) = notifications.list_for_user(director.id, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert!(items[0].message.contains("Cahiers"));
        assert!(!items[0].is_read);
    }
    assert_eq!(notifications.unread_count(staff.comptable.id).await.unwrap(), 0);

    repo.decide(expense.id, ValidationDecision::Validate, &staff.directeur)
        .await
        .unwrap();
    assert_eq!(notifications.unread_count(staff.comptable.id).await.unwrap(), 1);

    let (entries, _) = AuditRepository::new(db.clone())
        .list(
            &AuditFilter {
                action: Some(expense.id.to_string()),
                ..AuditFilter::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|(e, _)| e.action.contains("SUPERVISEE")));
    assert!(entries.iter().any(|(e, _)| e.action.contains("VALIDEE")));
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_request_approval_notifies_accountants() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let requests = ExpenseRequestRepository::new(db.clone());
    let notifications = NotificationRepository::new(db.clone());

    let request = requests
        .create(
            CreateRequestInput {
                objet: "Achat de craies".to_string(),
                montant_estime: dec!(15_000),
            },
            &staff.csa,
        )
        .await
        .unwrap();
    assert_eq!(request.user_id, staff.csa.id);
    assert_eq!(request.status, RequestStatus::EnAttente);

    let approved = requests
        .decide(
            request.id,
            RequestDecision::Approve,
            Some("Accordé".to_string()),
            &staff.directeur,
        )
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approuvee);
    assert_eq!(approved.director_comment.as_deref(), Some("Accordé"));
    assert_eq!(approved.decided_by, Some(staff.directeur.id));

    assert_eq!(notifications.unread_count(staff.comptable.id).await.unwrap(), 1);
    assert_eq!(notifications.unread_count(staff.csa.id).await.unwrap(), 0);

    let err = requests
        .decide(request.id, RequestDecision::Refuse, None, &staff.directeur)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Workflow(WorkflowError::AlreadyProcessed { .. })
    ));
}

#[tokio::test]
async fn test_request_refusal_notifies_submitter() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let requests = ExpenseRequestRepository::new(db.clone());

    let request = requests
        .create(
            CreateRequestInput {
                objet: "Sortie pédagogique".to_string(),
                montant_estime: dec!(80_000),
            },
            &staff.csa,
        )
        .await
        .unwrap();
    let refused = requests
        .decide(request.id, RequestDecision::Refuse, Some("  ".to_string()), &staff.directeur)
        .await
        .unwrap();
    assert_eq!(refused.status, RequestStatus::Refusee);
    assert!(refused.director_comment.is_none());

    let (items, _) = NotificationRepository::new(db.clone())
        .list_for_user(staff.csa.id, 0, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].message.contains("refusée"));
}

#[tokio::test]
async fn test_only_submitter_or_accountant_edits_request() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let requests = ExpenseRequestRepository::new(db.clone());

    let request = requests
        .create(
            CreateRequestInput {
                objet: "Ballons".to_string(),
                montant_estime: dec!(9_000),
            },
            &staff.csa,
        )
        .await
        .unwrap();

    let err = requests
        .update(
            request.id,
            UpdateRequestInput {
                objet: Some("Filets".to_string()),
                ..UpdateRequestInput::default()
            },
            &staff.directeur,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Workflow(WorkflowError::NotOwner)));

    let updated = requests
        .update(
            request.id,
            UpdateRequestInput {
                montant_estime: Some(dec!(12_000)),
                ..UpdateRequestInput::default()
            },
            &staff.comptable,
        )
        .await
        .unwrap();
    assert_eq!(updated.montant_estime, dec!(12_000));

    let err = requests
        .create(
            CreateRequestInput {
                objet: "Rien".to_string(),
                montant_estime: dec!(0),
            },
            &staff.csa,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Budget(_)));
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_mark_read_is_scoped_to_the_owner() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let notifications = NotificationRepository::new(db.clone());

    let created = NotificationRepository::notify_user(&db, staff.csa.id, "Bienvenue")
        .await
        .unwrap();

    let err = notifications
        .mark_read(staff.comptable.id, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let read = notifications.mark_read(staff.csa.id, created.id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(notifications.unread_count(staff.csa.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mark_all_read() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let notifications = NotificationRepository::new(db.clone());

    let sent = NotificationRepository::fan_out(&db, Role::Accountant, "Clôture")
        .await
        .unwrap();
    assert_eq!(sent, 1);
    NotificationRepository::notify_user(&db, staff.comptable.id, "Rappel")
        .await
        .unwrap();

    assert_eq!(notifications.mark_all_read(staff.comptable.id).await.unwrap(), 2);
    assert_eq!(notifications.unread_count(staff.comptable.id).await.unwrap(), 0);
    assert_eq!(notifications.mark_all_read(staff.comptable.id).await.unwrap(), 0);
}

// ============================================================================
// Journal
// ============================================================================

#[tokio::test]
async fn test_journal_filters_by_author_and_date() {
    let db = setup_db().await;
    let staff = staff(&db).await;
    let audit = AuditRepository::new(db.clone());

    AuditRepository::append(&db, staff.comptable.id, "Budget 2026 OUVERT")
        .await
        .unwrap();
    AuditRepository::append(&db, staff.directeur.id, "Demande X APPROUVEE")
        .await
        .unwrap();

    let (entries, total) = audit
        .list(
            &AuditFilter {
                user_id: Some(staff.directeur.id),
                ..AuditFilter::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    let (entry, author) = &entries[0];
    assert!(entry.action.contains("APPROUVEE"));
    assert_eq!(author.as_ref().map(|u| u.id), Some(staff.directeur.id));

    let today = chrono::Utc::now().date_naive();
    let (_, total) = audit
        .list(
            &AuditFilter {
                date_from: Some(today),
                date_to: Some(today),
                ..AuditFilter::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(total, 2);

    let (_, total) = audit
        .list(
            &AuditFilter {
                date_to: today.pred_opt(),
                ..AuditFilter::default()
            },
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(total, 0);
}
