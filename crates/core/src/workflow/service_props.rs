//! Property-based tests for WorkflowService.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{ActingUser, Role};
use crate::budget::BudgetBalance;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{
    BalanceEffect, ExpenseSnapshot, OrderSnapshot, RequestDecision, RequestSnapshot,
    RequestStatus, ValidationDecision, ValidationStatus,
};

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Accountant),
        Just(Role::Director),
        Just(Role::SupervisoryAgent),
    ]
}

fn arb_validation_status() -> impl Strategy<Value = ValidationStatus> {
    prop_oneof![
        Just(ValidationStatus::EnAttente),
        Just(ValidationStatus::Validee),
        Just(ValidationStatus::Rejettee),
    ]
}

fn arb_decision() -> impl Strategy<Value = ValidationDecision> {
    prop_oneof![
        Just(ValidationDecision::Validate),
        Just(ValidationDecision::Reject)
    ]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Terminal expenses and orders never transition again, whatever the decision.
    #[test]
    fn prop_terminal_is_final(
        status in arb_validation_status(),
        decision in arb_decision(),
        supervisor in arb_uuid(),
    ) {
        prop_assume!(!status.is_pending());
        let expense = ExpenseSnapshot {
            id: Uuid::new_v4(),
            status,
            supervised_by: Some(supervisor),
            montant: Decimal::ONE,
            description: String::new(),
        };
        let director = ActingUser::new(Uuid::new_v4(), Role::Director, "D");
        let result = WorkflowService::decide_expense(
            &expense,
            decision,
            &director,
            BudgetBalance::opening(Decimal::from(1_000_000)),
        );
        let expense_refused = matches!(result, Err(WorkflowError::AlreadyProcessed { .. }));
        prop_assert!(expense_refused);

        let order = OrderSnapshot {
            id: Uuid::new_v4(),
            reference: "R".to_string(),
            status,
            quantite: 1,
            prix_unitaire: Decimal::ONE,
        };
        let accountant = ActingUser::new(Uuid::new_v4(), Role::Accountant, "C");
        let result = WorkflowService::decide_order(&order, decision, &accountant, Decimal::from(10));
        let order_refused = matches!(result, Err(WorkflowError::AlreadyProcessed { .. }));
        prop_assert!(order_refused);
    }

    /// Only the role holding the step's capability gets past the role check.
    #[test]
    fn prop_role_gating(role in arb_role(), decision in arb_decision()) {
        let actor = ActingUser::new(Uuid::new_v4(), role, "X");
        let expense = ExpenseSnapshot {
            id: Uuid::new_v4(),
            status: ValidationStatus::EnAttente,
            supervised_by: Some(Uuid::new_v4()),
            montant: Decimal::ONE,
            description: String::new(),
        };
        let balance = BudgetBalance::opening(Decimal::from(100));

        let supervised = WorkflowService::supervise_expense(
            &ExpenseSnapshot { supervised_by: None, ..expense.clone() },
            &actor,
        );
        prop_assert_eq!(supervised.is_ok(), role == Role::SupervisoryAgent);

        let decided = WorkflowService::decide_expense(&expense, decision, &actor, balance);
        prop_assert_eq!(decided.is_ok(), role == Role::Director);

        let request = RequestSnapshot {
            id: Uuid::new_v4(),
            status: RequestStatus::EnAttente,
            submitted_by: Uuid::new_v4(),
            objet: String::new(),
            montant_estime: Decimal::ONE,
        };
        let decided = WorkflowService::decide_request(&request, RequestDecision::Approve, &actor);
        prop_assert_eq!(decided.is_ok(), role == Role::Director);

        let order = OrderSnapshot {
            id: Uuid::new_v4(),
            reference: "R".to_string(),
            status: ValidationStatus::EnAttente,
            quantite: 1,
            prix_unitaire: Decimal::ONE,
        };
        let decided = WorkflowService::decide_order(&order, decision, &actor, Decimal::from(10));
        prop_assert_eq!(decided.is_ok(), role == Role::Accountant);
    }

    /// Validating an order consumes exactly its total; rejecting consumes nothing.
    #[test]
    fn prop_order_effect_matches_total(
        quantite in 1i32..500,
        prix in 0i64..10_000,
        alloue in 0i64..10_000_000,
        decision in arb_decision(),
    ) {
        let order = OrderSnapshot {
            id: Uuid::new_v4(),
            reference: "R".to_string(),
            status: ValidationStatus::EnAttente,
            quantite,
            prix_unitaire: Decimal::from(prix),
        };
        let accountant = ActingUser::new(Uuid::new_v4(), Role::Accountant, "C");
        let total = Decimal::from(i64::from(quantite) * prix);
        let alloue = Decimal::from(alloue);

        match WorkflowService::decide_order(&order, decision, &accountant, alloue) {
            Ok(action) => match (decision, action.effect) {
                (ValidationDecision::Validate, BalanceEffect::ConsumeLine { remaining }) => {
                    prop_assert_eq!(remaining, alloue - total);
                }
                (ValidationDecision::Reject, BalanceEffect::None) => {}
                (d, e) => prop_assert!(false, "decision {:?} produced {:?}", d, e),
            },
            Err(_) => {
                prop_assert_eq!(decision, ValidationDecision::Validate);
                prop_assert!(total > alloue);
            }
        }
    }
}
