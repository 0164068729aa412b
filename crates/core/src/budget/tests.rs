//! Property-based tests for budget balance moves.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::ledger::LedgerService;
use super::types::{BudgetBalance, BudgetStatus};

#[derive(Debug, Clone)]
enum Op {
    Revenue(i64),
    WithdrawRevenue(i64),
    AllocateLine(i64),
    ReleaseLine(usize),
    DebitExpense(i64),
    Retotal(i64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1_000i64..5_000_000).prop_map(Op::Revenue),
        (0i64..5_000_000).prop_map(Op::WithdrawRevenue),
        (-1_000i64..2_000_000).prop_map(Op::AllocateLine),
        (0usize..8).prop_map(Op::ReleaseLine),
        (0i64..2_000_000).prop_map(Op::DebitExpense),
        (0i64..10_000_000).prop_map(Op::Retotal),
    ]
}

proptest! {
    /// Whatever sequence of moves is attempted, accepted ones keep
    /// `0 <= montant_disponible <= montant_total`.
    #[test]
    fn prop_available_stays_within_total(
        opening in 0i64..10_000_000,
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let mut balance = LedgerService::open(Decimal::from(opening)).unwrap();
        let mut lines: Vec<Decimal> = Vec::new();

        for op in ops {
            let before = balance;
            let result = match op {
                Op::Revenue(m) => LedgerService::add_revenue(balance, Decimal::from(m)),
                Op::WithdrawRevenue(m) => LedgerService::withdraw_revenue(balance, Decimal::from(m)),
                Op::AllocateLine(m) => {
                    let existing: Decimal = lines.iter().copied().sum();
                    let r = LedgerService::allocate_line(
                        balance,
                        BudgetStatus::Ouvert,
                        existing,
                        Decimal::from(m),
                    );
                    if r.is_ok() {
                        lines.push(Decimal::from(m));
                    }
                    r
                }
                Op::ReleaseLine(i) => {
                    if i < lines.len() {
                        let remaining = lines.remove(i);
                        Ok(LedgerService::release_line(balance, remaining))
                    } else {
                        Ok(balance)
                    }
                }
                Op::DebitExpense(m) => LedgerService::debit_expense(balance, Decimal::from(m)),
                Op::Retotal(t) => LedgerService::retotal(balance, Decimal::from(t)),
            };

            match result {
                Ok(next) => balance = next,
                Err(_) => prop_assert_eq!(balance, before),
            }
            prop_assert!(balance.is_consistent(), "inconsistent balance {:?}", balance);
        }
    }

    /// A refused allocation leaves the balance untouched.
    #[test]
    fn prop_refused_allocation_changes_nothing(
        disponible in 0i64..1_000_000,
        existing in 0i64..1_000_000,
        requested in 1i64..1_000_000,
    ) {
        let balance = BudgetBalance {
            montant_total: Decimal::from(disponible + existing),
            montant_disponible: Decimal::from(disponible),
        };
        let result = LedgerService::allocate_line(
            balance,
            BudgetStatus::Ouvert,
            Decimal::from(existing),
            Decimal::from(requested),
        );
        if existing + requested > disponible {
            let is_exceeded = matches!(result, Err(BudgetError::AllocationExceedsAvailable { .. }));
            prop_assert!(is_exceeded);
        } else {
            let next = result.unwrap();
            prop_assert_eq!(next.montant_disponible, Decimal::from(disponible - requested));
        }
    }

    /// Consuming a line removes exactly `quantite * prix_unitaire`.
    #[test]
    fn prop_order_consumes_exact_total(
        alloue in 0i64..10_000_000,
        quantite in 1i32..1_000,
        prix in 0i64..100_000,
    ) {
        let total = LedgerService::order_total(quantite, Decimal::from(prix)).unwrap();
        prop_assert_eq!(total, Decimal::from(i64::from(quantite) * prix));

        match LedgerService::consume_line(Decimal::from(alloue), total) {
            Ok(remaining) => prop_assert_eq!(remaining + total, Decimal::from(alloue)),
            Err(BudgetError::LineExhausted { .. }) => prop_assert!(total > Decimal::from(alloue)),
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Expense debits never push the available balance below zero.
    #[test]
    fn prop_debits_never_negative(
        disponible in 0i64..1_000_000,
        amounts in prop::collection::vec(1i64..300_000, 0..20),
    ) {
        let mut balance = BudgetBalance::opening(Decimal::from(disponible));
        for m in amounts {
            if let Ok(next) = LedgerService::debit_expense(balance, Decimal::from(m)) {
                balance = next;
            }
            prop_assert!(balance.montant_disponible >= Decimal::ZERO);
        }
    }
}
