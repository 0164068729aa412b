//! Workflow service for supervision and decisions.
//!
//! Each function checks, in order, the acting role, the record's status,
//! the step-specific precondition and finally the funds. The first failing
//! check is reported.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::auth::{ActingUser, Capability, Role};
use crate::budget::{BudgetBalance, LedgerService};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    BalanceEffect, ExpenseSnapshot, Notice, OrderSnapshot, Recipient, RequestDecision,
    RequestSnapshot, RequestStatus, SupervisionAction, ValidationDecision, ValidationStatus,
    WorkflowAction,
};

/// Stateless service for workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    fn require(
        actor: &ActingUser,
        capability: Capability,
        action: &'static str,
    ) -> Result<(), WorkflowError> {
        if actor.can(capability) {
            Ok(())
        } else {
            Err(WorkflowError::NotPermitted {
                role: actor.role,
                action,
            })
        }
    }

    /// Supervise a pending expense.
    ///
    /// # Errors
    /// * `NotPermitted` unless the actor is a supervisory agent
    /// * `AlreadyProcessed` if the expense left pending
    /// * `AlreadySupervised` if a supervisor is already recorded
    pub fn supervise_expense(
        expense: &ExpenseSnapshot,
        actor: &ActingUser,
    ) -> Result<SupervisionAction, WorkflowError> {
        Self::require(actor, Capability::SuperviseExpense, "superviser une dépense")?;
        if !expense.status.is_pending() {
            return Err(WorkflowError::AlreadyProcessed { what: "Dépense" });
        }
        if expense.supervised_by.is_some() {
            return Err(WorkflowError::AlreadySupervised);
        }

        Ok(SupervisionAction {
            supervised_by: actor.id,
            supervised_at: Utc::now(),
            audit: format!("Dépense {} SUPERVISEE - {} F", expense.id, expense.montant),
            notices: vec![Notice {
                recipient: Recipient::Role(Role::Director),
                message: format!(
                    "La dépense « {} » de {} F a été supervisée et attend votre validation.",
                    expense.description, expense.montant
                ),
            }],
        })
    }

    /// Validate or reject a supervised expense.
    ///
    /// `balance` is the budget balance read under lock.
    ///
    /// # Errors
    /// * `NotPermitted` unless the actor is a director
    /// * `AlreadyProcessed` if the expense left pending
    /// * `NotSupervised` if no supervisor is recorded
    /// * `Budget(InsufficientFunds)` when validating more than is available
    pub fn decide_expense(
        expense: &ExpenseSnapshot,
        decision: ValidationDecision,
        actor: &ActingUser,
        balance: BudgetBalance,
    ) -> Result<WorkflowAction<ValidationStatus>, WorkflowError> {
        Self::require(actor, Capability::ValidateExpense, "valider une dépense")?;
        if !expense.status.is_pending() {
            return Err(WorkflowError::AlreadyProcessed { what: "Dépense" });
        }
        if expense.supervised_by.is_none() {
            return Err(WorkflowError::NotSupervised);
        }

        let new_status = decision.target();
        let (effect, notices) = match decision {
            ValidationDecision::Validate => {
                let after = LedgerService::debit_expense(balance, expense.montant)?;
                let notice = Notice {
                    recipient: Recipient::Role(Role::Accountant),
                    message: format!(
                        "La dépense « {} » de {} F a été validée par le Directeur.",
                        expense.description, expense.montant
                    ),
                };
                (BalanceEffect::DebitBudget(after), vec![notice])
            }
            ValidationDecision::Reject => (BalanceEffect::None, Vec::new()),
        };

        Ok(WorkflowAction {
            new_status,
            decided_by: actor.id,
            decided_at: Utc::now(),
            audit: format!(
                "Dépense {} {} - {} F",
                expense.id,
                new_status.as_str().to_uppercase(),
                expense.montant
            ),
            notices,
            effect,
        })
    }

    /// Approve or refuse a pending expense request.
    ///
    /// # Errors
    /// * `NotPermitted` unless the actor is a director
    /// * `AlreadyProcessed` if the request left pending
    pub fn decide_request(
        request: &RequestSnapshot,
        decision: RequestDecision,
        actor: &ActingUser,
    ) -> Result<WorkflowAction<RequestStatus>, WorkflowError> {
        Self::require(actor, Capability::DecideRequest, "statuer sur une demande")?;
        if !request.status.is_pending() {
            return Err(WorkflowError::AlreadyProcessed { what: "Demande" });
        }

        let new_status = decision.target();
        let notice = match decision {
            RequestDecision::Approve => Notice {
                recipient: Recipient::Role(Role::Accountant),
                message: format!(
                    "La demande « {} » ({} F) a été approuvée par le Directeur.",
                    request.objet, request.montant_estime
                ),
            },
            RequestDecision::Refuse => Notice {
                recipient: Recipient::User(request.submitted_by),
                message: format!("Votre demande « {} » a été refusée.", request.objet),
            },
        };

        Ok(WorkflowAction {
            new_status,
            decided_by: actor.id,
            decided_at: Utc::now(),
            audit: format!(
                "Demande {} {} - {} F",
                request.id,
                new_status.as_str().to_uppercase(),
                request.montant_estime
            ),
            notices: vec![notice],
            effect: BalanceEffect::None,
        })
    }

    /// Validate or reject a pending purchase order.
    ///
    /// `montant_alloue` is the order line's remaining allocation read under lock.
    ///
    /// # Errors
    /// * `NotPermitted` unless the actor is an accountant
    /// * `AlreadyProcessed` if the order left pending
    /// * `Budget(LineExhausted)` when validating more than the line holds
    pub fn decide_order(
        order: &OrderSnapshot,
        decision: ValidationDecision,
        actor: &ActingUser,
        montant_alloue: Decimal,
    ) -> Result<WorkflowAction<ValidationStatus>, WorkflowError> {
        Self::require(actor, Capability::ValidateOrder, "valider une commande")?;
        if !order.status.is_pending() {
            return Err(WorkflowError::AlreadyProcessed { what: "Commande" });
        }

        let total = LedgerService::order_total(order.quantite, order.prix_unitaire)?;
        let effect = match decision {
            ValidationDecision::Validate => BalanceEffect::ConsumeLine {
                remaining: LedgerService::consume_line(montant_alloue, total)?,
            },
            ValidationDecision::Reject => BalanceEffect::None,
        };
        let new_status = decision.target();

        Ok(WorkflowAction {
            new_status,
            decided_by: actor.id,
            decided_at: Utc::now(),
            audit: format!(
                "Commande {} {} - {} F",
                order.reference,
                new_status.as_str().to_uppercase(),
                total
            ),
            notices: Vec::new(),
            effect,
        })
    }

    /// Checks that an expense or order may still be edited or deleted.
    ///
    /// # Errors
    /// Returns `NotEditable` once the record left pending.
    pub fn ensure_editable(
        status: ValidationStatus,
        what: &'static str,
    ) -> Result<(), WorkflowError> {
        if status.is_pending() {
            Ok(())
        } else {
            Err(WorkflowError::NotEditable { what })
        }
    }

    /// Checks that a request may still be edited or deleted by `actor`.
    ///
    /// # Errors
    /// * `NotOwner` unless the actor submitted it or is an accountant
    /// * `NotEditable` once the request left pending
    pub fn ensure_request_mutable(
        request: &RequestSnapshot,
        actor: &ActingUser,
    ) -> Result<(), WorkflowError> {
        if request.submitted_by != actor.id && actor.role != Role::Accountant {
            return Err(WorkflowError::NotOwner);
        }
        if !request.status.is_pending() {
            return Err(WorkflowError::NotEditable { what: "Demande" });
        }
        Ok(())
    }

    /// Checks that an expense or order still awaits a decision.
    ///
    /// # Errors
    /// Returns `AlreadyProcessed` once the record left pending.
    pub fn ensure_pending(status: ValidationStatus, what: &'static str) -> Result<(), WorkflowError> {
        if status.is_pending() {
            Ok(())
        } else {
            Err(WorkflowError::AlreadyProcessed { what })
        }
    }

    /// Checks that a request still awaits a decision.
    ///
    /// # Errors
    /// Returns `AlreadyProcessed` once the request left pending.
    pub fn ensure_request_pending(status: RequestStatus) -> Result<(), WorkflowError> {
        if status.is_pending() {
            Ok(())
        } else {
            Err(WorkflowError::AlreadyProcessed { what: "Demande" })
        }
    }

    /// Parses an expense/order decision label.
    ///
    /// # Errors
    /// Returns `UnknownDecision` for anything but `validee` / `rejettee`.
    pub fn parse_validation(label: &str) -> Result<ValidationDecision, WorkflowError> {
        ValidationDecision::parse(label)
            .ok_or_else(|| WorkflowError::UnknownDecision(label.to_string()))
    }

    /// Parses a request decision label.
    ///
    /// # Errors
    /// Returns `UnknownDecision` for anything but `approuvee` / `refusee`.
    pub fn parse_request(label: &str) -> Result<RequestDecision, WorkflowError> {
        RequestDecision::parse(label)
            .ok_or_else(|| WorkflowError::UnknownDecision(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetError;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn actor(role: Role) -> ActingUser {
        ActingUser::new(Uuid::new_v4(), role, "Test")
    }

    fn expense(supervised: bool) -> ExpenseSnapshot {
        ExpenseSnapshot {
            id: Uuid::new_v4(),
            status: ValidationStatus::EnAttente,
            supervised_by: supervised.then(Uuid::new_v4),
            montant: dec!(50_000),
            description: "Fournitures".to_string(),
        }
    }

    fn order(quantite: i32, prix: Decimal) -> OrderSnapshot {
        OrderSnapshot {
            id: Uuid::new_v4(),
            reference: "CMD-001".to_string(),
            status: ValidationStatus::EnAttente,
            quantite,
            prix_unitaire: prix,
        }
    }

    #[test]
    fn test_supervise_notifies_directors() {
        let csa = actor(Role::SupervisoryAgent);
        let action = WorkflowService::supervise_expense(&expense(false), &csa).unwrap();
        assert_eq!(action.supervised_by, csa.id);
        assert_eq!(action.notices.len(), 1);
        assert_eq!(action.notices[0].recipient, Recipient::Role(Role::Director));
        assert!(action.audit.contains("SUPERVISEE"));
    }

    #[test]
    fn test_supervise_twice_refused() {
        let err =
            WorkflowService::supervise_expense(&expense(true), &actor(Role::SupervisoryAgent))
                .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadySupervised));
    }

    #[test]
    fn test_supervise_wrong_role() {
        for role in [Role::Accountant, Role::Director] {
            let err = WorkflowService::supervise_expense(&expense(false), &actor(role)).unwrap_err();
            assert!(matches!(err, WorkflowError::NotPermitted { .. }));
        }
    }

    #[test]
    fn test_validate_unsupervised_refused() {
        let err = WorkflowService::decide_expense(
            &expense(false),
            ValidationDecision::Validate,
            &actor(Role::Director),
            BudgetBalance::opening(dec!(1_000_000)),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NotSupervised));
    }

    #[test]
    fn test_validate_debits_and_notifies_accountants() {
        let balance = BudgetBalance {
            montant_total: dec!(1_500_000),
            montant_disponible: dec!(1_300_000),
        };
        let action = WorkflowService::decide_expense(
            &expense(true),
            ValidationDecision::Validate,
            &actor(Role::Director),
            balance,
        )
        .unwrap();
        assert_eq!(action.new_status, ValidationStatus::Validee);
        match action.effect {
            BalanceEffect::DebitBudget(after) => {
                assert_eq!(after.montant_disponible, dec!(1_250_000));
            }
            other => panic!("unexpected effect {other:?}"),
        }
        assert_eq!(action.notices[0].recipient, Recipient::Role(Role::Accountant));
        assert!(action.audit.contains("VALIDEE"));
    }

    #[test]
    fn test_reject_moves_nothing() {
        let action = WorkflowService::decide_expense(
            &expense(true),
            ValidationDecision::Reject,
            &actor(Role::Director),
            BudgetBalance::opening(Decimal::ZERO),
        )
        .unwrap();
        assert_eq!(action.new_status, ValidationStatus::Rejettee);
        assert_eq!(action.effect, BalanceEffect::None);
        assert!(action.audit.contains("REJETTEE"));
    }

    #[test]
    fn test_validate_insufficient_funds() {
        let err = WorkflowService::decide_expense(
            &expense(true),
            ValidationDecision::Validate,
            &actor(Role::Director),
            BudgetBalance::opening(dec!(10)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Budget(BudgetError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_processed_expense_checked_before_supervision() {
        let mut e = expense(false);
        e.status = ValidationStatus::Rejettee;
        let err = WorkflowService::decide_expense(
            &e,
            ValidationDecision::Validate,
            &actor(Role::Director),
            BudgetBalance::opening(dec!(1_000_000)),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyProcessed { .. }));
    }

    #[test]
    fn test_order_exceeding_line() {
        let err = WorkflowService::decide_order(
            &order(10, dec!(1000)),
            ValidationDecision::Validate,
            &actor(Role::Accountant),
            dec!(5000),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Budget(BudgetError::LineExhausted { .. })
        ));
    }

    #[test]
    fn test_order_validation_audit_text() {
        let action = WorkflowService::decide_order(
            &order(4, dec!(1000)),
            ValidationDecision::Validate,
            &actor(Role::Accountant),
            dec!(5000),
        )
        .unwrap();
        assert_eq!(action.audit, "Commande CMD-001 VALIDEE - 4000 F");
        assert_eq!(
            action.effect,
            BalanceEffect::ConsumeLine {
                remaining: dec!(1000)
            }
        );
    }

    #[test]
    fn test_order_rejection_needs_no_funds() {
        let action = WorkflowService::decide_order(
            &order(10, dec!(1000)),
            ValidationDecision::Reject,
            &actor(Role::Accountant),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(action.effect, BalanceEffect::None);
        assert_eq!(action.audit, "Commande CMD-001 REJETTEE - 10000 F");
    }

    #[test]
    fn test_request_refusal_notifies_submitter() {
        let submitter = Uuid::new_v4();
        let request = RequestSnapshot {
            id: Uuid::new_v4(),
            status: RequestStatus::EnAttente,
            submitted_by: submitter,
            objet: "Achat de chaises".to_string(),
            montant_estime: dec!(75_000),
        };
        let refused =
            WorkflowService::decide_request(&request, RequestDecision::Refuse, &actor(Role::Director))
                .unwrap();
        assert_eq!(refused.new_status, RequestStatus::Refusee);
        assert_eq!(refused.notices[0].recipient, Recipient::User(submitter));

        let approved = WorkflowService::decide_request(
            &request,
            RequestDecision::Approve,
            &actor(Role::Director),
        )
        .unwrap();
        assert_eq!(approved.notices[0].recipient, Recipient::Role(Role::Accountant));
    }

    #[test]
    fn test_request_mutability() {
        let submitter = ActingUser::new(Uuid::new_v4(), Role::SupervisoryAgent, "Agent");
        let mut request = RequestSnapshot {
            id: Uuid::new_v4(),
            status: RequestStatus::EnAttente,
            submitted_by: submitter.id,
            objet: "Objet".to_string(),
            montant_estime: dec!(1),
        };
        assert!(WorkflowService::ensure_request_mutable(&request, &submitter).is_ok());
        assert!(WorkflowService::ensure_request_mutable(&request, &actor(Role::Accountant)).is_ok());
        assert!(matches!(
            WorkflowService::ensure_request_mutable(&request, &actor(Role::Director)),
            Err(WorkflowError::NotOwner)
        ));
        request.status = RequestStatus::Approuvee;
        assert!(matches!(
            WorkflowService::ensure_request_mutable(&request, &submitter),
            Err(WorkflowError::NotEditable { .. })
        ));
    }

    #[test]
    fn test_parse_labels() {
        assert!(WorkflowService::parse_validation("validee").is_ok());
        assert!(matches!(
            WorkflowService::parse_validation("approved"),
            Err(WorkflowError::UnknownDecision(_))
        ));
        assert!(WorkflowService::parse_request("approuvée").is_ok());
        assert!(WorkflowService::parse_request("validee").is_err());
    }

    #[test]
    fn test_pending_checks() {
        assert!(WorkflowService::ensure_pending(ValidationStatus::EnAttente, "Commande").is_ok());
        assert!(matches!(
            WorkflowService::ensure_pending(ValidationStatus::Validee, "Commande"),
            Err(WorkflowError::AlreadyProcessed { what: "Commande" })
        ));
        assert!(WorkflowService::ensure_request_pending(RequestStatus::EnAttente).is_ok());
        assert!(matches!(
            WorkflowService::ensure_request_pending(RequestStatus::Refusee),
            Err(WorkflowError::AlreadyProcessed { what: "Demande" })
        ));
    }
}
