//! Balance guards.
//!
//! Every function takes the balances read under lock and returns either the
//! balances to write back or the reason the move is refused. None of them
//! has side effects.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::BudgetError;
use super::types::{BudgetBalance, BudgetStatus};

/// Stateless service for budget balance moves.
pub struct LedgerService;

impl LedgerService {
    /// Opening balances for a new budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative total.
    pub fn open(montant_total: Decimal) -> Result<BudgetBalance, BudgetError> {
        if montant_total < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        Ok(BudgetBalance::opening(montant_total))
    }

    /// Changes a budget's total, moving the available balance by the same delta.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::TotalBelowCommitted` if the cut exceeds what is
    /// still available.
    pub fn retotal(
        balance: BudgetBalance,
        new_total: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        if new_total < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        let delta = new_total
            .checked_sub(balance.montant_total)
            .ok_or(BudgetError::Overflow)?;
        let disponible = balance
            .montant_disponible
            .checked_add(delta)
            .ok_or(BudgetError::Overflow)?;
        if disponible < Decimal::ZERO {
            return Err(BudgetError::TotalBelowCommitted);
        }
        Ok(BudgetBalance {
            montant_total: new_total,
            montant_disponible: disponible,
        })
    }

    /// A recette raises both the total and the available balance.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveAmount` unless `montant > 0`.
    pub fn add_revenue(
        balance: BudgetBalance,
        montant: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        Self::require_positive(montant)?;
        Ok(BudgetBalance {
            montant_total: balance
                .montant_total
                .checked_add(montant)
                .ok_or(BudgetError::Overflow)?,
            montant_disponible: balance
                .montant_disponible
                .checked_add(montant)
                .ok_or(BudgetError::Overflow)?,
        })
    }

    /// Reverses a recette, lowering both balances.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InsufficientFunds` if the money was already committed.
    pub fn withdraw_revenue(
        balance: BudgetBalance,
        montant: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        if montant > balance.montant_disponible {
            return Err(BudgetError::InsufficientFunds {
                requested: montant,
                available: balance.montant_disponible,
            });
        }
        Ok(BudgetBalance {
            montant_total: balance.montant_total - montant,
            montant_disponible: balance.montant_disponible - montant,
        })
    }

    /// Replaces a recette's amount by another.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_revenue`] and [`Self::withdraw_revenue`].
    pub fn amend_revenue(
        balance: BudgetBalance,
        old_montant: Decimal,
        new_montant: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        Self::require_positive(new_montant)?;
        match new_montant.cmp(&old_montant) {
            std::cmp::Ordering::Greater => Self::add_revenue(balance, new_montant - old_montant),
            std::cmp::Ordering::Less => Self::withdraw_revenue(balance, old_montant - new_montant),
            std::cmp::Ordering::Equal => Ok(balance),
        }
    }

    /// Allocates a new budget line.
    ///
    /// The cumulative allocation of existing lines plus the new one must fit
    /// in the available balance; the new allocation is then taken out of it.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::BudgetClosed`, `BudgetError::NonPositiveAmount`
    /// or `BudgetError::AllocationExceedsAvailable`.
    pub fn allocate_line(
        balance: BudgetBalance,
        status: BudgetStatus,
        existing_allocations: Decimal,
        montant_alloue: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        if !status.is_open() {
            return Err(BudgetError::BudgetClosed);
        }
        Self::require_positive(montant_alloue)?;

        let cumulative = existing_allocations
            .checked_add(montant_alloue)
            .ok_or(BudgetError::Overflow)?;
        if cumulative > balance.montant_disponible {
            return Err(BudgetError::AllocationExceedsAvailable {
                available: balance.montant_disponible,
            });
        }

        Ok(BudgetBalance {
            montant_disponible: balance.montant_disponible - montant_alloue,
            ..balance
        })
    }

    /// Changes an existing line's allocation by the difference.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::AllocationExceedsAvailable` when the increase
    /// does not fit in the available balance.
    pub fn reallocate_line(
        balance: BudgetBalance,
        status: BudgetStatus,
        current: Decimal,
        new_montant: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        Self::require_positive(new_montant)?;
        if new_montant > current {
            if !status.is_open() {
                return Err(BudgetError::BudgetClosed);
            }
            let increase = new_montant - current;
            if increase > balance.montant_disponible {
                return Err(BudgetError::AllocationExceedsAvailable {
                    available: balance.montant_disponible,
                });
            }
            Ok(BudgetBalance {
                montant_disponible: balance.montant_disponible - increase,
                ..balance
            })
        } else {
            Ok(Self::release_line(balance, current - new_montant))
        }
    }

    /// Returns a line's remaining allocation to the budget.
    #[must_use]
    pub fn release_line(balance: BudgetBalance, remaining: Decimal) -> BudgetBalance {
        let remaining = remaining.max(Decimal::ZERO);
        let disponible = balance
            .montant_disponible
            .checked_add(remaining)
            .unwrap_or(balance.montant_total)
            .min(balance.montant_total);
        BudgetBalance {
            montant_disponible: disponible,
            ..balance
        }
    }

    /// Checks that a new expense may attach to a budget and line.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::BudgetClosed`, `BudgetError::LineBudgetMismatch`
    /// or `BudgetError::NonPositiveAmount`.
    pub fn check_expense(
        status: BudgetStatus,
        budget_id: Uuid,
        line_budget_id: Uuid,
        montant: Decimal,
    ) -> Result<(), BudgetError> {
        if !status.is_open() {
            return Err(BudgetError::BudgetClosed);
        }
        if budget_id != line_budget_id {
            return Err(BudgetError::LineBudgetMismatch);
        }
        Self::require_positive(montant)
    }

    /// Debits a validated expense from the available balance.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InsufficientFunds` if `montant` exceeds it.
    pub fn debit_expense(
        balance: BudgetBalance,
        montant: Decimal,
    ) -> Result<BudgetBalance, BudgetError> {
        if montant > balance.montant_disponible {
            return Err(BudgetError::InsufficientFunds {
                requested: montant,
                available: balance.montant_disponible,
            });
        }
        Ok(BudgetBalance {
            montant_disponible: balance.montant_disponible - montant,
            ..balance
        })
    }

    /// Computes an order total from quantity and unit price.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveQuantity` or `BudgetError::NegativeAmount`.
    pub fn order_total(quantite: i32, prix_unitaire: Decimal) -> Result<Decimal, BudgetError> {
        if quantite <= 0 {
            return Err(BudgetError::NonPositiveQuantity);
        }
        if prix_unitaire < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        Decimal::from(quantite)
            .checked_mul(prix_unitaire)
            .ok_or(BudgetError::Overflow)
    }

    /// Takes a validated order's total out of its line.
    ///
    /// Returns the line's new remaining allocation.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineExhausted` if `total` exceeds the allocation.
    pub fn consume_line(montant_alloue: Decimal, total: Decimal) -> Result<Decimal, BudgetError> {
        if total > montant_alloue {
            return Err(BudgetError::LineExhausted {
                requested: total,
                available: montant_alloue,
            });
        }
        Ok(montant_alloue - total)
    }

    fn require_positive(montant: Decimal) -> Result<(), BudgetError> {
        if montant <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveAmount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(total: Decimal, disponible: Decimal) -> BudgetBalance {
        BudgetBalance {
            montant_total: total,
            montant_disponible: disponible,
        }
    }

    #[test]
    fn test_revenue_raises_both_balances() {
        let b = LedgerService::add_revenue(
            BudgetBalance::opening(dec!(1_000_000)),
            dec!(500_000),
        )
        .unwrap();
        assert_eq!(b.montant_total, dec!(1_500_000));
        assert_eq!(b.montant_disponible, dec!(1_500_000));
    }

    #[test]
    fn test_revenue_must_be_positive() {
        let b = BudgetBalance::opening(dec!(100));
        assert!(matches!(
            LedgerService::add_revenue(b, Decimal::ZERO),
            Err(BudgetError::NonPositiveAmount)
        ));
        assert!(matches!(
            LedgerService::add_revenue(b, dec!(-5)),
            Err(BudgetError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_allocation_takes_from_available() {
        let b = LedgerService::allocate_line(
            balance(dec!(1_500_000), dec!(1_500_000)),
            BudgetStatus::Ouvert,
            Decimal::ZERO,
            dec!(200_000),
        )
        .unwrap();
        assert_eq!(b.montant_disponible, dec!(1_300_000));
        assert_eq!(b.montant_total, dec!(1_500_000));
    }

    #[test]
    fn test_allocation_counts_existing_lines() {
        let err = LedgerService::allocate_line(
            balance(dec!(1000), dec!(600)),
            BudgetStatus::Ouvert,
            dec!(400),
            dec!(300),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BudgetError::AllocationExceedsAvailable { available } if available == dec!(600)
        ));
    }

    #[test]
    fn test_allocation_on_closed_budget() {
        let err = LedgerService::allocate_line(
            BudgetBalance::opening(dec!(1000)),
            BudgetStatus::Cloture,
            Decimal::ZERO,
            dec!(10),
        )
        .unwrap_err();
        assert!(matches!(err, BudgetError::BudgetClosed));
    }

    #[test]
    fn test_release_never_exceeds_total() {
        let b = LedgerService::release_line(balance(dec!(1000), dec!(900)), dec!(500));
        assert_eq!(b.montant_disponible, dec!(1000));
    }

    #[test]
    fn test_reallocate_up_and_down() {
        let b = balance(dec!(1000), dec!(500));
        let up = LedgerService::reallocate_line(b, BudgetStatus::Ouvert, dec!(300), dec!(400))
            .unwrap();
        assert_eq!(up.montant_disponible, dec!(400));
        let down =
            LedgerService::reallocate_line(b, BudgetStatus::Cloture, dec!(300), dec!(100))
                .unwrap();
        assert_eq!(down.montant_disponible, dec!(700));
        assert!(
            LedgerService::reallocate_line(b, BudgetStatus::Ouvert, dec!(300), dec!(900))
                .is_err()
        );
    }

    #[test]
    fn test_debit_expense() {
        let b = LedgerService::debit_expense(balance(dec!(1_500_000), dec!(1_300_000)), dec!(50_000))
            .unwrap();
        assert_eq!(b.montant_disponible, dec!(1_250_000));

        let err = LedgerService::debit_expense(balance(dec!(100), dec!(10)), dec!(11)).unwrap_err();
        assert!(matches!(err, BudgetError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_check_expense() {
        let budget = Uuid::new_v4();
        assert!(LedgerService::check_expense(BudgetStatus::Ouvert, budget, budget, dec!(1)).is_ok());
        assert!(matches!(
            LedgerService::check_expense(BudgetStatus::Cloture, budget, budget, dec!(1)),
            Err(BudgetError::BudgetClosed)
        ));
        assert!(matches!(
            LedgerService::check_expense(BudgetStatus::Ouvert, budget, Uuid::new_v4(), dec!(1)),
            Err(BudgetError::LineBudgetMismatch)
        ));
    }

    #[test]
    fn test_order_total() {
        assert_eq!(LedgerService::order_total(10, dec!(1000)).unwrap(), dec!(10_000));
        assert_eq!(LedgerService::order_total(3, Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert!(matches!(
            LedgerService::order_total(0, dec!(1)),
            Err(BudgetError::NonPositiveQuantity)
        ));
        assert!(matches!(
            LedgerService::order_total(1, dec!(-1)),
            Err(BudgetError::NegativeAmount)
        ));
    }

    #[test]
    fn test_consume_line() {
        assert_eq!(LedgerService::consume_line(dec!(5000), dec!(5000)).unwrap(), Decimal::ZERO);
        assert!(matches!(
            LedgerService::consume_line(dec!(5000), dec!(10_000)),
            Err(BudgetError::LineExhausted { .. })
        ));
    }

    #[test]
    fn test_retotal() {
        let b = balance(dec!(1000), dec!(300));
        let up = LedgerService::retotal(b, dec!(1500)).unwrap();
        assert_eq!(up, balance(dec!(1500), dec!(800)));
        let down = LedgerService::retotal(b, dec!(700)).unwrap();
        assert_eq!(down, balance(dec!(700), Decimal::ZERO));
        assert!(matches!(
            LedgerService::retotal(b, dec!(600)),
            Err(BudgetError::TotalBelowCommitted)
        ));
    }

    #[test]
    fn test_amend_revenue() {
        let b = balance(dec!(1000), dec!(400));
        assert_eq!(
            LedgerService::amend_revenue(b, dec!(100), dec!(150)).unwrap(),
            balance(dec!(1050), dec!(450))
        );
        assert_eq!(
            LedgerService::amend_revenue(b, dec!(100), dec!(50)).unwrap(),
            balance(dec!(950), dec!(350))
        );
        assert!(LedgerService::withdraw_revenue(b, dec!(500)).is_err());
    }
}
