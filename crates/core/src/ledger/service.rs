//! Wallet ledger operations.
//!
//! Every operation validates first and mutates last, so a returned error
//! always leaves the wallet exactly as it was.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{FundingSplit, Wallet, WalletStatus};

/// Stateless service for wallet balance mutations.
pub struct WalletLedger;

impl WalletLedger {
    /// Adds funds to the wallet.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is not active
    pub fn credit(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;

        wallet.balance += amount;
        wallet.available_balance += amount;
        Ok(())
    }

    /// Takes funds from the wallet, using available balance first and
    /// drawing on available credit for the shortfall.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is not active
    /// - `InsufficientFunds` if `amount > available_balance + available_credit`
    pub fn debit(wallet: &mut Wallet, amount: Decimal) -> Result<FundingSplit, LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;

        let available = total_available(wallet);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        let from_balance = amount.min(wallet.available_balance);
        let split = FundingSplit {
            from_balance,
            from_credit: amount - from_balance,
        };

        wallet.balance -= split.from_balance;
        wallet.available_balance -= split.from_balance;
        wallet.used_credit += split.from_credit;
        recompute_available_credit(wallet);
        Ok(split)
    }

    /// Outgoing payment: checks the spend window, debits, and records the
    /// spend for `today`.
    ///
    /// # Errors
    ///
    /// Same as [`WalletLedger::debit`], plus `LimitExceeded`.
    pub fn spend(
        wallet: &mut Wallet,
        amount: Decimal,
        today: NaiveDate,
    ) -> Result<FundingSplit, LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;
        wallet.window.check_spend(&wallet.limits(), amount, today)?;

        let split = Self::debit(wallet, amount)?;
        wallet.window.record_spend(amount, today);
        Ok(split)
    }

    /// Cash-out from available balance only. Credit is never drawn for a
    /// withdrawal.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`, `WalletClosed` as for a debit
    /// - `InsufficientFunds` if `amount > available_balance`
    /// - `LimitExceeded` if a withdrawal, daily or monthly limit would be hit
    pub fn withdraw(
        wallet: &mut Wallet,
        amount: Decimal,
        today: NaiveDate,
    ) -> Result<FundingSplit, LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;
        if amount > wallet.available_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: wallet.available_balance,
            });
        }
        wallet
            .window
            .check_withdrawal(&wallet.limits(), amount, today)?;

        wallet.balance -= amount;
        wallet.available_balance -= amount;
        wallet.window.record_withdrawal(amount, today);
        Ok(FundingSplit {
            from_balance: amount,
            from_credit: Decimal::ZERO,
        })
    }

    /// Returns funds taken by a debit: the credit portion repays
    /// `used_credit`, the balance portion goes back to available balance.
    ///
    /// Suspended wallets still accept a restore; closed wallets do not.
    ///
    /// # Errors
    ///
    /// - `WalletClosed` if the wallet is closed
    /// - `InvalidAmount` if either portion is negative or the split is empty
    /// - `Internal` if the credit portion exceeds `used_credit`
    pub fn restore(wallet: &mut Wallet, split: FundingSplit) -> Result<(), LedgerError> {
        if split.from_balance < Decimal::ZERO || split.from_credit < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(
                "funding portions cannot be negative".to_string(),
            ));
        }
        ensure_currency_amount(split.total())?;
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::WalletClosed(wallet.id));
        }
        if split.from_credit > wallet.used_credit {
            return Err(LedgerError::Internal(format!(
                "credit portion {} exceeds used credit {}",
                split.from_credit, wallet.used_credit
            )));
        }

        wallet.used_credit -= split.from_credit;
        recompute_available_credit(wallet);
        wallet.balance += split.from_balance;
        wallet.available_balance += split.from_balance;
        Ok(())
    }

    /// Takes funds back from available balance only, without limit checks.
    ///
    /// Used when a refund claws a payment back from the counterparty.
    ///
    /// # Errors
    ///
    /// - `WalletClosed` if the wallet is closed
    /// - `InsufficientFunds` if `amount > available_balance`
    pub fn reclaim(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::WalletClosed(wallet.id));
        }
        if amount > wallet.available_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: wallet.available_balance,
            });
        }

        wallet.balance -= amount;
        wallet.available_balance -= amount;
        Ok(())
    }

    /// Moves funds from available balance to frozen balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is closed
    /// - `InsufficientFunds` if `amount > available_balance`
    pub fn freeze(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::WalletClosed(wallet.id));
        }
        if amount > wallet.available_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: wallet.available_balance,
            });
        }

        wallet.available_balance -= amount;
        wallet.frozen_balance += amount;
        Ok(())
    }

    /// Moves funds from frozen balance back to available balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is closed
    /// - `InsufficientFunds` if `amount > frozen_balance`
    pub fn unfreeze(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::WalletClosed(wallet.id));
        }
        if amount > wallet.frozen_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: wallet.frozen_balance,
            });
        }

        wallet.frozen_balance -= amount;
        wallet.available_balance += amount;
        Ok(())
    }

    /// Sets the overdraft credit limit. A limit below `used_credit` leaves
    /// no available credit but does not force repayment.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `limit < 0` or finer than a cent
    /// - `WalletClosed` if the wallet is closed
    pub fn set_credit_limit(wallet: &mut Wallet, limit: Decimal) -> Result<(), LedgerError> {
        if limit < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "credit limit cannot be negative, got {limit}"
            )));
        }
        apex_shared::types::ensure_currency_scale(limit)?;
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::WalletClosed(wallet.id));
        }

        wallet.credit_limit = limit;
        recompute_available_credit(wallet);
        Ok(())
    }

    /// Adds cashback to the wallet's cashback balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is not active
    pub fn earn_cashback(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;

        wallet.cashback_balance += amount;
        wallet.total_cashback_earned += amount;
        Ok(())
    }

    /// Converts cashback into spendable balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `WalletClosed` if the wallet is not active
    /// - `InsufficientFunds` if `amount > cashback_balance`
    pub fn redeem_cashback(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
        ensure_currency_amount(amount)?;
        ensure_active(wallet)?;
        if amount > wallet.cashback_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: wallet.cashback_balance,
            });
        }

        wallet.cashback_balance -= amount;
        wallet.balance += amount;
        wallet.available_balance += amount;
        Ok(())
    }

    /// Active → Suspended. A suspended wallet keeps its funds but refuses
    /// credits, debits and cashback until reactivated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the wallet is active.
    pub fn suspend(wallet: &mut Wallet) -> Result<(), LedgerError> {
        move_to(wallet, &[WalletStatus::Active], WalletStatus::Suspended)
    }

    /// Suspended → Active.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the wallet is suspended.
    pub fn reactivate(wallet: &mut Wallet) -> Result<(), LedgerError> {
        move_to(wallet, &[WalletStatus::Suspended], WalletStatus::Active)
    }

    /// Soft-closes an active or suspended wallet. Closing is final.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the wallet is already closed
    /// - `InvalidTransaction` while the wallet still holds a balance, frozen
    ///   funds or drawn credit
    pub fn close(wallet: &mut Wallet) -> Result<(), LedgerError> {
        if wallet.status == WalletStatus::Closed {
            return Err(LedgerError::transition(wallet.status, WalletStatus::Closed));
        }
        let outstanding = [
            ("balance", wallet.balance),
            ("frozen balance", wallet.frozen_balance),
            ("used credit", wallet.used_credit),
        ];
        if let Some((what, amount)) = outstanding.into_iter().find(|(_, amount)| !amount.is_zero()) {
            return Err(LedgerError::InvalidTransaction(format!(
                "cannot close wallet {} with {what} {amount}",
                wallet.id
            )));
        }

        wallet.status = WalletStatus::Closed;
        Ok(())
    }

    /// Returns true if `amount` could be withdrawn on `today`.
    #[must_use]
    pub fn can_withdraw(wallet: &Wallet, amount: Decimal, today: NaiveDate) -> bool {
        wallet.is_active()
            && amount > Decimal::ZERO
            && amount <= wallet.available_balance
            && wallet
                .window
                .check_withdrawal(&wallet.limits(), amount, today)
                .is_ok()
    }

    /// Returns true if `amount` could be spent on `today`.
    #[must_use]
    pub fn can_spend(wallet: &Wallet, amount: Decimal, today: NaiveDate) -> bool {
        wallet.is_active()
            && amount > Decimal::ZERO
            && amount <= total_available(wallet)
            && wallet
                .window
                .check_spend(&wallet.limits(), amount, today)
                .is_ok()
    }
}

/// Balance plus credit that a debit could use.
#[must_use]
pub fn total_available(wallet: &Wallet) -> Decimal {
    wallet.available_balance + wallet.available_credit
}

/// Share of the credit limit in use, as a percentage.
#[must_use]
pub fn utilization_rate(wallet: &Wallet) -> Decimal {
    if wallet.credit_limit.is_zero() {
        return Decimal::ZERO;
    }
    wallet.used_credit / wallet.credit_limit * Decimal::ONE_HUNDRED
}

/// Checks both wallet invariants.
#[must_use]
pub fn is_consistent(wallet: &Wallet) -> bool {
    wallet.available_balance + wallet.frozen_balance == wallet.balance
        && wallet.available_credit == (wallet.credit_limit - wallet.used_credit).max(Decimal::ZERO)
}

fn recompute_available_credit(wallet: &mut Wallet) {
    wallet.available_credit = (wallet.credit_limit - wallet.used_credit).max(Decimal::ZERO);
}

fn ensure_currency_amount(amount: Decimal) -> Result<(), LedgerError> {
    apex_shared::types::ensure_currency_amount(amount)?;
    Ok(())
}

fn move_to(
    wallet: &mut Wallet,
    allowed: &[WalletStatus],
    to: WalletStatus,
) -> Result<(), LedgerError> {
    if !allowed.contains(&wallet.status) {
        return Err(LedgerError::transition(wallet.status, to));
    }
    wallet.status = to;
    Ok(())
}

fn ensure_active(wallet: &Wallet) -> Result<(), LedgerError> {
    if wallet.is_active() {
        Ok(())
    } else {
        Err(LedgerError::WalletClosed(wallet.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::error::LimitKind;
    use apex_shared::types::{Currency, UserId, WalletId};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn wallet_with(balance: Decimal, credit_limit: Decimal) -> Wallet {
        let mut wallet = Wallet::new(WalletId::new(1), UserId::new(1), Currency::Mxn, today());
        wallet.balance = balance;
        wallet.available_balance = balance;
        wallet.credit_limit = credit_limit;
        wallet.available_credit = credit_limit;
        wallet
    }

    #[test]
    fn test_credit_increases_balance() {
        let mut wallet = wallet_with(dec!(0), dec!(0));
        WalletLedger::credit(&mut wallet, dec!(250.50)).unwrap();
        assert_eq!(wallet.balance, dec!(250.50));
        assert_eq!(wallet.available_balance, dec!(250.50));
        assert!(is_consistent(&wallet));
    }

    #[test]
    fn test_credit_rejects_non_positive() {
        let mut wallet = wallet_with(dec!(10), dec!(0));
        assert!(matches!(
            WalletLedger::credit(&mut wallet, dec!(0)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            WalletLedger::credit(&mut wallet, dec!(-1)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(wallet.balance, dec!(10));
    }

    #[test]
    fn test_credit_rejects_inactive_wallet() {
        let mut wallet = wallet_with(dec!(10), dec!(0));
        WalletLedger::suspend(&mut wallet).unwrap();
        assert_eq!(
            WalletLedger::credit(&mut wallet, dec!(5)),
            Err(LedgerError::WalletClosed(WalletId::new(1)))
        );
        assert!(!WalletLedger::can_spend(&wallet, dec!(1), today()));
    }

    #[test]
    fn test_suspend_and_reactivate() {
        let mut wallet = wallet_with(dec!(10), dec!(0));
        WalletLedger::suspend(&mut wallet).unwrap();
        assert_eq!(wallet.status, WalletStatus::Suspended);
        assert_eq!(
            WalletLedger::suspend(&mut wallet),
            Err(LedgerError::transition(WalletStatus::Suspended, WalletStatus::Suspended))
        );

        WalletLedger::reactivate(&mut wallet).unwrap();
        assert_eq!(wallet.status, WalletStatus::Active);
        assert_eq!(
            WalletLedger::reactivate(&mut wallet),
            Err(LedgerError::transition(WalletStatus::Active, WalletStatus::Active))
        );
        WalletLedger::credit(&mut wallet, dec!(5)).unwrap();
        assert_eq!(wallet.balance, dec!(15));
    }

    #[test]
    fn test_close_empty_wallet_is_final() {
        let mut wallet = wallet_with(dec!(0), dec!(500));
        WalletLedger::suspend(&mut wallet).unwrap();
        WalletLedger::close(&mut wallet).unwrap();
        assert_eq!(wallet.status, WalletStatus::Closed);

        assert_eq!(
            WalletLedger::close(&mut wallet),
            Err(LedgerError::transition(WalletStatus::Closed, WalletStatus::Closed))
        );
        assert_eq!(
            WalletLedger::reactivate(&mut wallet),
            Err(LedgerError::transition(WalletStatus::Closed, WalletStatus::Active))
        );
        assert_eq!(
            WalletLedger::suspend(&mut wallet),
            Err(LedgerError::transition(WalletStatus::Closed, WalletStatus::Suspended))
        );
        assert_eq!(
            WalletLedger::freeze(&mut wallet, dec!(1)),
            Err(LedgerError::WalletClosed(WalletId::new(1)))
        );
    }

    #[test]
    fn test_close_refuses_outstanding_funds() {
        let mut with_balance = wallet_with(dec!(0.01), dec!(0));
        assert!(matches!(
            WalletLedger::close(&mut with_balance),
            Err(LedgerError::InvalidTransaction(_))
        ));
        assert_eq!(with_balance.status, WalletStatus::Active);

        let mut with_frozen = wallet_with(dec!(20), dec!(0));
        WalletLedger::freeze(&mut with_frozen, dec!(20)).unwrap();
        assert!(matches!(
            WalletLedger::close(&mut with_frozen),
            Err(LedgerError::InvalidTransaction(_))
        ));

        let mut with_credit = wallet_with(dec!(0), dec!(100));
        WalletLedger::debit(&mut with_credit, dec!(30)).unwrap();
        assert_eq!(with_credit.balance, dec!(0));
        assert!(matches!(
            WalletLedger::close(&mut with_credit),
            Err(LedgerError::InvalidTransaction(_))
        ));
        assert_eq!(with_credit.status, WalletStatus::Active);
    }

    #[test]
    fn test_sub_cent_amounts_rejected() {
        let mut wallet = wallet_with(dec!(1), dec!(0));
        let before = wallet.clone();
        assert!(matches!(
            WalletLedger::freeze(&mut wallet, dec!(0.00005)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            WalletLedger::credit(&mut wallet, dec!(10.005)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            WalletLedger::set_credit_limit(&mut wallet, dec!(100.001)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(wallet, before);

        WalletLedger::credit(&mut wallet, dec!(2.5000)).unwrap();
        assert_eq!(wallet.balance, dec!(3.5));
    }

    #[test]
    fn test_debit_uses_balance_then_credit() {
        let mut wallet = wallet_with(dec!(100), dec!(500));
        let split = WalletLedger::debit(&mut wallet, dec!(160)).unwrap();

        assert_eq!(split.from_balance, dec!(100));
        assert_eq!(split.from_credit, dec!(60));
        assert_eq!(wallet.balance, dec!(0));
        assert_eq!(wallet.used_credit, dec!(60));
        assert_eq!(wallet.available_credit, dec!(440));
        assert!(is_consistent(&wallet));
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_wallet_unchanged() {
        let mut wallet = wallet_with(dec!(100), dec!(50));
        let before = wallet.clone();
        let err = WalletLedger::debit(&mut wallet, dec!(150.01)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: dec!(150.01),
                available: dec!(150),
            }
        );
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_debit_ignores_frozen_funds() {
        let mut wallet = wallet_with(dec!(100), dec!(0));
        WalletLedger::freeze(&mut wallet, dec!(70)).unwrap();
        assert!(WalletLedger::debit(&mut wallet, dec!(31)).is_err());
        WalletLedger::debit(&mut wallet, dec!(30)).unwrap();
        assert_eq!(wallet.balance, dec!(70));
        assert_eq!(wallet.frozen_balance, dec!(70));
        assert!(is_consistent(&wallet));
    }

    #[test]
    fn test_restore_inverts_debit() {
        let mut wallet = wallet_with(dec!(100), dec!(500));
        let before = wallet.clone();
        let split = WalletLedger::debit(&mut wallet, dec!(320)).unwrap();
        WalletLedger::restore(&mut wallet, split).unwrap();
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_restore_rejects_credit_beyond_usage() {
        let mut wallet = wallet_with(dec!(100), dec!(500));
        let split = FundingSplit {
            from_balance: dec!(0),
            from_credit: dec!(1),
        };
        assert!(matches!(
            WalletLedger::restore(&mut wallet, split),
            Err(LedgerError::Internal(_))
        ));
    }

    #[test]
    fn test_freeze_and_unfreeze() {
        let mut wallet = wallet_with(dec!(100), dec!(0));
        WalletLedger::freeze(&mut wallet, dec!(40)).unwrap();
        assert_eq!(wallet.available_balance, dec!(60));
        assert_eq!(wallet.frozen_balance, dec!(40));
        assert_eq!(wallet.balance, dec!(100));

        assert!(matches!(
            WalletLedger::freeze(&mut wallet, dec!(61)),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            WalletLedger::unfreeze(&mut wallet, dec!(41)),
            Err(LedgerError::InsufficientFunds { .. })
        ));

        WalletLedger::unfreeze(&mut wallet, dec!(40)).unwrap();
        assert_eq!(wallet.available_balance, dec!(100));
        assert_eq!(wallet.frozen_balance, dec!(0));
    }

    #[test]
    fn test_withdraw_never_draws_credit() {
        let mut wallet = wallet_with(dec!(100), dec!(1000));
        assert!(!WalletLedger::can_withdraw(&wallet, dec!(150), today()));
        assert!(matches!(
            WalletLedger::withdraw(&mut wallet, dec!(150), today()),
            Err(LedgerError::InsufficientFunds { .. })
        ));

        let split = WalletLedger::withdraw(&mut wallet, dec!(100), today()).unwrap();
        assert_eq!(split.from_credit, dec!(0));
        assert_eq!(wallet.window.withdrawn_today, dec!(100));
        assert_eq!(wallet.window.spent_today, dec!(100));
    }

    #[test]
    fn test_withdraw_limit_per_day() {
        let mut wallet = wallet_with(dec!(50000), dec!(0));
        WalletLedger::withdraw(&mut wallet, dec!(15000), today()).unwrap();
        assert!(!WalletLedger::can_withdraw(&wallet, dec!(5001), today()));
        let err = WalletLedger::withdraw(&mut wallet, dec!(5001), today()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::LimitExceeded {
                kind: LimitKind::Withdrawal,
                ..
            }
        ));

        let tomorrow = today().succ_opt().unwrap();
        assert!(WalletLedger::can_withdraw(&wallet, dec!(20000), tomorrow));
    }

    #[test]
    fn test_spend_checks_daily_limit() {
        let mut wallet = wallet_with(dec!(100000), dec!(0));
        WalletLedger::spend(&mut wallet, dec!(49000), today()).unwrap();
        assert!(WalletLedger::can_spend(&wallet, dec!(1000), today()));
        assert!(!WalletLedger::can_spend(&wallet, dec!(1000.01), today()));

        let before = wallet.clone();
        assert!(matches!(
            WalletLedger::spend(&mut wallet, dec!(2000), today()),
            Err(LedgerError::LimitExceeded {
                kind: LimitKind::Daily,
                ..
            })
        ));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_can_spend_counts_credit() {
        let wallet = wallet_with(dec!(100), dec!(200));
        assert!(WalletLedger::can_spend(&wallet, dec!(300), today()));
        assert!(!WalletLedger::can_spend(&wallet, dec!(300.01), today()));
    }

    #[test]
    fn test_set_credit_limit_below_usage() {
        let mut wallet = wallet_with(dec!(0), dec!(500));
        WalletLedger::debit(&mut wallet, dec!(300)).unwrap();
        WalletLedger::set_credit_limit(&mut wallet, dec!(200)).unwrap();
        assert_eq!(wallet.available_credit, dec!(0));
        assert!(is_consistent(&wallet));
        assert_eq!(utilization_rate(&wallet), dec!(150));
    }

    #[test]
    fn test_cashback_earn_and_redeem() {
        let mut wallet = wallet_with(dec!(0), dec!(0));
        WalletLedger::earn_cashback(&mut wallet, dec!(12.50)).unwrap();
        WalletLedger::redeem_cashback(&mut wallet, dec!(10)).unwrap();
        assert_eq!(wallet.cashback_balance, dec!(2.50));
        assert_eq!(wallet.total_cashback_earned, dec!(12.50));
        assert_eq!(wallet.balance, dec!(10));
        assert!(WalletLedger::redeem_cashback(&mut wallet, dec!(3)).is_err());
    }

    #[test]
    fn test_utilization_rate_without_limit() {
        let wallet = wallet_with(dec!(10), dec!(0));
        assert_eq!(utilization_rate(&wallet), dec!(0));
        assert_eq!(total_available(&wallet), dec!(10));
    }
}
