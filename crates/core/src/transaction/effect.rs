//! Ledger effect of each transaction type.
//!
//! | type | owner wallet | counterparty wallet |
//! |------|--------------|---------------------|
//! | deposit, credit, factoring | credit `net_amount` | - |
//! | cashback | cashback balance += `net_amount` | - |
//! | withdrawal | withdraw `amount` from balance only | - |
//! | payment, transfer | spend `amount` (balance, then credit) | credit `net_amount` |
//! | fee, credit payment | debit `amount` (balance, then credit) | - |
//!
//! Refund records are produced by the refund path and have no effect of
//! their own.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::service::WalletLedger;
use crate::ledger::types::{FundingSplit, Wallet};
use crate::transaction::types::{Transaction, TransactionType};

/// What completing a transaction does to the owner's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerEffect {
    /// Add to balance.
    Credit(Decimal),
    /// Add to cashback balance.
    Cashback(Decimal),
    /// Cash-out from balance, subject to withdrawal limits.
    Withdraw(Decimal),
    /// Outgoing payment, subject to spend limits.
    Spend(Decimal),
    /// Charge against balance and credit, not counted as spend.
    Debit(Decimal),
}

/// Full effect of completing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEffect {
    /// Effect on the owner's wallet.
    pub owner: OwnerEffect,
    /// Amount credited to the counterparty wallet, if there is one.
    pub counterparty_credit: Option<Decimal>,
}

/// Determines the effect of completing `txn`.
///
/// # Errors
///
/// - `MissingCounterparty` for a transfer without a counterparty wallet
/// - `InvalidTransaction` for refund records
pub fn effect_of(txn: &Transaction) -> Result<LedgerEffect, LedgerError> {
    let owner_only = |owner| LedgerEffect {
        owner,
        counterparty_credit: None,
    };

    let effect = match txn.transaction_type {
        TransactionType::Deposit | TransactionType::Credit | TransactionType::Factoring => {
            owner_only(OwnerEffect::Credit(txn.net_amount))
        }
        TransactionType::Cashback => owner_only(OwnerEffect::Cashback(txn.net_amount)),
        TransactionType::Withdrawal => owner_only(OwnerEffect::Withdraw(txn.amount)),
        TransactionType::Fee | TransactionType::CreditPayment => {
            owner_only(OwnerEffect::Debit(txn.amount))
        }
        TransactionType::Payment => LedgerEffect {
            owner: OwnerEffect::Spend(txn.amount),
            counterparty_credit: txn.counterparty_wallet_id.map(|_| txn.net_amount),
        },
        TransactionType::Transfer => {
            if txn.counterparty_wallet_id.is_none() {
                return Err(LedgerError::MissingCounterparty);
            }
            LedgerEffect {
                owner: OwnerEffect::Spend(txn.amount),
                counterparty_credit: Some(txn.net_amount),
            }
        }
        TransactionType::Refund => {
            return Err(LedgerError::InvalidTransaction(
                "refund records are created by refunding a completed transaction".to_string(),
            ));
        }
    };
    Ok(effect)
}

/// Applies an owner effect and returns how any debit was funded.
///
/// # Errors
///
/// Propagates the wallet ledger error; the wallet is unchanged on error.
pub fn apply_owner_effect(
    wallet: &mut Wallet,
    effect: OwnerEffect,
    today: NaiveDate,
) -> Result<FundingSplit, LedgerError> {
    match effect {
        OwnerEffect::Credit(amount) => {
            WalletLedger::credit(wallet, amount)?;
            Ok(FundingSplit::default())
        }
        OwnerEffect::Cashback(amount) => {
            WalletLedger::earn_cashback(wallet, amount)?;
            Ok(FundingSplit::default())
        }
        OwnerEffect::Withdraw(amount) => WalletLedger::withdraw(wallet, amount, today),
        OwnerEffect::Spend(amount) => WalletLedger::spend(wallet, amount, today),
        OwnerEffect::Debit(amount) => WalletLedger::debit(wallet, amount),
    }
}
