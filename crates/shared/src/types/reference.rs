//! Human-facing identifiers.
//!
//! Besides the numeric row id, every wallet, transaction, credit line and
//! invoice carries a unique reference that is safe to show to customers.

use uuid::Uuid;

/// The entity a reference is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `wallet_number`
    Wallet,
    /// `transaction_id`
    Transaction,
    /// `credit_line_number`
    CreditLine,
    /// `invoice_number`
    Invoice,
}

impl ReferenceKind {
    /// Returns the prefix used for this kind of reference.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Wallet => "WAL",
            Self::Transaction => "TXN",
            Self::CreditLine => "CRL",
            Self::Invoice => "INV",
        }
    }
}

/// Generates a new reference such as `TXN-0192F0C4A1B27D3E8F9A0B1C2D3E4F50`.
///
/// The body is a time-ordered UUID v7, so references sort by creation time.
#[must_use]
pub fn new_reference(kind: ReferenceKind) -> String {
    format!(
        "{}-{}",
        kind.prefix(),
        Uuid::now_v7().simple().to_string().to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_prefix() {
        assert!(new_reference(ReferenceKind::Wallet).starts_with("WAL-"));
        assert!(new_reference(ReferenceKind::Transaction).starts_with("TXN-"));
        assert!(new_reference(ReferenceKind::CreditLine).starts_with("CRL-"));
        assert!(new_reference(ReferenceKind::Invoice).starts_with("INV-"));
    }

    #[test]
    fn test_reference_length_and_uniqueness() {
        let a = new_reference(ReferenceKind::Transaction);
        let b = new_reference(ReferenceKind::Transaction);
        assert_eq!(a.len(), 36);
        assert_ne!(a, b);
    }
}
