//! Credit line domain types.

use std::fmt;

use apex_shared::types::{CreditLineId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit line lifecycle status.
///
/// Valid transitions:
/// - Pending → Approved (approve)
/// - Approved → Active (activate)
/// - Active ↔ Suspended (suspend / reactivate)
/// - Active, Suspended → Defaulted (mark default)
/// - Pending, Approved, Active, Suspended → Closed (close, no balance owed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditLineStatus {
    /// Application received.
    Pending,
    /// Approved but not yet usable.
    Approved,
    /// Open for draws.
    Active,
    /// Temporarily blocked.
    Suspended,
    /// Closed with no balance owed.
    Closed,
    /// Written off.
    Defaulted,
}

impl CreditLineStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
            Self::Defaulted => "defaulted",
        }
    }

    /// Returns true if payments are still accepted in this status.
    #[must_use]
    pub fn accepts_payments(&self) -> bool {
        matches!(self, Self::Active | Self::Suspended | Self::Defaulted)
    }
}

impl fmt::Display for CreditLineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the credit line finances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    /// Day-to-day operations.
    WorkingCapital,
    /// Stock purchases.
    Inventory,
    /// Machinery and tools.
    Equipment,
    /// Growth projects.
    Expansion,
    /// Short-notice needs.
    Emergency,
}

/// How often scheduled payments fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Every calendar month.
    #[default]
    Monthly,
    /// Every three calendar months.
    Quarterly,
}

/// Delinquency bucket derived from days past due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No days past due.
    Current,
    /// 1 to 30 days past due.
    Late,
    /// 31 to 90 days past due.
    Delinquent,
    /// More than 90 days past due.
    Default,
}

impl PaymentStatus {
    /// Returns the string representation of the bucket.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Late => "late",
            Self::Delinquent => "delinquent",
            Self::Default => "default",
        }
    }
}

/// Terms requested when a credit line is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTerms {
    /// What the line finances.
    pub credit_type: CreditType,
    /// Limit granted at approval.
    pub approved_limit: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Total term.
    pub term_months: u32,
    /// Payment cadence.
    pub payment_frequency: PaymentFrequency,
    /// Lender name.
    pub provider: String,
}

/// Snapshot of a credit line.
///
/// Invariants: `available_amount == max(0, current_limit - used_amount)` and
/// `used_amount <= current_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLine {
    /// Credit line id.
    pub id: CreditLineId,
    /// Borrower.
    pub user_id: UserId,
    /// What the line finances.
    pub credit_type: CreditType,
    /// Lender name.
    pub provider: String,
    /// Limit granted at approval; the ceiling for any adjustment.
    pub approved_limit: Decimal,
    /// Limit currently in force.
    pub current_limit: Decimal,
    /// Principal drawn and not yet repaid.
    pub used_amount: Decimal,
    /// Room left to draw.
    pub available_amount: Decimal,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Total term.
    pub term_months: u32,
    /// Payment cadence.
    pub payment_frequency: PaymentFrequency,
    /// Lifecycle status.
    pub status: CreditLineStatus,
    /// When the line was approved.
    pub approval_date: Option<DateTime<Utc>>,
    /// When the line was activated.
    pub activation_date: Option<DateTime<Utc>>,
    /// When the full term ends.
    pub maturity_date: Option<DateTime<Utc>>,
    /// Smallest payment that keeps the line current.
    pub minimum_payment: Decimal,
    /// Scheduled amount of the next payment.
    pub next_payment_amount: Decimal,
    /// When the next payment falls due.
    pub next_payment_date: Option<DateTime<Utc>>,
    /// When the last payment was received.
    pub last_payment_date: Option<DateTime<Utc>>,
    /// Number of payments received.
    pub total_payments_made: u32,
    /// Sum of all payments received.
    pub total_amount_paid: Decimal,
    /// Interest part of all payments received.
    pub total_interest_paid: Decimal,
    /// Days the oldest scheduled payment is overdue.
    pub days_past_due: u32,
    /// Times the line went from current to late.
    pub late_payment_count: u32,
}

impl CreditLine {
    /// Creates a pending credit line from the requested terms.
    #[must_use]
    pub fn new(id: CreditLineId, user_id: UserId, terms: CreditTerms) -> Self {
        Self {
            id,
            user_id,
            credit_type: terms.credit_type,
            provider: terms.provider,
            approved_limit: terms.approved_limit,
            current_limit: terms.approved_limit,
            used_amount: Decimal::ZERO,
            available_amount: terms.approved_limit,
            interest_rate: terms.interest_rate,
            term_months: terms.term_months,
            payment_frequency: terms.payment_frequency,
            status: CreditLineStatus::Pending,
            approval_date: None,
            activation_date: None,
            maturity_date: None,
            minimum_payment: Decimal::ZERO,
            next_payment_amount: Decimal::ZERO,
            next_payment_date: None,
            last_payment_date: None,
            total_payments_made: 0,
            total_amount_paid: Decimal::ZERO,
            total_interest_paid: Decimal::ZERO,
            days_past_due: 0,
            late_payment_count: 0,
        }
    }
}

/// How a payment was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayment {
    /// One month of interest on the outstanding balance, capped at the payment.
    pub interest: Decimal,
    /// Remainder of the payment, applied to `used_amount`.
    pub principal: Decimal,
}
