//! Ledger schema migration.
//!
//! Creates the enum types and the wallets, transactions, credit_lines and
//! invoices tables. Balance invariants are repeated as CHECK constraints.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(CREDIT_LINES_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE wallet_status AS ENUM ('active', 'suspended', 'closed');
CREATE TYPE transaction_type AS ENUM (
    'deposit', 'withdrawal', 'payment', 'refund', 'transfer',
    'credit', 'cashback', 'fee', 'factoring', 'credit_payment'
);
CREATE TYPE transaction_status AS ENUM (
    'pending', 'processing', 'completed', 'failed', 'cancelled', 'refunded'
);
CREATE TYPE payment_method AS ENUM ('wallet', 'credit', 'bank_transfer', 'card', 'cash');
CREATE TYPE credit_type AS ENUM (
    'working_capital', 'inventory', 'equipment', 'expansion', 'emergency'
);
CREATE TYPE payment_frequency AS ENUM ('weekly', 'biweekly', 'monthly', 'quarterly');
CREATE TYPE credit_line_status AS ENUM (
    'pending', 'approved', 'active', 'suspended', 'closed', 'defaulted'
);
CREATE TYPE invoice_status AS ENUM ('draft', 'sent', 'paid', 'overdue', 'cancelled', 'refunded');
CREATE TYPE payment_terms AS ENUM ('immediate', 'net_15', 'net_30', 'net_60', 'net_90');
CREATE TYPE cfdi_status AS ENUM ('pending', 'issued', 'cancelled');
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id BIGSERIAL PRIMARY KEY,
    wallet_number VARCHAR(64) NOT NULL UNIQUE,
    user_id BIGINT NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'MXN',
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    available_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    frozen_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit_limit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    used_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    available_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    cashback_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_cashback_earned NUMERIC(19, 4) NOT NULL DEFAULT 0,
    daily_limit NUMERIC(19, 4) NOT NULL DEFAULT 50000,
    monthly_limit NUMERIC(19, 4) NOT NULL DEFAULT 500000,
    withdrawal_limit NUMERIC(19, 4) NOT NULL DEFAULT 20000,
    window_day DATE NOT NULL DEFAULT CURRENT_DATE,
    spent_today NUMERIC(19, 4) NOT NULL DEFAULT 0,
    spent_this_month NUMERIC(19, 4) NOT NULL DEFAULT 0,
    withdrawn_today NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status wallet_status NOT NULL DEFAULT 'active',
    description TEXT,
    last_transaction_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_wallet_balance_split CHECK (available_balance + frozen_balance = balance),
    CONSTRAINT chk_wallet_non_negative CHECK (
        available_balance >= 0 AND frozen_balance >= 0 AND used_credit >= 0
    ),
    CONSTRAINT chk_wallet_available_credit CHECK (
        available_credit = GREATEST(credit_limit - used_credit, 0)
    )
);

CREATE INDEX idx_wallets_user ON wallets(user_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id BIGSERIAL PRIMARY KEY,
    transaction_id VARCHAR(64) NOT NULL UNIQUE,
    user_id BIGINT NOT NULL,
    wallet_id BIGINT NOT NULL REFERENCES wallets(id),
    transaction_type transaction_type NOT NULL,
    status transaction_status NOT NULL DEFAULT 'pending',
    amount NUMERIC(19, 4) NOT NULL,
    fee NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_amount NUMERIC(19, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'MXN',
    exchange_rate NUMERIC(19, 8) NOT NULL DEFAULT 1,
    payment_method payment_method NOT NULL DEFAULT 'wallet',
    reference VARCHAR(255),
    external_id VARCHAR(255),
    counterparty_user_id BIGINT,
    counterparty_wallet_id BIGINT REFERENCES wallets(id),
    credit_line_id BIGINT,
    invoice_id BIGINT,
    refund_of BIGINT REFERENCES transactions(id),
    description TEXT,
    balance_portion NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit_portion NUMERIC(19, 4) NOT NULL DEFAULT 0,
    processed_at TIMESTAMPTZ,
    failure_reason TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transaction_net CHECK (net_amount = amount - fee),
    CONSTRAINT chk_transaction_counterparty CHECK (counterparty_wallet_id IS DISTINCT FROM wallet_id)
);

CREATE INDEX idx_transactions_wallet ON transactions(wallet_id, created_at DESC);
CREATE INDEX idx_transactions_status ON transactions(status) WHERE status IN ('pending', 'processing');
-- A transaction can be refunded once
CREATE UNIQUE INDEX idx_transactions_refund_of ON transactions(refund_of) WHERE refund_of IS NOT NULL;
";

const CREDIT_LINES_SQL: &str = r"
CREATE TABLE credit_lines (
    id BIGSERIAL PRIMARY KEY,
    credit_line_number VARCHAR(64) NOT NULL UNIQUE,
    user_id BIGINT NOT NULL,
    credit_type credit_type NOT NULL,
    provider VARCHAR(100) NOT NULL,
    approved_limit NUMERIC(19, 4) NOT NULL,
    current_limit NUMERIC(19, 4) NOT NULL,
    used_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    available_amount NUMERIC(19, 4) NOT NULL,
    interest_rate NUMERIC(7, 4) NOT NULL,
    term_months INTEGER NOT NULL,
    payment_frequency payment_frequency NOT NULL DEFAULT 'monthly',
    status credit_line_status NOT NULL DEFAULT 'pending',
    approval_date TIMESTAMPTZ,
    activation_date TIMESTAMPTZ,
    maturity_date TIMESTAMPTZ,
    minimum_payment NUMERIC(19, 4) NOT NULL DEFAULT 0,
    next_payment_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    next_payment_date TIMESTAMPTZ,
    last_payment_date TIMESTAMPTZ,
    total_payments_made INTEGER NOT NULL DEFAULT 0,
    total_amount_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_interest_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    days_past_due INTEGER NOT NULL DEFAULT 0,
    late_payment_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_credit_line_usage CHECK (used_amount >= 0 AND used_amount <= current_limit),
    CONSTRAINT chk_credit_line_available CHECK (
        available_amount = GREATEST(current_limit - used_amount, 0)
    ),
    CONSTRAINT chk_credit_line_term CHECK (term_months > 0)
);

CREATE INDEX idx_credit_lines_user ON credit_lines(user_id);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id BIGSERIAL PRIMARY KEY,
    invoice_number VARCHAR(64) NOT NULL UNIQUE,
    folio VARCHAR(50),
    series VARCHAR(25),
    issuer_id BIGINT NOT NULL,
    receiver_id BIGINT NOT NULL,
    subtotal NUMERIC(19, 4) NOT NULL,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'MXN',
    exchange_rate NUMERIC(19, 8) NOT NULL DEFAULT 1,
    status invoice_status NOT NULL DEFAULT 'draft',
    issue_date TIMESTAMPTZ NOT NULL,
    due_date TIMESTAMPTZ NOT NULL,
    paid_date TIMESTAMPTZ,
    payment_terms payment_terms NOT NULL DEFAULT 'net_30',
    sat_payment_method VARCHAR(3) NOT NULL DEFAULT 'PUE',
    payment_form VARCHAR(2) NOT NULL DEFAULT '99',
    cfdi_uuid VARCHAR(36) UNIQUE,
    cfdi_use VARCHAR(4) NOT NULL DEFAULT 'G03',
    cfdi_xml_url VARCHAR(500),
    cfdi_pdf_url VARCHAR(500),
    cfdi_status cfdi_status NOT NULL DEFAULT 'pending',
    cfdi_cancellation_date TIMESTAMPTZ,
    items JSONB NOT NULL DEFAULT '[]'::jsonb,
    notes TEXT,
    factoring_available BOOLEAN NOT NULL DEFAULT TRUE,
    factoring_rate NUMERIC(7, 4),
    factored_amount NUMERIC(19, 4),
    factoring_date TIMESTAMPTZ,
    factoring_provider VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_total CHECK (ABS(total - (subtotal + tax_amount - discount_amount)) <= 0.01)
);

CREATE INDEX idx_invoices_issuer ON invoices(issuer_id, issue_date DESC);
CREATE INDEX idx_invoices_receiver ON invoices(receiver_id);
CREATE INDEX idx_invoices_due ON invoices(due_date) WHERE status = 'sent';
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS credit_lines CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TYPE IF EXISTS cfdi_status;
DROP TYPE IF EXISTS payment_terms;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS credit_line_status;
DROP TYPE IF EXISTS payment_frequency;
DROP TYPE IF EXISTS credit_type;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS wallet_status;
";
