//! Database seeder for Apex development and testing.
//!
//! Opens two funded wallets, runs a transfer through the processor, opens an
//! active credit line and drafts a factorable invoice. Every write goes
//! through the repositories, so the seeded rows satisfy the ledger rules.
//!
//! Usage: cargo run --bin seeder [-- <merchant opening balance>]
//!
//! A refused ledger call exits with the sysexits status of its error kind.

use std::process::ExitCode;

use anyhow::Context;
use apex_core::credit::{CreditTerms, CreditType, PaymentFrequency};
use apex_core::invoice::{
    CfdiUse, InvoiceItem, NewInvoice, PaymentTerms, SatPaymentMethod,
};
use apex_core::transaction::{NewTransaction, PaymentMethod, TransactionType};
use apex_db::{CreditLineRepository, InvoiceRepository, TransactionRepository, WalletRepository};
use apex_shared::types::{Currency, Money, UserId, ensure_currency_amount, parse_amount};
use apex_shared::{AppConfig, AppError, AppResult};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info};

/// Demo merchant.
const MERCHANT: UserId = UserId::new(1001);
/// Demo supplier.
const SUPPLIER: UserId = UserId::new(1002);
/// Merchant balance when none is given on the command line.
const DEFAULT_OPENING_BALANCE: Decimal = dec!(25000);

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = AppConfig::load().context("failed to load configuration")?;
    apex_shared::telemetry::init(&config.telemetry)?;

    let opening = match std::env::args().nth(1) {
        Some(text) => parse_amount(&text)
            .and_then(ensure_currency_amount)
            .with_context(|| format!("invalid opening balance '{text}'"))?,
        None => DEFAULT_OPENING_BALANCE,
    };

    match seed(&config, opening).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(code = err.code(), retryable = err.is_retryable(), "seeding failed: {err}");
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

async fn seed(config: &AppConfig, opening: Decimal) -> AppResult<()> {
    let db = apex_db::connect_with(&config.database)
        .await
        .map_err(|err| AppError::Storage(err.to_string()))?;

    let wallets = WalletRepository::new(db.clone(), &config.ledger);
    let transactions = TransactionRepository::new(db.clone(), &config.ledger);
    let credit_lines = CreditLineRepository::new(db.clone(), &config.ledger);
    let invoices = InvoiceRepository::new(db, &config.ledger);
    let now = Utc::now();

    info!("seeding wallets");
    let merchant = wallets
        .open(MERCHANT, Currency::Mxn, Some("Merchant operating wallet".to_string()))
        .await?;
    let supplier = wallets
        .open(SUPPLIER, Currency::Mxn, Some("Supplier receivables".to_string()))
        .await?;
    info!(opening_balance = %Money::new(opening, Currency::Mxn), "funding merchant wallet");
    wallets.credit(merchant.id, opening).await?;
    wallets.set_credit_limit(merchant.id, dec!(5000)).await?;

    info!("seeding a completed transfer");
    let transfer = transactions
        .create(NewTransaction {
            user_id: MERCHANT,
            wallet_id: merchant.id,
            transaction_type: TransactionType::Transfer,
            amount: dec!(1200),
            fee: dec!(12),
            currency: Currency::Mxn,
            payment_method: PaymentMethod::Wallet,
            counterparty_user_id: Some(SUPPLIER),
            counterparty_wallet_id: Some(supplier.id),
            credit_line_id: None,
            invoice_id: None,
            description: Some("Brake pad restock".to_string()),
        })
        .await?;
    transactions.start_processing(transfer.id).await?;
    transactions.complete(transfer.id, now).await?;

    info!("seeding a credit line");
    let line = credit_lines
        .open(
            MERCHANT,
            CreditTerms {
                credit_type: CreditType::Inventory,
                approved_limit: dec!(150000),
                interest_rate: dec!(18),
                term_months: 12,
                payment_frequency: PaymentFrequency::Monthly,
                provider: "Financiera Demo".to_string(),
            },
        )
        .await?;
    credit_lines.approve(line.id, now).await?;
    credit_lines.activate(line.id, now).await?;
    credit_lines.draw(line.id, dec!(20000)).await?;

    info!("seeding an invoice");
    let invoice = invoices
        .create(NewInvoice {
            issuer_id: SUPPLIER,
            receiver_id: MERCHANT,
            folio: Some("1001".to_string()),
            series: Some("A".to_string()),
            currency: Currency::Mxn,
            exchange_rate: Decimal::ONE,
            issue_date: now,
            due_date: None,
            payment_terms: PaymentTerms::Net60,
            sat_payment_method: SatPaymentMethod::Ppd,
            payment_form: "99".to_string(),
            cfdi_use: CfdiUse::AdquisicionMercancias,
            items: vec![
                InvoiceItem {
                    description: "Ceramic brake pads".to_string(),
                    quantity: dec!(40),
                    unit_price: dec!(850),
                    discount: dec!(1000),
                    tax_rate: dec!(16),
                },
                InvoiceItem {
                    description: "Brake fluid DOT 4".to_string(),
                    quantity: dec!(24),
                    unit_price: dec!(189.50),
                    discount: Decimal::ZERO,
                    tax_rate: dec!(16),
                },
            ],
            notes: None,
            factoring_available: true,
        })
        .await?;
    invoices.send(invoice.id).await?;

    info!(
        merchant_wallet = %merchant.id,
        supplier_wallet = %supplier.id,
        credit_line = %line.id,
        invoice = %invoice.id,
        "seeding complete"
    );
    Ok(())
}
