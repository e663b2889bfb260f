//! Invoice domain types, including the CFDI fields required in Mexico.

use std::fmt;

use apex_shared::types::{Currency, InvoiceId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// VAT rate applied when an item does not specify one.
pub const DEFAULT_TAX_RATE: Decimal = dec!(16);

/// Invoice status.
///
/// Valid transitions:
/// - Draft → Sent (send)
/// - Sent → Overdue (mark overdue, once the due date has passed)
/// - Sent, Overdue → Paid (mark paid)
/// - Paid → Refunded (refund)
/// - Draft, Sent, Overdue → Cancelled (cancel, unless factored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared.
    Draft,
    /// Delivered to the receiver.
    Sent,
    /// Settled.
    Paid,
    /// Past due and unpaid.
    Overdue,
    /// Voided.
    Cancelled,
    /// Payment returned.
    Refunded,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agreed payment terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    /// Due on issue.
    Immediate,
    /// Due in 15 days.
    #[serde(rename = "net_15")]
    Net15,
    /// Due in 30 days.
    #[default]
    #[serde(rename = "net_30")]
    Net30,
    /// Due in 60 days.
    #[serde(rename = "net_60")]
    Net60,
    /// Due in 90 days.
    #[serde(rename = "net_90")]
    Net90,
}

impl PaymentTerms {
    /// Days between issue and due date.
    #[must_use]
    pub fn days(&self) -> i64 {
        match self {
            Self::Immediate => 0,
            Self::Net15 => 15,
            Self::Net30 => 30,
            Self::Net60 => 60,
            Self::Net90 => 90,
        }
    }
}

/// SAT payment method: single payment or installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SatPaymentMethod {
    /// Pago en una sola exhibición.
    #[default]
    Pue,
    /// Pago en parcialidades o diferido.
    Ppd,
}

/// Lifecycle of the tax document attached to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CfdiStatus {
    /// Not yet stamped.
    #[default]
    Pending,
    /// Stamped by the tax authority.
    Issued,
    /// Cancelled with the tax authority.
    Cancelled,
}

impl fmt::Display for CfdiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Issued => write!(f, "issued"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

macro_rules! cfdi_uses {
    ($($variant:ident => $code:literal, $doc:literal;)+) => {
        /// SAT catalogue of CFDI uses.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum CfdiUse {
            $(
                #[doc = $doc]
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl CfdiUse {
            /// SAT code, e.g. `G03`.
            #[must_use]
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Looks a use up by its SAT code.
            #[must_use]
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

cfdi_uses! {
    AdquisicionMercancias => "G01", "Acquisition of goods.";
    DevolucionesDescuentos => "G02", "Returns, discounts or rebates.";
    GastosGenerales => "G03", "General expenses.";
    Construcciones => "I01", "Construction.";
    MobiliarioEquipo => "I02", "Office furniture and equipment.";
    EquipoTransporte => "I03", "Transport equipment.";
    EquipoComputo => "I04", "Computer equipment.";
    DadosTroqueles => "I05", "Dies, moulds and tooling.";
    ComunicacionesTelefonicas => "I06", "Telephone communications.";
    ComunicacionesSatelitales => "I07", "Satellite communications.";
    OtraMaquinaria => "I08", "Other machinery.";
    HonorariosMedicos => "D01", "Medical and dental fees.";
    GastosMedicos => "D02", "Medical expenses for disability.";
    GastosFunerales => "D03", "Funeral expenses.";
    Donativos => "D04", "Donations.";
    InteresesCreditosHipotecarios => "D05", "Mortgage interest.";
    AportacionesVoluntariasSar => "D06", "Voluntary retirement contributions.";
    PrimasSegurosGastosMedicos => "D07", "Medical insurance premiums.";
    GastosTransportacionEscolar => "D08", "School transport.";
    DepositosCuentasAhorro => "D09", "Savings account deposits.";
    PagosServiciosEducativos => "D10", "Tuition.";
    SinEfectosFiscales => "S01", "No tax effect.";
    Pagos => "CP01", "Payments.";
    Nomina => "CN01", "Payroll.";
}

impl Default for CfdiUse {
    fn default() -> Self {
        Self::GastosGenerales
    }
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// What was sold.
    pub description: String,
    /// Units sold.
    pub quantity: Decimal,
    /// Price per unit before tax.
    pub unit_price: Decimal,
    /// Discount on the line.
    #[serde(default)]
    pub discount: Decimal,
    /// Tax rate in percent.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
}

fn default_tax_rate() -> Decimal {
    DEFAULT_TAX_RATE
}

/// Totals derived from the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of `quantity × unit_price`.
    pub subtotal: Decimal,
    /// Tax on the discounted lines.
    pub tax_amount: Decimal,
    /// Sum of line discounts.
    pub discount_amount: Decimal,
    /// `subtotal + tax_amount - discount_amount`.
    pub total: Decimal,
}

/// Input for a new invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    /// Seller.
    pub issuer_id: UserId,
    /// Buyer.
    pub receiver_id: UserId,
    /// Internal folio.
    pub folio: Option<String>,
    /// Invoice series.
    pub series: Option<String>,
    /// Currency.
    pub currency: Currency,
    /// Rate to MXN.
    pub exchange_rate: Decimal,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date; derived from the payment terms when absent.
    pub due_date: Option<DateTime<Utc>>,
    /// Payment terms.
    pub payment_terms: PaymentTerms,
    /// SAT payment method.
    pub sat_payment_method: SatPaymentMethod,
    /// SAT payment form code (`99` = to be defined).
    pub payment_form: String,
    /// CFDI use.
    pub cfdi_use: CfdiUse,
    /// Lines.
    pub items: Vec<InvoiceItem>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Whether the issuer allows the invoice to be factored.
    pub factoring_available: bool,
}

/// Snapshot of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Row id.
    pub id: InvoiceId,
    /// Human-facing number (`INV-…`).
    pub invoice_number: String,
    /// Internal folio.
    pub folio: Option<String>,
    /// Invoice series.
    pub series: Option<String>,
    /// Seller.
    pub issuer_id: UserId,
    /// Buyer.
    pub receiver_id: UserId,
    /// Sum of line amounts.
    pub subtotal: Decimal,
    /// Tax.
    pub tax_amount: Decimal,
    /// Discounts.
    pub discount_amount: Decimal,
    /// Amount payable.
    pub total: Decimal,
    /// Currency.
    pub currency: Currency,
    /// Rate to MXN.
    pub exchange_rate: Decimal,
    /// Status.
    pub status: InvoiceStatus,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// When it was paid.
    pub paid_date: Option<DateTime<Utc>>,
    /// Payment terms.
    pub payment_terms: PaymentTerms,
    /// SAT payment method.
    pub sat_payment_method: SatPaymentMethod,
    /// SAT payment form code.
    pub payment_form: String,
    /// Fiscal folio assigned by the tax authority.
    pub cfdi_uuid: Option<String>,
    /// CFDI use.
    pub cfdi_use: CfdiUse,
    /// Location of the stamped XML.
    pub cfdi_xml_url: Option<String>,
    /// Location of the printable PDF.
    pub cfdi_pdf_url: Option<String>,
    /// Tax document status.
    pub cfdi_status: CfdiStatus,
    /// When the tax document was cancelled.
    pub cfdi_cancellation_date: Option<DateTime<Utc>>,
    /// Lines.
    pub items: Vec<InvoiceItem>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Whether the issuer allows factoring.
    pub factoring_available: bool,
    /// Rate applied when factored, in percent.
    pub factoring_rate: Option<Decimal>,
    /// Cash received from factoring.
    pub factored_amount: Option<Decimal>,
    /// When the invoice was factored.
    pub factoring_date: Option<DateTime<Utc>>,
    /// Who bought the invoice.
    pub factoring_provider: Option<String>,
}
