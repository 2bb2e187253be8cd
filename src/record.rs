use crate::{CURRENCY_PRECISION, MAX_AMOUNT};
use chrono::NaiveDate;
use log::trace;
use rust_decimal::Decimal;
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a `FinancialRecord`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

/// Direction of the cash flow for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Payable,    // Money owed out
    Receivable, // Money owed in
}

/// Approval lifecycle of a record: `Pending` -> `Approved` -> `Paid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Pending,
    Approved,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Material,
    Labor,
    Equipment,
    Admin,
    Taxes,
    Sales,
    Other,
}

/// A single ledger entry.
///
/// `amount` is always a non-negative magnitude. Whether the money flows in or out of
/// the company is determined solely by `transaction_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRecord {
    pub id: RecordId,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub due_date: NaiveDate,
    pub project: String,
    pub cost_center: String,
    pub category: Category,
}

/// A candidate record, as captured by a data entry form.
///
/// The amount arrives as a raw float from the form and hasn't been checked yet. Any
/// `status` set here is ignored when the record is created.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub description: String,
    pub amount: f64,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub due_date: NaiveDate,
    pub project: String,
    pub cost_center: String,
    pub category: Category,
}

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("amount must be a finite number")]
    NonFiniteAmount,
    #[error("amount '{0}' is negative")]
    NegativeAmount(String),
    #[error("amount '{0}' exceeds the largest amount the ledger accepts")]
    AmountTooLarge(String),
    #[error("currency values cannot have more than 2 decimal places")]
    CurrencyPrecision,
    #[error("transaction type must be PAYABLE or RECEIVABLE")]
    MissingType,
}

#[derive(Error, Debug, PartialEq)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl RecordId {
    pub(crate) fn generate() -> Self {
        RecordId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(id.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payable => "PAYABLE",
            TransactionType::Receivable => "RECEIVABLE",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYABLE" => Ok(TransactionType::Payable),
            "RECEIVABLE" => Ok(TransactionType::Receivable),
            _ => Err(ParseError::new("transaction type", s)),
        }
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Paid => "PAID",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "APPROVED" => Ok(TransactionStatus::Approved),
            "PAID" => Ok(TransactionStatus::Paid),
            _ => Err(ParseError::new("transaction status", s)),
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Material => "MATERIAL",
            Category::Labor => "LABOR",
            Category::Equipment => "EQUIPMENT",
            Category::Admin => "ADMIN",
            Category::Taxes => "TAXES",
            Category::Sales => "SALES",
            Category::Other => "OTHER",
        }
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATERIAL" => Ok(Category::Material),
            "LABOR" => Ok(Category::Labor),
            "EQUIPMENT" => Ok(Category::Equipment),
            "ADMIN" => Ok(Category::Admin),
            "TAXES" => Ok(Category::Taxes),
            "SALES" => Ok(Category::Sales),
            "OTHER" => Ok(Category::Other),
            _ => Err(ParseError::new("category", s)),
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(
            impl fmt::Display for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(TransactionType, TransactionStatus, Category);

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        ParseError {
            kind,
            value: value.to_owned(),
        }
    }
}

impl FinancialRecord {
    /// Returns the amount with the sign of its cash flow: positive for receivables,
    /// negative for payables.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Receivable => self.amount,
            TransactionType::Payable => -self.amount,
        }
    }

    pub fn is_pending_payable(&self) -> bool {
        self.transaction_type == TransactionType::Payable
            && self.status == TransactionStatus::Pending
    }
}

impl NewRecord {
    /// Checks the form input and converts it into a `Pending` record with the given id.
    pub(crate) fn into_record(self, id: RecordId) -> Result<FinancialRecord, RecordError> {
        if self.description.trim().is_empty() {
            return Err(RecordError::EmptyDescription);
        }

        let transaction_type = self.transaction_type.ok_or(RecordError::MissingType)?;
        let amount = to_currency(self.amount)?;

        if let Some(status) = self.status {
            trace!("ignoring status {} on new record; records start PENDING", status);
        }

        Ok(FinancialRecord {
            id,
            description: self.description,
            amount,
            transaction_type,
            status: TransactionStatus::Pending,
            due_date: self.due_date,
            project: self.project,
            cost_center: self.cost_center,
            category: self.category,
        })
    }
}

// Convert a raw float amount into a currency value. Floats that carry more precision
// than a currency can express are rejected rather than silently rounded.
fn to_currency(value: f64) -> Result<Decimal, RecordError> {
    if !value.is_finite() {
        return Err(RecordError::NonFiniteAmount);
    }

    if value < 0.0 {
        return Err(RecordError::NegativeAmount(value.to_string()));
    }

    if value > MAX_AMOUNT as f64 {
        return Err(RecordError::AmountTooLarge(value.to_string()));
    }

    let amount = Decimal::try_from(value).map_err(|_| RecordError::NonFiniteAmount)?;
    check_amount(amount)
}

/// Checks that an amount is a valid currency value for the ledger, returning it
/// normalised.
pub(crate) fn check_amount(amount: Decimal) -> Result<Decimal, RecordError> {
    if amount < Decimal::ZERO {
        return Err(RecordError::NegativeAmount(amount.to_string()));
    }

    // Ledger totals are summed without overflow checks, so bound each amount
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(RecordError::AmountTooLarge(amount.to_string()));
    }

    let amount = amount.normalize();
    if amount.scale() > CURRENCY_PRECISION {
        return Err(RecordError::CurrencyPrecision);
    }

    Ok(amount)
}
