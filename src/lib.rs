pub mod analysis;
mod cash_flow;
mod filter;
mod ledger;
mod record;
pub mod sample;

pub use cash_flow::MonthlyCashFlow;
pub use filter::{Project, ProjectFilter, TabFilter};
pub use ledger::{CategoryTotal, Kpis, Ledger, LedgerError};
pub use record::{
    Category, FinancialRecord, NewRecord, ParseError, RecordError, RecordId, TransactionStatus,
    TransactionType,
};

// This represents the number of decimal places that a currency can validly express.
// @todo Support the full range of currency precisions specified in ISO 4217.
const CURRENCY_PRECISION: u32 = 2;

// The largest amount a single record may carry (one trillion). Keeping amounts well
// below `Decimal::MAX` means ledger totals can't overflow.
const MAX_AMOUNT: i64 = 1_000_000_000_000;
