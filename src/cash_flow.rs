use crate::record::{FinancialRecord, TransactionType};
use chrono::Datelike;
use log::trace;
use rust_decimal::Decimal;

/// Income and expense falling due within one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCashFlow {
    pub year: i32,
    pub month: u32, // January = 1, December = 12
    pub income: Decimal,
    pub expense: Decimal,
}

impl MonthlyCashFlow {
    fn empty(year: i32, month: u32) -> Self {
        MonthlyCashFlow {
            year,
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        }
    }

    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

/// Buckets records by the month of their due date.
///
/// The result runs chronologically from the earliest to the latest month in which a
/// record falls due. Months in between that have no records are still emitted, with
/// zero totals, so that a chart's x-axis doesn't skip.
pub(crate) fn bucket_by_month<'a, I>(records: I) -> Vec<MonthlyCashFlow>
where
    I: IntoIterator<Item = &'a FinancialRecord>,
{
    let records: Vec<&FinancialRecord> = records.into_iter().collect();

    let (first, last) = match (
        records.iter().map(|r| r.due_date).min(),
        records.iter().map(|r| r.due_date).max(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut months: Vec<MonthlyCashFlow> = month_range(
        (first.year(), first.month()),
        (last.year(), last.month()),
    )
    .into_iter()
    .map(|(y, m)| MonthlyCashFlow::empty(y, m))
    .collect();

    for record in records {
        let index = month_offset((first.year(), first.month()), &record.due_date);
        let bucket = &mut months[index];

        match record.transaction_type {
            TransactionType::Receivable => bucket.income += record.amount,
            TransactionType::Payable => bucket.expense += record.amount,
        }

        trace!(
            "bucketed {} {} into {}-{:02}",
            record.transaction_type,
            record.amount,
            bucket.year,
            bucket.month
        );
    }

    months
}

// Every (year, month) pair from `start` to `end` inclusive
fn month_range(start: (i32, u32), end: (i32, u32)) -> Vec<(i32, u32)> {
    let (mut year, mut month) = start;
    let mut result = Vec::new();

    while (year, month) <= end {
        result.push((year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    result
}

fn month_offset(start: (i32, u32), date: &impl Datelike) -> usize {
    let months = (date.year() - start.0) * 12 + date.month() as i32 - start.1 as i32;
    months as usize
}
