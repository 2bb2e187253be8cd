use crate::{
    cash_flow::{bucket_by_month, MonthlyCashFlow},
    filter::{ProjectFilter, TabFilter},
    record::{
        check_amount, Category, FinancialRecord, NewRecord, RecordError, RecordId,
        TransactionStatus, TransactionType,
    },
};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// The financial ledger of the company.
///
/// The ledger owns every record and is the only way to mutate them. All views over the
/// records (filtered lists, KPIs, breakdowns) are computed from the current collection
/// each time they are requested, so they can never observe a stale snapshot.
///
/// Records are kept newest first: `create` always inserts at the front.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<FinancialRecord>,
}

/// Summary figures for a project scope
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal, // May be negative
    pub pending: usize,   // Payables awaiting approval
}

/// The total expense booked against one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("invalid record: {0}")]
    Validation(#[from] RecordError),
    #[error("record id '{0}' is not unique")]
    DuplicateId(RecordId),
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Creates a ledger from existing records, keeping their order.
    ///
    /// Ids must be unique and amounts must follow the same rules as `create`.
    pub fn from_records(records: Vec<FinancialRecord>) -> Result<Self, LedgerError> {
        let mut ids = HashSet::new();

        for record in records.iter() {
            if !ids.insert(&record.id) {
                return Err(LedgerError::DuplicateId(record.id.clone()));
            }

            check_amount(record.amount)?;
        }

        debug!("loaded ledger with {} records", records.len());

        Ok(Ledger { records })
    }

    pub fn records(&self) -> &[FinancialRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&FinancialRecord> {
        self.records.iter().find(|r| r.id == *id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records matching both the project and the tab filter, in ledger
    /// order.
    pub fn filtered_records(
        &self,
        project: &ProjectFilter,
        tab: TabFilter,
    ) -> Vec<&FinancialRecord> {
        self.records
            .iter()
            .filter(|r| project.matches(r) && tab.matches(r))
            .collect()
    }

    /// Calculates the KPIs for a project.
    ///
    /// KPIs describe the whole project, so unlike `filtered_records` they ignore the
    /// selected tab.
    pub fn kpis(&self, project: &ProjectFilter) -> Kpis {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut pending = 0;

        for record in self.scope(project) {
            match record.transaction_type {
                TransactionType::Receivable => income += record.amount,
                TransactionType::Payable => expense += record.amount,
            }

            if record.is_pending_payable() {
                pending += 1;
            }
        }

        Kpis {
            income,
            expense,
            balance: income - expense,
            pending,
        }
    }

    /// Sums the payables in a project's scope by category.
    ///
    /// Categories are listed in the order they first appear in the ledger. Categories
    /// whose total is zero are left out.
    pub fn category_breakdown(&self, project: &ProjectFilter) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();

        for record in self
            .scope(project)
            .filter(|r| r.transaction_type == TransactionType::Payable)
        {
            match totals.iter_mut().find(|t| t.category == record.category) {
                Some(t) => t.total += record.amount,
                None => totals.push(CategoryTotal {
                    category: record.category,
                    total: record.amount,
                }),
            }
        }

        totals.retain(|t| !t.total.is_zero());
        totals
    }

    /// Buckets a project's income and expense by the month they fall due.
    pub fn monthly_cash_flow(&self, project: &ProjectFilter) -> Vec<MonthlyCashFlow> {
        bucket_by_month(self.scope(project))
    }

    /// Approves a pending payable.
    ///
    /// Only pending payables can be approved. Approving anything else, including an id
    /// that doesn't exist, does nothing. Returns whether the record was approved.
    pub fn approve(&mut self, id: &RecordId) -> bool {
        match self.records.iter_mut().find(|r| r.id == *id) {
            Some(record) if record.is_pending_payable() => {
                record.status = TransactionStatus::Approved;
                debug!("approved record {} ({})", record.id, record.description);
                true
            }
            Some(record) => {
                debug!(
                    "record {} is a {} {} record and cannot be approved",
                    record.id, record.status, record.transaction_type
                );
                false
            }
            None => {
                debug!("no record with id {} to approve", id);
                false
            }
        }
    }

    /// Validates and adds a new record to the front of the ledger.
    ///
    /// The new record is always `Pending`. If validation fails the ledger is left
    /// untouched.
    pub fn create(&mut self, new: NewRecord) -> Result<RecordId, LedgerError> {
        let record = new.into_record(self.next_id()).map_err(|e| {
            warn!("rejected new record: {}", e);
            e
        })?;
        let id = record.id.clone();

        debug!(
            "created {} record {} for {} on project '{}'",
            record.transaction_type, id, record.amount, record.project
        );

        self.records.insert(0, record);
        Ok(id)
    }

    fn scope<'a>(
        &'a self,
        project: &'a ProjectFilter,
    ) -> impl Iterator<Item = &'a FinancialRecord> + 'a {
        self.records.iter().filter(move |r| project.matches(r))
    }

    // UUIDs won't realistically collide, but the ledger may have been seeded with
    // arbitrary ids, so make sure.
    fn next_id(&self) -> RecordId {
        loop {
            let id = RecordId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
