use crate::record::{FinancialRecord, TransactionStatus, TransactionType};

/// A construction project. Records refer to projects by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub location: String,
}

/// Selects which project's records are in scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFilter {
    All,
    Named(String),
}

/// The transaction tabs of the finance view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabFilter {
    All,
    Payable,
    Receivable,
    Pending,
    Approved,
}

impl ProjectFilter {
    pub fn named<S: Into<String>>(name: S) -> Self {
        ProjectFilter::Named(name.into())
    }

    /// The selectable filters for a list of projects: `All` followed by each project in
    /// the given order.
    pub fn options(projects: &[Project]) -> Vec<ProjectFilter> {
        std::iter::once(ProjectFilter::All)
            .chain(projects.iter().map(ProjectFilter::from))
            .collect()
    }

    /// Project names are matched exactly. There is no normalisation of case or
    /// whitespace, as the project name is the only join key we have.
    pub fn matches(&self, record: &FinancialRecord) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Named(name) => record.project == *name,
        }
    }
}

impl From<&Project> for ProjectFilter {
    fn from(project: &Project) -> Self {
        ProjectFilter::Named(project.name.clone())
    }
}

impl Default for ProjectFilter {
    fn default() -> Self {
        ProjectFilter::All
    }
}

impl TabFilter {
    pub fn matches(&self, record: &FinancialRecord) -> bool {
        match self {
            TabFilter::All => true,
            TabFilter::Payable => record.transaction_type == TransactionType::Payable,
            TabFilter::Receivable => record.transaction_type == TransactionType::Receivable,
            TabFilter::Pending => record.status == TransactionStatus::Pending,
            TabFilter::Approved => record.status == TransactionStatus::Approved,
        }
    }
}

impl Default for TabFilter {
    fn default() -> Self {
        TabFilter::All
    }
}
