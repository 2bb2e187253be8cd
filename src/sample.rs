//! Seed data for the finance dashboard.

use crate::{
    filter::Project,
    record::{Category, FinancialRecord, RecordId, TransactionStatus, TransactionType},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn projects() -> Vec<Project> {
    vec![
        project("Residencial Horizon", "Centro, São Paulo"),
        project("Edifício Titan", "Zona Sul, Rio de Janeiro"),
        project("Galpão Logístico Alpha", "Campinas, SP"),
    ]
}

/// The seed ledger. Note that "Escritório Central" is a project name with no matching
/// entry in `projects()`.
#[rustfmt::skip]
pub fn financial_records() -> Vec<FinancialRecord> {
    use Category::*;
    use TransactionStatus::*;
    use TransactionType::*;

    const HORIZON: &str = "Residencial Horizon";
    const TITAN: &str = "Edifício Titan";
    const ALPHA: &str = "Galpão Logístico Alpha";
    const OFFICE: &str = "Escritório Central";

    vec![
        record("1", "Cimento Votoran (500 sacos)", dec!(12500), Payable, Pending, "2023-10-25", HORIZON, "Fundação", Material),
        record("3", "Venda Unidade 101 - Entrada", dec!(45000), Receivable, Paid, "2023-10-20", HORIZON, "Vendas", Sales),
        record("5", "Aço Gerdau CA-50", dec!(28000), Payable, Paid, "2023-09-15", HORIZON, "Estrutura", Material),
        record("6", "Folha de Pagamento (Set)", dec!(120000), Payable, Paid, "2023-10-05", HORIZON, "RH", Labor),
        record("7", "Venda Unidade 304 - Parcela", dec!(15000), Receivable, Pending, "2023-10-30", HORIZON, "Vendas", Sales),

        record("2", "Locação de Grua Potain", dec!(8000), Payable, Approved, "2023-10-28", TITAN, "Equipamentos", Equipment),
        record("8", "Licença Prefeitura", dec!(4500), Payable, Paid, "2023-08-10", TITAN, "Administrativo", Taxes),
        record("9", "Serviço de Terraplanagem", dec!(15000), Payable, Approved, "2023-09-01", TITAN, "Fundação", Labor),
        record("10", "Venda Unidade Cobertura - Sinal", dec!(150000), Receivable, Paid, "2023-09-20", TITAN, "Vendas", Sales),

        record("4", "Empreiteira Silva & Filhos", dec!(32000), Payable, Pending, "2023-11-05", ALPHA, "Mão de Obra", Labor),
        record("11", "Telhas Metálicas", dec!(42000), Payable, Approved, "2023-10-15", ALPHA, "Cobertura", Material),
        record("12", "Instalação Elétrica Industrial", dec!(18000), Payable, Pending, "2023-11-10", ALPHA, "Instalações", Labor),

        record("13", "Software NEXUS (Mensalidade)", dec!(1200), Payable, Paid, "2023-10-01", OFFICE, "TI", Admin),
        record("14", "Manutenção Frota", dec!(3500), Payable, Paid, "2023-09-28", OFFICE, "Logística", Equipment),
        record("15", "Aporte de Capital", dec!(500000), Receivable, Paid, "2023-07-01", OFFICE, "Financeiro", Other),
    ]
}

fn project(name: &str, location: &str) -> Project {
    Project {
        name: name.to_owned(),
        location: location.to_owned(),
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    description: &str,
    amount: Decimal,
    transaction_type: TransactionType,
    status: TransactionStatus,
    due_date: &str,
    project: &str,
    cost_center: &str,
    category: Category,
) -> FinancialRecord {
    FinancialRecord {
        id: RecordId::from(id),
        description: description.to_owned(),
        amount,
        transaction_type,
        status,
        due_date: due_date.parse::<NaiveDate>().expect("seed due dates are ISO 8601"),
        project: project.to_owned(),
        cost_center: cost_center.to_owned(),
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{ProjectFilter, TabFilter},
        ledger::{CategoryTotal, Kpis, Ledger},
    };

    fn ledger() -> Ledger {
        Ledger::from_records(financial_records()).unwrap()
    }

    #[test]
    fn seed_data_is_complete() {
        let records = financial_records();

        assert_eq!(records.len(), 15);
        assert_eq!(records[0].due_date, NaiveDate::from_ymd_opt(2023, 10, 25).unwrap());
        assert_eq!(records[14].due_date, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(projects().len(), 3);
    }

    #[test]
    fn seed_kpis_for_all_projects() {
        assert_eq!(
            ledger().kpis(&ProjectFilter::All),
            Kpis {
                income: dec!(710000),
                expense: dec!(284700),
                balance: dec!(425300),
                pending: 3,
            }
        );
    }

    #[test]
    fn seed_kpis_for_horizon() {
        assert_eq!(
            ledger().kpis(&ProjectFilter::named("Residencial Horizon")),
            Kpis {
                income: dec!(60000),
                expense: dec!(160500),
                balance: dec!(-100500),
                pending: 1,
            }
        );
    }

    #[test]
    fn seed_breakdown_for_alpha() {
        assert_eq!(
            ledger().category_breakdown(&ProjectFilter::named("Galpão Logístico Alpha")),
            vec![
                CategoryTotal {
                    category: Category::Labor,
                    total: dec!(50000),
                },
                CategoryTotal {
                    category: Category::Material,
                    total: dec!(42000),
                },
            ]
        );
    }

    #[test]
    fn seed_office_has_no_project_entity() {
        let ledger = ledger();
        let office = ProjectFilter::named("Escritório Central");

        assert!(!ProjectFilter::options(&projects()).contains(&office));
        assert_eq!(ledger.filtered_records(&office, TabFilter::All).len(), 3);
    }

    #[test]
    fn seed_monthly_cash_flow() {
        let months = ledger().monthly_cash_flow(&ProjectFilter::All);

        assert_eq!(months.len(), 5);
        assert_eq!((months[0].year, months[0].month), (2023, 7));
        assert_eq!((months[4].year, months[4].month), (2023, 11));
        assert_eq!(months[4].expense, dec!(50000));
        assert_eq!(months[0].income, dec!(500000));
    }
}
