use crate::debtor::DebtorRecord;
use crate::error::IngestError;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Months between ingestion and the portfolio due date.
pub const DUE_IN_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioStatus {
    Draft,
    Bidding,
    Assigned,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortfolioSummary {
    pub debtor_count: usize,
    pub total_value: Decimal,
}

impl PortfolioSummary {
    pub fn of(debtors: &[DebtorRecord]) -> Result<Self, IngestError> {
        let total_value = debtors
            .iter()
            .try_fold(Decimal::ZERO, |total, d| total.checked_add(d.debt_value))
            .ok_or(IngestError::TotalOverflow {
                debtor_count: debtors.len(),
            })?;

        Ok(Self {
            debtor_count: debtors.len(),
            total_value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRequest {
    pub name: String,
    pub institution_id: String,
    pub total_debt_value: Decimal,
    pub debtor_count: usize,
    pub due_date: NaiveDate,
    pub status: PortfolioStatus,
}

impl PortfolioRequest {
    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            debtor_count: self.debtor_count,
            total_value: self.total_debt_value,
        }
    }
}

/// Ingestion date plus [`DUE_IN_MONTHS`], clamped to the end of the month.
pub fn due_date(ingested_on: NaiveDate) -> Result<NaiveDate, IngestError> {
    ingested_on
        .checked_add_months(Months::new(DUE_IN_MONTHS))
        .ok_or(IngestError::DueDateOutOfRange(ingested_on))
}

pub fn default_name(ingested_on: NaiveDate) -> String {
    format!("Portfolio {}", ingested_on.format("%d/%m/%Y"))
}

/// Builds the draft portfolio for a validated debtor set. A blank `name`
/// falls back to [`default_name`].
pub fn aggregate(
    debtors: &[DebtorRecord],
    name: Option<&str>,
    institution_id: &str,
    ingested_on: NaiveDate,
) -> Result<PortfolioRequest, IngestError> {
    let summary = PortfolioSummary::of(debtors)?;

    let name = match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_name(ingested_on),
    };

    Ok(PortfolioRequest {
        name,
        institution_id: institution_id.to_string(),
        total_debt_value: summary.total_value,
        debtor_count: summary.debtor_count,
        due_date: due_date(ingested_on)?,
        status: PortfolioStatus::Draft,
    })
}
