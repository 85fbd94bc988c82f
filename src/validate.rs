use crate::debtor::{DebtValue, DebtorRecord, RowRecord};
use crate::error::IngestError;

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingName,
    MissingDocument,
    MissingDebtValue,
    UnparsableDebtValue(String),
    NonPositiveDebtValue(Decimal),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingName => write!(f, "missing name"),
            RejectReason::MissingDocument => write!(f, "missing document"),
            RejectReason::MissingDebtValue => write!(f, "missing debt value"),
            RejectReason::UnparsableDebtValue(text) => {
                write!(f, "debt value '{}' is not a number", text)
            }
            RejectReason::NonPositiveDebtValue(value) => {
                write!(f, "debt value {} is not positive", value)
            }
        }
    }
}

/// A dropped row. `row` is the 1-based line in the source file (the sheet
/// row number for xlsx), so under a header on line 1 the first data row is 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub row: usize,
    pub reason: RejectReason,
}

#[derive(Debug, Default)]
pub struct Validation {
    pub valid: Vec<DebtorRecord>,
    pub rejected: Vec<Rejection>,
}

pub fn check(record: RowRecord) -> Result<DebtorRecord, RejectReason> {
    let name = record.name.ok_or(RejectReason::MissingName)?;
    let document = record.document.ok_or(RejectReason::MissingDocument)?;

    let debt_value = match record.debt_value {
        DebtValue::Missing => return Err(RejectReason::MissingDebtValue),
        DebtValue::Unparsable(text) => return Err(RejectReason::UnparsableDebtValue(text)),
        DebtValue::Amount(amount) if amount <= Decimal::ZERO => {
            return Err(RejectReason::NonPositiveDebtValue(amount))
        }
        DebtValue::Amount(amount) => amount,
    };

    Ok(DebtorRecord {
        name,
        document,
        debt_value,
        debt_date: record.debt_date,
        email: record.email,
        phone: record.phone,
        address: record.address,
        portfolio_id: None,
    })
}

/// Splits `(row, record)` pairs into valid debtors and rejections, keeping
/// input order. An empty valid set is an error.
pub fn validate<I>(records: I) -> Result<Validation, IngestError>
where
    I: IntoIterator<Item = (usize, RowRecord)>,
{
    let mut validation = Validation::default();

    for (row, record) in records {
        match check(record) {
            Ok(debtor) => validation.valid.push(debtor),
            Err(reason) => {
                debug!(row, %reason, "rejected debtor row");
                validation.rejected.push(Rejection { row, reason });
            }
        }
    }

    if validation.valid.is_empty() {
        return Err(IngestError::NoValidRecords {
            rejected: validation.rejected,
        });
    }

    Ok(validation)
}
