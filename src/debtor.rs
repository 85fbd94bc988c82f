use crate::header::{Field, FieldMapping};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The debt value cell as read from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebtValue {
    Missing,
    Unparsable(String),
    Amount(Decimal),
}

impl DebtValue {
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return DebtValue::Missing;
        };

        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map(DebtValue::Amount)
            .unwrap_or_else(|_| DebtValue::Unparsable(text.to_string()))
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            DebtValue::Amount(amount) => Some(*amount),
            _ => None,
        }
    }
}

/// One row of a debtor file after normalization. Nothing is checked here;
/// see [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub name: Option<String>,
    pub document: Option<String>,
    pub debt_value: DebtValue,
    pub debt_date: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl RowRecord {
    pub fn from_row(row: &[String], mapping: &FieldMapping, today: NaiveDate) -> Self {
        let cell = |field: Field| -> Option<String> {
            let index = mapping.get(field)?;
            let text = row.get(index)?.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        };

        Self {
            name: cell(Field::Name),
            document: cell(Field::Document),
            debt_value: DebtValue::parse(cell(Field::DebtValue).as_deref()),
            debt_date: cell(Field::DebtDate)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            email: cell(Field::Email),
            phone: cell(Field::Phone),
            address: cell(Field::Address),
        }
    }
}

/// A validated debtor, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorRecord {
    pub name: String,
    pub document: String,
    pub debt_value: Decimal,
    pub debt_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<String>,
}

impl DebtorRecord {
    pub fn new(name: &str, document: &str, debt_value: Decimal, debt_date: &str) -> Self {
        Self {
            name: name.to_string(),
            document: document.to_string(),
            debt_value,
            debt_date: debt_date.to_string(),
            email: None,
            phone: None,
            address: None,
            portfolio_id: None,
        }
    }

    pub fn with_portfolio(mut self, portfolio_id: &str) -> Self {
        self.portfolio_id = Some(portfolio_id.to_string());
        self
    }
}
