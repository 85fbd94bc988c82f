use crate::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Semantic fields a debtor file column can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Document,
    DebtValue,
    DebtDate,
    Email,
    Phone,
    Address,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Document,
        Field::DebtValue,
        Field::DebtDate,
        Field::Email,
        Field::Phone,
        Field::Address,
    ];
}

/// A test applied to a lower-cased, trimmed header label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matcher {
    Contains(String),
    Equals(String),
}

impl Matcher {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Matcher::Contains(text) => label.contains(text.as_str()),
            Matcher::Equals(text) => label == text,
        }
    }
}

/// Field → matchers. A header label belongs to a field when any of the
/// field's matchers accepts it; among several accepted labels the leftmost
/// column wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable(BTreeMap<Field, Vec<Matcher>>);

impl Default for SynonymTable {
    fn default() -> Self {
        use Matcher::{Contains, Equals};

        let c = |s: &str| Contains(s.to_string());
        let e = |s: &str| Equals(s.to_string());

        Self(BTreeMap::from([
            (Field::Name, vec![c("nome"), e("name")]),
            (
                Field::Document,
                vec![c("cpf"), c("cnpj"), c("documento"), c("document")],
            ),
            (Field::DebtValue, vec![c("valor"), c("value"), c("divida")]),
            (Field::DebtDate, vec![c("data"), c("date")]),
            (Field::Email, vec![e("email")]),
            (Field::Phone, vec![c("telefone"), c("phone")]),
            (Field::Address, vec![c("endereco"), c("address")]),
        ]))
    }
}

impl SynonymTable {
    pub fn new(rules: BTreeMap<Field, Vec<Matcher>>) -> Self {
        Self(rules)
    }

    /// Loads a JSON table such as `{"name": [{"contains": "nome"}]}`.
    /// Fields left out of the file never match.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let to_err = |message: String| ConfigError::Synonyms {
            path: path.display().to_string(),
            message,
        };

        let text = fs::read_to_string(path).map_err(|e| to_err(e.to_string()))?;
        let table: SynonymTable =
            serde_json::from_str(&text).map_err(|e| to_err(e.to_string()))?;

        Ok(table.normalized())
    }

    // Matching runs against lower-cased labels, so synonyms must be too.
    fn normalized(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(field, matchers)| {
                    let matchers = matchers
                        .into_iter()
                        .map(|m| match m {
                            Matcher::Contains(s) => Matcher::Contains(s.trim().to_lowercase()),
                            Matcher::Equals(s) => Matcher::Equals(s.trim().to_lowercase()),
                        })
                        .collect();
                    (field, matchers)
                })
                .collect(),
        )
    }

    pub fn matchers(&self, field: Field) -> &[Matcher] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn resolve(&self, header: &[String]) -> FieldMapping {
        let labels: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

        let columns = Field::ALL
            .iter()
            .filter_map(|&field| {
                let matchers = self.matchers(field);
                labels
                    .iter()
                    .position(|label| matchers.iter().any(|m| m.matches(label)))
                    .map(|index| (field, index))
            })
            .collect();

        FieldMapping { columns }
    }
}

/// Column index per field, inferred once from the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    columns: BTreeMap<Field, usize>,
}

impl FieldMapping {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}
