//! Shared types for bank sync

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source-side bank account to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: String,
    /// Display name
    #[serde(rename = "name")]
    pub display_name: String,
}

/// Settled transaction reported by the source bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Globally unique, stable across repeated fetches
    pub id: String,
    /// Signed amount (positive = money in)
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Bank description (the feed may send null)
    #[serde(rename = "bankDescription", default)]
    pub description: Option<String>,
    /// Posting timestamp
    pub posted_at: DateTime<Utc>,
}

/// Destination routing identifier attached to every posted record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationRoute {
    /// Bank integration ID
    pub id: String,
}

/// Bank integration known to the destination system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankIntegration {
    /// Integration ID
    pub id: String,
    /// Provider name (e.g. "Mercury")
    pub provider_name: String,
}

/// Destination record category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BaseType {
    /// Money in
    Credit,
    /// Money out (or zero)
    Debit,
}

impl BaseType {
    /// Category for a signed amount
    pub fn from_amount(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            BaseType::Credit
        } else {
            BaseType::Debit
        }
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseType::Credit => write!(f, "CREDIT"),
            BaseType::Debit => write!(f, "DEBIT"),
        }
    }
}

/// Bank transaction as posted to the destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransactionRequest {
    /// Unsigned magnitude; the sign lives in `base_type`
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Date-only posting date
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    /// Description
    pub description: String,
    /// Route ID
    pub bank_integration_id: String,
    /// Credit or debit
    pub base_type: BaseType,
}

impl BankTransactionRequest {
    /// Build the destination record for a source transaction
    pub fn from_transaction(tx: &Transaction, route: &DestinationRoute) -> Self {
        Self {
            amount: tx.amount.abs(),
            date: tx.posted_at.date_naive(),
            description: tx.description.clone().unwrap_or_default(),
            bank_integration_id: route.id.clone(),
            base_type: BaseType::from_amount(tx.amount),
        }
    }
}

mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
