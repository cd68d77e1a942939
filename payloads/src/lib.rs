pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct AccountId(pub Uuid);

/// A supplier (payable) or client (receivable) id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct CounterpartyId(pub Uuid);

/// A purchase (payable) or sale (receivable) id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct SourceDocumentId(pub Uuid);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
pub struct SalespersonId(pub Uuid);

/// Which side of the books an account sits on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "account_kind", rename_all = "snake_case")
)]
pub enum AccountKind {
    /// Money owed by the operator to a supplier.
    Payable,
    /// Money owed to the operator by a client.
    Receivable,
}

impl AccountKind {
    /// Lowercase name, as used in route paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payable => "payable",
            Self::Receivable => "receivable",
        }
    }

    /// Prefix of the human-readable account number.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Payable => "CP",
            Self::Receivable => "CR",
        }
    }

    pub fn counterparty_label(&self) -> &'static str {
        match self {
            Self::Payable => "supplier",
            Self::Receivable => "client",
        }
    }
}

/// Lifecycle state of a payable or receivable account.
///
/// `Settled` means paid (payable) or received (receivable). `Settled` and
/// `Cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "account_status", rename_all = "snake_case")
)]
pub enum AccountStatus {
    Pending,
    PartiallySettled,
    Settled,
    Overdue,
    Cancelled,
}

impl AccountStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "use-sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
pub enum PaymentMethod {
    Pix,
    Cash,
    BankTransfer,
    Boleto,
    CreditCard,
    DebitCard,
    Check,
    Other,
}

/// Cadence of a recurring account.
///
/// Stored values that don't name a known cadence deserialize to
/// `Unrecognized`, which schedules like `Monthly`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    #[display("weekly")]
    Weekly,
    #[display("biweekly")]
    Biweekly,
    #[display("monthly")]
    Monthly,
    #[display("bimonthly")]
    Bimonthly,
    #[display("quarterly")]
    Quarterly,
    #[display("yearly")]
    Yearly,
    #[serde(other)]
    #[display("unrecognized")]
    Unrecognized,
}

impl RecurrenceKind {
    /// Parse a stored cadence, never failing.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Self::Weekly,
            "biweekly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            "bimonthly" => Self::Bimonthly,
            "quarterly" => Self::Quarterly,
            "yearly" => Self::Yearly,
            _ => Self::Unrecognized,
        }
    }
}

/// Sequential human-readable account number, e.g. `CP-007` or `CR-112`.
///
/// Serialized as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountNumber {
    pub kind: AccountKind,
    pub seq: i32,
}

impl AccountNumber {
    pub fn new(kind: AccountKind, seq: i32) -> Self {
        Self { kind, seq }
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:03}", self.kind.prefix(), self.seq)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid account number: '{0}'")]
pub struct InvalidAccountNumber(pub String);

impl FromStr for AccountNumber {
    type Err = InvalidAccountNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidAccountNumber(s.to_string());
        let (prefix, digits) = s.split_once('-').ok_or_else(err)?;
        let kind = match prefix {
            "CP" => AccountKind::Payable,
            "CR" => AccountKind::Receivable,
            _ => return Err(err()),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let seq = digits.parse::<i32>().map_err(|_| err())?;
        if seq < 1 {
            return Err(err());
        }
        Ok(Self { kind, seq })
    }
}

impl Serialize for AccountNumber {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountNumber {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Attributes only payable accounts carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayableDetails {
    pub category: Option<String>,
    pub cost_center: Option<String>,
    /// Explicit cadence in days, recorded alongside the recurrence kind.
    pub recurrence_interval_days: Option<u32>,
}

/// Attributes only receivable accounts carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceivableDetails {
    pub salesperson_id: Option<SalespersonId>,
}
