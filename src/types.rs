use serde::{Deserialize, Serialize};
use std::fmt;

/// identifier assigned by the gateway to a payment record
pub type PaymentId = i64;

/// identifier assigned by the gateway to a company
pub type CompanyId = i64;

/// gateway-owned payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// fee still owed
    #[serde(rename = "PENDENTE", alias = "PENDING")]
    Pending,
    /// fee settled, a payment date is recorded
    #[serde(rename = "PAGO", alias = "PAID")]
    Paid,
}

/// status derived from the gateway status and the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivedStatus {
    Pago,
    Pendente,
    Atrasado,
}

impl DerivedStatus {
    /// whether the fee is still owed (pending or overdue)
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, DerivedStatus::Pago)
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DerivedStatus::Pago => "Pago",
            DerivedStatus::Pendente => "Pendente",
            DerivedStatus::Atrasado => "Atrasado",
        };
        f.write_str(label)
    }
}

/// which part of a month a screen wants to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    /// pending and overdue fees
    Outstanding,
    /// settled fees
    Paid,
    /// everything in the month
    Combined,
}

/// company activity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActivityFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActivityFilter {
    pub fn accepts(&self, is_active: bool) -> bool {
        match self {
            ActivityFilter::All => true,
            ActivityFilter::Active => is_active,
            ActivityFilter::Inactive => !is_active,
        }
    }
}

/// how the selection ledger treats amounts it cannot parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentParsing {
    /// invalid input becomes zero
    #[default]
    Permissive,
    /// invalid input is rejected and the previous value kept
    Strict,
}
