use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::ReferenceMonth;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{CompanyId, PaymentId, PaymentStatus};

/// company fields embedded in a payment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
    pub name: String,
    pub is_active: bool,
}

/// a single fee obligation for one company in one reference month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub company_id: CompanyId,
    pub company: CompanyRef,
    #[serde(with = "wire::month")]
    pub reference_month: ReferenceMonth,
    #[serde(default)]
    pub value: Option<Money>,
    #[serde(default, with = "wire::instant")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
    #[serde(default, with = "wire::instant")]
    pub payment_date: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    /// check the record invariants, failing on the first violation
    pub fn validate(&self) -> Result<()> {
        self.amount()?;
        if !self.is_paid() {
            self.due()?;
        }
        match (self.status, self.payment_date) {
            (PaymentStatus::Paid, None) => {
                Err(FeeError::malformed(self.id, "paid record without payment date"))
            }
            (PaymentStatus::Pending, Some(_)) => {
                Err(FeeError::malformed(self.id, "pending record with payment date"))
            }
            _ => Ok(()),
        }
    }

    /// the fee value, required and non-negative
    pub fn amount(&self) -> Result<Money> {
        match self.value {
            Some(value) if value.is_negative() => {
                Err(FeeError::malformed(self.id, format!("negative value {value}")))
            }
            Some(value) => Ok(value),
            None => Err(FeeError::malformed(self.id, "missing value")),
        }
    }

    /// the due date, required while the record is pending
    pub fn due(&self) -> Result<DateTime<Utc>> {
        self.due_date
            .ok_or_else(|| FeeError::malformed(self.id, "missing due date"))
    }

    /// month match plus currently active company
    pub fn belongs_to(&self, month: ReferenceMonth) -> bool {
        self.reference_month == month && self.company.is_active
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// company as listed by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    pub cnpj: String,
    #[serde(default)]
    pub activity: Option<String>,
    pub accounting_fee: Money,
    pub email: String,
    pub billing_due_day: u32,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_firm_id: Option<i64>,
}

/// body of a payment status mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: PaymentStatus,
    #[serde(with = "wire::instant")]
    pub payment_date: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn mark_paid(payment_date: DateTime<Utc>) -> Self {
        Self {
            status: PaymentStatus::Paid,
            payment_date: Some(payment_date),
        }
    }

    /// back to pending, clearing the payment date
    pub fn revert() -> Self {
        Self {
            status: PaymentStatus::Pending,
            payment_date: None,
        }
    }
}

/// serde helpers for the gateway's date strings
pub(crate) mod wire {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

    /// parse `YYYY-MM-DD`, a naive datetime (read as UTC) or RFC 3339
    pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc())
    }

    /// calendar date component only, ignoring any time or offset
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    pub mod instant {
        use super::*;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_some(&v.to_rfc3339_opts(SecondsFormat::Millis, true)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) if s.trim().is_empty() => Ok(None),
                Some(s) => parse_instant(&s)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date: {s}"))),
            }
        }
    }

    pub mod month {
        use super::*;
        use crate::calendar::ReferenceMonth;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &ReferenceMonth,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&value.iso_first_day())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<ReferenceMonth, D::Error> {
            let raw = String::deserialize(deserializer)?;
            parse_date(&raw)
                .map(|d| ReferenceMonth::containing(&d))
                .ok_or_else(|| de::Error::custom(format!("invalid reference month: {raw}")))
        }
    }
}
