//! monthly fee aggregation
//!
//! one pass over the flat record list: keep the target month's records of
//! active companies, classify each, split them into outstanding and paid
//! buckets and total the amounts. every screen (dashboard, fee list, fee
//! registration) reads from the same `MonthlyView`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{format_date_br, ReferenceMonth};
use crate::classifier::classify;
use crate::decimal::{Money, Percentage};
use crate::errors::Result;
use crate::records::PaymentRecord;
use crate::types::{CompanyId, DerivedStatus, PaymentId, ViewKind};

/// one fee as shown in a monthly list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeItem {
    pub payment_id: PaymentId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub value: Money,
    /// may be absent on paid fees
    pub due_date: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
    pub status: DerivedStatus,
    pub overdue_days: u32,
}

impl FeeItem {
    fn from_record(record: &PaymentRecord, now: DateTime<Utc>) -> Result<Self> {
        record.validate()?;
        let classification = classify(record, now)?;
        Ok(Self {
            payment_id: record.id,
            company_id: record.company_id,
            company_name: record.company.name.clone(),
            value: record.amount()?,
            due_date: record.due_date,
            payment_date: record.payment_date,
            status: classification.status,
            overdue_days: classification.overdue_days,
        })
    }

    pub fn due_label(&self) -> Option<String> {
        self.due_date.as_ref().map(format_date_br)
    }

    pub fn payment_label(&self) -> Option<String> {
        self.payment_date.as_ref().map(format_date_br)
    }

    /// status badge, e.g. `Atrasado (3 dias)`
    pub fn badge(&self) -> String {
        match (self.status, self.overdue_days) {
            (DerivedStatus::Atrasado, 1) => format!("{} (1 dia)", self.status),
            (DerivedStatus::Atrasado, days) if days > 0 => format!("{} ({days} dias)", self.status),
            (status, _) => status.to_string(),
        }
    }

    pub fn matches(&self, term: &str) -> bool {
        matches_search(&self.company_name, term)
    }
}

/// case-insensitive substring match, a blank term matches everything
pub fn matches_search(haystack: &str, term: &str) -> bool {
    let term = term.trim();
    term.is_empty() || haystack.to_lowercase().contains(&term.to_lowercase())
}

/// outstanding (pending + overdue) and paid fees of a month
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Buckets {
    pub pending: Vec<FeeItem>,
    pub paid: Vec<FeeItem>,
}

impl Buckets {
    pub fn len(&self) -> usize {
        self.pending.len() + self.paid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn filtered(&self, term: &str) -> Buckets {
        Buckets {
            pending: self.pending.iter().filter(|i| i.matches(term)).cloned().collect(),
            paid: self.paid.iter().filter(|i| i.matches(term)).cloned().collect(),
        }
    }
}

/// month totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub total: Money,
    pub received: Money,
    pub pending: Money,
    pub overdue: Money,
    pub received_percentage: Percentage,
}

impl MonthlySummary {
    /// pending plus overdue
    pub fn outstanding(&self) -> Money {
        self.pending + self.overdue
    }
}

/// aggregated view of one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyView {
    pub month: ReferenceMonth,
    pub buckets: Buckets,
    pub summary: MonthlySummary,
}

impl MonthlyView {
    /// items for a given list, in gateway order
    pub fn items(&self, kind: ViewKind) -> Vec<&FeeItem> {
        match kind {
            ViewKind::Outstanding => self.buckets.pending.iter().collect(),
            ViewKind::Paid => self.buckets.paid.iter().collect(),
            ViewKind::Combined => self.buckets.pending.iter().chain(self.buckets.paid.iter()).collect(),
        }
    }

    /// narrow the buckets by company name, the summary is left untouched
    pub fn search(&self, term: &str) -> Buckets {
        self.buckets.filtered(term)
    }

    pub fn overdue_count(&self) -> usize {
        self.buckets
            .pending
            .iter()
            .filter(|i| i.status == DerivedStatus::Atrasado)
            .count()
    }
}

/// aggregate `records` for `month` as of `now`
pub fn summarize(
    records: &[PaymentRecord],
    month: ReferenceMonth,
    now: DateTime<Utc>,
) -> Result<MonthlyView> {
    let mut buckets = Buckets::default();
    let mut summary = MonthlySummary::default();

    for record in records.iter().filter(|r| r.belongs_to(month)) {
        let item = FeeItem::from_record(record, now)?;
        summary.total += item.value;
        match item.status {
            DerivedStatus::Pago => {
                summary.received += item.value;
                buckets.paid.push(item);
            }
            DerivedStatus::Pendente => {
                summary.pending += item.value;
                buckets.pending.push(item);
            }
            DerivedStatus::Atrasado => {
                summary.overdue += item.value;
                buckets.pending.push(item);
            }
        }
    }

    summary.received_percentage = Percentage::of(summary.received, summary.total);

    Ok(MonthlyView {
        month,
        buckets,
        summary,
    })
}

/// per-month revenue and receipts for a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub month: ReferenceMonth,
    pub total: Money,
    pub received: Money,
}

pub fn monthly_series(
    records: &[PaymentRecord],
    months: &[ReferenceMonth],
    now: DateTime<Utc>,
) -> Result<Vec<MonthlyTotals>> {
    months
        .iter()
        .map(|&month| {
            let view = summarize(records, month, now)?;
            Ok(MonthlyTotals {
                month,
                total: view.summary.total,
                received: view.summary.received,
            })
        })
        .collect()
}

/// whether any record exists for the month, active company or not
pub fn has_records_for(records: &[PaymentRecord], month: ReferenceMonth) -> bool {
    records.iter().any(|r| r.reference_month == month)
}
