use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::aggregator::MonthlyView;
use crate::calendar::ReferenceMonth;
use crate::decimal::{Money, Percentage};
use crate::records::Company;

/// headline numbers of the dashboard for one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub month: ReferenceMonth,
    pub total_companies: usize,
    pub active_companies: usize,
    /// revenue figure reported by the server
    pub server_revenue: Money,
    /// pending plus overdue
    pub outstanding: Money,
    pub collection_rate: Percentage,
    pub overdue_count: usize,
}

impl DashboardSummary {
    pub fn build(companies: &[Company], view: &MonthlyView, server_revenue: Money) -> Self {
        Self {
            month: view.month,
            total_companies: companies.len(),
            active_companies: companies.iter().filter(|c| c.is_active).count(),
            server_revenue,
            outstanding: view.summary.outstanding(),
            collection_rate: view.summary.received_percentage,
            overdue_count: view.overdue_count(),
        }
    }
}

/// server revenue out of whatever shape the endpoint returned
///
/// accepts a number, a numeric string or an object with a `total`, `value`
/// or `revenue` field, optionally wrapped in `data`. anything else is zero.
pub fn parse_revenue(value: &Value) -> Money {
    match value {
        Value::Object(map) => {
            if let Some(inner) = map.get("data") {
                return parse_revenue(inner);
            }
            ["total", "value", "revenue"]
                .iter()
                .find_map(|key| map.get(*key).and_then(scalar_amount))
                .unwrap_or(Money::ZERO)
        }
        other => scalar_amount(other).unwrap_or(Money::ZERO),
    }
}

fn scalar_amount(value: &Value) -> Option<Money> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .map(Money::from_decimal)
}
