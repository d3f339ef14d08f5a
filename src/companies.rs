use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::aggregator::matches_search;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::records::Company;
use crate::types::ActivityFilter;

/// companies matching a search term and an activity filter
///
/// the term is matched against name, CNPJ and e-mail.
pub fn filter_companies<'a>(
    companies: &'a [Company],
    term: &str,
    filter: ActivityFilter,
) -> Vec<&'a Company> {
    companies
        .iter()
        .filter(|c| {
            matches_search(&c.name, term) || matches_search(&c.cnpj, term) || matches_search(&c.email, term)
        })
        .filter(|c| filter.accepts(c.is_active))
        .collect()
}

/// headline numbers of the company directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanyStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// sum of the contracted fee of active companies
    pub monthly_fee_revenue: Money,
}

impl CompanyStats {
    pub fn from_companies(companies: &[Company]) -> Self {
        let active: Vec<&Company> = companies.iter().filter(|c| c.is_active).collect();
        Self {
            total: companies.len(),
            active: active.len(),
            inactive: companies.len() - active.len(),
            monthly_fee_revenue: active.iter().map(|c| c.accounting_fee).sum(),
        }
    }
}

/// apply the `00.000.000/0000-00` mask to whatever digits were typed
///
/// input with more than 14 digits is returned unchanged.
pub fn format_cnpj(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 14 {
        return input.to_string();
    }

    let mut out = String::with_capacity(18);
    for (i, d) in digits.iter().enumerate() {
        match i {
            2 | 5 => out.push('.'),
            8 => out.push('/'),
            12 => out.push('-'),
            _ => {}
        }
        out.push(*d);
    }
    out
}

const CNPJ_PATTERN: &str = r"^\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static CNPJ_RE: OnceLock<Option<Regex>> = OnceLock::new();
static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn matches_shape(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// shape check only, no check digits
pub fn is_valid_cnpj_format(cnpj: &str) -> bool {
    matches_shape(&CNPJ_RE, CNPJ_PATTERN, cnpj)
}

/// `local@host.tld` with no whitespace and a single `@`
pub fn is_valid_email(email: &str) -> bool {
    matches_shape(&EMAIL_RE, EMAIL_PATTERN, email)
}

/// payload for registering a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub trade_name: Option<String>,
    pub cnpj: String,
    pub activity: Option<String>,
    pub email: String,
    pub accounting_fee: Money,
    pub billing_due_day: u32,
}

impl CompanyDraft {
    /// trim text fields, turn blank optionals into `None` and mask the CNPJ
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.cnpj = format_cnpj(self.cnpj.trim());
        self.trade_name = self.trade_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.activity = self.activity.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, message: &str| FeeError::InvalidCompany {
            field,
            message: message.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name", "name is required"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(invalid("email", "invalid e-mail address"));
        }
        if !is_valid_cnpj_format(self.cnpj.trim()) {
            return Err(invalid("cnpj", "expected 00.000.000/0000-00"));
        }
        if !(1..=31).contains(&self.billing_due_day) {
            return Err(invalid("billing_due_day", "must be between 1 and 31"));
        }
        if self.accounting_fee <= Money::ZERO {
            return Err(invalid("accounting_fee", "must be greater than zero"));
        }
        Ok(())
    }
}

/// partial company update, unset fields are left out of the request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounting_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_due_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CompanyChanges {
    /// activate or deactivate
    pub fn activity(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// apply to a company as the gateway would
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(trade_name) = &self.trade_name {
            company.trade_name = Some(trade_name.clone());
        }
        if let Some(cnpj) = &self.cnpj {
            company.cnpj = cnpj.clone();
        }
        if let Some(activity) = &self.activity {
            company.activity = Some(activity.clone());
        }
        if let Some(email) = &self.email {
            company.email = email.clone();
        }
        if let Some(fee) = self.accounting_fee {
            company.accounting_fee = fee;
        }
        if let Some(day) = self.billing_due_day {
            company.billing_due_day = day;
        }
        if let Some(active) = self.is_active {
            company.is_active = active;
        }
    }
}
