use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{FeeError, Result};

const MONTH_NAMES_PT_BR: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

/// calendar month a fee is attributed to (year + month, no day)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonth")]
pub struct ReferenceMonth {
    year: i32,
    month: u32,
}

/// unchecked wire form, validated through `ReferenceMonth::new`
#[derive(Deserialize)]
struct RawMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonth> for ReferenceMonth {
    type Error = FeeError;

    fn try_from(raw: RawMonth) -> Result<Self> {
        Self::new(raw.year, raw.month)
    }
}

impl ReferenceMonth {
    /// create a month, `month` is 1-based
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(FeeError::InvalidMonth {
                input: format!("{year}-{month}"),
            });
        }
        Ok(Self { year, month })
    }

    /// month containing the given date
    pub fn containing<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// parse a `MM/yyyy` key as used by the month picker
    pub fn from_key(key: &str) -> Result<Self> {
        let invalid = || FeeError::InvalidMonth {
            input: key.to_string(),
        };
        let (month, year) = key.trim().split_once('/').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `outubro de 2026`
    pub fn label_pt_br(&self) -> String {
        format!("{} de {}", MONTH_NAMES_PT_BR[(self.month - 1) as usize], self.year)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// `yyyy-MM-01`, the form the fee generation endpoint expects
    pub fn iso_first_day(&self) -> String {
        self.first_day().format("%Y-%m-%d").to_string()
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.succ().first_day();
        (next - self.first_day()).num_days() as u32
    }

    /// given day of this month, clamped to the last day
    pub fn day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day)
            .unwrap_or_else(|| self.first_day())
    }

    pub fn add_months(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn pred(&self) -> Self {
        self.add_months(-1)
    }

    /// whether the date falls inside this month
    pub fn contains<D: Datelike>(&self, date: &D) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// entry of the month picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    pub month: ReferenceMonth,
    pub key: String,
    pub label: String,
}

/// inclusive range of months a user may navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub min: ReferenceMonth,
    pub max: ReferenceMonth,
}

impl MonthWindow {
    pub fn new(min: ReferenceMonth, max: ReferenceMonth) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// window from `back` months before to `forward` months after `current`
    pub fn around(current: ReferenceMonth, back: u32, forward: u32) -> Self {
        Self::new(
            current.add_months(-(back as i32)),
            current.add_months(forward as i32),
        )
    }

    pub fn contains(&self, month: ReferenceMonth) -> bool {
        self.min <= month && month <= self.max
    }

    pub fn clamp(&self, month: ReferenceMonth) -> ReferenceMonth {
        month.clamp(self.min, self.max)
    }

    /// following month, saturating at the upper bound
    pub fn next(&self, month: ReferenceMonth) -> ReferenceMonth {
        self.clamp(month.succ())
    }

    /// previous month, saturating at the lower bound
    pub fn prev(&self, month: ReferenceMonth) -> ReferenceMonth {
        self.clamp(month.pred())
    }

    pub fn options(&self) -> Vec<MonthOption> {
        let mut options = Vec::new();
        let mut month = self.min;
        while month <= self.max {
            options.push(MonthOption {
                month,
                key: month.to_string(),
                label: month.label_pt_br(),
            });
            month = month.succ();
        }
        options
    }
}

/// whole days past due, rounded up; zero when not past due
pub fn overdue_days(due: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed = now - due;
    if elapsed <= Duration::zero() {
        return 0;
    }
    let day_ms = Duration::days(1).num_milliseconds();
    let ms = elapsed.num_milliseconds();
    let days = ms / day_ms + i64::from(ms % day_ms != 0);
    // sub-millisecond remainders still count as a started day
    let days = days.max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// `dd/MM/yyyy`
pub fn format_date_br<D: Datelike>(date: &D) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}
