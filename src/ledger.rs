use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::calendar::ReferenceMonth;
use crate::decimal::{parse_user_amount, Money};
use crate::errors::{FeeError, Result};
use crate::records::PaymentRecord;
use crate::types::{AdjustmentParsing, PaymentId, PaymentStatus};

/// selection state of one pending fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub base_value: Money,
    pub selected: bool,
    pub adjusted_value: Option<Money>,
}

impl LedgerEntry {
    /// adjusted value, or the record value when no adjustment is set
    pub fn effective_value(&self) -> Money {
        self.adjusted_value.unwrap_or(self.base_value)
    }
}

/// count and sum of the selected fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionTotals {
    pub count: usize,
    pub sum: Money,
}

/// user-chosen subset of a month's pending fees and their adjusted amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionLedger {
    month: ReferenceMonth,
    parsing: AdjustmentParsing,
    entries: BTreeMap<PaymentId, LedgerEntry>,
}

impl SelectionLedger {
    /// empty ledger for a month
    pub fn new(month: ReferenceMonth, parsing: AdjustmentParsing) -> Self {
        Self {
            month,
            parsing,
            entries: BTreeMap::new(),
        }
    }

    /// ledger seeded with every pending fee of an active company in `month`
    pub fn seed(
        month: ReferenceMonth,
        records: &[PaymentRecord],
        parsing: AdjustmentParsing,
    ) -> Result<Self> {
        let mut ledger = Self::new(month, parsing);
        ledger.reset(month, records)?;
        Ok(ledger)
    }

    /// drop every selection and adjustment and re-seed for `month`
    pub fn reset(&mut self, month: ReferenceMonth, records: &[PaymentRecord]) -> Result<()> {
        let mut entries = BTreeMap::new();
        for record in records
            .iter()
            .filter(|r| r.belongs_to(month) && r.status == PaymentStatus::Pending)
        {
            let value = record.amount()?;
            entries.insert(
                record.id,
                LedgerEntry {
                    base_value: value,
                    selected: false,
                    adjusted_value: Some(value),
                },
            );
        }
        self.month = month;
        self.entries = entries;
        Ok(())
    }

    /// forget everything, e.g. when the month changes before data arrives
    pub fn clear(&mut self, month: ReferenceMonth) {
        self.month = month;
        self.entries.clear();
    }

    pub fn month(&self) -> ReferenceMonth {
        self.month
    }

    pub fn parsing(&self) -> AdjustmentParsing {
        self.parsing
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: PaymentId) -> Option<&LedgerEntry> {
        self.entries.get(&id)
    }

    pub fn is_selected(&self, id: PaymentId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.selected)
    }

    fn entry_mut(&mut self, id: PaymentId) -> Result<&mut LedgerEntry> {
        self.entries
            .get_mut(&id)
            .ok_or(FeeError::UnknownPayment { id })
    }

    pub fn select(&mut self, id: PaymentId) -> Result<()> {
        self.entry_mut(id)?.selected = true;
        Ok(())
    }

    pub fn deselect(&mut self, id: PaymentId) -> Result<()> {
        self.entry_mut(id)?.selected = false;
        Ok(())
    }

    /// flip one selection, returning the new state
    pub fn toggle(&mut self, id: PaymentId) -> Result<bool> {
        let entry = self.entry_mut(id)?;
        entry.selected = !entry.selected;
        Ok(entry.selected)
    }

    /// set the amount typed by the user
    ///
    /// permissive parsing turns unparseable input into zero; strict parsing
    /// rejects it and keeps the previous value.
    pub fn set_adjusted_value(&mut self, id: PaymentId, input: &str) -> Result<Money> {
        let parsing = self.parsing;
        let entry = self.entry_mut(id)?;
        let value = match (parse_user_amount(input), parsing) {
            (Some(value), _) => value,
            (None, AdjustmentParsing::Permissive) => Money::ZERO,
            (None, AdjustmentParsing::Strict) => {
                return Err(FeeError::InvalidAmount {
                    input: input.to_string(),
                })
            }
        };
        entry.adjusted_value = Some(value);
        Ok(value)
    }

    /// remove an adjustment so the record value applies again
    pub fn clear_adjustment(&mut self, id: PaymentId) -> Result<()> {
        self.entry_mut(id)?.adjusted_value = None;
        Ok(())
    }

    /// select all of `visible`, or deselect them if they already are all selected
    ///
    /// ids that are not pending fees of this ledger are ignored. returns the
    /// new selection state of the visible fees.
    pub fn select_all(&mut self, visible: &[PaymentId]) -> bool {
        let known: Vec<PaymentId> = visible
            .iter()
            .copied()
            .filter(|id| self.entries.contains_key(id))
            .collect();
        let all_selected = known.iter().all(|id| self.is_selected(*id));
        let target = !all_selected;

        for id in known {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.selected = target;
            }
        }
        target
    }

    pub fn deselect_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.selected = false;
        }
    }

    /// selected ids among `visible`, in `visible` order
    pub fn selected_ids(&self, visible: &[PaymentId]) -> Vec<PaymentId> {
        visible
            .iter()
            .copied()
            .filter(|id| self.is_selected(*id))
            .collect()
    }

    /// count and sum over fees that are both selected and visible
    pub fn totals(&self, visible: &[PaymentId]) -> SelectionTotals {
        let mut seen = BTreeSet::new();
        visible
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.entries.get(id))
            .filter(|e| e.selected)
            .fold(SelectionTotals::default(), |acc, e| SelectionTotals {
                count: acc.count + 1,
                sum: acc.sum + e.effective_value(),
            })
    }
}
