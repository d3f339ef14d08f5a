//! self-contained gateway holding companies and payments in memory

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{FeeGateway, GatewayError, GatewayResult};
use crate::calendar::ReferenceMonth;
use crate::companies::{CompanyChanges, CompanyDraft};
use crate::decimal::Money;
use crate::records::{Company, CompanyRef, PaymentRecord, StatusUpdate};
use crate::types::{CompanyId, PaymentId, PaymentStatus};

#[derive(Debug, Default)]
struct Store {
    companies: Vec<Company>,
    payments: Vec<PaymentRecord>,
    revenue: BTreeMap<ReferenceMonth, Money>,
    failing: BTreeSet<PaymentId>,
}

impl Store {
    fn next_payment_id(&self) -> PaymentId {
        self.payments.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    fn next_company_id(&self) -> CompanyId {
        self.companies.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    /// keep the embedded company fields of payments in line with the company
    fn sync_company(&mut self, company: &Company) {
        for payment in self.payments.iter_mut().filter(|p| p.company_id == company.id) {
            payment.company = CompanyRef {
                name: company.name.clone(),
                is_active: company.is_active,
            };
        }
    }
}

/// gateway double with per-payment failure injection and call counting
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    store: Mutex<Store>,
    status_updates: AtomicUsize,
    payment_listings: AtomicUsize,
    generations: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(self, companies: Vec<Company>) -> Self {
        self.lock().companies = companies;
        self
    }

    pub fn with_payments(self, payments: Vec<PaymentRecord>) -> Self {
        self.lock().payments = payments;
        self
    }

    /// server-side revenue reported for a month
    pub fn set_revenue(&self, month: ReferenceMonth, revenue: Money) {
        self.lock().revenue.insert(month, revenue);
    }

    /// make status mutations of this payment fail
    pub fn fail_updates_for(&self, id: PaymentId) {
        self.lock().failing.insert(id);
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.lock().payments.clone()
    }

    pub fn companies(&self) -> Vec<Company> {
        self.lock().companies.clone()
    }

    pub fn status_update_count(&self) -> usize {
        self.status_updates.load(Ordering::SeqCst)
    }

    pub fn payment_listing_count(&self) -> usize {
        self.payment_listings.load(Ordering::SeqCst)
    }

    pub fn generation_count(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn due_date_in(month: ReferenceMonth, day: u32) -> Option<DateTime<Utc>> {
    month.day(day).and_hms_opt(0, 0, 0).map(|d| d.and_utc())
}

#[async_trait]
impl FeeGateway for InMemoryGateway {
    async fn list_companies(&self) -> GatewayResult<Vec<Company>> {
        Ok(self.companies())
    }

    async fn list_payments(&self) -> GatewayResult<Vec<PaymentRecord>> {
        self.payment_listings.fetch_add(1, Ordering::SeqCst);
        Ok(self.payments())
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        update: &StatusUpdate,
    ) -> GatewayResult<PaymentRecord> {
        self.status_updates.fetch_add(1, Ordering::SeqCst);
        let mut store = self.lock();
        if store.failing.contains(&id) {
            return Err(GatewayError::Server(format!("payment {id} could not be updated")));
        }

        let payment = store
            .payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("payment {id}")))?;
        payment.status = update.status;
        payment.payment_date = match update.status {
            PaymentStatus::Paid => update.payment_date,
            PaymentStatus::Pending => None,
        };
        Ok(payment.clone())
    }

    async fn monthly_revenue(&self, month: ReferenceMonth) -> GatewayResult<Money> {
        Ok(self.lock().revenue.get(&month).copied().unwrap_or(Money::ZERO))
    }

    async fn generate_payments(&self, month: ReferenceMonth) -> GatewayResult<()> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        let mut store = self.lock();

        let missing: Vec<Company> = store
            .companies
            .iter()
            .filter(|c| c.is_active)
            .filter(|c| {
                !store
                    .payments
                    .iter()
                    .any(|p| p.company_id == c.id && p.reference_month == month)
            })
            .cloned()
            .collect();

        for company in missing {
            let id = store.next_payment_id();
            store.payments.push(PaymentRecord {
                id,
                company_id: company.id,
                company: CompanyRef {
                    name: company.name.clone(),
                    is_active: company.is_active,
                },
                reference_month: month,
                value: Some(company.accounting_fee),
                due_date: due_date_in(month, company.billing_due_day),
                status: PaymentStatus::Pending,
                payment_date: None,
            });
        }
        Ok(())
    }

    async fn create_company(&self, draft: &CompanyDraft) -> GatewayResult<Company> {
        let mut store = self.lock();
        let company = Company {
            id: store.next_company_id(),
            name: draft.name.clone(),
            trade_name: draft.trade_name.clone(),
            cnpj: draft.cnpj.clone(),
            activity: draft.activity.clone(),
            accounting_fee: draft.accounting_fee,
            email: draft.email.clone(),
            billing_due_day: draft.billing_due_day,
            is_active: true,
            accounting_firm_id: None,
        };
        store.companies.push(company.clone());
        Ok(company)
    }

    async fn update_company(&self, id: CompanyId, changes: &CompanyChanges) -> GatewayResult<Company> {
        let mut store = self.lock();
        let company = store
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("company {id}")))?;
        changes.apply_to(company);
        let updated = company.clone();
        store.sync_company(&updated);
        Ok(updated)
    }

    async fn delete_company(&self, id: CompanyId) -> GatewayResult<()> {
        let mut store = self.lock();
        let before = store.companies.len();
        store.companies.retain(|c| c.id != id);
        if store.companies.len() == before {
            return Err(GatewayError::NotFound(format!("company {id}")));
        }
        store.payments.retain(|p| p.company_id != id);
        Ok(())
    }
}
