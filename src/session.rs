//! fee session
//!
//! ties the gateway, the loaded record lists, the selected month and the
//! selection ledger together for one user. aggregation stays a pure
//! function of the loaded records; the session only decides when to load,
//! which month to look at and when the ledger has to start over.

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use std::sync::Arc;
use uuid::Uuid;

use crate::aggregator::{has_records_for, matches_search, summarize, MonthlyView};
use crate::calendar::{MonthOption, MonthWindow, ReferenceMonth};
use crate::companies::{filter_companies, CompanyChanges, CompanyDraft, CompanyStats};
use crate::config::AppConfig;
use crate::dashboard::DashboardSummary;
use crate::errors::{FeeError, Result};
use crate::events::{EventStore, FeeEvent};
use crate::gateway::FeeGateway;
use crate::ledger::{SelectionLedger, SelectionTotals};
use crate::records::{Company, PaymentRecord};
use crate::repository::{LoadOutcome, Repository};
use crate::submission;
use crate::types::{ActivityFilter, CompanyId, PaymentId, PaymentStatus};

/// what a fee screen can show right now
#[derive(Debug, Clone, PartialEq)]
pub enum FeeView {
    /// records are being fetched, nothing is aggregated
    Loading,
    /// no records could be loaded
    Unavailable(String),
    /// month aggregate with the search term applied to the buckets
    Ready(MonthlyView),
}

pub struct FeeSession<G: FeeGateway + ?Sized> {
    gateway: Arc<G>,
    payments: Arc<Repository<Vec<PaymentRecord>>>,
    companies: Arc<Repository<Vec<Company>>>,
    month: ReferenceMonth,
    window: MonthWindow,
    search: String,
    ledger: SelectionLedger,
    events: EventStore,
}

impl<G: FeeGateway + ?Sized> FeeSession<G> {
    /// session positioned on `current`, navigable within the configured window
    pub fn new(gateway: Arc<G>, config: &AppConfig, current: ReferenceMonth) -> Self {
        let window = MonthWindow::around(
            current,
            config.navigation.months_back,
            config.navigation.months_forward,
        );

        Self {
            gateway,
            payments: Arc::new(Repository::new()),
            companies: Arc::new(Repository::new()),
            month: current,
            window,
            search: String::new(),
            ledger: SelectionLedger::new(current, config.ledger.adjustment_parsing),
            events: EventStore::new(),
        }
    }

    /// session positioned on the month of the provider's current time
    pub fn starting_at(gateway: Arc<G>, config: &AppConfig, time_provider: &SafeTimeProvider) -> Self {
        Self::new(gateway, config, ReferenceMonth::containing(&time_provider.now()))
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// shared handle to the payment list, loads through it race with the session's own
    pub fn payments(&self) -> Arc<Repository<Vec<PaymentRecord>>> {
        Arc::clone(&self.payments)
    }

    pub fn companies(&self) -> Arc<Repository<Vec<Company>>> {
        Arc::clone(&self.companies)
    }

    pub fn month(&self) -> ReferenceMonth {
        self.month
    }

    pub fn window(&self) -> MonthWindow {
        self.window
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut SelectionLedger {
        &mut self.ledger
    }

    pub fn events(&self) -> &[FeeEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<FeeEvent> {
        self.events.take_events()
    }

    // loading

    /// fetch the full payment list; an applied result re-seeds the ledger
    pub async fn refresh(&mut self) -> Result<LoadOutcome> {
        let outcome = self.payments.load(self.gateway.list_payments()).await;
        match outcome {
            LoadOutcome::Applied => self.reseed()?,
            LoadOutcome::Stale(ticket) => self.events.emit(FeeEvent::StaleResponseDiscarded {
                ticket: ticket.value(),
            }),
            LoadOutcome::Failed => {}
        }
        Ok(outcome)
    }

    pub async fn refresh_companies(&mut self) -> LoadOutcome {
        let outcome = self.companies.load(self.gateway.list_companies()).await;
        if let LoadOutcome::Stale(ticket) = outcome {
            self.events.emit(FeeEvent::StaleResponseDiscarded {
                ticket: ticket.value(),
            });
        }
        outcome
    }

    /// rebuild the ledger for the current month from the loaded records
    fn reseed(&mut self) -> Result<()> {
        let month = self.month;
        let ledger = &mut self.ledger;
        let result = self.payments.with_data(|records| match records {
            Some(records) => ledger.reset(month, records),
            None => {
                ledger.clear(month);
                Ok(())
            }
        });

        if result.is_err() {
            self.ledger.clear(month);
        }
        result
    }

    fn require_payments(&self) -> Result<Vec<PaymentRecord>> {
        self.payments.snapshot().data.ok_or_else(|| {
            FeeError::Unavailable(
                self.payments
                    .error()
                    .unwrap_or_else(|| "payments not loaded".to_string()),
            )
        })
    }

    // month navigation

    /// move to `month`, clamped to the navigation window
    ///
    /// any change resets the ledger in full. returns whether the month changed.
    pub fn set_month(&mut self, month: ReferenceMonth) -> Result<bool> {
        let target = self.window.clamp(month);
        if target == self.month {
            return Ok(false);
        }

        let from = self.month;
        self.month = target;
        tracing::info!(%from, to = %target, "month changed");
        self.events.emit(FeeEvent::MonthChanged { from, to: target });
        self.reseed()?;
        Ok(true)
    }

    pub fn next_month(&mut self) -> Result<bool> {
        self.set_month(self.window.next(self.month))
    }

    pub fn previous_month(&mut self) -> Result<bool> {
        self.set_month(self.window.prev(self.month))
    }

    pub fn month_options(&self) -> Vec<MonthOption> {
        self.window.options()
    }

    // view and selection

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// aggregate the current month as of `now`
    ///
    /// the summary always covers the whole month; the search term only
    /// narrows the buckets.
    pub fn view(&self, now: DateTime<Utc>) -> Result<FeeView> {
        if self.payments.is_loading() {
            return Ok(FeeView::Loading);
        }

        let month = self.month;
        let search = self.search.as_str();
        let error = self.payments.error();
        self.payments.with_data(|records| -> Result<FeeView> {
            match records {
                Some(records) => {
                    let mut view = summarize(records, month, now)?;
                    view.buckets = view.search(search);
                    Ok(FeeView::Ready(view))
                }
                None => Ok(FeeView::Unavailable(
                    error.unwrap_or_else(|| "payments not loaded".to_string()),
                )),
            }
        })
    }

    /// pending fees of the month that pass the search, in gateway order
    pub fn visible_pending_ids(&self) -> Vec<PaymentId> {
        let month = self.month;
        let search = self.search.as_str();
        self.payments.with_data(|records| {
            records
                .into_iter()
                .flatten()
                .filter(|r| r.belongs_to(month) && r.status == PaymentStatus::Pending)
                .filter(|r| matches_search(&r.company.name, search))
                .map(|r| r.id)
                .filter(|id| self.ledger.entry(*id).is_some())
                .collect()
        })
    }

    /// select every visible pending fee, or clear them if all already are
    pub fn select_all_visible(&mut self) -> bool {
        let visible = self.visible_pending_ids();
        self.ledger.select_all(&visible)
    }

    pub fn selection_totals(&self) -> SelectionTotals {
        self.ledger.totals(&self.visible_pending_ids())
    }

    // mutations

    /// mark the visible selected fees as paid, then re-fetch
    ///
    /// the list is re-fetched after success and after partial failure alike;
    /// nothing is patched locally.
    pub async fn submit_selected(&mut self, payment_date: DateTime<Utc>) -> Result<usize> {
        let ids = self.ledger.selected_ids(&self.visible_pending_ids());
        if ids.is_empty() {
            return Err(FeeError::NoSelection);
        }

        let batch_id = Uuid::new_v4();
        let result = submission::submit(self.gateway.as_ref(), &ids, payment_date).await;
        match &result {
            Ok(_) => self.events.emit(FeeEvent::PaymentsRegistered {
                batch_id,
                payment_ids: ids,
                payment_date,
            }),
            Err(FeeError::PartialFailure {
                succeeded_ids,
                failed_ids,
            }) => self.events.emit(FeeEvent::BatchPartiallyFailed {
                batch_id,
                succeeded_ids: succeeded_ids.clone(),
                failed_ids: failed_ids.clone(),
            }),
            Err(_) => {}
        }

        let refreshed = self.refresh().await;
        let count = result?;
        refreshed?;
        Ok(count)
    }

    /// put a paid fee back to pending, then re-fetch
    pub async fn revert_payment(&mut self, id: PaymentId) -> Result<PaymentRecord> {
        let result = submission::revert(self.gateway.as_ref(), id).await;
        if result.is_ok() {
            self.events.emit(FeeEvent::PaymentReverted { payment_id: id });
        }

        let refreshed = self.refresh().await;
        let record = result?;
        refreshed?;
        Ok(record)
    }

    /// have the gateway generate the month's fees unless any record exists
    ///
    /// returns whether generation was requested.
    pub async fn ensure_month_generated(&mut self, month: ReferenceMonth) -> Result<bool> {
        if self.payments.with_data(|d| d.is_none()) {
            self.refresh().await?;
        }
        let records = self.require_payments()?;
        if has_records_for(&records, month) {
            return Ok(false);
        }

        self.gateway.generate_payments(month).await?;
        tracing::info!(%month, "fees generated");
        self.events.emit(FeeEvent::FeesGenerated { month });
        self.refresh().await?;
        Ok(true)
    }

    /// ensure the current month and the following `count - 1` months have fees
    pub async fn ensure_upcoming_generated(&mut self, count: u32) -> Result<Vec<ReferenceMonth>> {
        let mut generated = Vec::new();
        let mut month = self.month;
        for _ in 0..count {
            if self.ensure_month_generated(month).await? {
                generated.push(month);
            }
            month = month.succ();
        }
        Ok(generated)
    }

    /// dashboard figures of the current month as of `now`
    ///
    /// unavailable while a payments reload is in flight.
    pub async fn dashboard(&mut self, now: DateTime<Utc>) -> Result<DashboardSummary> {
        if self.payments.is_loading() {
            return Err(FeeError::Unavailable("payments are loading".to_string()));
        }
        if self.payments.with_data(|d| d.is_none()) {
            self.refresh().await?;
        }
        if self.companies.with_data(|d| d.is_none()) {
            self.refresh_companies().await;
        }

        let records = self.require_payments()?;
        let companies = self.companies.snapshot().data.unwrap_or_default();
        let revenue = self.gateway.monthly_revenue(self.month).await?;
        let view = summarize(&records, self.month, now)?;
        Ok(DashboardSummary::build(&companies, &view, revenue))
    }

    // company directory

    /// loaded companies matching `term` and `filter`
    pub fn company_list(&self, term: &str, filter: ActivityFilter) -> Vec<Company> {
        self.companies.with_data(|companies| {
            filter_companies(companies.map(Vec::as_slice).unwrap_or_default(), term, filter)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn company_stats(&self) -> CompanyStats {
        self.companies.with_data(|companies| {
            CompanyStats::from_companies(companies.map(Vec::as_slice).unwrap_or_default())
        })
    }

    pub async fn create_company(&mut self, draft: CompanyDraft) -> Result<Company> {
        let draft = draft.normalized();
        draft.validate()?;
        let result = self.gateway.create_company(&draft).await;
        self.refresh_companies().await;
        Ok(result?)
    }

    /// apply `changes`; payments embed the company status, so both lists are re-fetched
    pub async fn update_company(&mut self, id: CompanyId, changes: &CompanyChanges) -> Result<Company> {
        let result = self.gateway.update_company(id, changes).await;
        self.refresh_companies().await;
        let refreshed = self.refresh().await;
        let company = result?;
        refreshed?;
        Ok(company)
    }

    pub async fn set_company_active(&mut self, id: CompanyId, is_active: bool) -> Result<Company> {
        self.update_company(id, &CompanyChanges::activity(is_active)).await
    }

    pub async fn delete_company(&mut self, id: CompanyId) -> Result<()> {
        let result = self.gateway.delete_company(id).await;
        self.refresh_companies().await;
        let refreshed = self.refresh().await;
        result?;
        refreshed?;
        Ok(())
    }
}
