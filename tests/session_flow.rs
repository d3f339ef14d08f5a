// end-to-end session flows against the in-memory gateway

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use honorarios_rs::{
    AppConfig, Company, CompanyChanges, CompanyDraft, CompanyRef, FeeError, FeeEvent, FeeGateway,
    FeeSession, FeeView, GatewayResult, InMemoryGateway, LoadOutcome, Money, PaymentId,
    PaymentRecord, PaymentStatus, ReferenceMonth, SafeTimeProvider, StatusUpdate, TimeSource,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Notify;

fn october() -> ReferenceMonth {
    ReferenceMonth::new(2026, 10).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

fn company(id: i64, name: &str, fee: i64, due_day: u32) -> Company {
    Company {
        id,
        name: name.to_string(),
        trade_name: None,
        cnpj: format!("{:02}.345.678/0001-90", id),
        activity: Some("Contabilidade".to_string()),
        accounting_fee: Money::from_major(fee),
        email: format!("financeiro{id}@empresa.com.br"),
        billing_due_day: due_day,
        is_active: true,
        accounting_firm_id: Some(1),
    }
}

fn payment(id: PaymentId, company: &Company, due_day: u32, status: PaymentStatus) -> PaymentRecord {
    let due = Utc.with_ymd_and_hms(2026, 10, due_day, 0, 0, 0).unwrap();
    PaymentRecord {
        id,
        company_id: company.id,
        company: CompanyRef {
            name: company.name.clone(),
            is_active: company.is_active,
        },
        reference_month: october(),
        value: Some(company.accounting_fee),
        due_date: Some(due),
        status,
        payment_date: (status == PaymentStatus::Paid).then_some(due),
    }
}

/// four october fees: 2000 paid, 1200 overdue, 1500 pending and 1000 overdue
fn seeded_gateway() -> InMemoryGateway {
    let companies = vec![
        company(1, "Tech Solutions Ltda", 2_000, 5),
        company(2, "Comércio Geral S.A.", 1_200, 10),
        company(3, "Serviços Digitais ME", 1_500, 25),
        company(4, "Padaria Central", 1_000, 15),
    ];
    let payments = vec![
        payment(1, &companies[0], 5, PaymentStatus::Paid),
        payment(2, &companies[1], 10, PaymentStatus::Pending),
        payment(3, &companies[2], 25, PaymentStatus::Pending),
        payment(4, &companies[3], 15, PaymentStatus::Pending),
    ];
    InMemoryGateway::new().with_companies(companies).with_payments(payments)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn loaded_session() -> FeeSession<InMemoryGateway> {
    init_tracing();
    let mut session = FeeSession::new(Arc::new(seeded_gateway()), &AppConfig::default(), october());
    assert_eq!(session.refresh().await.unwrap(), LoadOutcome::Applied);
    session
}

#[tokio::test]
async fn test_monthly_view() {
    let session = loaded_session().await;

    let view = match session.view(now()).unwrap() {
        FeeView::Ready(view) => view,
        other => panic!("unexpected view: {other:?}"),
    };

    assert_eq!(view.summary.total, Money::from_major(5_700));
    assert_eq!(view.summary.received, Money::from_major(2_000));
    assert_eq!(view.summary.overdue, Money::from_major(2_200));
    assert_eq!(view.summary.pending, Money::from_major(1_500));
    assert_eq!(view.summary.received_percentage.round_dp(1).as_decimal(), dec!(35.1));
    assert_eq!(view.overdue_count(), 2);

    let ids: Vec<PaymentId> = view.buckets.pending.iter().map(|i| i.payment_id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert_eq!(view.buckets.pending[0].badge(), "Atrasado (10 dias)");
}

#[tokio::test]
async fn test_register_fees_with_partial_failure() {
    let mut session = loaded_session().await;
    session.gateway().fail_updates_for(3);

    assert!(session.select_all_visible());
    assert_eq!(session.selection_totals().count, 3);
    session.ledger_mut().set_adjusted_value(4, "950,00").unwrap();
    assert_eq!(session.selection_totals().sum, Money::from_major(3_650));

    let listings_before = session.gateway().payment_listing_count();
    let err = session.submit_selected(now()).await.unwrap_err();
    match &err {
        FeeError::PartialFailure {
            succeeded_ids,
            failed_ids,
        } => {
            assert_eq!(succeeded_ids, &vec![2, 4]);
            assert_eq!(failed_ids, &vec![3]);
        }
        other => panic!("unexpected error: {other}"),
    }

    // the list is re-read from the gateway, never patched locally
    assert_eq!(session.gateway().payment_listing_count(), listings_before + 1);
    assert_eq!(session.visible_pending_ids(), vec![3]);
    assert_eq!(session.ledger().len(), 1);
    assert!(!session.ledger().is_selected(3));

    let events = session.take_events();
    assert!(matches!(
        events.as_slice(),
        [FeeEvent::BatchPartiallyFailed { failed_ids, .. }] if failed_ids == &vec![3]
    ));
}

#[tokio::test]
async fn test_register_and_revert() {
    let mut session = loaded_session().await;
    session.ledger_mut().select(2).unwrap();

    assert_eq!(session.submit_selected(now()).await.unwrap(), 1);
    assert_eq!(session.gateway().status_update_count(), 1);
    assert!(matches!(
        session.take_events().as_slice(),
        [FeeEvent::PaymentsRegistered { payment_ids, .. }] if payment_ids == &vec![2]
    ));

    let record = session.revert_payment(2).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert!(session.ledger().entry(2).is_some());
    assert_eq!(
        session.take_events(),
        vec![FeeEvent::PaymentReverted { payment_id: 2 }]
    );
}

#[tokio::test]
async fn test_search_only_narrows_lists() {
    let mut session = loaded_session().await;
    session.set_search("  padaria ");

    let view = match session.view(now()).unwrap() {
        FeeView::Ready(view) => view,
        other => panic!("unexpected view: {other:?}"),
    };
    assert_eq!(view.buckets.pending.len(), 1);
    assert!(view.buckets.paid.is_empty());
    assert_eq!(view.summary.total, Money::from_major(5_700));

    session.select_all_visible();
    assert_eq!(session.ledger().selected_ids(&[2, 3, 4]), vec![4]);
}

#[tokio::test]
async fn test_month_navigation_resets_selection() {
    let mut session = loaded_session().await;
    session.ledger_mut().select(2).unwrap();

    assert!(session.previous_month().unwrap());
    assert!(session.ledger().is_empty());
    assert!(session.next_month().unwrap());
    assert_eq!(session.month(), october());
    assert!(!session.ledger().is_selected(2));
    assert_eq!(session.ledger().len(), 3);
    assert_eq!(session.take_events().len(), 2);
}

#[tokio::test]
async fn test_fee_generation_is_idempotent() {
    let mut session = loaded_session().await;
    let november = october().succ();

    assert!(!session.ensure_month_generated(october()).await.unwrap());
    assert!(session.ensure_month_generated(november).await.unwrap());
    assert!(!session.ensure_month_generated(november).await.unwrap());
    assert_eq!(session.gateway().generation_count(), 1);

    let generated: Vec<PaymentRecord> = session
        .gateway()
        .payments()
        .into_iter()
        .filter(|p| p.reference_month == november)
        .collect();
    assert_eq!(generated.len(), 4);
    assert!(generated.iter().all(|p| p.status == PaymentStatus::Pending));

    let padaria = generated.iter().find(|p| p.company_id == 4).unwrap();
    assert_eq!(padaria.value, Some(Money::from_major(1_000)));
    assert_eq!(
        padaria.due_date,
        Some(Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap())
    );

    let upcoming = session.ensure_upcoming_generated(3).await.unwrap();
    assert_eq!(upcoming, vec![november.succ()]);
}

#[tokio::test]
async fn test_dashboard() {
    let mut session = loaded_session().await;
    session.gateway().set_revenue(october(), Money::from_major(5_700));

    let dashboard = session.dashboard(now()).await.unwrap();
    assert_eq!(dashboard.total_companies, 4);
    assert_eq!(dashboard.active_companies, 4);
    assert_eq!(dashboard.server_revenue, Money::from_major(5_700));
    assert_eq!(dashboard.outstanding, Money::from_major(3_700));
    assert_eq!(dashboard.overdue_count, 2);
}

#[tokio::test]
async fn test_deactivated_company_drops_out_of_month() {
    let mut session = loaded_session().await;
    session.refresh_companies().await;

    let updated = session.set_company_active(4, false).await.unwrap();
    assert!(!updated.is_active);
    assert_eq!(session.company_stats().inactive, 1);
    assert_eq!(session.visible_pending_ids(), vec![2, 3]);

    let changes = CompanyChanges {
        name: Some("Padaria Nova".to_string()),
        is_active: Some(true),
        ..CompanyChanges::default()
    };
    session.update_company(4, &changes).await.unwrap();
    assert_eq!(session.visible_pending_ids(), vec![2, 3, 4]);
}

#[tokio::test]
async fn test_company_directory() {
    let mut session = loaded_session().await;
    session.refresh_companies().await;

    let draft = CompanyDraft {
        name: "Nova Empresa".to_string(),
        trade_name: None,
        cnpj: "98765432000110".to_string(),
        activity: None,
        email: "contato@nova.com".to_string(),
        accounting_fee: Money::from_major(700),
        billing_due_day: 20,
    };
    let created = session.create_company(draft.clone()).await.unwrap();
    assert_eq!(created.cnpj, "98.765.432/0001-10");
    assert_eq!(session.company_stats().total, 5);

    let invalid = CompanyDraft {
        billing_due_day: 0,
        ..draft
    };
    assert!(matches!(
        session.create_company(invalid).await,
        Err(FeeError::InvalidCompany { field: "billing_due_day", .. })
    ));

    session.delete_company(created.id).await.unwrap();
    assert_eq!(session.company_list("nova", Default::default()).len(), 0);
}

#[tokio::test]
async fn test_session_follows_test_clock() {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap(),
    ));
    let session = FeeSession::starting_at(Arc::new(seeded_gateway()), &AppConfig::default(), &time);
    assert_eq!(session.month(), ReferenceMonth::new(2026, 12).unwrap());
}

/// holds `list_payments` until released
struct GatedGateway {
    inner: InMemoryGateway,
    gate: Notify,
}

#[async_trait]
impl FeeGateway for GatedGateway {
    async fn list_companies(&self) -> GatewayResult<Vec<Company>> {
        self.inner.list_companies().await
    }

    async fn list_payments(&self) -> GatewayResult<Vec<PaymentRecord>> {
        self.gate.notified().await;
        self.inner.list_payments().await
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        update: &StatusUpdate,
    ) -> GatewayResult<PaymentRecord> {
        self.inner.update_payment_status(id, update).await
    }

    async fn monthly_revenue(&self, month: ReferenceMonth) -> GatewayResult<Money> {
        self.inner.monthly_revenue(month).await
    }

    async fn generate_payments(&self, month: ReferenceMonth) -> GatewayResult<()> {
        self.inner.generate_payments(month).await
    }

    async fn create_company(&self, draft: &CompanyDraft) -> GatewayResult<Company> {
        self.inner.create_company(draft).await
    }

    async fn update_company(&self, id: i64, changes: &CompanyChanges) -> GatewayResult<Company> {
        self.inner.update_company(id, changes).await
    }

    async fn delete_company(&self, id: i64) -> GatewayResult<()> {
        self.inner.delete_company(id).await
    }
}

#[tokio::test]
async fn test_stale_refresh_is_discarded() {
    let gateway = Arc::new(GatedGateway {
        inner: seeded_gateway(),
        gate: Notify::new(),
    });
    let mut session = FeeSession::new(Arc::clone(&gateway), &AppConfig::default(), october());
    let payments = session.payments();

    let (outcome, ()) = tokio::join!(session.refresh(), async {
        let newer = payments.load(async { Ok(Vec::new()) }).await;
        assert_eq!(newer, LoadOutcome::Applied);
        gateway.gate.notify_one();
    });

    assert!(matches!(outcome.unwrap(), LoadOutcome::Stale(_)));
    assert_eq!(payments.snapshot().data, Some(Vec::new()));
    assert!(matches!(
        session.take_events().as_slice(),
        [FeeEvent::StaleResponseDiscarded { ticket: 1 }]
    ));
}
