/// quick start - load a month of fees and register two payments
use chrono::{TimeZone, Utc};
use honorarios_rs::{
    AppConfig, CompanyRef, FeeSession, FeeView, InMemoryGateway, Money, PaymentRecord,
    PaymentStatus, ReferenceMonth,
};
use std::sync::Arc;

fn pending(id: i64, name: &str, value: i64, due_day: u32) -> PaymentRecord {
    PaymentRecord {
        id,
        company_id: id,
        company: CompanyRef {
            name: name.to_string(),
            is_active: true,
        },
        reference_month: ReferenceMonth::new(2026, 10).unwrap(),
        value: Some(Money::from_major(value)),
        due_date: Utc.with_ymd_and_hms(2026, 10, due_day, 0, 0, 0).single(),
        status: PaymentStatus::Pending,
        payment_date: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("honorarios_rs=info").init();

    let gateway = InMemoryGateway::new().with_payments(vec![
        pending(1, "Tech Solutions Ltda", 1_500, 10),
        pending(2, "Comércio Geral S.A.", 1_200, 15),
        pending(3, "Padaria Central", 800, 25),
    ]);
    let october = ReferenceMonth::new(2026, 10)?;
    let mut session = FeeSession::new(Arc::new(gateway), &AppConfig::default(), october);
    session.refresh().await?;

    // select everything, then give one fee a discount
    session.select_all_visible();
    session.ledger_mut().set_adjusted_value(3, "750,00")?;
    let totals = session.selection_totals();
    println!("{} selected, {}", totals.count, totals.sum.format_brl());

    session.submit_selected(Utc::now()).await?;

    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    if let FeeView::Ready(view) = session.view(now)? {
        println!(
            "{}: received {} of {} ({})",
            view.month.label_pt_br(),
            view.summary.received.format_brl(),
            view.summary.total.format_brl(),
            view.summary.received_percentage,
        );
    }

    Ok(())
}
