//! property tests for classification and monthly aggregation
//!
//! record sets mix three reference months, active and inactive companies,
//! paid and pending fees with due dates on both sides of `now`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::aggregator::summarize;
use crate::calendar::ReferenceMonth;
use crate::classifier::classify;
use crate::decimal::Money;
use crate::records::{CompanyRef, PaymentRecord};
use crate::types::{DerivedStatus, PaymentStatus};

const MINUTES_PER_DAY: i64 = 24 * 60;

fn october() -> ReferenceMonth {
    ReferenceMonth::new(2026, 10).unwrap()
}

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
}

/// instants spread over october, at minute resolution
fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..31 * MINUTES_PER_DAY).prop_map(|m| anchor() + Duration::minutes(m))
}

/// shape of one generated record, ids are assigned afterwards
#[derive(Debug, Clone)]
struct FeeShape {
    month_offset: i32,
    is_active: bool,
    cents: i64,
    due_offset_minutes: Option<i64>,
    paid: bool,
}

fn fee_shape() -> impl Strategy<Value = FeeShape> {
    (
        -1i32..=1,
        any::<bool>(),
        0i64..500_000,
        -45 * MINUTES_PER_DAY..75 * MINUTES_PER_DAY,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(month_offset, is_active, cents, due, paid, drop_due)| FeeShape {
            month_offset,
            is_active,
            cents,
            // only paid fees may come without a due date
            due_offset_minutes: if paid && drop_due { None } else { Some(due) },
            paid,
        })
}

fn build(shapes: &[FeeShape]) -> Vec<PaymentRecord> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let id = i as i64 + 1;
            let due_date = shape.due_offset_minutes.map(|m| anchor() + Duration::minutes(m));
            PaymentRecord {
                id,
                company_id: id * 10,
                company: CompanyRef {
                    name: format!("Empresa {id} Ltda"),
                    is_active: shape.is_active,
                },
                reference_month: october().add_months(shape.month_offset),
                value: Some(Money::from_cents(shape.cents)),
                due_date,
                status: if shape.paid { PaymentStatus::Paid } else { PaymentStatus::Pending },
                payment_date: shape.paid.then(|| anchor() + Duration::days(2)),
            }
        })
        .collect()
}

fn records_strategy() -> impl Strategy<Value = Vec<PaymentRecord>> {
    prop::collection::vec(fee_shape(), 0..24).prop_map(|shapes| build(&shapes))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// total equals received + pending + overdue, and equals the sum of
    /// the month's active records
    #[test]
    fn prop_summary_is_additive(records in records_strategy(), now in now_strategy()) {
        let view = summarize(&records, october(), now).unwrap();
        let s = view.summary;

        prop_assert_eq!(s.total, s.received + s.pending + s.overdue);

        let expected: Money = records
            .iter()
            .filter(|r| r.belongs_to(october()))
            .filter_map(|r| r.value)
            .sum();
        prop_assert_eq!(s.total, expected);
    }

    /// paid records are `Pago` whatever their due date
    #[test]
    fn prop_paid_is_pago(records in records_strategy(), now in now_strategy()) {
        for record in records.iter().filter(|r| r.is_paid()) {
            let c = classify(record, now).unwrap();
            prop_assert_eq!(c.status, DerivedStatus::Pago);
            prop_assert_eq!(c.overdue_days, 0);
        }
    }

    /// pending records split on the due date: on or after `now` is
    /// `Pendente` with no overdue days, before it is `Atrasado` with some
    #[test]
    fn prop_pending_splits_on_due_date(records in records_strategy(), now in now_strategy()) {
        for record in records.iter().filter(|r| !r.is_paid()) {
            let due = record.due_date.unwrap();
            let c = classify(record, now).unwrap();
            if due >= now {
                prop_assert_eq!(c.status, DerivedStatus::Pendente);
                prop_assert_eq!(c.overdue_days, 0);
            } else {
                prop_assert_eq!(c.status, DerivedStatus::Atrasado);
                prop_assert!(c.overdue_days >= 1);
            }
        }
    }

    /// buckets hold exactly the month's records of active companies, with
    /// paid ones only in the paid bucket
    #[test]
    fn prop_buckets_hold_only_active_month_records(
        records in records_strategy(),
        now in now_strategy(),
    ) {
        let view = summarize(&records, october(), now).unwrap();
        let expected = records.iter().filter(|r| r.belongs_to(october())).count();
        prop_assert_eq!(view.buckets.len(), expected);

        for item in view.buckets.pending.iter().chain(view.buckets.paid.iter()) {
            let source = records.iter().find(|r| r.id == item.payment_id).unwrap();
            prop_assert!(source.company.is_active);
            prop_assert_eq!(source.reference_month, october());
        }
        prop_assert!(view.buckets.paid.iter().all(|i| i.status == DerivedStatus::Pago));
        prop_assert!(view.buckets.pending.iter().all(|i| i.status.is_outstanding()));
    }

    /// same records and instant give the same view
    #[test]
    fn prop_summary_is_deterministic(records in records_strategy(), now in now_strategy()) {
        let first = summarize(&records, october(), now).unwrap();
        let second = summarize(&records.clone(), october(), now).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
