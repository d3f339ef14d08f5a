use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::calendar::overdue_days;
use crate::errors::Result;
use crate::records::PaymentRecord;
use crate::types::{DerivedStatus, PaymentStatus};

/// derived status of one record at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: DerivedStatus,
    /// zero unless overdue
    pub overdue_days: u32,
}

impl Classification {
    fn with_status(status: DerivedStatus) -> Self {
        Self {
            status,
            overdue_days: 0,
        }
    }
}

/// classify a record relative to `now`
///
/// a paid record is `Pago` whatever its due date. otherwise a due date
/// strictly before `now` makes it `Atrasado`, anything else is `Pendente`.
/// pending records without a due date are rejected as malformed.
pub fn classify(record: &PaymentRecord, now: DateTime<Utc>) -> Result<Classification> {
    if record.status == PaymentStatus::Paid {
        return Ok(Classification::with_status(DerivedStatus::Pago));
    }

    let due = record.due()?;
    if due < now {
        Ok(Classification {
            status: DerivedStatus::Atrasado,
            overdue_days: overdue_days(due, now),
        })
    } else {
        Ok(Classification::with_status(DerivedStatus::Pendente))
    }
}

/// classify against the provider's current time
pub fn classify_at(record: &PaymentRecord, time_provider: &SafeTimeProvider) -> Result<Classification> {
    classify(record, time_provider.now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ReferenceMonth;
    use crate::decimal::Money;
    use crate::errors::FeeError;
    use crate::records::CompanyRef;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    fn record(status: PaymentStatus, due: Option<DateTime<Utc>>) -> PaymentRecord {
        PaymentRecord {
            id: 1,
            company_id: 1,
            company: CompanyRef {
                name: "Comércio Geral S.A.".to_string(),
                is_active: true,
            },
            reference_month: ReferenceMonth::new(2026, 10).unwrap(),
            value: Some(Money::from_major(1_200)),
            due_date: due,
            status,
            payment_date: match status {
                PaymentStatus::Paid => due,
                PaymentStatus::Pending => None,
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_paid_ignores_due_date() {
        for offset in [-40, 0, 40] {
            let due = now() + Duration::days(offset);
            let c = classify(&record(PaymentStatus::Paid, Some(due)), now()).unwrap();
            assert_eq!(c.status, DerivedStatus::Pago);
            assert_eq!(c.overdue_days, 0);
        }
    }

    #[test]
    fn test_past_due_is_overdue() {
        let due = now() - Duration::days(3) - Duration::hours(2);
        let c = classify(&record(PaymentStatus::Pending, Some(due)), now()).unwrap();
        assert_eq!(c.status, DerivedStatus::Atrasado);
        assert_eq!(c.overdue_days, 4);
    }

    #[test]
    fn test_due_now_or_later_is_pending() {
        let c = classify(&record(PaymentStatus::Pending, Some(now())), now()).unwrap();
        assert_eq!(c, Classification { status: DerivedStatus::Pendente, overdue_days: 0 });

        let c = classify(&record(PaymentStatus::Pending, Some(now() + Duration::days(1))), now()).unwrap();
        assert_eq!(c.status, DerivedStatus::Pendente);
    }

    #[test]
    fn test_missing_due_date_is_malformed() {
        let err = classify(&record(PaymentStatus::Pending, None), now()).unwrap_err();
        assert!(matches!(err, FeeError::MalformedRecord { id: 1, .. }));
    }

    #[test]
    fn test_paid_without_due_date_is_pago() {
        let mut rec = record(PaymentStatus::Paid, None);
        rec.payment_date = Some(now() - Duration::days(2));

        let c = classify(&rec, now()).unwrap();
        assert_eq!(c, Classification { status: DerivedStatus::Pago, overdue_days: 0 });
    }

    #[test]
    fn test_classify_with_controlled_time() {
        let time = SafeTimeProvider::new(TimeSource::Test(now()));
        let control = time.test_control().unwrap();
        let rec = record(PaymentStatus::Pending, Some(now() + Duration::hours(12)));

        assert_eq!(classify_at(&rec, &time).unwrap().status, DerivedStatus::Pendente);

        control.advance(Duration::days(2));
        let c = classify_at(&rec, &time).unwrap();
        assert_eq!(c.status, DerivedStatus::Atrasado);
        assert_eq!(c.overdue_days, 2);
    }
}
