use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;

use crate::errors::{FeeError, Result};
use crate::gateway::FeeGateway;
use crate::records::{PaymentRecord, StatusUpdate};
use crate::types::PaymentId;

/// mark every payment in `ids` as paid on `payment_date`
///
/// duplicate ids are sent once. the mutations run concurrently and are not
/// atomic: when some fail, the ones that went through stay paid and the
/// split is reported as `PartialFailure`. returns the number of payments
/// marked paid.
pub async fn submit<G>(gateway: &G, ids: &[PaymentId], payment_date: DateTime<Utc>) -> Result<usize>
where
    G: FeeGateway + ?Sized,
{
    let mut seen = HashSet::new();
    let ids: Vec<PaymentId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if ids.is_empty() {
        return Err(FeeError::NoSelection);
    }

    let update = StatusUpdate::mark_paid(payment_date);
    let results = join_all(ids.iter().map(|id| gateway.update_payment_status(*id, &update))).await;

    let mut succeeded_ids = Vec::new();
    let mut failed_ids = Vec::new();
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(_) => succeeded_ids.push(*id),
            Err(err) => {
                tracing::warn!(payment_id = id, error = %err, "failed to mark payment as paid");
                failed_ids.push(*id);
            }
        }
    }

    if !failed_ids.is_empty() {
        return Err(FeeError::PartialFailure {
            succeeded_ids,
            failed_ids,
        });
    }

    tracing::info!(count = succeeded_ids.len(), "payments marked as paid");
    Ok(succeeded_ids.len())
}

/// put a paid fee back to pending
pub async fn revert<G>(gateway: &G, id: PaymentId) -> Result<PaymentRecord>
where
    G: FeeGateway + ?Sized,
{
    let record = gateway
        .update_payment_status(id, &StatusUpdate::revert())
        .await?;
    tracing::info!(payment_id = id, "payment reverted to pending");
    Ok(record)
}
