use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::ReferenceMonth;
use crate::types::PaymentId;

/// all events that can be emitted by a fee session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeeEvent {
    // navigation events
    MonthChanged {
        from: ReferenceMonth,
        to: ReferenceMonth,
    },

    // payment events
    PaymentsRegistered {
        batch_id: Uuid,
        payment_ids: Vec<PaymentId>,
        payment_date: DateTime<Utc>,
    },
    BatchPartiallyFailed {
        batch_id: Uuid,
        succeeded_ids: Vec<PaymentId>,
        failed_ids: Vec<PaymentId>,
    },
    PaymentReverted {
        payment_id: PaymentId,
    },
    FeesGenerated {
        month: ReferenceMonth,
    },

    // data events
    StaleResponseDiscarded {
        ticket: u64,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<FeeEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: FeeEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<FeeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[FeeEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
