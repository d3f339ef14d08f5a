pub mod aggregator;
pub mod calendar;
pub mod classifier;
pub mod companies;
pub mod config;
pub mod dashboard;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod records;
pub mod repository;
pub mod session;
pub mod submission;
pub mod types;

#[cfg(test)]
mod aggregator_props;

// re-export key types
pub use aggregator::{summarize, Buckets, FeeItem, MonthlySummary, MonthlyTotals, MonthlyView};
pub use calendar::{MonthOption, MonthWindow, ReferenceMonth};
pub use classifier::{classify, classify_at, Classification};
pub use companies::{CompanyChanges, CompanyDraft, CompanyStats};
pub use crate::config::AppConfig;
pub use dashboard::DashboardSummary;
pub use decimal::{parse_user_amount, Money, Percentage};
pub use errors::{FeeError, Result};
pub use events::{EventStore, FeeEvent};
pub use gateway::{FeeGateway, GatewayError, GatewayResult, HttpGateway, InMemoryGateway};
pub use ledger::{LedgerEntry, SelectionLedger, SelectionTotals};
pub use records::{Company, CompanyRef, PaymentRecord, StatusUpdate};
pub use repository::{LoadOutcome, Repository, RequestTicket, Snapshot};
pub use session::{FeeSession, FeeView};
pub use submission::{revert, submit};
pub use types::{
    ActivityFilter, AdjustmentParsing, CompanyId, DerivedStatus, PaymentId, PaymentStatus, ViewKind,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
