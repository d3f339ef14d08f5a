//! remote data gateway
//!
//! the gateway is the system of record. the core only depends on the
//! request/response shapes behind [`FeeGateway`].

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::calendar::ReferenceMonth;
use crate::companies::{CompanyChanges, CompanyDraft};
use crate::decimal::Money;
use crate::records::{Company, PaymentRecord, StatusUpdate};
use crate::types::{CompanyId, PaymentId};

pub use http::HttpGateway;
pub use memory::InMemoryGateway;

/// gateway request failure, opaque to the core
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// responses come either bare or wrapped in `{ "data": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// request/response contract of the remote back office
#[async_trait]
pub trait FeeGateway: Send + Sync {
    async fn list_companies(&self) -> GatewayResult<Vec<Company>>;

    async fn list_payments(&self) -> GatewayResult<Vec<PaymentRecord>>;

    /// mark paid or revert to pending
    async fn update_payment_status(
        &self,
        id: PaymentId,
        update: &StatusUpdate,
    ) -> GatewayResult<PaymentRecord>;

    /// server-side revenue figure for a month
    async fn monthly_revenue(&self, month: ReferenceMonth) -> GatewayResult<Money>;

    /// make sure fee records exist for the month, idempotent
    async fn generate_payments(&self, month: ReferenceMonth) -> GatewayResult<()>;

    async fn create_company(&self, draft: &CompanyDraft) -> GatewayResult<Company>;

    async fn update_company(&self, id: CompanyId, changes: &CompanyChanges) -> GatewayResult<Company>;

    async fn delete_company(&self, id: CompanyId) -> GatewayResult<()>;
}
