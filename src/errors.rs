use thiserror::Error;

use crate::gateway::GatewayError;
use crate::types::PaymentId;

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("malformed payment record {id}: {reason}")]
    MalformedRecord {
        id: PaymentId,
        reason: String,
    },

    #[error("no payments selected")]
    NoSelection,

    #[error("batch partially failed: {} succeeded, {} failed", succeeded_ids.len(), failed_ids.len())]
    PartialFailure {
        succeeded_ids: Vec<PaymentId>,
        failed_ids: Vec<PaymentId>,
    },

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("invalid month: {input}")]
    InvalidMonth {
        input: String,
    },

    #[error("invalid amount: {input:?}")]
    InvalidAmount {
        input: String,
    },

    #[error("payment {id} is not a pending fee of the selected month")]
    UnknownPayment {
        id: PaymentId,
    },

    #[error("invalid company field {field}: {message}")]
    InvalidCompany {
        field: &'static str,
        message: String,
    },

    #[error("data unavailable: {0}")]
    Unavailable(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FeeError {
    pub(crate) fn malformed(id: PaymentId, reason: impl Into<String>) -> Self {
        FeeError::MalformedRecord {
            id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeeError>;
