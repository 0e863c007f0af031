use crate::types::ClientId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No product available for the requested simulation")]
    NoProductAvailable,

    #[error("Client {client_id} has no investment or simulation history")]
    NoHistoryAvailable { client_id: ClientId },

    #[error("Unsupported matching source: {reason}")]
    UnsupportedSource { reason: String },

    #[error("Invalid amount {amount}: must be a positive number")]
    InvalidAmount { amount: f64 },

    #[error("Invalid term: {reason}")]
    InvalidTerm { reason: String },

    #[error("Invalid rate profile for '{subject}': {reason}")]
    InvalidRateProfile { subject: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
