use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid amount '{raw}': {reason}")]
    InvalidAmount { raw: String, reason: String },

    #[error("Unparseable timestamp '{raw}'")]
    InvalidTimestamp { raw: String },

    #[error("Invalid RFM code '{code}'")]
    InvalidRfmCode { code: String },

    #[error("Invalid cohort label '{label}'")]
    InvalidCohortLabel { label: String },

    #[error("Unknown cohort period '{period}' (expected monthly or weekly)")]
    UnknownPeriod { period: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
