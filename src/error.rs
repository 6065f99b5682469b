use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderProcessError {
    #[error("order process for order {0} exists")]
    AlreadyExists(String),
    #[error("order process for order {0} does not exist")]
    NotFound(String),
    #[error("callback delivery to {url} failed: {reason}")]
    DeliveryFailed { url: String, reason: String },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, OrderProcessError>;
