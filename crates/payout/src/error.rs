//! Error taxonomy for a payout run
//!
//! Every variant except [`PayoutError::InvalidInput`] ends the run. Invalid
//! operator input is handled where it happens by prompting again.

use std::path::PathBuf;

use crate::slate::Balance;

#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Network(String),

    #[error("Failed to get a payment slate: {body}")]
    PoolApi { status: Option<u16>, body: String },

    #[error("Insufficient Available Balance for payout: Minimum: {minimum}, Available: {available}")]
    InsufficientBalance { minimum: Balance, available: Balance },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    WalletUnavailable(String),

    #[error("{0}")]
    Signing(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to submit signed slate - {0}")]
    Submission(String),

    #[error("Error saving {what} to {path}: {source}")]
    Storage {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid deployment configuration: {0}")]
    Config(String),

    #[error("Input closed before a value was entered")]
    InputClosed,
}

impl PayoutError {
    /// Whether the operator can be asked again instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PayoutError::InvalidInput(_))
    }
}

pub type PayoutResult<T> = Result<T, PayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_recoverable() {
        assert!(PayoutError::InvalidInput("not json".into()).is_recoverable());
        assert!(!PayoutError::Signing("boom".into()).is_recoverable());
        assert!(!PayoutError::InputClosed.is_recoverable());
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = PayoutError::InsufficientBalance {
            minimum: Balance::from_nano(100_000_000),
            available: Balance::from_nano(0),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient Available Balance for payout: Minimum: 0.1, Available: 0"
        );
    }
}
