//! Error types for coin selection
//!
//! Target-amount selection has exactly one failure mode: the eligible
//! outputs cannot pay for the target plus the cheapest possible fee. It is
//! an ordinary business outcome, so it is returned as a `Result` error and
//! never retried internally. Retrying with the same inputs fails the same
//! way; the caller has to change the request first.
//!
//! Configuration errors are reported through `anyhow` by the `config`
//! module and are not part of this type.

use bitcoin::Amount;
use thiserror::Error;

/// Errors returned by target-amount selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinSelectionError {
    /// Even spending every eligible output does not cover target plus fee
    #[error(
        "Insufficient funds: needed {} sats, available {} sats",
        required.to_sat(),
        available.to_sat()
    )]
    InsufficientFunds {
        /// Sum of all eligible outputs
        available: Amount,
        /// Target plus the no-change fee for spending every eligible output
        required: Amount,
    },
}

impl CoinSelectionError {
    /// How much more value the wallet would need
    pub fn shortfall(&self) -> Amount {
        match self {
            CoinSelectionError::InsufficientFunds {
                available,
                required,
            } => required.checked_sub(*available).unwrap_or(Amount::ZERO),
        }
    }
}

/// Result alias for selection calls
pub type SelectionResult<T> = Result<T, CoinSelectionError>;
