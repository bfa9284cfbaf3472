//! Coinsel Core Library
//!
//! This crate implements the coin selection and fee estimation engine of a
//! UTXO wallet. Given the wallet's unspent outputs, a payment amount and a
//! fee rate, it chooses the inputs, prices the transaction, and decides
//! whether a change output is worth creating.
//!
//! # Modules
//!
//! - `types`: Unspent outputs, fee rate, request and result aggregates
//! - `size`: Transaction size estimation
//! - `utxo_selection`: Candidate ordering, eligibility, and the selector
//! - `error`: Selection error type
//! - `config`: TOML configuration of chain constants
//! - `logging`: Logger initialisation and structured event helpers
//!
//! # Scope
//!
//! Fetching outputs, building and signing transactions, and broadcasting
//! them are left to the caller. Every selection call is a pure function of
//! its inputs; no state survives between calls.
//!
//! # Example
//!
//! ```
//! use coinsel_core::{CoinSelector, FeeRate, SelectionRequest, SortingStrategy, UnspentOutput};
//! use bitcoin::{Amount, OutPoint, Txid};
//! use std::str::FromStr;
//!
//! let txid = Txid::from_str("5e2f84f989c08d4a0f9ce759ed21261f23b0b190bac24a5dfad045e05ddd3a7a").unwrap();
//! let utxos: Vec<UnspentOutput> = [200_000u64, 300_000, 500_000]
//!     .iter()
//!     .enumerate()
//!     .map(|(vout, sats)| UnspentOutput::new(OutPoint::new(txid, vout as u32), Amount::from_sat(*sats), 1))
//!     .collect();
//!
//! let selector = CoinSelector::new();
//! let fee_rate = FeeRate::from_sat_per_byte(55);
//!
//! // Largest-first covers the payment with a single input; the remainder is
//! // too small for a change output and is folded into the fee.
//! let request = SelectionRequest::new(Amount::from_sat(485_000), fee_rate, utxos.clone(), SortingStrategy::Descending);
//! let selection = selector.select_for_amount(&request).unwrap();
//! assert_eq!(selection.absolute_fee, Amount::from_sat(15_000));
//! assert_eq!(selection.consumed_amount, Amount::from_sat(4_385));
//!
//! // "Send max"
//! assert_eq!(selector.max_spendable(&utxos, fee_rate), Amount::from_sat(1_000_000 - 27_005));
//! ```

/// Core domain types
pub mod types;

/// Transaction size estimation
pub mod size;

/// UTXO selection algorithms
pub mod utxo_selection;

/// Selection error type
pub mod error;

/// Configuration management
pub mod config;

/// Logging infrastructure
pub mod logging;

/// Re-export core types
pub use types::{FeeRate, OwnerDescriptor, SelectionRequest, SpendableUnspentOutputs, UnspentOutput};

/// Re-export size estimation types
pub use size::{ScriptType, SizeProfile, TransactionSizeCalculator};

/// Re-export selection types and entry points
pub use utxo_selection::{
    select_all, select_for_amount, ChangeOutput, CoinSelector, DustPolicy, EligibilityRules,
    ReplayPolicy, SortingStrategy,
};

/// Re-export error types
pub use error::CoinSelectionError;

/// Re-export configuration
pub use config::SelectorConfig;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
