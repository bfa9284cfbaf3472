//! UTXO selection module
//!
//! This module chooses which unspent outputs fund a payment, prices the
//! resulting transaction, and decides whether a change output is worth
//! creating.
//!
//! # Module Structure
//!
//! - `sorting.rs` - Candidate ordering (ascent draw / descent draw)
//! - `dust.rs` - Dust threshold and pre-sort eligibility filter
//! - `selector.rs` - `CoinSelector`, the target-amount and sweep entry points
//!
//! # Selection Semantics
//!
//! Target-amount selection draws candidates in strategy order and stops at
//! the first input that covers `target + fee(inputs, 2 outputs)`. The
//! remainder becomes change when it clears the dust threshold, which by
//! default is never below the relay dust limit of the change output; otherwise it
//! is folded into the fee and reported as `consumed_amount`. If the
//! candidates run out first, the selector spends everything for a single
//! payee, or fails with `InsufficientFunds`.
//!
//! Sweep selection spends every eligible output and never fails.
//!
//! # Typical Usage
//!
//! ```
//! use coinsel_core::utxo_selection::{self, SortingStrategy};
//! use coinsel_core::types::{FeeRate, SelectionRequest};
//! use bitcoin::Amount;
//!
//! let request = SelectionRequest::new(
//!     Amount::from_sat(50_000),
//!     FeeRate::from_sat_per_byte(10),
//!     Vec::new(),
//!     SortingStrategy::Ascending,
//! );
//!
//! // No candidates: the request cannot be funded
//! assert!(utxo_selection::select_for_amount(&request).is_err());
//!
//! // Sweeping nothing is an empty, fee-free selection
//! let sweep = utxo_selection::select_all(&[], FeeRate::from_sat_per_byte(10));
//! assert!(sweep.is_empty());
//! ```

pub mod dust;
pub mod selector;
pub mod sorting;

pub use dust::{ChangeOutput, DustPolicy, EligibilityRules, ReplayPolicy, DEFAULT_DUST_LIMIT};
pub use selector::{select_all, select_for_amount, CoinSelector};
pub use sorting::SortingStrategy;
