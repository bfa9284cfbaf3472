//! Core domain types for coin selection
//!
//! This module defines the value types that flow through the selection
//! engine: the spendable outputs handed in by the wallet, the fee rate,
//! the request aggregate and the result aggregate returned to the
//! transaction builder.
//!
//! # Key Types
//!
//! - [`UnspentOutput`]: A single spendable output owned by the wallet
//! - [`FeeRate`]: Integer fee rate in satoshis per byte
//! - [`SelectionRequest`]: Input aggregate for target-amount selection
//! - [`SpendableUnspentOutputs`]: Result of a selection call
//!
//! # Example
//!
//! ```
//! use coinsel_core::types::{UnspentOutput, FeeRate};
//! use bitcoin::{Amount, OutPoint, Txid};
//! use std::str::FromStr;
//!
//! let utxo = UnspentOutput::new(
//!     OutPoint::new(
//!         Txid::from_str("7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc").unwrap(),
//!         0,
//!     ),
//!     Amount::from_sat(10_000),
//!     6,
//! )
//! .with_owner("xpub6C...".to_string(), "M/0/3".to_string());
//!
//! assert!(utxo.is_confirmed());
//! assert_eq!(FeeRate::from_sat_per_byte(55).fee_for(100), Amount::from_sat(5_500));
//! ```
//!
//! All monetary values are `bitcoin::Amount` (satoshis in a `u64`). Nothing
//! in this crate uses floating point for amounts or fees.

use bitcoin::{Amount, OutPoint};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::size::ScriptType;
use crate::utxo_selection::sorting::SortingStrategy;

/// Largest representable amount, used where sums saturate
pub const AMOUNT_CEILING: Amount = Amount::from_sat(u64::MAX);

/// Sum of the values of `utxos`, or `None` if it does not fit in a `u64`
pub fn checked_total(utxos: &[UnspentOutput]) -> Option<Amount> {
    utxos
        .iter()
        .try_fold(Amount::ZERO, |total, utxo| total.checked_add(utxo.value))
}

/// Opaque reference to the key that controls an output
///
/// The engine never interprets this; it is carried through so the
/// transaction signer can find the right key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OwnerDescriptor {
    /// Extended public key of the owning account
    pub xpub: String,
    /// Derivation path below the account key
    pub path: String,
}

impl OwnerDescriptor {
    pub fn new(xpub: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            xpub: xpub.into(),
            path: path.into(),
        }
    }
}

/// Unspent transaction output (UTXO) offered to the selector
///
/// # Fields
///
/// * `identifier` - Transaction hash and output index
/// * `value` - Amount held by this output
/// * `confirmations` - Number of confirmations (0 for unconfirmed)
/// * `owner` - Opaque owner reference, forwarded untouched
/// * `is_replayable` - Whether the output can be replayed on a forked chain
/// * `is_force_include` - Caller requires this output to be spent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Reference to the transaction output (txid and vout)
    pub identifier: OutPoint,

    /// Amount in this output
    #[serde(rename = "value_sats", with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,

    /// Number of confirmations (0 for unconfirmed)
    pub confirmations: u32,

    /// Owning key reference
    #[serde(default)]
    pub owner: OwnerDescriptor,

    /// Spending this output alone is unsafe under replay protection rules
    #[serde(default)]
    pub is_replayable: bool,

    /// Always include this output, even if it is uneconomical
    #[serde(default)]
    pub is_force_include: bool,
}

impl UnspentOutput {
    /// Create a new output with an empty owner and no flags set
    pub fn new(identifier: OutPoint, value: Amount, confirmations: u32) -> Self {
        Self {
            identifier,
            value,
            confirmations,
            owner: OwnerDescriptor::default(),
            is_replayable: false,
            is_force_include: false,
        }
    }

    /// Attach the owning key reference
    pub fn with_owner(mut self, xpub: impl Into<String>, path: impl Into<String>) -> Self {
        self.owner = OwnerDescriptor::new(xpub, path);
        self
    }

    /// Mark this output as replayable
    pub fn replayable(mut self) -> Self {
        self.is_replayable = true;
        self
    }

    /// Mark this output as mandatory for any selection
    pub fn force_include(mut self) -> Self {
        self.is_force_include = true;
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmations > 0
    }

    /// `txid:vout` string for this output
    pub fn id(&self) -> String {
        format!("{}:{}", self.identifier.txid, self.identifier.vout)
    }
}

/// Fee rate in satoshis per byte of serialized transaction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FeeRate(u64);

impl FeeRate {
    /// A zero fee rate
    pub const ZERO: FeeRate = FeeRate(0);

    pub const fn from_sat_per_byte(sat_per_byte: u64) -> Self {
        FeeRate(sat_per_byte)
    }

    pub const fn as_sat_per_byte(self) -> u64 {
        self.0
    }

    /// Absolute fee for a transaction of `size` bytes
    ///
    /// Saturates at `u64::MAX` satoshis rather than wrapping.
    pub fn fee_for(self, size: u64) -> Amount {
        Amount::from_sat(self.0.saturating_mul(size))
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/B", self.0)
    }
}

/// Input aggregate for a target-amount selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Amount the payee must receive
    pub target: Amount,
    /// Fee rate to price candidate transactions with
    pub fee_rate: FeeRate,
    /// Candidate outputs, deduplicated by the caller
    pub unspent_outputs: Vec<UnspentOutput>,
    /// Order in which candidates are offered to the accumulator
    pub sorting_strategy: SortingStrategy,
    /// Script type of the payment output (`None`: profile default)
    pub payee_output: Option<ScriptType>,
    /// Script type of a change output (`None`: profile default)
    pub change_output: Option<ScriptType>,
}

impl SelectionRequest {
    pub fn new(
        target: Amount,
        fee_rate: FeeRate,
        unspent_outputs: Vec<UnspentOutput>,
        sorting_strategy: SortingStrategy,
    ) -> Self {
        Self {
            target,
            fee_rate,
            unspent_outputs,
            sorting_strategy,
            payee_output: None,
            change_output: None,
        }
    }

    /// Price the payment output as `script_type`
    pub fn with_payee_output(mut self, script_type: ScriptType) -> Self {
        self.payee_output = Some(script_type);
        self
    }

    /// Price a change output as `script_type`
    pub fn with_change_output(mut self, script_type: ScriptType) -> Self {
        self.change_output = Some(script_type);
        self
    }
}

/// Result of a selection call
///
/// # Fields
///
/// * `spendable_outputs` - The chosen outputs, in selection order
/// * `absolute_fee` - Everything that reaches neither the payee nor a change output
/// * `consumed_amount` - Part of `absolute_fee` that is folded-in dust change
///
/// `absolute_fee - consumed_amount` is always the fee the transaction shape
/// actually requires at the requested fee rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableUnspentOutputs {
    /// Selected outputs
    pub spendable_outputs: Vec<UnspentOutput>,

    /// Real fee paid to the network
    #[serde(rename = "absolute_fee_sats", with = "bitcoin::amount::serde::as_sat")]
    pub absolute_fee: Amount,

    /// Dust change folded into the fee
    #[serde(rename = "consumed_amount_sats", with = "bitcoin::amount::serde::as_sat")]
    pub consumed_amount: Amount,
}

impl Default for SpendableUnspentOutputs {
    fn default() -> Self {
        Self::empty()
    }
}

impl SpendableUnspentOutputs {
    /// A selection that spends nothing and pays nothing
    pub fn empty() -> Self {
        Self {
            spendable_outputs: Vec::new(),
            absolute_fee: Amount::ZERO,
            consumed_amount: Amount::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spendable_outputs.is_empty()
    }

    /// Sum of the selected output values, saturating at `AMOUNT_CEILING`
    pub fn total_value(&self) -> Amount {
        checked_total(&self.spendable_outputs).unwrap_or(AMOUNT_CEILING)
    }

    /// Value of the change output the builder should create for `target`
    ///
    /// Zero when the remainder was folded into the fee.
    pub fn change_amount(&self, target: Amount) -> Amount {
        self.total_value()
            .checked_sub(target)
            .and_then(|rest| rest.checked_sub(self.absolute_fee))
            .unwrap_or(Amount::ZERO)
    }

    /// Amount that reaches the single payee of a sweep
    pub fn sweep_amount(&self) -> Amount {
        self.total_value()
            .checked_sub(self.absolute_fee)
            .unwrap_or(Amount::ZERO)
    }
}
