//! Transaction size estimation
//!
//! Fee estimation in the selector is always `fee_rate * estimated_size`. This
//! module provides the size half of that product. Sizes are linear in the
//! number of inputs and outputs:
//!
//! ```text
//! size = base_overhead + inputs * per_input + outputs * per_output
//! ```
//!
//! The three constants are chain and script-type configuration, captured in
//! a [`SizeProfile`]. The legacy P2PKH profile is the default.
//!
//! Example:
//! ```
//! use coinsel_core::size::{SizeProfile, TransactionSizeCalculator};
//! use coinsel_core::types::FeeRate;
//! use bitcoin::Amount;
//!
//! let calculator = TransactionSizeCalculator::new(SizeProfile::LEGACY);
//!
//! // One input paying one recipient plus change
//! assert_eq!(calculator.estimate(1, 2), 227);
//! assert_eq!(
//!     calculator.fee(FeeRate::from_sat_per_byte(55), 1, 2),
//!     Amount::from_sat(12_485)
//! );
//! ```

use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::types::FeeRate;

/// Fixed transaction overhead (version, locktime, in/out counts)
pub const TX_OVERHEAD: u64 = 10;

/// Script type of an input or output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    /// Legacy pay-to-pubkey-hash
    P2PKH,
    /// Native SegWit v0 pay-to-witness-pubkey-hash
    P2WPKH,
}

impl ScriptType {
    /// Serialized size of an input spending this script type
    pub const fn input_size(self) -> u64 {
        match self {
            ScriptType::P2PKH => 149,
            ScriptType::P2WPKH => 68,
        }
    }

    /// Serialized size of an output paying to this script type
    pub const fn output_size(self) -> u64 {
        match self {
            ScriptType::P2PKH => 34,
            ScriptType::P2WPKH => 31,
        }
    }

    /// Smallest output value relay nodes accept for this script type
    pub const fn dust_limit(self) -> u64 {
        match self {
            ScriptType::P2PKH => 546,
            ScriptType::P2WPKH => 294,
        }
    }
}

/// Size constants for a chain / script type combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeProfile {
    /// Bytes every transaction carries regardless of inputs and outputs
    pub base_overhead: u64,
    /// Bytes added per input
    pub per_input: u64,
    /// Bytes added per output
    pub per_output: u64,
}

impl SizeProfile {
    /// Legacy P2PKH inputs and outputs (Bitcoin, Bitcoin Cash)
    pub const LEGACY: SizeProfile = SizeProfile::for_script_type(ScriptType::P2PKH);

    /// Native SegWit P2WPKH inputs and outputs
    pub const SEGWIT_V0: SizeProfile = SizeProfile::for_script_type(ScriptType::P2WPKH);

    /// Profile where every input and output uses `script_type`
    pub const fn for_script_type(script_type: ScriptType) -> Self {
        Self {
            base_overhead: TX_OVERHEAD,
            per_input: script_type.input_size(),
            per_output: script_type.output_size(),
        }
    }
}

impl Default for SizeProfile {
    fn default() -> Self {
        Self::LEGACY
    }
}

/// Estimates serialized transaction sizes and the fees they imply
///
/// Pure and cheap to copy; every method is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionSizeCalculator {
    profile: SizeProfile,
}

impl TransactionSizeCalculator {
    pub const fn new(profile: SizeProfile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> SizeProfile {
        self.profile
    }

    /// Estimated size in bytes of a transaction with the given counts
    pub fn estimate(&self, inputs: usize, outputs: usize) -> u64 {
        let SizeProfile {
            base_overhead,
            per_input,
            per_output,
        } = self.profile;

        base_overhead
            .saturating_add((inputs as u64).saturating_mul(per_input))
            .saturating_add((outputs as u64).saturating_mul(per_output))
    }

    /// Bytes added by one output of `script_type`
    ///
    /// `None` prices the output with the profile's `per_output`.
    pub fn output_size(&self, script_type: Option<ScriptType>) -> u64 {
        script_type.map_or(self.profile.per_output, ScriptType::output_size)
    }

    /// Size estimate for `inputs` profile inputs paying `outputs`
    ///
    /// Each output is priced by its own script type, so a legacy wallet can
    /// pay a SegWit address and keep legacy change.
    pub fn estimate_with_outputs(&self, inputs: usize, outputs: &[Option<ScriptType>]) -> u64 {
        let outputs_size = outputs
            .iter()
            .fold(0u64, |size, output| size.saturating_add(self.output_size(*output)));

        self.profile
            .base_overhead
            .saturating_add((inputs as u64).saturating_mul(self.profile.per_input))
            .saturating_add(outputs_size)
    }

    /// Fee for a transaction with the given counts
    pub fn fee(&self, fee_rate: FeeRate, inputs: usize, outputs: usize) -> Amount {
        fee_rate.fee_for(self.estimate(inputs, outputs))
    }

    /// Fee for `inputs` profile inputs paying script-typed `outputs`
    pub fn fee_with_outputs(
        &self,
        fee_rate: FeeRate,
        inputs: usize,
        outputs: &[Option<ScriptType>],
    ) -> Amount {
        fee_rate.fee_for(self.estimate_with_outputs(inputs, outputs))
    }

    /// Fee added by one more input
    ///
    /// Measured against a minimal one-input, one-output transaction.
    pub fn marginal_input_fee(&self, fee_rate: FeeRate) -> Amount {
        let extra = self.estimate(2, 1) - self.estimate(1, 1);
        fee_rate.fee_for(extra)
    }
}
