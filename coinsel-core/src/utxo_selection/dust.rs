//! Dust threshold and eligibility rules
//!
//! Two separate economics questions are answered here:
//!
//! - Is an output worth spending at all? An output whose value does not
//!   exceed the fee its input adds is uneconomical and is filtered out
//!   before sorting, unless the caller forces it in.
//! - Is a change remainder worth returning? Below the dust threshold the
//!   remainder is folded into the fee instead of becoming an output.

use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::size::{ScriptType, TransactionSizeCalculator};
use crate::types::{FeeRate, UnspentOutput};

/// Relay dust limit of a legacy P2PKH output
pub const DEFAULT_DUST_LIMIT: u64 = ScriptType::P2PKH.dust_limit();

/// Change output a dust decision is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeOutput {
    /// Script type of the change (`None`: profile default)
    pub script_type: Option<ScriptType>,
    /// Smallest change value relay nodes accept
    pub dust_limit: Amount,
}

impl ChangeOutput {
    /// Change priced with the profile default, relayable from `dust_limit`
    pub const fn untyped(dust_limit: Amount) -> Self {
        Self {
            script_type: None,
            dust_limit,
        }
    }

    /// Change paying to `script_type`, with that type's relay dust limit
    pub const fn of_type(script_type: ScriptType) -> Self {
        Self {
            script_type: Some(script_type),
            dust_limit: Amount::from_sat(script_type.dust_limit()),
        }
    }
}

impl Default for ChangeOutput {
    fn default() -> Self {
        Self::untyped(Amount::from_sat(DEFAULT_DUST_LIMIT))
    }
}

/// Rule deciding the minimum change output value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum DustPolicy {
    /// Change must be worth at least what it costs to create and later spend
    ///
    /// `threshold = max(fee_rate * (per_input + change_output_size), dust_limit)`
    #[default]
    FeeRelative,

    /// Constant threshold in satoshis, independent of the fee rate
    ///
    /// Used as given; it is not raised to the relay dust limit.
    Fixed {
        /// Minimum change value in satoshis
        threshold: u64,
    },
}

impl DustPolicy {
    /// Dust threshold for `change` at `fee_rate`
    pub fn threshold(
        &self,
        fee_rate: FeeRate,
        calculator: &TransactionSizeCalculator,
        change: ChangeOutput,
    ) -> Amount {
        match self {
            DustPolicy::FeeRelative => {
                let spend_and_create = calculator
                    .profile()
                    .per_input
                    .saturating_add(calculator.output_size(change.script_type));
                fee_rate.fee_for(spend_and_create).max(change.dust_limit)
            }
            DustPolicy::Fixed { threshold } => Amount::from_sat(*threshold),
        }
    }

    /// Whether `amount` is large enough to become the `change` output
    pub fn admits_change(
        &self,
        amount: Amount,
        fee_rate: FeeRate,
        calculator: &TransactionSizeCalculator,
        change: ChangeOutput,
    ) -> bool {
        amount > Amount::ZERO && amount >= self.threshold(fee_rate, calculator, change)
    }
}

/// Treatment of outputs flagged as replayable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayPolicy {
    /// Replayable outputs are ordinary candidates
    #[default]
    Allow,
    /// Replayable outputs are only spent when force-included
    ExcludeReplayable,
}

/// Filters applied to candidates before sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EligibilityRules {
    /// Minimum confirmations for a non-forced output
    pub min_confirmations: u32,
    /// Replay protection handling
    pub replay_policy: ReplayPolicy,
}

impl EligibilityRules {
    /// Whether `utxo` passes the eligibility filter
    ///
    /// Force-included outputs always pass. Everything else must be confirmed
    /// enough, replay-safe under the policy, and worth more than
    /// `marginal_fee`.
    pub fn admits(&self, utxo: &UnspentOutput, marginal_fee: Amount) -> bool {
        if utxo.is_force_include {
            return true;
        }

        if utxo.confirmations < self.min_confirmations {
            return false;
        }

        if utxo.is_replayable && self.replay_policy == ReplayPolicy::ExcludeReplayable {
            return false;
        }

        utxo.value > marginal_fee
    }

    /// Eligible outputs of `utxos` at `fee_rate`, in their original order
    pub fn eligible_outputs(
        &self,
        utxos: &[UnspentOutput],
        fee_rate: FeeRate,
        calculator: &TransactionSizeCalculator,
    ) -> Vec<UnspentOutput> {
        let marginal_fee = calculator.marginal_input_fee(fee_rate);
        utxos
            .iter()
            .filter(|utxo| self.admits(utxo, marginal_fee))
            .cloned()
            .collect()
    }
}
