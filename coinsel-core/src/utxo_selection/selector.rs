//! Main coin selector implementation
//!
//! `CoinSelector` implements the two entry points of the engine:
//!
//! - [`CoinSelector::select_for_amount`] greedily draws candidates until the
//!   target plus the fee of a two-output (payment + change) transaction is
//!   covered, then decides whether the remainder is worth a change output.
//! - [`CoinSelector::select_all`] spends every eligible output for a single
//!   payee ("send max" / sweep). [`CoinSelector::select_all_to`] does the
//!   same for a payee of a given script type.
//!
//! Outputs are priced with the size profile unless the request names their
//! script type, so a legacy wallet paying a SegWit address pays for a 31
//! byte output rather than a 34 byte one.
//!
//! # Selection flow
//!
//! ```text
//! filter -> order -> accumulate -> evaluate(change?) -> result
//!                        |
//!                        +-- candidates exhausted -> select-all fallback
//!                                                       |
//!                                                       +-- InsufficientFunds
//! ```
//!
//! # Usage
//!
//! ```
//! use coinsel_core::utxo_selection::{CoinSelector, SortingStrategy};
//! use coinsel_core::types::{FeeRate, SelectionRequest, UnspentOutput};
//! use bitcoin::{Amount, OutPoint, Txid};
//! use std::str::FromStr;
//!
//! let txid = Txid::from_str("3d7c1421a4732a250ee59ce08b2ae34b5de8d3242e266a81a3d09887b8ca2e7c").unwrap();
//! let utxos = vec![
//!     UnspentOutput::new(OutPoint::new(txid, 0), Amount::from_sat(300_000), 3),
//!     UnspentOutput::new(OutPoint::new(txid, 1), Amount::from_sat(50_000), 3),
//! ];
//!
//! let selector = CoinSelector::new();
//! let request = SelectionRequest::new(
//!     Amount::from_sat(100_000),
//!     FeeRate::from_sat_per_byte(55),
//!     utxos,
//!     SortingStrategy::Descending,
//! );
//!
//! let selection = selector.select_for_amount(&request).unwrap();
//! assert_eq!(selection.spendable_outputs.len(), 1);
//! assert_eq!(selection.absolute_fee, Amount::from_sat(12_485));
//! assert_eq!(selection.consumed_amount, Amount::ZERO);
//! ```
//!
//! The selector holds only configuration. Every call is a pure function of
//! its arguments, so one selector can be shared freely across threads.

use bitcoin::Amount;
use serde_json::json;

use crate::config::SelectorConfig;
use crate::error::{CoinSelectionError, SelectionResult};
use crate::logging::{self, LogLevel};
use crate::size::{ScriptType, SizeProfile, TransactionSizeCalculator};
use crate::types::{
    checked_total, FeeRate, SelectionRequest, SpendableUnspentOutputs, UnspentOutput,
    AMOUNT_CEILING,
};
use crate::utxo_selection::dust::{ChangeOutput, DustPolicy, EligibilityRules, DEFAULT_DUST_LIMIT};

/// Coin selector configured for one chain profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinSelector {
    /// Size estimation for candidate transactions
    calculator: TransactionSizeCalculator,
    /// Minimum change output rule
    dust_policy: DustPolicy,
    /// Relay dust limit for change priced with the profile default
    dust_limit: Amount,
    /// Pre-sort candidate filter
    eligibility: EligibilityRules,
}

impl Default for CoinSelector {
    fn default() -> Self {
        Self {
            calculator: TransactionSizeCalculator::default(),
            dust_policy: DustPolicy::default(),
            dust_limit: Amount::from_sat(DEFAULT_DUST_LIMIT),
            eligibility: EligibilityRules::default(),
        }
    }
}

/// Script types of the outputs a target selection prices
#[derive(Debug, Clone, Copy)]
struct Outputs {
    payee: Option<ScriptType>,
    change: ChangeOutput,
}

impl Outputs {
    fn with_change(&self) -> [Option<ScriptType>; 2] {
        [self.payee, self.change.script_type]
    }

    fn without_change(&self) -> [Option<ScriptType>; 1] {
        [self.payee]
    }
}

impl CoinSelector {
    /// Create a selector for legacy P2PKH transactions
    ///
    /// Uses a fee-relative dust threshold floored at the 546 sat relay limit
    /// and admits every economical output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector using the given size profile
    pub fn with_profile(profile: SizeProfile) -> Self {
        Self {
            calculator: TransactionSizeCalculator::new(profile),
            ..Self::default()
        }
    }

    /// Create a selector from a loaded configuration
    pub fn from_config(config: &SelectorConfig) -> Self {
        Self {
            calculator: TransactionSizeCalculator::new(config.size_profile()),
            dust_policy: config.dust,
            dust_limit: config.dust_limit(),
            eligibility: config.eligibility_rules(),
        }
    }

    /// Set the dust policy for this selector
    pub fn with_dust_policy(mut self, dust_policy: DustPolicy) -> Self {
        self.dust_policy = dust_policy;
        self
    }

    /// Set the relay dust limit for untyped change outputs
    pub fn with_dust_limit(mut self, dust_limit: Amount) -> Self {
        self.dust_limit = dust_limit;
        self
    }

    /// Set the eligibility rules for this selector
    pub fn with_eligibility(mut self, eligibility: EligibilityRules) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn calculator(&self) -> &TransactionSizeCalculator {
        &self.calculator
    }

    pub fn dust_policy(&self) -> DustPolicy {
        self.dust_policy
    }

    pub fn dust_limit(&self) -> Amount {
        self.dust_limit
    }

    pub fn eligibility(&self) -> EligibilityRules {
        self.eligibility
    }

    /// Dust threshold at `fee_rate` for change priced with the profile default
    pub fn dust_threshold(&self, fee_rate: FeeRate) -> Amount {
        self.dust_policy
            .threshold(fee_rate, &self.calculator, ChangeOutput::untyped(self.dust_limit))
    }

    /// Outputs of `utxos` that survive the eligibility filter at `fee_rate`
    pub fn eligible_outputs(&self, utxos: &[UnspentOutput], fee_rate: FeeRate) -> Vec<UnspentOutput> {
        self.eligibility
            .eligible_outputs(utxos, fee_rate, &self.calculator)
    }

    /// Select outputs paying `request.target` at `request.fee_rate`
    ///
    /// # Returns
    ///
    /// * `Ok(SpendableUnspentOutputs)` - A complete selection. When
    ///   `consumed_amount` is zero and the remainder is positive, the caller
    ///   must add a change output of `change_amount(target)`.
    /// * `Err(CoinSelectionError::InsufficientFunds)` - Spending every
    ///   eligible output cannot cover the target plus fee, or the candidate
    ///   values overflow a `u64` before the target is covered
    pub fn select_for_amount(
        &self,
        request: &SelectionRequest,
    ) -> SelectionResult<SpendableUnspentOutputs> {
        let SelectionRequest {
            target,
            fee_rate,
            unspent_outputs,
            sorting_strategy,
            payee_output,
            change_output,
        } = request;
        let (target, fee_rate) = (*target, *fee_rate);
        let outputs = Outputs {
            payee: *payee_output,
            change: change_output.map_or(ChangeOutput::untyped(self.dust_limit), ChangeOutput::of_type),
        };

        let eligible = self.eligible_outputs(unspent_outputs, fee_rate);
        let (mut forced, mut optional): (Vec<_>, Vec<_>) = eligible
            .into_iter()
            .partition(|utxo| utxo.is_force_include);
        sorting_strategy.sort(&mut forced);
        sorting_strategy.sort(&mut optional);

        if logging::enabled(LogLevel::Debug) {
            logging::log_selection(
                LogLevel::Debug,
                "selection_started",
                Some(json!({
                    "target": target.to_sat(),
                    "fee_rate": fee_rate.as_sat_per_byte(),
                    "strategy": sorting_strategy.name(),
                    "candidates": unspent_outputs.len(),
                    "forced": forced.len(),
                    "eligible": forced.len() + optional.len(),
                })),
            );
        }

        // Forced outputs seed the selection; the rest are drawn one at a time
        let mut selected = forced;
        let mut accumulated = match checked_total(&selected) {
            Some(total) => total,
            None => return Err(self.overflow(&selected, target, fee_rate, &outputs)),
        };
        let mut candidates = optional.into_iter();

        loop {
            if !selected.is_empty() {
                let fee_with_change =
                    self.calculator
                        .fee_with_outputs(fee_rate, selected.len(), &outputs.with_change());
                let covered = target
                    .checked_add(fee_with_change)
                    .map_or(false, |needed| accumulated >= needed);
                if covered {
                    return Ok(self.evaluate(
                        selected,
                        accumulated,
                        target,
                        fee_rate,
                        fee_with_change,
                        &outputs,
                    ));
                }
            }

            match candidates.next() {
                Some(utxo) => {
                    let value = utxo.value;
                    selected.push(utxo);
                    accumulated = match accumulated.checked_add(value) {
                        Some(total) => total,
                        None => return Err(self.overflow(&selected, target, fee_rate, &outputs)),
                    };
                }
                None => break,
            }
        }

        // Exhausted: `selected` now holds every eligible output in strategy order
        self.exhausted(selected, accumulated, target, fee_rate, &outputs)
    }

    /// Spend every eligible output of `utxos` for a single payee
    ///
    /// The payment output is priced with the profile default. Never fails.
    /// When the eligible outputs are worth no more than the fee to spend
    /// them, the result is empty with a zero fee.
    pub fn select_all(&self, utxos: &[UnspentOutput], fee_rate: FeeRate) -> SpendableUnspentOutputs {
        self.sweep(utxos, fee_rate, None)
    }

    /// Spend every eligible output of `utxos` to a `payee_output` address
    pub fn select_all_to(
        &self,
        utxos: &[UnspentOutput],
        fee_rate: FeeRate,
        payee_output: ScriptType,
    ) -> SpendableUnspentOutputs {
        self.sweep(utxos, fee_rate, Some(payee_output))
    }

    /// Largest amount a single payee can receive by sweeping `utxos`
    pub fn max_spendable(&self, utxos: &[UnspentOutput], fee_rate: FeeRate) -> Amount {
        self.select_all(utxos, fee_rate).sweep_amount()
    }

    fn sweep(
        &self,
        utxos: &[UnspentOutput],
        fee_rate: FeeRate,
        payee_output: Option<ScriptType>,
    ) -> SpendableUnspentOutputs {
        let eligible = self.eligible_outputs(utxos, fee_rate);
        if eligible.is_empty() {
            return SpendableUnspentOutputs::empty();
        }

        let fee = self
            .calculator
            .fee_with_outputs(fee_rate, eligible.len(), &[payee_output]);

        // A total past u64::MAX cannot be paid out to one output
        let total = match checked_total(&eligible) {
            Some(total) if total > fee => total,
            total => {
                if logging::enabled(LogLevel::Debug) {
                    logging::log_selection(
                        LogLevel::Debug,
                        "sweep_uneconomical",
                        Some(json!({
                            "total": total.map(|total| total.to_sat()),
                            "fee": fee.to_sat(),
                            "eligible": eligible.len(),
                        })),
                    );
                }
                return SpendableUnspentOutputs::empty();
            }
        };

        if logging::enabled(LogLevel::Debug) {
            logging::log_selection(
                LogLevel::Debug,
                "sweep_selected",
                Some(json!({
                    "total": total.to_sat(),
                    "fee": fee.to_sat(),
                    "eligible": eligible.len(),
                })),
            );
        }

        SpendableUnspentOutputs {
            spendable_outputs: eligible,
            absolute_fee: fee,
            consumed_amount: Amount::ZERO,
        }
    }

    /// Decide whether the remainder of a satisfied selection becomes change
    fn evaluate(
        &self,
        selected: Vec<UnspentOutput>,
        accumulated: Amount,
        target: Amount,
        fee_rate: FeeRate,
        fee_with_change: Amount,
        outputs: &Outputs,
    ) -> SpendableUnspentOutputs {
        let change = accumulated - target - fee_with_change;

        if self
            .dust_policy
            .admits_change(change, fee_rate, &self.calculator, outputs.change)
        {
            if logging::enabled(LogLevel::Debug) {
                logging::log_selection(
                    LogLevel::Debug,
                    "selection_with_change",
                    Some(json!({
                        "inputs": selected.len(),
                        "fee": fee_with_change.to_sat(),
                        "change": change.to_sat(),
                        "first_input": selected.first().map(|u| logging::sanitize_for_logging(&u.id())),
                    })),
                );
            }

            return SpendableUnspentOutputs {
                spendable_outputs: selected,
                absolute_fee: fee_with_change,
                consumed_amount: Amount::ZERO,
            };
        }

        self.without_change(selected, accumulated, target, fee_rate, outputs)
    }

    /// Fold everything above the target into the fee
    ///
    /// Callers guarantee `accumulated >= target + fee_without_change`.
    fn without_change(
        &self,
        selected: Vec<UnspentOutput>,
        accumulated: Amount,
        target: Amount,
        fee_rate: FeeRate,
        outputs: &Outputs,
    ) -> SpendableUnspentOutputs {
        let fee_without_change =
            self.calculator
                .fee_with_outputs(fee_rate, selected.len(), &outputs.without_change());
        let absolute_fee = accumulated - target;
        let consumed_amount = absolute_fee - fee_without_change;

        if logging::enabled(LogLevel::Debug) {
            logging::log_selection(
                LogLevel::Debug,
                "selection_without_change",
                Some(json!({
                    "inputs": selected.len(),
                    "fee": absolute_fee.to_sat(),
                    "consumed": consumed_amount.to_sat(),
                })),
            );
        }

        SpendableUnspentOutputs {
            spendable_outputs: selected,
            absolute_fee,
            consumed_amount,
        }
    }

    /// Select-all fallback once the greedy draw ran out of candidates
    fn exhausted(
        &self,
        eligible: Vec<UnspentOutput>,
        total: Amount,
        target: Amount,
        fee_rate: FeeRate,
        outputs: &Outputs,
    ) -> SelectionResult<SpendableUnspentOutputs> {
        let required = self.required(eligible.len(), target, fee_rate, outputs);

        if eligible.is_empty() || total < required {
            return Err(self.insufficient(total, required, eligible.len()));
        }

        Ok(self.without_change(eligible, total, target, fee_rate, outputs))
    }

    /// Candidate values summed past `u64::MAX` before the target was covered
    fn overflow(
        &self,
        selected: &[UnspentOutput],
        target: Amount,
        fee_rate: FeeRate,
        outputs: &Outputs,
    ) -> CoinSelectionError {
        let required = self.required(selected.len(), target, fee_rate, outputs);
        self.insufficient(AMOUNT_CEILING, required, selected.len())
    }

    /// Target plus the no-change fee for `inputs` inputs, saturating
    fn required(&self, inputs: usize, target: Amount, fee_rate: FeeRate, outputs: &Outputs) -> Amount {
        let fee_without_change =
            self.calculator
                .fee_with_outputs(fee_rate, inputs, &outputs.without_change());
        target
            .checked_add(fee_without_change)
            .unwrap_or(AMOUNT_CEILING)
    }

    fn insufficient(&self, available: Amount, required: Amount, inputs: usize) -> CoinSelectionError {
        if logging::enabled(LogLevel::Debug) {
            logging::log_selection(
                LogLevel::Debug,
                "selection_insufficient_funds",
                Some(json!({
                    "available": available.to_sat(),
                    "required": required.to_sat(),
                    "inputs": inputs,
                })),
            );
        }

        CoinSelectionError::InsufficientFunds {
            available,
            required,
        }
    }
}

/// Select outputs for `request` using a default legacy selector
pub fn select_for_amount(
    request: &SelectionRequest,
) -> SelectionResult<SpendableUnspentOutputs> {
    CoinSelector::new().select_for_amount(request)
}

/// Sweep every eligible output using a default legacy selector
pub fn select_all(utxos: &[UnspentOutput], fee_rate: FeeRate) -> SpendableUnspentOutputs {
    CoinSelector::new().select_all(utxos, fee_rate)
}
