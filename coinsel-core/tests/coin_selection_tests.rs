use bitcoin::Amount;
use coinsel_core::error::CoinSelectionError;
use coinsel_core::logging::{self, LogLevel};
use coinsel_core::size::{ScriptType, SizeProfile};
use coinsel_core::types::{FeeRate, SelectionRequest, SpendableUnspentOutputs, AMOUNT_CEILING};
use coinsel_core::utxo_selection::{
    self, CoinSelector, DustPolicy, EligibilityRules, ReplayPolicy, SortingStrategy,
};

mod test_utils;
use test_utils::{sats, setup, sorted_values, unspent, unspents, values, FEE_PER_BYTE};

fn fee_rate() -> FeeRate {
    FeeRate::from_sat_per_byte(FEE_PER_BYTE)
}

fn request(target: u64, coins: &[u64], strategy: SortingStrategy) -> SelectionRequest {
    SelectionRequest::new(sats(target), fee_rate(), unspents(coins), strategy)
}

#[test]
fn test_ascent_draw_selection_with_change_output() {
    setup();

    let selection = utxo_selection::select_for_amount(&request(
        100_000,
        &[1, 20_000, 0, 0, 300_000, 50_000, 30_000],
        SortingStrategy::Ascending,
    ))
    .expect("selection should succeed");

    // (10 + 4 * 149 + 2 * 34) * 55
    assert_eq!(values(&selection.spendable_outputs), vec![20_000, 30_000, 50_000, 300_000]);
    assert_eq!(selection.absolute_fee, sats(37_070));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
    assert_eq!(selection.change_amount(sats(100_000)), sats(262_930));
}

#[test]
fn test_ascent_draw_selection_with_no_change_output() {
    setup();

    let target = 472_000;
    let selection = utxo_selection::select_for_amount(&request(
        target,
        &[200_000, 300_000, 500_000],
        SortingStrategy::Ascending,
    ))
    .expect("selection should succeed");

    assert_eq!(values(&selection.spendable_outputs), vec![200_000, 300_000]);
    assert_eq!(selection.absolute_fee, sats(500_000 - target));
    assert_eq!(selection.consumed_amount, sats(9_190));
    assert_eq!(selection.change_amount(sats(target)), Amount::ZERO);
}

#[test]
fn test_descent_draw_selection_with_change_output() {
    setup();

    let selection = utxo_selection::select_for_amount(&request(
        100_000,
        &[1, 20_000, 0, 0, 300_000, 50_000, 30_000],
        SortingStrategy::Descending,
    ))
    .expect("selection should succeed");

    // (10 + 149 + 2 * 34) * 55
    assert_eq!(values(&selection.spendable_outputs), vec![300_000]);
    assert_eq!(selection.absolute_fee, sats(12_485));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
    assert_eq!(selection.change_amount(sats(100_000)), sats(187_515));
}

#[test]
fn test_descent_draw_selection_with_no_change_output() {
    setup();

    let selection = utxo_selection::select_for_amount(&request(
        485_000,
        &[200_000, 300_000, 500_000],
        SortingStrategy::Descending,
    ))
    .expect("selection should succeed");

    assert_eq!(values(&selection.spendable_outputs), vec![500_000]);
    assert_eq!(selection.absolute_fee, sats(15_000));
    assert_eq!(selection.consumed_amount, sats(4_385));
}

#[test]
fn test_select_all_filters_uneconomical_outputs() {
    setup();

    let selection = utxo_selection::select_all(&unspents(&[1, 20_000, 0, 0, 300_000]), fee_rate());

    assert_eq!(values(&selection.spendable_outputs), vec![20_000, 300_000]);
    assert_eq!(selection.absolute_fee, sats(18_810));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
    assert_eq!(selection.sweep_amount(), sats(301_190));
}

#[test]
fn test_select_all_with_no_inputs() {
    setup();

    let selection = utxo_selection::select_all(&[], fee_rate());
    assert_eq!(selection, SpendableUnspentOutputs::empty());
    assert_eq!(selection.absolute_fee, Amount::ZERO);
}

#[test]
fn test_select_all_with_no_effective_inputs() {
    setup();

    let selection = utxo_selection::select_all(&unspents(&[1, 10, 100]), fee_rate());
    assert!(selection.is_empty());
    assert_eq!(selection.absolute_fee, Amount::ZERO);
    assert_eq!(selection.consumed_amount, Amount::ZERO);
}

#[test]
fn test_select_all_when_fee_swallows_everything() {
    setup();

    // Each output clears the marginal input fee (8195) but together they do
    // not clear the 3-input, 1-output fee (27005)
    let selection = utxo_selection::select_all(&unspents(&[8_200, 8_300, 8_400]), fee_rate());
    assert!(selection.is_empty());
    assert_eq!(selection.absolute_fee, Amount::ZERO);
}

#[test]
fn test_insufficient_funds() {
    setup();

    let result = utxo_selection::select_for_amount(&request(
        1_000_000,
        &[200_000, 300_000, 500_000],
        SortingStrategy::Ascending,
    ));

    assert_eq!(
        result,
        Err(CoinSelectionError::InsufficientFunds {
            available: sats(1_000_000),
            required: sats(1_027_005),
        })
    );
    assert_eq!(result.unwrap_err().shortfall(), sats(27_005));
}

#[test]
fn test_insufficient_funds_with_no_candidates() {
    setup();

    let result = utxo_selection::select_for_amount(&request(10_000, &[], SortingStrategy::Descending));

    match result {
        Err(CoinSelectionError::InsufficientFunds { available, required }) => {
            assert_eq!(available, Amount::ZERO);
            // target + (10 + 34) * 55
            assert_eq!(required, sats(12_420));
        }
        other => panic!("Expected insufficient funds, got {:?}", other),
    }
}

#[test]
fn test_insufficient_funds_error_message() {
    let error = CoinSelectionError::InsufficientFunds {
        available: sats(1_000),
        required: sats(5_000),
    };
    assert_eq!(
        error.to_string(),
        "Insufficient funds: needed 5000 sats, available 1000 sats"
    );
}

#[test]
fn test_exhaustion_falls_back_to_spending_everything() {
    setup();

    // Covers target + fee(3, 1) = 999005 but not target + fee(3, 2) = 1000875
    let target = 972_000;
    let selection = utxo_selection::select_for_amount(&request(
        target,
        &[200_000, 300_000, 500_000],
        SortingStrategy::Ascending,
    ))
    .expect("fallback should succeed");

    assert_eq!(values(&selection.spendable_outputs), vec![200_000, 300_000, 500_000]);
    assert_eq!(selection.absolute_fee, sats(28_000));
    assert_eq!(selection.consumed_amount, sats(995));
}

#[test]
fn test_selection_is_independent_of_input_order() {
    setup();

    let coins = [1, 20_000, 0, 0, 300_000, 50_000, 30_000];
    let forward = unspents(&coins);
    let mut backward = forward.clone();
    backward.reverse();

    for strategy in [SortingStrategy::Ascending, SortingStrategy::Descending] {
        let a = utxo_selection::select_for_amount(&SelectionRequest::new(
            sats(100_000),
            fee_rate(),
            forward.clone(),
            strategy,
        ));
        let b = utxo_selection::select_for_amount(&SelectionRequest::new(
            sats(100_000),
            fee_rate(),
            backward.clone(),
            strategy,
        ));
        assert_eq!(a, b, "strategy {}", strategy.name());
    }
}

#[test]
fn test_fixed_dust_policy_keeps_small_change() {
    setup();

    let selector = CoinSelector::new().with_dust_policy(DustPolicy::Fixed { threshold: 546 });
    let selection = selector
        .select_for_amount(&request(472_000, &[200_000, 300_000, 500_000], SortingStrategy::Ascending))
        .expect("selection should succeed");

    // 7320 sats of change clears a 546 sat threshold
    assert_eq!(selection.absolute_fee, sats(20_680));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
    assert_eq!(selection.change_amount(sats(472_000)), sats(7_320));
}

#[test]
fn test_force_included_output_is_always_spent() {
    setup();

    let mut coins = vec![unspent(0, 1_000).force_include(), unspent(1, 300_000)];
    coins.push(unspent(2, 500_000));

    let selection = CoinSelector::new()
        .select_for_amount(&SelectionRequest::new(
            sats(100_000),
            fee_rate(),
            coins,
            SortingStrategy::Ascending,
        ))
        .expect("selection should succeed");

    // Forced dust first, then the smallest economical output
    assert_eq!(values(&selection.spendable_outputs), vec![1_000, 300_000]);
    assert_eq!(selection.absolute_fee, sats(20_680));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
}

#[test]
fn test_select_all_keeps_force_included_dust() {
    setup();

    let coins = vec![unspent(0, 1).force_include(), unspent(1, 20_000), unspent(2, 300_000)];
    let selection = utxo_selection::select_all(&coins, fee_rate());

    assert_eq!(sorted_values(&selection.spendable_outputs), vec![1, 20_000, 300_000]);
    // (10 + 3 * 149 + 34) * 55
    assert_eq!(selection.absolute_fee, sats(27_005));
}

#[test]
fn test_replayable_outputs_excluded_when_required() {
    setup();

    let coins = vec![unspent(0, 500_000).replayable(), unspent(1, 300_000)];
    let selector = CoinSelector::new().with_eligibility(EligibilityRules {
        min_confirmations: 0,
        replay_policy: ReplayPolicy::ExcludeReplayable,
    });

    let selection = selector
        .select_for_amount(&SelectionRequest::new(
            sats(100_000),
            fee_rate(),
            coins.clone(),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");
    assert_eq!(values(&selection.spendable_outputs), vec![300_000]);

    let sweep = selector.select_all(&coins, fee_rate());
    assert_eq!(values(&sweep.spendable_outputs), vec![300_000]);

    // Default rules treat replayable outputs as ordinary candidates
    let sweep = CoinSelector::new().select_all(&coins, fee_rate());
    assert_eq!(sorted_values(&sweep.spendable_outputs), vec![300_000, 500_000]);
}

#[test]
fn test_min_confirmations_filters_unconfirmed_outputs() {
    setup();

    let mut unconfirmed = unspent(0, 500_000);
    unconfirmed.confirmations = 0;
    let coins = vec![unconfirmed, unspent(1, 300_000)];

    let selector = CoinSelector::new().with_eligibility(EligibilityRules {
        min_confirmations: 1,
        replay_policy: ReplayPolicy::Allow,
    });

    let selection = selector
        .select_for_amount(&SelectionRequest::new(
            sats(100_000),
            fee_rate(),
            coins,
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");
    assert_eq!(values(&selection.spendable_outputs), vec![300_000]);
}

#[test]
fn test_segwit_profile_select_all() {
    setup();

    let selector = CoinSelector::with_profile(SizeProfile::SEGWIT_V0);
    let selection = selector.select_all(&unspents(&[1, 20_000, 0, 0, 300_000]), fee_rate());

    // (10 + 2 * 68 + 31) * 55
    assert_eq!(values(&selection.spendable_outputs), vec![20_000, 300_000]);
    assert_eq!(selection.absolute_fee, sats(9_735));
    assert_eq!(
        selector.max_spendable(&unspents(&[1, 20_000, 0, 0, 300_000]), fee_rate()),
        sats(320_000 - 9_735)
    );
}

#[test]
fn test_higher_fee_rate_requires_more_inputs() {
    setup();

    let coins = [60_000, 60_000, 60_000];

    let cheap = CoinSelector::new()
        .select_for_amount(&SelectionRequest::new(
            sats(100_000),
            FeeRate::from_sat_per_byte(1),
            unspents(&coins),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");
    let expensive = CoinSelector::new()
        .select_for_amount(&SelectionRequest::new(
            sats(100_000),
            FeeRate::from_sat_per_byte(100),
            unspents(&coins),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");

    assert_eq!(cheap.spendable_outputs.len(), 2);
    assert_eq!(expensive.spendable_outputs.len(), 3);
    assert!(expensive.absolute_fee > cheap.absolute_fee);
}

#[test]
fn test_low_fee_rate_change_respects_relay_dust() {
    setup();

    // At 1 sat/B the fee-relative threshold is only 183 sats; a 300 sat
    // change output would still be below the 546 sat relay limit
    let rate = FeeRate::from_sat_per_byte(1);
    let target = 100_000 - 227 - 300;
    let selector = CoinSelector::new();

    assert_eq!(selector.dust_threshold(rate), sats(546));

    let selection = selector
        .select_for_amount(&SelectionRequest::new(
            sats(target),
            rate,
            unspents(&[100_000]),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");

    assert_eq!(selection.change_amount(sats(target)), Amount::ZERO);
    assert_eq!(selection.absolute_fee, sats(527));
    // 527 - (10 + 149 + 34)
    assert_eq!(selection.consumed_amount, sats(334));
}

#[test]
fn test_segwit_change_uses_segwit_dust_limit() {
    setup();

    // (10 + 149 + 34 + 31) bytes with a P2WPKH change output
    let rate = FeeRate::from_sat_per_byte(1);
    let target = 100_000 - 224 - 300;

    let selection = CoinSelector::new()
        .select_for_amount(
            &SelectionRequest::new(sats(target), rate, unspents(&[100_000]), SortingStrategy::Descending)
                .with_change_output(ScriptType::P2WPKH),
        )
        .expect("selection should succeed");

    // 300 clears the 294 sat P2WPKH relay limit
    assert_eq!(selection.absolute_fee, sats(224));
    assert_eq!(selection.consumed_amount, Amount::ZERO);
    assert_eq!(selection.change_amount(sats(target)), sats(300));
}

#[test]
fn test_dust_limit_override() {
    setup();

    let rate = FeeRate::from_sat_per_byte(1);
    let target = 100_000 - 227 - 300;
    let selector = CoinSelector::new().with_dust_limit(sats(200));

    let selection = selector
        .select_for_amount(&SelectionRequest::new(
            sats(target),
            rate,
            unspents(&[100_000]),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");

    assert_eq!(selection.absolute_fee, sats(227));
    assert_eq!(selection.change_amount(sats(target)), sats(300));
}

#[test]
fn test_select_all_to_segwit_payee() {
    setup();

    let coins = unspents(&[1, 20_000, 0, 0, 300_000]);
    let selector = CoinSelector::new();

    // Legacy inputs, one 31 byte P2WPKH output: (10 + 2 * 149 + 31) * 55
    let segwit = selector.select_all_to(&coins, fee_rate(), ScriptType::P2WPKH);
    assert_eq!(values(&segwit.spendable_outputs), vec![20_000, 300_000]);
    assert_eq!(segwit.absolute_fee, sats(18_645));
    assert_eq!(segwit.sweep_amount(), sats(301_355));

    let legacy = selector.select_all_to(&coins, fee_rate(), ScriptType::P2PKH);
    assert_eq!(legacy, selector.select_all(&coins, fee_rate()));
    assert_eq!(legacy.absolute_fee - segwit.absolute_fee, sats(165));
}

#[test]
fn test_segwit_payee_with_legacy_change() {
    setup();

    let request = SelectionRequest::new(
        sats(100_000),
        fee_rate(),
        unspents(&[1, 20_000, 0, 0, 300_000, 50_000, 30_000]),
        SortingStrategy::Descending,
    )
    .with_payee_output(ScriptType::P2WPKH)
    .with_change_output(ScriptType::P2PKH);

    let selection = CoinSelector::new()
        .select_for_amount(&request)
        .expect("selection should succeed");

    // (10 + 149 + 31 + 34) * 55
    assert_eq!(values(&selection.spendable_outputs), vec![300_000]);
    assert_eq!(selection.absolute_fee, sats(12_320));
    assert_eq!(selection.change_amount(sats(100_000)), sats(187_680));
}

#[test]
fn test_segwit_payee_without_change() {
    setup();

    let request = request(485_000, &[200_000, 300_000, 500_000], SortingStrategy::Descending)
        .with_payee_output(ScriptType::P2WPKH);

    let selection = CoinSelector::new()
        .select_for_amount(&request)
        .expect("selection should succeed");

    // 2680 sats of change is dust; the fee is priced for one P2WPKH output
    assert_eq!(selection.absolute_fee, sats(15_000));
    assert_eq!(selection.consumed_amount, sats(15_000 - 10_450));
}

#[test]
fn test_debug_events_skipped_without_debug_logger() {
    setup();

    assert!(!logging::enabled(LogLevel::Debug));

    let selection = utxo_selection::select_for_amount(&request(
        100_000,
        &[300_000],
        SortingStrategy::Descending,
    ))
    .expect("selection should succeed");
    assert_eq!(selection.absolute_fee, sats(12_485));
}

#[test]
fn test_overflowing_values_do_not_panic() {
    setup();

    let rate = FeeRate::from_sat_per_byte(1);
    let coins = unspents(&[1_000, u64::MAX - 10]);

    // Smallest first runs past u64::MAX before covering the target
    let result = CoinSelector::new().select_for_amount(&SelectionRequest::new(
        sats(5_000),
        rate,
        coins.clone(),
        SortingStrategy::Ascending,
    ));
    assert_eq!(
        result,
        Err(CoinSelectionError::InsufficientFunds {
            available: AMOUNT_CEILING,
            required: sats(5_000 + 342),
        })
    );

    // Largest first covers the target with one input and never sums
    let selection = CoinSelector::new()
        .select_for_amount(&SelectionRequest::new(
            sats(5_000),
            rate,
            coins.clone(),
            SortingStrategy::Descending,
        ))
        .expect("selection should succeed");
    assert_eq!(values(&selection.spendable_outputs), vec![u64::MAX - 10]);
    assert_eq!(selection.absolute_fee, sats(227));

    // A sweep cannot pay out more than u64::MAX
    assert!(CoinSelector::new().select_all(&coins, rate).is_empty());
}

#[test]
fn test_overflowing_forced_outputs_do_not_panic() {
    setup();

    let half = u64::MAX / 2 + 1;
    let coins = vec![unspent(0, half).force_include(), unspent(1, half).force_include()];

    let result = CoinSelector::new().select_for_amount(&SelectionRequest::new(
        sats(1_000),
        FeeRate::from_sat_per_byte(1),
        coins,
        SortingStrategy::Descending,
    ));

    assert!(matches!(
        result,
        Err(CoinSelectionError::InsufficientFunds { available, .. }) if available == AMOUNT_CEILING
    ));
}
