//! Shared helpers for coinsel-core integration tests
#![allow(dead_code)]

use bitcoin::{Amount, OutPoint, Txid};
use coinsel_core::logging::{self, LogConfig, LogLevel};
use coinsel_core::types::UnspentOutput;
use std::str::FromStr;
use std::sync::Once;

/// Reference fee rate of the worked examples, in sat/B
pub const FEE_PER_BYTE: u64 = 55;

static INIT_LOGGER: Once = Once::new();

/// Install a quiet logger once per test binary
pub fn setup() {
    INIT_LOGGER.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Error,
            log_file: None,
            include_timestamps: false,
            include_source_location: false,
            console_logging: false,
            json_format: false,
        };

        let _ = logging::init(&config);
    });
}

/// Deterministic txid for the `index`-th test output
pub fn txid(index: usize) -> Txid {
    Txid::from_str(&format!("{:064x}", index + 1)).expect("valid hex txid")
}

/// One confirmed output per value, each with a distinct identifier
pub fn unspents(values: &[u64]) -> Vec<UnspentOutput> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| unspent(index, *value))
        .collect()
}

/// A single confirmed output with a deterministic identifier
pub fn unspent(index: usize, value: u64) -> UnspentOutput {
    UnspentOutput::new(
        OutPoint::new(txid(index), index as u32),
        Amount::from_sat(value),
        1,
    )
    .with_owner("xpub-test".to_string(), format!("M/0/{}", index))
}

/// Values of `utxos` in order
pub fn values(utxos: &[UnspentOutput]) -> Vec<u64> {
    utxos.iter().map(|utxo| utxo.value.to_sat()).collect()
}

/// Sorted values of `utxos`, for set comparisons
pub fn sorted_values(utxos: &[UnspentOutput]) -> Vec<u64> {
    let mut values = values(utxos);
    values.sort_unstable();
    values
}

pub fn sats(value: u64) -> Amount {
    Amount::from_sat(value)
}
